//! SQLite funding state store.

use crate::schema::{CREATE_TABLE, TABLE};
use crate::{CreateMode, DEFAULT_ID, Error, FundingState, ListKind, Result, SetupReport};
use policy::{AccessRequest, Caller, Policy};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, ffi, params};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long a statement waits on a locked database before failing.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite-backed store for the `funding_state` table.
///
/// Every data statement is checked against the store's [`Policy`] on behalf
/// of a [`Caller`]. Schema and seed operations run as the table owner.
pub struct FundingStore {
    conn: Connection,
    policy: Policy,
}

impl FundingStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>, policy: Policy) -> Result<Self> {
        Self::open_with(path, policy, DEFAULT_BUSY_TIMEOUT)
    }

    pub fn open_with(path: impl AsRef<Path>, policy: Policy, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)?;
        conn.busy_timeout(busy_timeout)?;
        debug!(path = %path.display(), "opened funding state database");
        Ok(Self { conn, policy })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory(policy: Policy) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn, policy })
    }

    pub fn table_exists(&self) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [TABLE],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// Create the `funding_state` table. Returns `false` if `IfNotExists`
    /// found it already present.
    pub fn create_table(&self, mode: CreateMode) -> Result<bool> {
        if self.table_exists()? {
            return match mode {
                CreateMode::Strict => Err(Error::TableExists(TABLE.to_string())),
                CreateMode::IfNotExists => {
                    debug!(table = TABLE, "table already exists");
                    Ok(false)
                }
            };
        }
        self.conn.execute_batch(CREATE_TABLE)?;
        info!(table = TABLE, "created table");
        Ok(true)
    }

    /// Insert the default row with both lists empty.
    pub fn seed(&self) -> Result<()> {
        self.conn
            .execute("INSERT INTO funding_state (id) VALUES (?1)", [DEFAULT_ID])
            .map_err(|e| key_error(e, DEFAULT_ID))?;
        info!(id = DEFAULT_ID, "seeded default row");
        Ok(())
    }

    /// Create the table and seed the default row in one transaction.
    ///
    /// `Strict` fails on a second run; `IfNotExists` only does what is missing.
    /// The write lock is taken up front so concurrent setups queue on the
    /// busy timeout instead of deadlocking.
    pub fn setup(&self, mode: CreateMode) -> Result<SetupReport> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let created_table = self.create_table(mode)?;
        let seeded = match mode {
            CreateMode::Strict => {
                self.seed()?;
                true
            }
            CreateMode::IfNotExists => {
                if self.row_exists(DEFAULT_ID)? {
                    false
                } else {
                    self.seed()?;
                    true
                }
            }
        };
        tx.commit()?;
        Ok(SetupReport {
            created_table,
            seeded,
        })
    }

    /// Fetch a row. Rows hidden by the policy come back as `None`.
    pub fn select(&self, caller: &Caller, id: &str) -> Result<Option<FundingState>> {
        if !self.allowed(&AccessRequest::select(caller)) {
            return Ok(None);
        }
        let row = self
            .conn
            .query_row(
                "SELECT id, applied, irrelevant FROM funding_state WHERE id = ?1",
                [id],
                read_row,
            )
            .optional()?;
        debug!(id, found = row.is_some(), "select");
        row.map(decode).transpose()
    }

    /// Fetch every visible row, ordered by id.
    pub fn select_all(&self, caller: &Caller) -> Result<Vec<FundingState>> {
        if !self.allowed(&AccessRequest::select(caller)) {
            return Ok(Vec::new());
        }
        let mut stmt = self
            .conn
            .prepare("SELECT id, applied, irrelevant FROM funding_state ORDER BY id")?;
        let rows = stmt
            .query_map([], read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(decode).collect()
    }

    /// Fetch the singleton row.
    pub fn load(&self, caller: &Caller) -> Result<FundingState> {
        self.select(caller, DEFAULT_ID)?
            .ok_or_else(|| Error::not_found(DEFAULT_ID))
    }

    pub fn insert(&self, caller: &Caller, state: &FundingState) -> Result<()> {
        self.require(&AccessRequest::insert(caller))?;
        self.conn
            .execute(
                "INSERT INTO funding_state (id, applied, irrelevant) VALUES (?1, ?2, ?3)",
                params![
                    state.id,
                    serde_json::to_string(&state.applied)?,
                    serde_json::to_string(&state.irrelevant)?,
                ],
            )
            .map_err(|e| key_error(e, &state.id))?;
        debug!(id = %state.id, "insert");
        Ok(())
    }

    /// Replace both lists of the row with `state.id`.
    pub fn update(&self, caller: &Caller, state: &FundingState) -> Result<()> {
        self.check_update(caller, &state.id)?;
        let changed = self.conn.execute(
            "UPDATE funding_state SET applied = ?1, irrelevant = ?2 WHERE id = ?3",
            params![
                serde_json::to_string(&state.applied)?,
                serde_json::to_string(&state.irrelevant)?,
                state.id,
            ],
        )?;
        if changed == 0 {
            return Err(Error::not_found(&state.id));
        }
        debug!(id = %state.id, applied = state.applied.len(), irrelevant = state.irrelevant.len(), "update");
        Ok(())
    }

    /// Replace one list of a row.
    pub fn set_list(&self, caller: &Caller, id: &str, kind: ListKind, items: &[String]) -> Result<()> {
        self.check_update(caller, id)?;
        let sql = format!("UPDATE funding_state SET {} = ?1 WHERE id = ?2", kind.column());
        let changed = self
            .conn
            .execute(&sql, params![serde_json::to_string(items)?, id])?;
        if changed == 0 {
            return Err(Error::not_found(id));
        }
        debug!(id, list = %kind, len = items.len(), "set list");
        Ok(())
    }

    /// Mark an item applied on the singleton row. Returns whether it changed.
    pub fn mark_applied(&self, caller: &Caller, item: &str) -> Result<bool> {
        self.modify(caller, |state| state.mark_applied(item))
    }

    pub fn mark_irrelevant(&self, caller: &Caller, item: &str) -> Result<bool> {
        self.modify(caller, |state| state.mark_irrelevant(item))
    }

    pub fn unmark(&self, caller: &Caller, kind: ListKind, item: &str) -> Result<bool> {
        self.modify(caller, |state| state.unmark(kind, item))
    }

    /// Delete a row. Returns `false` if no visible row matched.
    pub fn delete(&self, caller: &Caller, id: &str) -> Result<bool> {
        if !self.allowed(&AccessRequest::delete(caller)) {
            return Ok(false);
        }
        let deleted = self
            .conn
            .execute("DELETE FROM funding_state WHERE id = ?1", [id])?;
        debug!(id, deleted, "delete");
        Ok(deleted > 0)
    }

    fn modify(&self, caller: &Caller, f: impl FnOnce(&mut FundingState) -> bool) -> Result<bool> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        let mut state = self.load(caller)?;
        if !f(&mut state) {
            return Ok(false);
        }
        self.update(caller, &state)?;
        tx.commit()?;
        Ok(true)
    }

    fn row_exists(&self, id: &str) -> Result<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS (SELECT 1 FROM funding_state WHERE id = ?1)",
            [id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn check_update(&self, caller: &Caller, id: &str) -> Result<()> {
        // invisible rows are simply not matched by the update
        if !self.allowed(&AccessRequest::update_visible(caller)) {
            return Err(Error::not_found(id));
        }
        self.require(&AccessRequest::update_check(caller))
    }

    fn allowed(&self, request: &AccessRequest<'_>) -> bool {
        self.require(request).is_ok()
    }

    fn require(&self, request: &AccessRequest<'_>) -> Result<()> {
        self.policy.check(request).require().map_err(|e| {
            warn!(role = %request.caller.role, command = %request.command, "{e}");
            Error::from(e)
        })
    }
}

type RawRow = (String, String, String);

fn read_row(row: &Row<'_>) -> rusqlite::Result<RawRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?))
}

fn decode((id, applied, irrelevant): RawRow) -> Result<FundingState> {
    Ok(FundingState {
        id,
        applied: serde_json::from_str(&applied)?,
        irrelevant: serde_json::from_str(&irrelevant)?,
    })
}

fn key_error(err: rusqlite::Error, id: &str) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Error::DuplicateKey(id.to_string())
        }
        _ => Error::Database(err),
    }
}

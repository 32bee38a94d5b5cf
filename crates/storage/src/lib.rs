//! SQLite-backed storage for the funding state record.
//!
//! This crate owns the `funding_state` table: a single shared record, keyed
//! by the literal id `"default"`, holding two ordered lists of item
//! identifiers (`applied` and `irrelevant`).
//!
//! # Overview
//!
//! The storage layer has three jobs:
//!
//! 1. **Schema** — create the table with its defaults
//!    ([`FundingStore::create_table`]).
//!
//! 2. **Seed** — insert the default row once ([`FundingStore::seed`]), or do
//!    both steps together with [`FundingStore::setup`].
//!
//! 3. **Access** — read and write rows on behalf of a [`Caller`], with every
//!    statement checked against a row-level [`Policy`] the way an RLS-enabled
//!    database would check it.
//!
//! # Core Concepts
//!
//! ## FundingState
//!
//! A [`FundingState`] is one row. The lists are opaque: the store preserves
//! exactly what was written, in order. The marking helpers
//! ([`FundingState::mark_applied`] and friends) keep an item in at most one
//! list, but raw writes are not constrained.
//!
//! ## Access policy
//!
//! Rows hidden by the policy's `using` predicate are invisible: selects skip
//! them, updates report [`Error::NotFound`], deletes report `false`. New data
//! rejected by `with_check` fails with [`Error::Policy`].
//!
//! # Example
//!
//! ```no_run
//! use storage::{Caller, CreateMode, FundingStore, Policy};
//!
//! let store = FundingStore::open("funding.db", Policy::public())?;
//! store.setup(CreateMode::IfNotExists)?;
//!
//! let anon = Caller::anonymous();
//! store.mark_applied(&anon, "item1")?;
//!
//! let state = store.load(&anon)?;
//! assert_eq!(state.applied, vec!["item1"]);
//! # Ok::<(), storage::Error>(())
//! ```

mod error;
mod record;
mod schema;
mod store;

pub use error::{Error, Result};
pub use policy::{Caller, Policy};
pub use record::{DEFAULT_ID, FundingState, ListKind};
pub use schema::{CreateMode, SetupReport, TABLE};
pub use store::{DEFAULT_BUSY_TIMEOUT, FundingStore};

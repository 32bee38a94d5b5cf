//! Table definition for `funding_state`.

/// Name of the one table this crate manages.
pub const TABLE: &str = "funding_state";

/// Arrays are stored as JSON text; the checks keep them arrays.
pub(crate) const CREATE_TABLE: &str = r#"
CREATE TABLE funding_state (
    id TEXT PRIMARY KEY NOT NULL DEFAULT 'default',
    applied TEXT NOT NULL DEFAULT '[]' CHECK (json_type(applied) = 'array'),
    irrelevant TEXT NOT NULL DEFAULT '[]' CHECK (json_type(irrelevant) = 'array')
);
"#;

/// How [`FundingStore::create_table`](crate::FundingStore::create_table) treats an existing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreateMode {
    /// Fail with [`Error::TableExists`](crate::Error::TableExists).
    #[default]
    Strict,
    /// Leave the existing table alone.
    IfNotExists,
}

/// What [`FundingStore::setup`](crate::FundingStore::setup) actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupReport {
    pub created_table: bool,
    pub seeded: bool,
}

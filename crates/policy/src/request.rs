use serde::{Deserialize, Serialize};

/// Role assigned to callers that present no identity.
pub const ANONYMOUS_ROLE: &str = "anon";

/// Statement kinds a rule can apply to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    #[default]
    All,
    Select,
    Insert,
    Update,
    Delete,
}

impl Command {
    /// Whether a rule declared for `self` covers a statement of kind `other`.
    pub fn covers(self, other: Command) -> bool {
        self == Command::All || self == other
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::All => "all",
            Command::Select => "select",
            Command::Insert => "insert",
            Command::Update => "update",
            Command::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Which predicate of a rule is being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Row visibility for reads, updates and deletes.
    Using,
    /// Admission of new or changed row data.
    WithCheck,
}

/// The identity a statement runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub role: String,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self::with_role(ANONYMOUS_ROLE)
    }

    pub fn with_role(role: impl Into<String>) -> Self {
        Self { role: role.into() }
    }
}

impl Default for Caller {
    fn default() -> Self {
        Self::anonymous()
    }
}

/// A single access check against the policy.
#[derive(Debug, Clone)]
pub struct AccessRequest<'a> {
    pub caller: &'a Caller,
    pub command: Command,
    pub phase: Phase,
}

impl<'a> AccessRequest<'a> {
    pub fn new(caller: &'a Caller, command: Command, phase: Phase) -> Self {
        Self {
            caller,
            command,
            phase,
        }
    }

    pub fn select(caller: &'a Caller) -> Self {
        Self::new(caller, Command::Select, Phase::Using)
    }

    pub fn insert(caller: &'a Caller) -> Self {
        Self::new(caller, Command::Insert, Phase::WithCheck)
    }

    pub fn update_visible(caller: &'a Caller) -> Self {
        Self::new(caller, Command::Update, Phase::Using)
    }

    pub fn update_check(caller: &'a Caller) -> Self {
        Self::new(caller, Command::Update, Phase::WithCheck)
    }

    pub fn delete(caller: &'a Caller) -> Self {
        Self::new(caller, Command::Delete, Phase::Using)
    }
}

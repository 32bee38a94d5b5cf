//! Policy configuration and enforcement.

use crate::{AccessRequest, Caller, Command, Error, Phase, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Name of the single rule shipped with the public policy.
pub const PUBLIC_RULE_NAME: &str = "Allow public access";

/// Top-level switch for authorization filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessControl {
    /// Every request is allowed; rules are ignored.
    #[default]
    None,
    /// Row-level rules decide; no applicable rule means deny.
    Rules,
}

/// Policy configuration loaded from TOML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default)]
    pub access_control: AccessControl,

    /// Permissive rules, consulted when `access_control = "rules"`.
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// A named permissive rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,

    #[serde(default)]
    pub command: Command,

    /// Decides which rows are visible.
    #[serde(default)]
    pub using: Predicate,

    /// Decides which new rows may be committed. Falls back to `using`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with_check: Option<Predicate>,
}

impl Rule {
    fn predicate(&self, phase: Phase) -> &Predicate {
        match phase {
            Phase::Using => &self.using,
            Phase::WithCheck => self.with_check.as_ref().unwrap_or(&self.using),
        }
    }
}

/// A condition evaluated against the caller.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    Always,
    #[default]
    Never,
    /// Passes when the caller's role is listed.
    Roles(Vec<String>),
}

impl Predicate {
    pub fn eval(&self, caller: &Caller) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::Never => false,
            Predicate::Roles(roles) => roles.iter().any(|r| r == &caller.role),
        }
    }
}

/// Result of an access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: String },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Turn a denial into [`Error::Denied`].
    pub fn require(self) -> Result<()> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny { reason } => Err(Error::Denied(reason)),
        }
    }
}

impl Policy {
    /// Load policy from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse policy from TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        let policy: Self = toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }

    /// Unrestricted access expressed as a single always-true rule for every command.
    pub fn public() -> Self {
        Self {
            access_control: AccessControl::Rules,
            rules: vec![Rule {
                name: PUBLIC_RULE_NAME.to_string(),
                command: Command::All,
                using: Predicate::Always,
                with_check: Some(Predicate::Always),
            }],
        }
    }

    /// Rules enabled with nothing granted.
    pub fn restrictive() -> Self {
        Self {
            access_control: AccessControl::Rules,
            rules: Vec::new(),
        }
    }

    /// Reject rules with empty or repeated names.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            let name = rule.name.trim();
            if name.is_empty() {
                return Err(Error::Invalid("rule name must not be empty".to_string()));
            }
            if !seen.insert(name) {
                return Err(Error::Invalid(format!("duplicate rule name '{name}'")));
            }
        }
        Ok(())
    }

    /// Check if a request is allowed.
    pub fn check(&self, request: &AccessRequest<'_>) -> Decision {
        if self.access_control == AccessControl::None {
            return Decision::Allow;
        }

        let mut applicable = self
            .rules
            .iter()
            .filter(|rule| rule.command.covers(request.command))
            .peekable();

        if applicable.peek().is_none() {
            return Decision::Deny {
                reason: format!("no rule grants {}", request.command),
            };
        }

        if applicable.any(|rule| rule.predicate(request.phase).eval(request.caller)) {
            return Decision::Allow;
        }

        let what = match request.phase {
            Phase::Using => "row not visible",
            Phase::WithCheck => "new row violates row-level policy",
        };
        Decision::Deny {
            reason: format!(
                "{what} for {} as role '{}'",
                request.command, request.caller.role
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EVERY_COMMAND: [Command; 4] = [
        Command::Select,
        Command::Insert,
        Command::Update,
        Command::Delete,
    ];

    fn requests(caller: &Caller) -> Vec<AccessRequest<'_>> {
        EVERY_COMMAND
            .iter()
            .flat_map(|&c| {
                [
                    AccessRequest::new(caller, c, Phase::Using),
                    AccessRequest::new(caller, c, Phase::WithCheck),
                ]
            })
            .collect()
    }

    #[test]
    fn test_public_allows_everyone_everything() {
        let policy = Policy::public();
        for caller in [Caller::anonymous(), Caller::with_role("authenticated")] {
            for req in requests(&caller) {
                assert!(policy.check(&req).is_allowed(), "{req:?}");
            }
        }
    }

    #[test]
    fn test_default_is_access_control_none() {
        let policy = Policy::default();
        assert_eq!(policy.access_control, AccessControl::None);
        let caller = Caller::anonymous();
        assert!(requests(&caller).iter().all(|r| policy.check(r).is_allowed()));
    }

    #[test]
    fn test_restrictive_denies() {
        let policy = Policy::restrictive();
        let caller = Caller::anonymous();
        let decision = policy.check(&AccessRequest::select(&caller));
        assert_eq!(
            decision,
            Decision::Deny {
                reason: "no rule grants select".to_string()
            }
        );
        assert!(matches!(decision.require(), Err(Error::Denied(_))));
    }

    #[test]
    fn test_role_rules_filter_by_role() {
        let policy = Policy {
            access_control: AccessControl::Rules,
            rules: vec![
                Rule {
                    name: "read".into(),
                    command: Command::Select,
                    using: Predicate::Always,
                    with_check: None,
                },
                Rule {
                    name: "write".into(),
                    command: Command::Update,
                    using: Predicate::Roles(vec!["editor".into()]),
                    with_check: None,
                },
            ],
        };
        let anon = Caller::anonymous();
        let editor = Caller::with_role("editor");

        assert!(policy.check(&AccessRequest::select(&anon)).is_allowed());
        assert!(!policy.check(&AccessRequest::update_visible(&anon)).is_allowed());
        assert!(policy.check(&AccessRequest::update_visible(&editor)).is_allowed());
        // with_check falls back to using
        assert!(policy.check(&AccessRequest::update_check(&editor)).is_allowed());
        assert!(!policy.check(&AccessRequest::delete(&editor)).is_allowed());
    }

    #[test]
    fn test_with_check_overrides_using() {
        let policy = Policy {
            access_control: AccessControl::Rules,
            rules: vec![Rule {
                name: "read-only".into(),
                command: Command::All,
                using: Predicate::Always,
                with_check: Some(Predicate::Never),
            }],
        };
        let caller = Caller::anonymous();
        assert!(policy.check(&AccessRequest::update_visible(&caller)).is_allowed());
        assert!(!policy.check(&AccessRequest::update_check(&caller)).is_allowed());
        assert!(!policy.check(&AccessRequest::insert(&caller)).is_allowed());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
access_control = "rules"

[[rules]]
name = "Allow public access"
command = "all"
using = "always"
with_check = "always"

[[rules]]
name = "staff delete"
command = "delete"
using = { roles = ["staff"] }
"#;
        let policy = Policy::parse(toml).unwrap();
        assert_eq!(policy.rules.len(), 2);
        assert_eq!(policy.rules[0], Policy::public().rules[0]);
        assert_eq!(
            policy.rules[1].using,
            Predicate::Roles(vec!["staff".to_string()])
        );
        assert_eq!(policy.rules[1].with_check, None);
    }

    #[test]
    fn test_parse_empty_is_default() {
        assert_eq!(Policy::parse("").unwrap(), Policy::default());
    }

    #[test]
    fn test_parse_rejects_duplicate_names() {
        let toml = r#"
access_control = "rules"

[[rules]]
name = "a"
using = "always"

[[rules]]
name = "a"
using = "never"
"#;
        assert!(matches!(Policy::parse(toml), Err(Error::Invalid(_))));
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        assert!(matches!(
            Policy::parse(r#"access_control = "sometimes""#),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_public_serializes_with_rule_name() {
        let json = serde_json::to_value(Policy::public()).unwrap();
        assert_eq!(json["access_control"], "rules");
        assert_eq!(json["rules"][0]["name"], PUBLIC_RULE_NAME);
        assert_eq!(json["rules"][0]["using"], "always");
    }
}

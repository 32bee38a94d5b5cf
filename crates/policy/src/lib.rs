//! Row-level access policy for the funding state table.
//!
//! Core principle: **access is decided by explicit configuration.** The
//! `access_control` flag either disables filtering outright (`none`) or
//! hands every statement to a list of permissive rules (`rules`).

mod error;
mod policy;
mod request;

pub use error::{Error, Result};
pub use policy::{AccessControl, Decision, PUBLIC_RULE_NAME, Policy, Predicate, Rule};
pub use request::{ANONYMOUS_ROLE, AccessRequest, Caller, Command, Phase};

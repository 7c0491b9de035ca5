//! Authentication/authorization is an external collaborator (spec.md §1);
//! the core only needs to know whether the current client may perform a
//! mutating operation.

pub trait Authorizer: Send + Sync {
    /// `username` is `None` for an unauthenticated request. `group` is
    /// `"admin"` or the system's configured print group, matching the
    /// operations in spec.md §4.E.
    fn is_authorized(&self, username: Option<&str>, group: &str) -> bool;
}

/// Used by the test harness and by deployments that don't wire PAM: every
/// request is authorized.
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn is_authorized(&self, _username: Option<&str>, _group: &str) -> bool {
        true
    }
}

/// A static username allowlist per group, useful for tests that need to
/// exercise the forbidden path without a real PAM service.
pub struct StaticGroups {
    pub groups: std::collections::HashMap<String, Vec<String>>,
}

impl Authorizer for StaticGroups {
    fn is_authorized(&self, username: Option<&str>, group: &str) -> bool {
        match (username, self.groups.get(group)) {
            (Some(user), Some(members)) => members.iter().any(|m| m == user),
            _ => false,
        }
    }
}

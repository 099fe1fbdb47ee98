//! The permission check consumed from the host platform.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

/// Answers whether the current user holds a capability on an object.
pub trait PermissionChecker: Send + Sync {
    fn current_user_can(&self, capability: &str, object_id: i64) -> bool;
}

/// Grants everything. For command-line and maintenance contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl PermissionChecker for AllowAll {
    fn current_user_can(&self, _capability: &str, _object_id: i64) -> bool {
        true
    }
}

/// Grants an explicit set of `(capability, object)` pairs.
///
/// # Examples
///
/// ```
/// use polyglot_rs_objects::permissions::{GrantedPermissions, PermissionChecker};
///
/// let perms = GrantedPermissions::new();
/// perms.grant("edit_post", 12);
/// assert!(perms.current_user_can("edit_post", 12));
/// assert!(!perms.current_user_can("edit_post", 13));
/// ```
#[derive(Debug, Default)]
pub struct GrantedPermissions {
    granted: RwLock<HashSet<(String, i64)>>,
}

impl GrantedPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, capability: &str, object_id: i64) {
        self.granted
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((capability.to_string(), object_id));
    }

    pub fn revoke(&self, capability: &str, object_id: i64) {
        self.granted
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(capability.to_string(), object_id));
    }
}

impl PermissionChecker for GrantedPermissions {
    fn current_user_can(&self, capability: &str, object_id: i64) -> bool {
        self.granted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&(capability.to_string(), object_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revoke() {
        let perms = GrantedPermissions::new();
        perms.grant("edit_term", 4);
        perms.revoke("edit_term", 4);
        assert!(!perms.current_user_can("edit_term", 4));
        assert!(AllowAll.current_user_can("edit_term", 4));
    }
}

//! Authorization for privileged commands.

/// Decides whether a Matrix user may run privileged commands.
///
/// Only the single configured administrator is privileged. When no
/// administrator is configured, nobody is.
#[derive(Clone, Debug)]
pub struct AccessGuard {
    /// Matrix user ID of the administrator
    admin_id: Option<String>,
}

impl AccessGuard {
    pub fn new(admin_id: Option<String>) -> Self {
        AccessGuard { admin_id }
    }

    /// Returns `true` iff `user_id` is the configured administrator.
    pub fn is_privileged(&self, user_id: &str) -> bool {
        self.admin_id.as_deref() == Some(user_id)
    }

    pub fn admin_id(&self) -> Option<&str> {
        self.admin_id.as_deref()
    }
}

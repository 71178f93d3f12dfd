//! IAM feature slice.
//!
//! Identifies the caller of every API request and answers permission checks.

mod checker;
mod error;
#[cfg(feature = "server")]
mod server;

pub use crate::checker::{PermissionChecker, RuleChecker};
pub use crate::error::{IamError, IamErrorExt};
#[cfg(feature = "server")]
pub use crate::server::{
    PermissionGuard, REMOTE_GROUP_HEADER, REMOTE_USER_HEADER, authenticate, require_permission,
};

use std::sync::Arc;
use velaux_kernel::domain::config::ApiConfig;
use velaux_kernel::domain::registry::InitializedSlice;

/// Feature inner state
#[velaux_derive::velaux_slice]
pub struct Iam {
    pub checker: Arc<dyn PermissionChecker>,
}

#[cfg(feature = "server")]
impl Iam {
    /// Guard state for a route that requires `permission`.
    #[must_use]
    pub fn guard(&self, permission: velaux_kernel::domain::identity::Permission) -> PermissionGuard {
        PermissionGuard::new(Arc::clone(&self.checker), permission)
    }
}

/// Builds the slice with the rule checker from `security.rbac`.
///
/// # Errors
/// Returns [`IamError::Validation`] if the configured rules are malformed.
pub fn init(config: &ApiConfig) -> Result<InitializedSlice, IamError> {
    let checker = RuleChecker::new(config.security.rbac.rules.clone())?;
    tracing::info!(rules = config.security.rbac.rules.len(), "IAM feature initialized");

    Ok(InitializedSlice::new(Iam::new(IamInner { checker: Arc::new(checker) })))
}

/// Same as [`init`], with a caller-supplied permission backend.
#[must_use]
pub fn init_with(checker: Arc<dyn PermissionChecker>) -> InitializedSlice {
    InitializedSlice::new(Iam::new(IamInner { checker }))
}

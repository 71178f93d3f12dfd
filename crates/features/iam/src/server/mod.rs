//! Axum middleware: caller authentication and permission guards.

use crate::checker::PermissionChecker;
use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use velaux_cluster::RequestContext;
use velaux_kernel::domain::identity::{Caller, Permission};
use velaux_kernel::server::ApiError;

/// Username asserted by the trusted front proxy.
pub const REMOTE_USER_HEADER: &str = "x-remote-user";
/// Group memberships; repeatable, each value may be comma-separated.
pub const REMOTE_GROUP_HEADER: &str = "x-remote-group";

/// Establishes the caller for the rest of the request.
///
/// The [`Caller`] is stored in the request extensions and the downstream
/// handlers run inside a [`RequestContext`] carrying it, so cluster calls are
/// made on the caller's behalf. Requests without a user are answered with 401.
pub async fn authenticate(mut req: Request, next: Next) -> Response {
    let Some(caller) = caller_from_headers(req.headers()) else {
        return ApiError::unauthorized().into_response();
    };

    tracing::debug!(user = %caller.username, groups = ?caller.groups, "Caller authenticated");
    req.extensions_mut().insert(caller.clone());
    RequestContext::new().with_caller(caller).scope(next.run(req)).await
}

fn caller_from_headers(headers: &HeaderMap) -> Option<Caller> {
    let username = headers
        .get(REMOTE_USER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|user| !user.is_empty())?;

    let groups = headers
        .get_all(REMOTE_GROUP_HEADER)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|group| !group.is_empty());

    Some(Caller::new(username).with_groups(groups))
}

/// State for [`require_permission`]: which checker to ask, and for what.
#[derive(Debug, Clone)]
pub struct PermissionGuard {
    checker: Arc<dyn PermissionChecker>,
    permission: Permission,
}

impl PermissionGuard {
    #[must_use]
    pub fn new(checker: Arc<dyn PermissionChecker>, permission: Permission) -> Self {
        Self { checker, permission }
    }

    #[must_use]
    pub const fn permission(&self) -> Permission {
        self.permission
    }
}

/// Rejects the request before it reaches the handler unless the caller holds the permission.
///
/// Use with `axum::middleware::from_fn_with_state(guard, require_permission)` as a route layer.
/// Missing caller: 401. Denied: 403. Checker failure: 500.
pub async fn require_permission(
    State(guard): State<PermissionGuard>,
    req: Request,
    next: Next,
) -> Response {
    let Some(caller) = req.extensions().get::<Caller>().cloned() else {
        return ApiError::unauthorized().into_response();
    };

    match guard.checker.check(&caller, guard.permission).await {
        Ok(true) => next.run(req).await,
        Ok(false) => {
            tracing::info!(user = %caller.username, permission = %guard.permission, "Permission denied");
            ApiError::forbidden().into_response()
        },
        Err(err) => ApiError::internal(err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn groups_may_repeat_or_be_comma_separated() {
        let mut headers = HeaderMap::new();
        headers.insert(REMOTE_USER_HEADER, HeaderValue::from_static(" alice "));
        headers.append(REMOTE_GROUP_HEADER, HeaderValue::from_static("dev, ops"));
        headers.append(REMOTE_GROUP_HEADER, HeaderValue::from_static("admins"));
        headers.append(REMOTE_GROUP_HEADER, HeaderValue::from_static(""));

        let caller = caller_from_headers(&headers).expect("caller");
        assert_eq!(caller.username, "alice");
        assert_eq!(caller.groups, ["dev", "ops", "admins"]);
    }

    #[test]
    fn blank_user_is_anonymous() {
        let mut headers = HeaderMap::new();
        headers.insert(REMOTE_USER_HEADER, HeaderValue::from_static("   "));
        assert!(caller_from_headers(&headers).is_none());
        assert!(caller_from_headers(&HeaderMap::new()).is_none());
    }
}

//! REST surface of the slice.

mod format;
mod handlers;

use crate::SystemInfo;
use axum::middleware::from_fn_with_state;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;
use velaux_iam::{PermissionGuard, require_permission};
use velaux_kernel::domain::constants::{ACTION_UPDATE, SYSTEM_SETTING};
use velaux_kernel::domain::identity::Permission;

/// Permission required to change the platform settings.
pub const UPDATE_PERMISSION: Permission = Permission::new(SYSTEM_SETTING, ACTION_UPDATE);

/// `GET` and `PUT /api/v1/system_info/`.
///
/// Only the `PUT` route sits behind `guard`; reads need an authenticated
/// caller and nothing more. Callers must layer [`velaux_iam::authenticate`] on top.
pub fn router<S>(slice: SystemInfo, guard: PermissionGuard) -> OpenApiRouter<S>
where
    S: Send + Sync + Clone + 'static,
{
    let read = OpenApiRouter::new().routes(routes!(handlers::get_system_info));
    let write = OpenApiRouter::new()
        .routes(routes!(handlers::update_system_info))
        .route_layer(from_fn_with_state(guard, require_permission));

    read.merge(write).with_state(slice)
}

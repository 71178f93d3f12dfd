use anyhow::{Context, Result};
use axum::Router;
use axum::middleware::from_fn;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};
use velaux::features::iam::Iam;
use velaux::features::system_info::{SystemInfo, UPDATE_PERMISSION};
use velaux::kernel::server::ApiState;
use velaux::server::authenticate;
use velaux::server::router::{system_info_router, system_router};

#[derive(OpenApi)]
#[openapi(info(title = "VelaUX API"))]
struct ApiDoc;

#[allow(unreachable_pub)]
pub fn init(state: ApiState) -> Result<Router> {
    let iam = state.try_get_slice::<Iam>().context("IAM slice is not registered")?.clone();
    let system_info =
        state.try_get_slice::<SystemInfo>().context("System info slice is not registered")?.clone();

    // Everything except the health check runs as an authenticated caller.
    let protected = system_info_router(system_info, iam.guard(UPDATE_PERMISSION))
        .layer(from_fn(authenticate));

    // Separate the OpenAPI routes and the API documentation object
    let (openapi_routes, api_doc) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(system_router())
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .split_for_parts();

    let scalar_routes = Scalar::with_url("/api", api_doc);

    Ok(Router::new().merge(openapi_routes).merge(scalar_routes))
}

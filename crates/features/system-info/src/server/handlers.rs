use super::format::Format;
use crate::SystemInfo;
use crate::dto::{SystemInfoRequest, SystemInfoResponse};
use crate::validation::validate;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Response;
use velaux_derive::api_handler;
use velaux_kernel::domain::constants::SYSTEM_INFO_TAG;
use velaux_kernel::server::{ApiError, ErrorBody};

const RESPONSE_ROOT: &str = "SystemInfoResponse";

#[api_handler(
    get,
    path = "/api/v1/system_info/",
    responses(
        (status = OK, description = "Current platform settings", content(
            (SystemInfoResponse = "application/json"),
            (SystemInfoResponse = "application/xml")
        )),
        (status = BAD_REQUEST, description = "The record could not be read", body = ErrorBody),
        (status = UNAUTHORIZED, description = "No caller identity", body = ErrorBody),
    ),
    tag = SYSTEM_INFO_TAG,
)]
pub(super) async fn get_system_info(
    State(slice): State<SystemInfo>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let info = slice.service.get_system_info().await?;
    Format::from_accept(&headers).respond(RESPONSE_ROOT, &info)
}

/// The body is taken raw so a missing or malformed payload is reported
/// with the same error shape as a field validation failure.
#[api_handler(
    put,
    path = "/api/v1/system_info/",
    request_body(content(
        (SystemInfoRequest = "application/json"),
        (SystemInfoRequest = "application/xml")
    )),
    responses(
        (status = OK, description = "Updated platform settings", content(
            (SystemInfoResponse = "application/json"),
            (SystemInfoResponse = "application/xml")
        )),
        (status = BAD_REQUEST, description = "Malformed or invalid request", body = ErrorBody),
        (status = UNAUTHORIZED, description = "No caller identity", body = ErrorBody),
        (status = FORBIDDEN, description = "Missing systemSetting:update", body = ErrorBody),
    ),
    tag = SYSTEM_INFO_TAG,
)]
pub(super) async fn update_system_info(
    State(slice): State<SystemInfo>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let request: SystemInfoRequest = Format::from_content_type(&headers).decode(&body)?;
    validate(&request)?;

    let info = slice.service.update_system_info(request).await?;
    Format::from_accept(&headers).respond(RESPONSE_ROOT, &info)
}

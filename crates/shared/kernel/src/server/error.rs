use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use utoipa::ToSchema;

/// Numeric code carried in every error body, stable across releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BusinessCode(pub u32);

impl BusinessCode {
    pub const BAD_REQUEST: Self = Self(400);
    pub const UNAUTHORIZED: Self = Self(401);
    pub const FORBIDDEN: Self = Self(403);
    pub const SERVER_ERROR: Self = Self(500);
    pub const INVALID_BODY: Self = Self(400_001);
    pub const INVALID_FIELD: Self = Self(400_002);
    pub const CLUSTER_UNAVAILABLE: Self = Self(400_010);
}

/// Wire format of an error response.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub business_code: u32,
    pub message: String,
}

/// An error that already knows how it is presented over HTTP.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: BusinessCode,
    message: Cow<'static, str>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: BusinessCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self { status, code, message: message.into() }
    }

    pub fn bad_request(code: BusinessCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, BusinessCode::UNAUTHORIZED, "401 Unauthorized")
    }

    #[must_use]
    pub fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, BusinessCode::FORBIDDEN, "403 Forbidden")
    }

    /// The detail is logged, never sent.
    pub fn internal(detail: impl fmt::Display) -> Self {
        tracing::error!(error = %detail, "Request failed with an internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            BusinessCode::SERVER_ERROR,
            "The service has lapsed.",
        )
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub const fn code(&self) -> BusinessCode {
        self.code
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub fn body(&self) -> ErrorBody {
        ErrorBody { business_code: self.code.0, message: self.message.to_string() }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.status, self.code.0, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_client_error() {
            tracing::debug!(status = %self.status, code = self.code.0, message = %self.message, "Request rejected");
        }
        (self.status, Json(self.body())).into_response()
    }
}

//! JSON and XML payloads, chosen from `Content-Type` and `Accept`.

use crate::error::{SystemInfoError, SystemInfoErrorExt};
use axum::Json;
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use velaux_kernel::server::ApiError;

const APPLICATION_XML: &str = "application/xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Format {
    Json,
    Xml,
}

impl Format {
    /// First JSON or XML media range listed in `Accept`; JSON when none is.
    pub(super) fn from_accept(headers: &HeaderMap) -> Self {
        headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .find_map(Self::from_media_type)
            .unwrap_or(Self::Json)
    }

    /// Decoder for the request body. A missing or unknown type is read as JSON.
    pub(super) fn from_content_type(headers: &HeaderMap) -> Self {
        headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .and_then(Self::from_media_type)
            .unwrap_or(Self::Json)
    }

    fn from_media_type(raw: &str) -> Option<Self> {
        let essence = raw.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/json" | "application/*" | "*/*" => Some(Self::Json),
            "application/xml" | "text/xml" => Some(Self::Xml),
            _ => None,
        }
    }

    pub(super) fn decode<T: DeserializeOwned>(self, body: &[u8]) -> Result<T, SystemInfoError> {
        match self {
            Self::Json => serde_json::from_slice(body).context("decoding the request body"),
            Self::Xml => quick_xml::de::from_reader(body).context("decoding the request body"),
        }
    }

    /// XML documents are wrapped in a `root` element.
    pub(super) fn respond<T: Serialize>(self, root: &str, value: &T) -> Result<Response, ApiError> {
        match self {
            Self::Json => Ok(Json(value).into_response()),
            Self::Xml => {
                let document =
                    quick_xml::se::to_string_with_root(root, value).map_err(ApiError::internal)?;
                Ok(([(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_XML))], document)
                    .into_response())
            },
        }
    }
}

//! Rewrites the acting identity of outbound control-plane requests.

use crate::error::ClusterError;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Request;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use velaux_domain::identity::Caller;

pub const IMPERSONATE_USER: HeaderName = HeaderName::from_static("impersonate-user");
pub const IMPERSONATE_GROUP: HeaderName = HeaderName::from_static("impersonate-group");
pub const IMPERSONATE_UID: HeaderName = HeaderName::from_static("impersonate-uid");
const IMPERSONATE_EXTRA_PREFIX: &str = "impersonate-extra-";

/// Pre-encoded identity headers for one caller.
#[derive(Debug, Clone)]
struct Identity {
    user: HeaderValue,
    groups: Vec<HeaderValue>,
}

/// Layer that applies [`Impersonation`] to the wrapped service.
///
/// Without a caller the layer still strips spoofed headers, so requests go out
/// under the service's own identity.
#[derive(Debug, Clone, Default)]
pub struct ImpersonationLayer {
    identity: Option<Identity>,
}

impl ImpersonationLayer {
    /// # Errors
    /// Returns [`ClusterError::Validation`] if the username or a group is not a valid header value.
    pub fn new(caller: Option<&Caller>) -> Result<Self, ClusterError> {
        let Some(caller) = caller else {
            return Ok(Self::default());
        };

        let user = header_value(&caller.username)?;
        let groups = caller.groups.iter().map(|g| header_value(g)).collect::<Result<_, _>>()?;

        Ok(Self { identity: Some(Identity { user, groups }) })
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        self.identity.is_none()
    }
}

impl<S> Layer<S> for ImpersonationLayer {
    type Service = Impersonation<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Impersonation { inner, identity: self.identity.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct Impersonation<S> {
    inner: S,
    identity: Option<Identity>,
}

impl<S, B> Service<Request<B>> for Impersonation<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let headers = req.headers_mut();
        strip_impersonation(headers);

        if let Some(identity) = &self.identity {
            headers.insert(IMPERSONATE_USER, identity.user.clone());
            for group in &identity.groups {
                headers.append(IMPERSONATE_GROUP, group.clone());
            }
        }

        self.inner.call(req)
    }
}

/// Removes every impersonation header already present on a request.
pub fn strip_impersonation(headers: &mut HeaderMap) {
    let extras: Vec<HeaderName> = headers
        .keys()
        .filter(|name| name.as_str().starts_with(IMPERSONATE_EXTRA_PREFIX))
        .cloned()
        .collect();

    for name in [IMPERSONATE_USER, IMPERSONATE_GROUP, IMPERSONATE_UID].into_iter().chain(extras) {
        headers.remove(name);
    }
}

fn header_value(raw: &str) -> Result<HeaderValue, ClusterError> {
    HeaderValue::from_str(raw)
        .map_err(|_| ClusterError::validation(format!("'{raw}' cannot be sent as an identity header")))
}

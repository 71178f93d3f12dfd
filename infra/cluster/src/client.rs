use crate::context::RequestContext;
use crate::error::{ClusterError, ClusterErrorExt};
use crate::impersonation::ImpersonationLayer;
use crate::routing::ClusterRoutingLayer;
use crate::scheme::Scheme;
use crate::transport::TransportConfig;
use http::Request;
use kube::client::{Body, ClientBuilder};
use kube::core::{DynamicObject, GroupVersionKind};
use kube::Api;
use std::fmt;
use std::sync::Arc;
use tower::ServiceBuilder;

/// Shared handle to the control plane.
///
/// The handle owns one base [`kube::Client`] (and its connection pool). Calls go
/// through per-request views from [`ApiClient::kube`], which act as the caller
/// and target the cluster found in the current [`RequestContext`].
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    base: kube::Client,
    scheme: Scheme,
    impersonate: bool,
}

impl ApiClient {
    /// Wraps an existing client. Views impersonate the caller and honor cluster routing.
    #[must_use]
    pub fn new(base: kube::Client, scheme: Scheme) -> Self {
        Self { inner: Arc::new(ApiClientInner { base, scheme, impersonate: true }) }
    }

    /// Builds the base client from `config`, applying its rate limit.
    ///
    /// Must be called inside a Tokio runtime.
    ///
    /// # Errors
    /// Returns [`ClusterError::Kube`] if the transport cannot be constructed.
    pub fn connect(config: &TransportConfig, scheme: &Scheme) -> Result<Self, ClusterError> {
        let limits = ServiceBuilder::new().option_layer(config.rate_limit().layer());
        let base = ClientBuilder::try_from(config.kube().clone())
            .context("building the control-plane transport")?
            .with_layer(&limits)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                base,
                scheme: scheme.clone(),
                impersonate: config.is_impersonating(),
            }),
        })
    }

    /// Whether both handles share the same underlying client.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    #[must_use]
    pub fn scheme(&self) -> &Scheme {
        &self.inner.scheme
    }

    #[must_use]
    pub fn default_namespace(&self) -> &str {
        self.inner.base.default_namespace()
    }

    /// Client view for the current task's [`RequestContext`].
    ///
    /// # Errors
    /// Fails if the caller's identity cannot be encoded or the cluster name is invalid.
    pub fn kube(&self) -> Result<kube::Client, ClusterError> {
        self.view(&RequestContext::current())
    }

    /// Client view acting as `ctx`'s caller against `ctx`'s cluster.
    ///
    /// # Errors
    /// Fails if the caller's identity cannot be encoded or the cluster name is invalid.
    pub fn view(&self, ctx: &RequestContext) -> Result<kube::Client, ClusterError> {
        let caller = if self.inner.impersonate { ctx.caller() } else { None };
        let impersonation = ImpersonationLayer::new(caller)?;
        let routing = ClusterRoutingLayer::new(ctx.cluster())?;

        let base = self.inner.base.clone();
        let service = ServiceBuilder::new().layer(impersonation).layer(routing).service_fn(
            move |req: Request<Body>| {
                let base = base.clone();
                async move { base.send(req).await }
            },
        );

        Ok(kube::Client::new(service, self.inner.base.default_namespace()))
    }

    /// Dynamic API for a kind registered in this client's scheme.
    ///
    /// # Errors
    /// Returns [`ClusterError::Registration`] for unknown kinds.
    pub fn dynamic_api(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
    ) -> Result<Api<DynamicObject>, ClusterError> {
        let resource = self.inner.scheme.resource(gvk).ok_or_else(|| ClusterError::Registration {
            message: format!("{}/{} {} is not registered", gvk.group, gvk.version, gvk.kind).into(),
            context: None,
        })?;

        let client = self.kube()?;
        Ok(match namespace {
            Some(ns) => Api::namespaced_with(client, ns, resource),
            None => Api::all_with(client, resource),
        })
    }
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("default_namespace", &self.default_namespace())
            .field("kinds", &self.inner.scheme.len())
            .field("impersonate", &self.inner.impersonate)
            .finish_non_exhaustive()
    }
}

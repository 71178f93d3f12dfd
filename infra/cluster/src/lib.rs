//! # Cluster gateway
//!
//! Single process-wide access point to the Kubernetes control plane.
//!
//! * [`ClusterGateway`] owns the transport configuration and memoizes the shared [`ApiClient`].
//! * Every outbound call is made as the end user found in the current
//!   [`RequestContext`] (`Impersonate-*` headers), optionally routed to a managed cluster.
//! * [`DiscoveryClient`] and [`PackageDiscovery`] are built fresh per call; schema parse
//!   failures degrade package discovery instead of failing it.
//!
//! ```rust,ignore
//! let gateway = ClusterGateway::builder().qps(100.0).burst(300).build()?;
//! gateway.initialize_config(None).await?;
//!
//! let ctx = RequestContext::new().with_caller(Caller::new("alice"));
//! let pods = ctx.scope(async {
//!     let api: Api<Pod> = Api::default_namespaced(gateway.client()?.kube()?);
//!     api.list(&Default::default()).await.map_err(ClusterError::from)
//! }).await?;
//! ```

mod client;
mod connector;
mod context;
mod discovery;
mod error;
mod impersonation;
mod provider;
mod routing;
mod scheme;
mod transport;

pub use client::ApiClient;
pub use connector::{ClusterConnector, KubeConnector};
pub use context::RequestContext;
pub use discovery::{
    DiscoveryClient, PackageDiscovery, PackageSchema, PackageSource, SchemaFailure, ServerGroup,
    package_resource,
};
pub use error::{ClusterError, ClusterErrorExt};
pub use impersonation::{Impersonation, ImpersonationLayer, strip_impersonation};
pub use provider::{ClusterGateway, ClusterGatewayBuilder};
pub use routing::{CLUSTER_GATEWAY_PATH, ClusterRouting, ClusterRoutingLayer};
pub use scheme::{Scheme, workflow};
pub use transport::{RateLimit, TransportConfig, load_kubeconfig, load_kubeconfig_context};

use crate::client::ApiClient;
use crate::discovery::{DiscoveryClient, PackageDiscovery};
use crate::error::ClusterError;
use crate::scheme::Scheme;
use crate::transport::TransportConfig;
use async_trait::async_trait;
use std::fmt::Debug;

/// Constructs the handles the gateway hands out.
///
/// The gateway owns caching and error classification; implementations only
/// build. Tests substitute fakes here to avoid a live control plane.
#[async_trait]
pub trait ClusterConnector: Send + Sync + Debug {
    /// Builds the shared client. `scheme` already holds every custom kind.
    fn api_client(&self, config: &TransportConfig, scheme: &Scheme)
    -> Result<ApiClient, ClusterError>;

    fn discovery_client(&self, config: &TransportConfig) -> Result<DiscoveryClient, ClusterError>;

    /// May fail with the recoverable [`ClusterError::SchemaParse`].
    async fn package_discovery(
        &self,
        config: &TransportConfig,
    ) -> Result<PackageDiscovery, ClusterError>;
}

/// Connects to a real control plane through `kube`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KubeConnector;

#[async_trait]
impl ClusterConnector for KubeConnector {
    fn api_client(
        &self,
        config: &TransportConfig,
        scheme: &Scheme,
    ) -> Result<ApiClient, ClusterError> {
        ApiClient::connect(config, scheme)
    }

    fn discovery_client(&self, config: &TransportConfig) -> Result<DiscoveryClient, ClusterError> {
        Ok(DiscoveryClient::new(ApiClient::connect(config, &Scheme::default())?))
    }

    async fn package_discovery(
        &self,
        config: &TransportConfig,
    ) -> Result<PackageDiscovery, ClusterError> {
        PackageDiscovery::load(ApiClient::connect(config, &Scheme::default())?).await
    }
}

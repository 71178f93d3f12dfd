use crate::client::ApiClient;
use crate::connector::{ClusterConnector, KubeConnector};
use crate::discovery::{DiscoveryClient, PackageDiscovery};
use crate::error::{ClusterError, ClusterErrorExt};
use crate::scheme::{Scheme, workflow};
use crate::transport::{RateLimit, TransportConfig};
use kube::core::ApiResource;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Memoized client slot.
#[derive(Debug, Default)]
enum ClientCell {
    #[default]
    Uninitialized,
    Cached(ApiClient),
}

impl ClientCell {
    fn set(&mut self, client: ApiClient) {
        *self = Self::Cached(client);
    }

    fn get_or_build(
        &mut self,
        build: impl FnOnce() -> Result<ApiClient, ClusterError>,
    ) -> Result<ApiClient, ClusterError> {
        if let Self::Cached(client) = self {
            return Ok(client.clone());
        }
        let client = build()?;
        *self = Self::Cached(client.clone());
        Ok(client)
    }
}

#[derive(Debug)]
struct GatewayInner {
    rate_limit: RateLimit,
    connector: Arc<dyn ClusterConnector>,
    scheme: RwLock<Scheme>,
    config: RwLock<Option<Arc<TransportConfig>>>,
    client: Mutex<ClientCell>,
}

/// Process-wide access point to the control plane.
///
/// Cheap to clone; every clone shares the same configuration and cached client.
///
/// 1. [`ClusterGateway::initialize_config`] installs the transport (once, at startup).
/// 2. [`ClusterGateway::client`] lazily builds and memoizes the shared client.
/// 3. [`ClusterGateway::discovery_client`] and [`ClusterGateway::package_discovery`]
///    build fresh handles on every call.
#[derive(Debug, Clone)]
pub struct ClusterGateway {
    inner: Arc<GatewayInner>,
}

impl ClusterGateway {
    #[must_use]
    pub fn builder() -> ClusterGatewayBuilder {
        ClusterGatewayBuilder::default()
    }

    /// Resolves and installs the transport configuration.
    ///
    /// Uses `explicit` when given, otherwise infers one from the environment
    /// (kubeconfig, then in-cluster service account). The gateway's rate limit
    /// is applied and impersonation installed. Any previous configuration is
    /// replaced as a whole.
    ///
    /// # Errors
    /// Returns [`ClusterError::ConfigResolution`] if no configuration can be inferred.
    pub async fn initialize_config(
        &self,
        explicit: Option<kube::Config>,
    ) -> Result<(), ClusterError> {
        let source = if explicit.is_some() { "explicit" } else { "inferred" };
        let resolved = match explicit {
            Some(config) => config,
            None => kube::Config::infer().await.context("inferring from the environment")?,
        };

        let mut transport = TransportConfig::new(resolved, self.inner.rate_limit);
        transport.install_impersonation();

        info!(
            source,
            cluster_url = %transport.kube().cluster_url,
            qps = transport.rate_limit().qps,
            burst = transport.rate_limit().burst,
            "Cluster transport configured"
        );

        *self.inner.config.write() = Some(Arc::new(transport));
        Ok(())
    }

    /// # Errors
    /// Returns [`ClusterError::NotInitialized`] before [`Self::initialize_config`] succeeded.
    pub fn config(&self) -> Result<Arc<TransportConfig>, ClusterError> {
        self.inner.config.read().clone().ok_or_else(ClusterError::not_initialized)
    }

    /// Replaces the cached client unconditionally. Intended for test doubles.
    pub fn set_client(&self, client: ApiClient) {
        debug!(?client, "Cluster client overridden");
        self.inner.client.lock().set(client);
    }

    /// Shared client, built on first use.
    ///
    /// Concurrent first callers build exactly one client.
    ///
    /// # Errors
    /// * [`ClusterError::NotInitialized`] if no configuration is installed.
    /// * [`ClusterError::Registration`] if custom kinds conflict.
    /// * Any construction error from the connector.
    pub fn client(&self) -> Result<ApiClient, ClusterError> {
        self.inner.client.lock().get_or_build(|| {
            let config = self.config()?;
            let scheme = {
                let mut scheme = self.inner.scheme.write();
                workflow::add_to_scheme(&mut scheme)?;
                scheme.clone()
            };

            let client = self.inner.connector.api_client(&config, &scheme)?;
            info!(kinds = scheme.len(), "Cluster client created");
            Ok(client)
        })
    }

    /// Registers an additional kind for clients built after this call.
    ///
    /// # Errors
    /// Returns [`ClusterError::Registration`] on a conflicting mapping.
    pub fn register(&self, resource: ApiResource) -> Result<(), ClusterError> {
        self.inner.scheme.write().register(resource)
    }

    /// # Errors
    /// Returns [`ClusterError::NotInitialized`] or any construction error, unchanged.
    pub fn discovery_client(&self) -> Result<DiscoveryClient, ClusterError> {
        let config = self.config()?;
        self.inner.connector.discovery_client(&config)
    }

    /// Fresh package discovery handle.
    ///
    /// A schema parse failure is logged and the partial handle returned.
    ///
    /// # Errors
    /// Returns [`ClusterError::NotInitialized`] or any non-parse construction error.
    pub async fn package_discovery(&self) -> Result<PackageDiscovery, ClusterError> {
        let config = self.config()?;
        match self.inner.connector.package_discovery(&config).await {
            Ok(discovery) => Ok(discovery),
            Err(ClusterError::SchemaParse { message, partial, .. }) => {
                warn!(%message, failures = partial.failures().len(), "Package discovery is degraded");
                Ok(*partial)
            },
            Err(err) => Err(err),
        }
    }
}

#[derive(Debug, Default)]
pub struct ClusterGatewayBuilder {
    rate_limit: RateLimit,
    connector: Option<Arc<dyn ClusterConnector>>,
    resources: Vec<ApiResource>,
}

impl ClusterGatewayBuilder {
    #[must_use]
    pub fn qps(mut self, qps: f32) -> Self {
        self.rate_limit.qps = qps;
        self
    }

    #[must_use]
    pub fn burst(mut self, burst: u32) -> Self {
        self.rate_limit.burst = burst;
        self
    }

    #[must_use]
    pub fn connector(mut self, connector: Arc<dyn ClusterConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Adds a custom kind to the shared scheme.
    #[must_use]
    pub fn resource(mut self, resource: ApiResource) -> Self {
        self.resources.push(resource);
        self
    }

    /// # Errors
    /// Returns [`ClusterError::Validation`] if the rate tunables give no usable
    /// limiter window, or [`ClusterError::Registration`] if the supplied kinds conflict.
    pub fn build(self) -> Result<ClusterGateway, ClusterError> {
        self.rate_limit.validate()?;

        let mut scheme = Scheme::new();
        for resource in self.resources {
            scheme.register(resource)?;
        }

        Ok(ClusterGateway {
            inner: Arc::new(GatewayInner {
                rate_limit: self.rate_limit,
                connector: self.connector.unwrap_or_else(|| Arc::new(KubeConnector)),
                scheme: RwLock::new(scheme),
                config: RwLock::new(None),
                client: Mutex::new(ClientCell::Uninitialized),
            }),
        })
    }
}

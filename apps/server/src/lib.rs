//! # VelaUX Server
//!
//! The `VelaUX` REST API on `Axum`, talking to the hub cluster through the
//! cluster gateway on behalf of each authenticated caller.
//!
//! ## Example
//! ```no_run
//! use velaux_server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     Server::builder()
//!         .port(8000)
//!         .build()
//!         .await?
//!         .run()
//!         .await
//! }
//! ```

mod router;

use anyhow::{Context, Result, anyhow};
use axum::Router;
use axum_server::Handle;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};
use velaux::cluster::{ClusterGateway, load_kubeconfig, load_kubeconfig_context};
use velaux::domain::config::{ApiConfig, SslConfig};
use velaux::kernel::server::ApiState;

/// A fluent builder for configuring and initializing the [`Server`].
#[must_use = "builders do nothing unless you call .build()"]
#[derive(Debug, Default)]
pub struct ServerBuilder {
    cfg: ApiConfig,
}

impl ServerBuilder {
    /// Set up the server's configuration.
    pub fn config(mut self, cfg: ApiConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.cfg.server.port = port;
        self
    }

    async fn init_gateway(&self) -> Result<ClusterGateway> {
        let kube = &self.cfg.kube;
        let gateway = ClusterGateway::builder()
            .qps(kube.qps)
            .burst(kube.burst)
            .build()
            .context("Failed to build the cluster gateway")?;

        let explicit = match (&kube.kubeconfig, kube.context.as_deref()) {
            (Some(path), context) => Some(load_kubeconfig(path, context).await?),
            (None, Some(context)) => Some(load_kubeconfig_context(context).await?),
            (None, None) => None,
        };

        gateway
            .initialize_config(explicit)
            .await
            .context("Failed to resolve the cluster connection")?;
        Ok(gateway)
    }

    /// Consumes the builder and initializes the server.
    ///
    /// # Process
    /// 1. Checks the TLS material, if configured
    /// 2. Resolves the cluster connection (explicit kubeconfig, then the environment)
    /// 3. Initializes the feature slices
    /// 4. Constructs application state
    ///
    /// No request is sent to the cluster here; the client is built on first use.
    ///
    /// # Errors
    /// Returns an error if:
    /// * SSL certificate/key files are missing
    /// * No cluster configuration can be resolved
    /// * The RBAC rules are malformed
    pub async fn build(self) -> Result<Server> {
        // 1. TLS material
        if let Some(ssl) = &self.cfg.server.ssl {
            check_tls_material(ssl)?;
        }

        let address = SocketAddr::new(self.cfg.server.address, self.cfg.server.port);
        info!(address = %address, "Initializing server");

        // 2. Cluster gateway
        let gateway = self.init_gateway().await?;

        // 3. Orchestrate Feature Slices
        let slices = velaux::init(&self.cfg, &gateway)
            .map_err(|e| anyhow!("Platform bootstrap failed: {e}"))?;

        // 4. Construct State
        let state = ApiState::builder()
            .config(self.cfg)
            .gateway(gateway)
            .register_slices(slices)
            .build()
            .context("Failed to finalize API state registry")?;
        Ok(Server { state })
    }
}

/// A fully initialized server instance ready to run.
#[must_use = "call .run().await to start the server"]
#[derive(Debug)]
pub struct Server {
    state: ApiState,
}

impl Server {
    /// Returns a new [`ServerBuilder`] to configure the server.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::default()
    }

    /// The complete application router, documentation UI included.
    ///
    /// # Errors
    /// Returns an error if a required feature slice is not registered.
    pub fn router(&self) -> Result<Router> {
        router::init(self.state.clone())
    }

    /// Starts the server and runs until the shutdown signal is received.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the configured address
    /// or if SSL/TLS setup fails.
    pub async fn run(self) -> Result<()> {
        let cfg = self.state.config.clone();
        let address = SocketAddr::new(cfg.server.address, cfg.server.port);

        info!(address = %address, ssl = cfg.server.ssl.is_some(), "Starting server");

        let app = self.router()?;

        // Graceful shutdown
        let handle = Handle::<SocketAddr>::new();
        let shutdown_handle = handle.clone();

        tokio::spawn(async move {
            if let Err(e) = shutdown_signal().await {
                error!("Error while waiting for shutdown signal: {e}");
                return;
            }
            info!("Shutdown signal received, starting graceful shutdown...");
            shutdown_handle.graceful_shutdown(Some(std::time::Duration::from_secs(30)));
        });

        if let Some(ssl_config) = &cfg.server.ssl {
            info!("Starting HTTPS server on https://{address}");

            let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(
                &ssl_config.cert,
                &ssl_config.key,
            )
            .await
            .context("Failed to load SSL/TLS certificates")?;

            axum_server::bind_rustls(address, tls_config)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTPS server failed")?;
        } else {
            info!("Starting HTTP server on http://{address}");

            axum_server::bind(address)
                .handle(handle)
                .serve(app.into_make_service())
                .await
                .context("HTTP server failed")?;
        }

        info!("Server shutdown complete");
        Ok(())
    }

    /// Returns a reference to the application state.
    #[must_use]
    pub const fn state(&self) -> &ApiState {
        &self.state
    }
}

/// Both files must exist; a group- or world-readable key is only warned about.
fn check_tls_material(ssl: &SslConfig) -> Result<()> {
    for (what, path) in [("certificate", &ssl.cert), ("key", &ssl.key)] {
        if !path.is_file() {
            anyhow::bail!("SSL {what} not found at: {}", path.display());
        }
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = ssl.key.metadata().context("Failed to stat the SSL key")?.permissions().mode();
        if mode & 0o077 != 0 {
            tracing::warn!(
                key = %ssl.key.display(),
                mode = %format!("{mode:o}"),
                "SSL key is readable by other users"
            );
        }
    }
    Ok(())
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM.
async fn shutdown_signal() -> Result<()> {
    let ctrl_c = async { signal::ctrl_c().await.context("Failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to install SIGTERM handler")?
            .recv()
            .await;
        Ok::<_, anyhow::Error>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<()>>();

    tokio::select! {
        res = ctrl_c => res?,
        res = terminate => res?,
    }

    Ok(())
}

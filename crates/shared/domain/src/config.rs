use crate::constants::VELA_SYSTEM_NAMESPACE;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Top-level API configuration shared across services.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfigInner {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub kube: KubeConfig,
    pub logging: LoggingConfig,
    pub system_info: SystemInfoConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(flatten, default)]
    inner: Arc<ApiConfigInner>,
}

impl Deref for ApiConfig {
    type Target = ApiConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ApiConfig {
    fn deref_mut(&mut self) -> &mut ApiConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
    pub ssl: Option<SslConfig>,
}

/// TLS certificate/key paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub cert: PathBuf,
    pub key: PathBuf,
}

/// Connection settings for the Kubernetes control plane.
///
/// `qps` and `burst` are applied onto the transport before the first client is built.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KubeConfig {
    /// Steady-state request rate. Zero or negative disables client-side limiting.
    pub qps: f32,
    /// Requests allowed in a single burst.
    pub burst: u32,
    /// Explicit kubeconfig file; the ambient environment is used when unset.
    pub kubeconfig: Option<PathBuf>,
    /// Context to select inside the kubeconfig file.
    pub context: Option<String>,
}

/// Optional API security knobs.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub rbac: RbacConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RbacConfig {
    pub rules: Vec<RbacRule>,
}

/// Grants `actions` on `resources` to `subjects`.
///
/// Subjects are written as `user:<name>`, `group:<name>` or `*`.
/// Resources and actions accept `*` as a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RbacRule {
    pub subjects: Vec<String>,
    pub resources: Vec<String>,
    pub actions: Vec<String>,
}

/// Logger settings consumed by the server binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub filter: Option<String>,
    pub json: bool,
    pub dir: Option<PathBuf>,
}

/// Where the system info record is persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SystemInfoConfig {
    pub namespace: String,
}

// --- Default ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self { address: IpAddr::V4(Ipv4Addr::UNSPECIFIED), port: 8000, ssl: None }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self { cert: PathBuf::from("cert.pem"), key: PathBuf::from("key.pem") }
    }
}

impl Default for KubeConfig {
    fn default() -> Self {
        Self { qps: 100.0, burst: 300, kubeconfig: None, context: None }
    }
}

impl Default for RbacConfig {
    fn default() -> Self {
        Self {
            rules: vec![RbacRule {
                subjects: vec!["group:velaux:admins".to_owned(), "group:system:masters".to_owned()],
                resources: vec!["*".to_owned()],
                actions: vec!["*".to_owned()],
            }],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), filter: None, json: false, dir: None }
    }
}

impl Default for SystemInfoConfig {
    fn default() -> Self {
        Self { namespace: VELA_SYSTEM_NAMESPACE.to_owned() }
    }
}

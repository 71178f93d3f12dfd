use crate::error::{ClusterError, ClusterErrorExt};
use kube::config::{KubeConfigOptions, Kubeconfig};
use std::path::Path;
use std::time::Duration;
use tower::limit::RateLimitLayer;

/// Client-side request budget applied to every outbound call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateLimit {
    pub qps: f32,
    pub burst: u32,
}

impl Default for RateLimit {
    fn default() -> Self {
        Self { qps: 100.0, burst: 300 }
    }
}

impl RateLimit {
    #[must_use]
    pub const fn new(qps: f32, burst: u32) -> Self {
        Self { qps, burst }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.qps > 0.0 && self.burst > 0
    }

    /// Checks that the tunables map onto a representable limiter window.
    ///
    /// # Errors
    /// Returns [`ClusterError::Validation`] for a non-finite `qps`, or when
    /// `burst / qps` is shorter than a nanosecond or too long for a [`Duration`].
    pub fn validate(&self) -> Result<(), ClusterError> {
        if !self.qps.is_finite() {
            return Err(ClusterError::validation(format!("kube.qps must be finite, got {}", self.qps)));
        }
        if self.is_enabled() && self.period().is_none() {
            return Err(ClusterError::validation(format!(
                "kube.qps={} with kube.burst={} gives no usable rate window",
                self.qps, self.burst
            )));
        }
        Ok(())
    }

    /// Window in which `burst` requests are admitted.
    ///
    /// `None` when limiting is disabled or the window is not representable.
    #[must_use]
    pub fn period(&self) -> Option<Duration> {
        if !self.is_enabled() || !self.qps.is_finite() {
            return None;
        }
        Duration::try_from_secs_f64(f64::from(self.burst) / f64::from(self.qps))
            .ok()
            .filter(|period| !period.is_zero())
    }

    #[must_use]
    pub fn layer(&self) -> Option<RateLimitLayer> {
        self.period().map(|period| RateLimitLayer::new(u64::from(self.burst), period))
    }
}

/// Resolved connection parameters plus the gateway's transport tunables.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    kube: kube::Config,
    rate_limit: RateLimit,
    impersonation: bool,
}

impl TransportConfig {
    #[must_use]
    pub const fn new(kube: kube::Config, rate_limit: RateLimit) -> Self {
        Self { kube, rate_limit, impersonation: false }
    }

    #[must_use]
    pub const fn kube(&self) -> &kube::Config {
        &self.kube
    }

    #[must_use]
    pub const fn rate_limit(&self) -> RateLimit {
        self.rate_limit
    }

    /// Marks the transport as impersonating. Returns `false` if it already was.
    pub const fn install_impersonation(&mut self) -> bool {
        if self.impersonation {
            return false;
        }
        self.impersonation = true;
        true
    }

    #[must_use]
    pub const fn is_impersonating(&self) -> bool {
        self.impersonation
    }
}

/// Reads a kubeconfig file, optionally selecting a named context.
///
/// # Errors
/// Returns [`ClusterError::Kubeconfig`] if the file cannot be read or the context is unknown.
pub async fn load_kubeconfig(
    path: impl AsRef<Path>,
    context: Option<&str>,
) -> Result<kube::Config, ClusterError> {
    let path = path.as_ref();
    let kubeconfig = Kubeconfig::read_from(path)
        .context(format!("reading kubeconfig {}", path.display()))?;
    let options =
        KubeConfigOptions { context: context.map(ToOwned::to_owned), ..Default::default() };

    kube::Config::from_custom_kubeconfig(kubeconfig, &options)
        .await
        .context(format!("loading kubeconfig {}", path.display()))
}

/// Loads the default kubeconfig (`$KUBECONFIG` or `~/.kube/config`) with `context` selected.
///
/// # Errors
/// Returns [`ClusterError::Kubeconfig`] if no kubeconfig is found or the context is unknown.
pub async fn load_kubeconfig_context(context: &str) -> Result<kube::Config, ClusterError> {
    let options = KubeConfigOptions { context: Some(context.to_owned()), ..Default::default() };
    kube::Config::from_kubeconfig(&options).await.context(format!("selecting context {context}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> kube::Config {
        kube::Config::new("https://127.0.0.1:6443".parse().expect("valid uri"))
    }

    #[test]
    fn rate_limit_period_spans_one_burst() {
        let limit = RateLimit::new(100.0, 300);
        assert_eq!(limit.period(), Some(Duration::from_secs(3)));
        assert!(limit.layer().is_some());
    }

    #[test]
    fn non_positive_values_disable_limiting() {
        assert_eq!(RateLimit::new(0.0, 300).period(), None);
        assert_eq!(RateLimit::new(-1.0, 300).period(), None);
        assert_eq!(RateLimit::new(50.0, 0).period(), None);
        assert!(RateLimit::new(0.0, 0).layer().is_none());
    }

    #[test]
    fn unrepresentable_windows_never_build_a_layer() {
        for limit in [
            RateLimit::new(1e10, 1),
            RateLimit::new(f32::INFINITY, 300),
            RateLimit::new(1e-30, u32::MAX),
        ] {
            assert_eq!(limit.period(), None, "{limit:?}");
            assert!(limit.layer().is_none(), "{limit:?}");
            assert!(
                matches!(limit.validate(), Err(ClusterError::Validation { .. })),
                "{limit:?}"
            );
        }
    }

    #[test]
    fn nan_qps_is_rejected() {
        let limit = RateLimit::new(f32::NAN, 300);
        assert!(matches!(limit.validate(), Err(ClusterError::Validation { .. })));
        assert!(limit.layer().is_none());
    }

    #[test]
    fn usable_and_disabled_limits_validate() {
        assert!(RateLimit::default().validate().is_ok());
        assert!(RateLimit::new(0.5, 1).validate().is_ok());
        assert!(RateLimit::new(0.0, 300).validate().is_ok());
        assert!(RateLimit::new(-5.0, 0).validate().is_ok());
    }

    #[test]
    fn impersonation_installs_once() {
        let mut transport = TransportConfig::new(config(), RateLimit::default());
        assert!(!transport.is_impersonating());
        assert!(transport.install_impersonation());
        assert!(!transport.install_impersonation());
        assert!(transport.is_impersonating());
    }
}

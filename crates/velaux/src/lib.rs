//! Facade crate for the `VelaUX` feature slices and shared modules.
//! Re-exports domain/kernel/cluster primitives and aggregates feature initialization.
//! Keep this crate thin: it should compose other crates, not implement business logic.
//!
//! ## Usage
//! - Add `velaux` with the `server` feature.
//! - Build a [`cluster::ClusterGateway`], then call [`init`] to obtain the feature slices.

pub use velaux_cluster as cluster;
use velaux_cluster::ClusterGateway;
pub use velaux_domain as domain;
use velaux_domain::config::ApiConfig;
pub use velaux_kernel as kernel;

#[cfg(feature = "server")]
pub mod server {
    pub use velaux_iam::authenticate;

    pub mod router {
        pub use velaux_kernel::server::router::system_router;
        pub use velaux_system_info::router as system_info_router;
    }
}

/// Feature registry for runtime introspection.
pub mod features {
    pub use velaux_iam as iam;
    pub use velaux_system_info as system_info;

    /// Build-time enabled features (by Cargo feature).
    pub const ENABLED: &[&str] = &[
        #[cfg(feature = "server")]
        "server",
        "iam",
        "system_info",
    ];

    #[must_use]
    pub fn is_enabled(name: &str) -> bool {
        ENABLED.contains(&name)
    }
}

/// Initializes every feature slice.
///
/// # Errors
/// Returns an error if any feature initialization fails.
pub fn init(
    config: &ApiConfig,
    gateway: &ClusterGateway,
) -> Result<Vec<domain::registry::InitializedSlice>, Box<dyn std::error::Error>> {
    let mut slices = Vec::new();

    // Identity & Access Management (IAM)
    slices.push(features::iam::init(config)?);

    // Platform settings
    slices.push(features::system_info::init(config, gateway));

    Ok(slices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::iam::Iam;
    use crate::features::system_info::SystemInfo;

    #[test]
    fn init_registers_every_slice() {
        let gateway = ClusterGateway::builder().build().expect("gateway");
        let slices = init(&ApiConfig::default(), &gateway).expect("slices");

        assert_eq!(slices.len(), 2);
        assert!(slices.iter().any(|s| s.state.as_any().is::<Iam>()));
        assert!(slices.iter().any(|s| s.state.as_any().is::<SystemInfo>()));
        assert!(features::is_enabled("system_info"));
    }

    #[test]
    fn malformed_rbac_rules_fail_bootstrap() {
        let mut config = ApiConfig::default();
        config.security.rbac.rules[0].subjects = vec!["team:ops".to_owned()];
        let gateway = ClusterGateway::builder().build().expect("gateway");

        assert!(init(&config, &gateway).is_err());
    }
}

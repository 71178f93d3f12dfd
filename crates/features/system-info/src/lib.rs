//! System info feature slice.
//!
//! Owns the platform settings record: a stable platform id, the install
//! time, the login mode and the defaults applied to single-sign-on users.
//! The record lives in a `ConfigMap` and is created on first read.

mod dto;
mod error;
#[cfg(feature = "server")]
mod server;
mod service;
mod validation;

pub use crate::dto::{
    LOGIN_TYPE_DEX, LOGIN_TYPE_LOCAL, ProjectRef, SystemInfoRecord, SystemInfoRequest,
    SystemInfoResponse, SystemVersion,
};
pub use crate::error::{SystemInfoError, SystemInfoErrorExt};
#[cfg(feature = "server")]
pub use crate::server::{UPDATE_PERMISSION, router};
pub use crate::service::{CONFIG_MAP_NAME, ConfigMapSystemInfoService, DATA_KEY, SystemInfoService};
pub use crate::validation::validate;

use std::sync::Arc;
use velaux_cluster::ClusterGateway;
use velaux_kernel::domain::config::ApiConfig;
use velaux_kernel::domain::registry::InitializedSlice;

#[velaux_derive::velaux_slice]
pub struct SystemInfo {
    pub service: Arc<dyn SystemInfoService>,
}

/// Builds the slice backed by the `ConfigMap` in `system_info.namespace`.
#[must_use]
pub fn init(config: &ApiConfig, gateway: &ClusterGateway) -> InitializedSlice {
    let namespace = config.system_info.namespace.clone();
    tracing::info!(%namespace, "System info feature initialized");

    init_with(Arc::new(ConfigMapSystemInfoService::new(gateway.clone(), namespace)))
}

/// Same as [`init`], with a caller-supplied backend.
#[must_use]
pub fn init_with(service: Arc<dyn SystemInfoService>) -> InitializedSlice {
    InitializedSlice::new(SystemInfo::new(SystemInfoInner { service }))
}

//! Shared string constants: `OpenAPI` tags and RBAC names.

/// `OpenAPI` tag for infrastructure endpoints.
pub const SYSTEM_TAG: &str = "System";
/// `OpenAPI` tag for the system info endpoints.
pub const SYSTEM_INFO_TAG: &str = "systemInfo";

/// RBAC resource guarding the platform settings.
pub const SYSTEM_SETTING: &str = "systemSetting";

pub const ACTION_UPDATE: &str = "update";
pub const ACTION_DETAIL: &str = "detail";

/// Name of the hub cluster in multi-cluster routing.
pub const LOCAL_CLUSTER: &str = "local";

/// Namespace where `KubeVela` keeps its system objects.
pub const VELA_SYSTEM_NAMESPACE: &str = "vela-system";

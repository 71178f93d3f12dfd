use serde::{Deserialize, Serialize};

pub const LOGIN_TYPE_LOCAL: &str = "local";
pub const LOGIN_TYPE_DEX: &str = "dex";

/// A project new single-sign-on users join, with the roles they get there.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct ProjectRef {
    pub name: String,
    pub roles: Vec<String>,
}

/// The persisted platform settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", default)]
pub struct SystemInfoRecord {
    #[serde(rename = "platformID")]
    pub platform_id: String,
    pub enable_collection: bool,
    pub login_type: String,
    /// RFC 3339
    pub install_time: String,
    pub vela_address: String,
    pub dex_user_default_projects: Vec<ProjectRef>,
}

impl Default for SystemInfoRecord {
    fn default() -> Self {
        Self {
            platform_id: String::new(),
            enable_collection: true,
            login_type: LOGIN_TYPE_LOCAL.to_owned(),
            install_time: String::new(),
            vela_address: String::new(),
            dex_user_default_projects: Vec::new(),
        }
    }
}

impl SystemInfoRecord {
    /// Overwrites the mutable settings; identity and install time are kept.
    pub fn apply(&mut self, request: SystemInfoRequest) {
        self.enable_collection = request.enable_collection;
        self.login_type = request.login_type;
        if let Some(address) = request.vela_address {
            self.vela_address = address;
        }
        self.dex_user_default_projects = request.dex_user_default_projects;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SystemVersion {
    pub vela_version: String,
    pub git_version: String,
}

impl SystemVersion {
    #[must_use]
    pub fn current() -> Self {
        Self {
            vela_version: env!("CARGO_PKG_VERSION").to_owned(),
            git_version: option_env!("VELAUX_GIT_VERSION").unwrap_or("unknown").to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SystemInfoResponse {
    #[serde(flatten)]
    pub info: SystemInfoRecord,
    pub system_version: SystemVersion,
}

/// Body of `PUT /api/v1/system_info/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SystemInfoRequest {
    #[serde(default)]
    pub enable_collection: bool,
    /// `local` or `dex`
    pub login_type: String,
    #[serde(default)]
    pub vela_address: Option<String>,
    #[serde(default)]
    pub dex_user_default_projects: Vec<ProjectRef>,
}

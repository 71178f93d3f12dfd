use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment overrides, e.g. `VELAUX__KUBE__QPS=50`.
pub const ENV_PREFIX: &str = "VELAUX";

const DEFAULT_CONFIG: &str = "server";

#[velaux_derive::velaux_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads settings from a file overlaid with environment overrides.
///
/// 1. **Base file**: `path` (any format the `config` crate recognizes by extension). When no
///    path is given, an optional `server.*` file in the working directory is used.
/// 2. **Environment**: variables prefixed with `VELAUX__`, nested with double underscores
///    (`VELAUX__SYSTEM_INFO__NAMESPACE` maps to `system_info.namespace`).
///
/// # Errors
/// Returns [`ConfigError`] if an explicitly given file is missing, or if the merged
/// settings do not deserialize into `T`.
///
/// # Example
/// ```rust
/// use velaux_kernel::config::load_config;
///
/// #[derive(Default, serde::Deserialize)]
/// struct AppConfig {
///     port: u16,
/// }
///
/// let cfg: AppConfig = load_config(Some("config/local")).unwrap_or_default();
/// ```
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load_layered(path, environment())
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .convert_case(config::Case::Snake)
}

fn load_layered<T>(path: Option<impl AsRef<Path>>, env: Environment) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let required = path.is_some();
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(env);

    info!(path = %effective_path.display(), required, "Loading config");

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}

use crate::dto::{LOGIN_TYPE_DEX, LOGIN_TYPE_LOCAL, ProjectRef, SystemInfoRequest};
use crate::error::SystemInfoError;

/// Structural checks on an update request.
///
/// # Errors
/// Returns [`SystemInfoError::Validation`] naming the first offending field.
pub fn validate(request: &SystemInfoRequest) -> Result<(), SystemInfoError> {
    if request.login_type != LOGIN_TYPE_LOCAL && request.login_type != LOGIN_TYPE_DEX {
        return Err(SystemInfoError::invalid(format!(
            "loginType must be '{LOGIN_TYPE_LOCAL}' or '{LOGIN_TYPE_DEX}', got '{}'",
            request.login_type
        )));
    }

    if let Some(address) = request.vela_address.as_deref().filter(|a| !a.is_empty()) {
        if !(address.starts_with("http://") || address.starts_with("https://")) {
            return Err(SystemInfoError::invalid(format!(
                "velaAddress must be an http(s) URL, got '{address}'"
            )));
        }
    }

    request.dex_user_default_projects.iter().try_for_each(validate_project)
}

fn validate_project(project: &ProjectRef) -> Result<(), SystemInfoError> {
    if !is_dns_label(&project.name) {
        return Err(SystemInfoError::invalid(format!(
            "dexUserDefaultProjects: '{}' is not a valid project name",
            project.name
        )));
    }
    if project.roles.is_empty() || project.roles.iter().any(|role| role.trim().is_empty()) {
        return Err(SystemInfoError::invalid(format!(
            "dexUserDefaultProjects: project '{}' needs at least one non-empty role",
            project.name
        )));
    }
    Ok(())
}

fn is_dns_label(name: &str) -> bool {
    let bytes = name.as_bytes();
    !bytes.is_empty()
        && bytes.len() <= 63
        && bytes.iter().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && bytes.first().is_some_and(u8::is_ascii_alphanumeric)
        && bytes.last().is_some_and(u8::is_ascii_alphanumeric)
}

//! Registry of the custom kinds the gateway's clients understand.

use crate::error::ClusterError;
use fxhash::FxHashMap;
use kube::core::{ApiResource, GroupVersionKind};

#[derive(Debug, Clone, Default)]
pub struct Scheme {
    kinds: FxHashMap<GroupVersionKind, ApiResource>,
}

impl Scheme {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `resource` under its group/version/kind.
    ///
    /// Registering an identical mapping again is a no-op.
    ///
    /// # Errors
    /// Returns [`ClusterError::Registration`] if the kind is already mapped to a different plural.
    pub fn register(&mut self, resource: ApiResource) -> Result<(), ClusterError> {
        let gvk = GroupVersionKind::gvk(&resource.group, &resource.version, &resource.kind);

        if let Some(existing) = self.kinds.get(&gvk) {
            if existing.plural == resource.plural {
                return Ok(());
            }
            return Err(ClusterError::Registration {
                message: format!(
                    "{}/{} {} is already registered as '{}', refusing '{}'",
                    gvk.group, gvk.version, gvk.kind, existing.plural, resource.plural
                )
                .into(),
                context: None,
            });
        }

        tracing::debug!(api_version = %resource.api_version, kind = %resource.kind, "Registered kind");
        self.kinds.insert(gvk, resource);
        Ok(())
    }

    #[must_use]
    pub fn resource(&self, gvk: &GroupVersionKind) -> Option<&ApiResource> {
        self.kinds.get(gvk)
    }

    #[must_use]
    pub fn contains(&self, gvk: &GroupVersionKind) -> bool {
        self.kinds.contains_key(gvk)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &GroupVersionKind> {
        self.kinds.keys()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

/// Workflow kinds served under `core.oam.dev/v1alpha1`.
pub mod workflow {
    use super::Scheme;
    use crate::error::ClusterError;
    use kube::core::{ApiResource, GroupVersionKind};

    pub const GROUP: &str = "core.oam.dev";
    pub const VERSION: &str = "v1alpha1";

    #[must_use]
    pub fn workflow() -> ApiResource {
        ApiResource::from_gvk_with_plural(&GroupVersionKind::gvk(GROUP, VERSION, "Workflow"), "workflows")
    }

    #[must_use]
    pub fn workflow_run() -> ApiResource {
        ApiResource::from_gvk_with_plural(
            &GroupVersionKind::gvk(GROUP, VERSION, "WorkflowRun"),
            "workflowruns",
        )
    }

    /// # Errors
    /// Fails if either kind is already registered with a different plural.
    pub fn add_to_scheme(scheme: &mut Scheme) -> Result<(), ClusterError> {
        scheme.register(workflow())?;
        scheme.register(workflow_run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_kinds_register_idempotently() {
        let mut scheme = Scheme::new();
        workflow::add_to_scheme(&mut scheme).expect("first registration");
        workflow::add_to_scheme(&mut scheme).expect("second registration");

        assert_eq!(scheme.len(), 2);
        let gvk = GroupVersionKind::gvk(workflow::GROUP, workflow::VERSION, "WorkflowRun");
        assert_eq!(scheme.resource(&gvk).map(|r| r.plural.as_str()), Some("workflowruns"));
    }

    #[test]
    fn conflicting_plural_is_rejected() {
        let mut scheme = Scheme::new();
        workflow::add_to_scheme(&mut scheme).expect("registration");

        let clash = ApiResource::from_gvk_with_plural(
            &GroupVersionKind::gvk(workflow::GROUP, workflow::VERSION, "Workflow"),
            "wfs",
        );
        let err = scheme.register(clash).expect_err("conflict");
        assert!(matches!(err, ClusterError::Registration { .. }));
        assert!(err.to_string().contains("wfs"));
    }
}

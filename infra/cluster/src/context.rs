//! Per-request identity and target cluster.
//!
//! The context lives in a Tokio task-local for the duration of one request and is
//! read whenever a client view is derived from the shared [`ApiClient`](crate::ApiClient).

use crate::error::ClusterError;
use std::future::Future;
use velaux_domain::constants::LOCAL_CLUSTER;
use velaux_domain::identity::Caller;

tokio::task_local! {
    static CURRENT: RequestContext;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    caller: Option<Caller>,
    cluster: Option<String>,
}

impl RequestContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Targets a managed cluster by name.
    ///
    /// # Errors
    /// Returns [`ClusterError::Validation`] if `cluster` is not a DNS-1123 label.
    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Result<Self, ClusterError> {
        let cluster = cluster.into();
        if !is_dns_label(&cluster) {
            return Err(ClusterError::validation(format!("invalid cluster name '{cluster}'")));
        }
        self.cluster = Some(cluster);
        Ok(self)
    }

    #[must_use]
    pub const fn caller(&self) -> Option<&Caller> {
        self.caller.as_ref()
    }

    #[must_use]
    pub fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    /// `Some(name)` only for clusters other than the hub itself.
    #[must_use]
    pub fn remote_cluster(&self) -> Option<&str> {
        self.cluster().filter(|cluster| *cluster != LOCAL_CLUSTER)
    }

    /// Snapshot of the context installed for the current task, or an empty one.
    #[must_use]
    pub fn current() -> Self {
        CURRENT.try_with(Clone::clone).unwrap_or_default()
    }

    /// Runs `fut` with `self` as the current context.
    pub async fn scope<F: Future>(self, fut: F) -> F::Output {
        CURRENT.scope(self, fut).await
    }
}

/// Lowercase alphanumerics and `-`, at most 63 chars, alphanumeric at both ends.
pub(crate) fn is_dns_label(name: &str) -> bool {
    let bytes = name.as_bytes();
    !bytes.is_empty()
        && bytes.len() <= 63
        && bytes.iter().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        && bytes.first().is_some_and(u8::is_ascii_alphanumeric)
        && bytes.last().is_some_and(u8::is_ascii_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_cluster_names() {
        assert!(RequestContext::new().with_cluster("prod-eu-1").is_ok());
        assert!(RequestContext::new().with_cluster("Prod").is_err());
        assert!(RequestContext::new().with_cluster("-edge").is_err());
        assert!(RequestContext::new().with_cluster("").is_err());
        assert!(RequestContext::new().with_cluster("a".repeat(64)).is_err());
    }

    #[test]
    fn local_cluster_is_not_remote() {
        let local = RequestContext::new().with_cluster(LOCAL_CLUSTER).expect("valid");
        assert_eq!(local.cluster(), Some(LOCAL_CLUSTER));
        assert_eq!(local.remote_cluster(), None);

        let remote = RequestContext::new().with_cluster("edge").expect("valid");
        assert_eq!(remote.remote_cluster(), Some("edge"));
    }

    #[tokio::test]
    async fn current_is_visible_only_inside_scope() {
        assert_eq!(RequestContext::current(), RequestContext::default());

        let ctx = RequestContext::new().with_caller(Caller::new("alice"));
        let seen = ctx.clone().scope(async { RequestContext::current() }).await;
        assert_eq!(seen, ctx);

        assert!(RequestContext::current().caller().is_none());
    }
}

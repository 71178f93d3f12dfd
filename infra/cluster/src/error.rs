use crate::discovery::PackageDiscovery;
use std::borrow::Cow;

#[velaux_derive::velaux_error]
pub enum ClusterError {
    #[error("Cluster gateway not initialized{}: {message}", format_context(.context))]
    NotInitialized { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Cluster configuration could not be resolved{}: {source}", format_context(.context))]
    ConfigResolution {
        source: kube::config::InferConfigError,
        context: Option<Cow<'static, str>>,
    },

    #[error("Kubeconfig error{}: {source}", format_context(.context))]
    Kubeconfig { source: kube::config::KubeconfigError, context: Option<Cow<'static, str>> },

    #[error("Scheme registration error{}: {message}", format_context(.context))]
    Registration { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Kubernetes client error{}: {source}", format_context(.context))]
    Kube { source: kube::Error, context: Option<Cow<'static, str>> },

    /// Recoverable: the handle is usable, some package schemas are missing.
    #[error("Package schema parse error{}: {message}", format_context(.context))]
    SchemaParse {
        message: Cow<'static, str>,
        partial: Box<PackageDiscovery>,
        context: Option<Cow<'static, str>>,
    },

    #[error("Validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal cluster error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl ClusterError {
    pub(crate) fn not_initialized() -> Self {
        Self::NotInitialized {
            message: "transport configuration has not been installed".into(),
            context: None,
        }
    }

    pub(crate) fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }

    /// Startup-ordering and configuration failures that should stop the process.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized { .. }
                | Self::ConfigResolution { .. }
                | Self::Kubeconfig { .. }
                | Self::Registration { .. }
        )
    }
}

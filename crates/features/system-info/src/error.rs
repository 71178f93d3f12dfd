use std::borrow::Cow;
use velaux_cluster::ClusterError;

#[velaux_derive::velaux_error]
pub enum SystemInfoError {
    #[error("Invalid request body{}: {source}", format_context(.context))]
    Decode { source: serde_json::Error, context: Option<Cow<'static, str>> },

    #[error("Invalid XML request body{}: {source}", format_context(.context))]
    XmlDecode { source: quick_xml::DeError, context: Option<Cow<'static, str>> },

    #[error("Validation failed{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Cluster error{}: {source}", format_context(.context))]
    Cluster { source: ClusterError, context: Option<Cow<'static, str>> },

    #[error("Kubernetes request failed{}: {source}", format_context(.context))]
    Kube { source: kube::Error, context: Option<Cow<'static, str>> },

    #[error("Internal feature error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl SystemInfoError {
    pub(crate) fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation { message: message.into(), context: None }
    }
}

#[cfg(feature = "server")]
impl From<SystemInfoError> for velaux_kernel::server::ApiError {
    fn from(err: SystemInfoError) -> Self {
        use velaux_kernel::server::BusinessCode;

        let code = match &err {
            SystemInfoError::Decode { .. } | SystemInfoError::XmlDecode { .. } => {
                BusinessCode::INVALID_BODY
            },
            SystemInfoError::Validation { .. } => BusinessCode::INVALID_FIELD,
            SystemInfoError::Cluster { .. } | SystemInfoError::Kube { .. } => {
                BusinessCode::CLUSTER_UNAVAILABLE
            },
            SystemInfoError::Internal { .. } => BusinessCode::BAD_REQUEST,
        };
        Self::bad_request(code, err.to_string())
    }
}

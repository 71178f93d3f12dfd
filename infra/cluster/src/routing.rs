//! Sends requests for managed clusters through the cluster-gateway proxy.

use crate::context::is_dns_label;
use crate::error::ClusterError;
use http::uri::{PathAndQuery, Uri};
use http::Request;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tower::{BoxError, Layer, Service};
use velaux_domain::constants::LOCAL_CLUSTER;

pub const CLUSTER_GATEWAY_PATH: &str = "/apis/cluster.core.oam.dev/v1alpha1/clustergateways";

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

#[derive(Debug, Clone, Default)]
pub struct ClusterRoutingLayer {
    prefix: Option<String>,
}

impl ClusterRoutingLayer {
    /// `None` and the `local` cluster leave requests untouched.
    ///
    /// # Errors
    /// Returns [`ClusterError::Validation`] if `cluster` is not a DNS-1123 label.
    pub fn new(cluster: Option<&str>) -> Result<Self, ClusterError> {
        let Some(cluster) = cluster.filter(|c| *c != LOCAL_CLUSTER) else {
            return Ok(Self::default());
        };
        if !is_dns_label(cluster) {
            return Err(ClusterError::validation(format!("invalid cluster name '{cluster}'")));
        }
        Ok(Self { prefix: Some(format!("{CLUSTER_GATEWAY_PATH}/{cluster}/proxy")) })
    }
}

impl<S> Layer<S> for ClusterRoutingLayer {
    type Service = ClusterRouting<S>;

    fn layer(&self, inner: S) -> Self::Service {
        ClusterRouting { inner, prefix: self.prefix.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct ClusterRouting<S> {
    inner: S,
    prefix: Option<String>,
}

impl<S, B> Service<Request<B>> for ClusterRouting<S>
where
    S: Service<Request<B>>,
    S::Future: Send + 'static,
    S::Error: Into<BoxError>,
{
    type Response = S::Response;
    type Error = BoxError;
    type Future = BoxFuture<Result<S::Response, BoxError>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        if let Some(prefix) = &self.prefix {
            match proxied(prefix, req.uri()) {
                Ok(uri) => *req.uri_mut() = uri,
                Err(err) => return Box::pin(async move { Err(err) }),
            }
        }

        let fut = self.inner.call(req);
        Box::pin(async move { fut.await.map_err(Into::into) })
    }
}

fn proxied(prefix: &str, uri: &Uri) -> Result<Uri, BoxError> {
    let path = uri.path_and_query().map_or("/", PathAndQuery::as_str);
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(PathAndQuery::try_from(format!("{prefix}{path}"))?);
    Ok(Uri::from_parts(parts)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use tower::ServiceExt;

    async fn route(cluster: Option<&str>, uri: &str) -> String {
        let layer = ClusterRoutingLayer::new(cluster).expect("valid cluster");
        let svc = layer.layer(tower::service_fn(|req: Request<()>| async move {
            Ok::<_, Infallible>(req.uri().to_string())
        }));
        let req = Request::builder().uri(uri).body(()).expect("request");
        svc.oneshot(req).await.expect("routed")
    }

    #[tokio::test]
    async fn remote_clusters_go_through_the_proxy() {
        let uri = route(Some("edge-1"), "/api/v1/namespaces/default/configmaps?limit=5").await;
        assert_eq!(
            uri,
            "/apis/cluster.core.oam.dev/v1alpha1/clustergateways/edge-1/proxy/api/v1/namespaces/default/configmaps?limit=5"
        );
    }

    #[tokio::test]
    async fn local_and_unset_clusters_are_untouched() {
        assert_eq!(route(None, "/api/v1/pods").await, "/api/v1/pods");
        assert_eq!(route(Some(LOCAL_CLUSTER), "/api/v1/pods").await, "/api/v1/pods");
    }

    #[test]
    fn rejects_invalid_cluster_names() {
        assert!(ClusterRoutingLayer::new(Some("../kube-system")).is_err());
    }
}

#![allow(dead_code, unreachable_pub)]

use async_trait::async_trait;
use http::{HeaderMap, Method, Request, Response};
use kube::client::Body;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use velaux_cluster::{
    ApiClient, ClusterConnector, ClusterError, DiscoveryClient, PackageDiscovery, PackageSource,
    Scheme, TransportConfig,
};

/// One request as seen on the wire.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
}

/// In-process stand-in for the API server: records requests, answers with a fixed body.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Recorder {
    pub fn client(&self, body: &Value) -> kube::Client {
        let requests = Arc::clone(&self.requests);
        let payload = serde_json::to_vec(body).expect("serializable body");

        let service = tower::service_fn(move |req: Request<Body>| {
            requests.lock().push(Recorded {
                method: req.method().clone(),
                uri: req.uri().to_string(),
                headers: req.headers().clone(),
            });
            let payload = payload.clone();
            async move {
                Ok::<_, Infallible>(
                    Response::builder()
                        .status(200)
                        .header("content-type", "application/json")
                        .body(Body::from(payload))
                        .expect("response"),
                )
            }
        });

        kube::Client::new(service, "default")
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().clone()
    }

    pub fn last(&self) -> Recorded {
        self.requests.lock().last().cloned().expect("at least one request")
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub enum PackageOutcome {
    #[default]
    Clean,
    ParseFailure,
    Unreachable,
}

/// Counts constructions and remembers what it was asked to build.
#[derive(Debug, Default)]
pub struct FakeConnector {
    pub recorder: Recorder,
    pub packages: PackageOutcome,
    build_delay: Option<Duration>,
    api_builds: AtomicUsize,
    discovery_builds: AtomicUsize,
    package_builds: AtomicUsize,
    last_scheme: Mutex<Option<Scheme>>,
    last_config: Mutex<Option<TransportConfig>>,
}

impl FakeConnector {
    pub fn with_packages(packages: PackageOutcome) -> Self {
        Self { packages, ..Self::default() }
    }

    /// Widens the race window for concurrent first callers.
    pub fn slow(delay: Duration) -> Self {
        Self { build_delay: Some(delay), ..Self::default() }
    }

    pub fn api_builds(&self) -> usize {
        self.api_builds.load(Ordering::SeqCst)
    }

    pub fn discovery_builds(&self) -> usize {
        self.discovery_builds.load(Ordering::SeqCst)
    }

    pub fn package_builds(&self) -> usize {
        self.package_builds.load(Ordering::SeqCst)
    }

    pub fn last_scheme(&self) -> Option<Scheme> {
        self.last_scheme.lock().clone()
    }

    pub fn last_config(&self) -> Option<TransportConfig> {
        self.last_config.lock().clone()
    }
}

#[async_trait]
impl ClusterConnector for FakeConnector {
    fn api_client(
        &self,
        config: &TransportConfig,
        scheme: &Scheme,
    ) -> Result<ApiClient, ClusterError> {
        if let Some(delay) = self.build_delay {
            std::thread::sleep(delay);
        }
        self.api_builds.fetch_add(1, Ordering::SeqCst);
        *self.last_scheme.lock() = Some(scheme.clone());
        *self.last_config.lock() = Some(config.clone());
        Ok(ApiClient::new(self.recorder.client(&json!({})), scheme.clone()))
    }

    fn discovery_client(&self, config: &TransportConfig) -> Result<DiscoveryClient, ClusterError> {
        self.discovery_builds.fetch_add(1, Ordering::SeqCst);
        *self.last_config.lock() = Some(config.clone());
        Ok(DiscoveryClient::new(ApiClient::new(
            self.recorder.client(&json!({})),
            Scheme::default(),
        )))
    }

    async fn package_discovery(
        &self,
        _config: &TransportConfig,
    ) -> Result<PackageDiscovery, ClusterError> {
        self.package_builds.fetch_add(1, Ordering::SeqCst);
        match self.packages {
            PackageOutcome::Clean => PackageDiscovery::from_sources([package("ext/ok", "{}")]),
            PackageOutcome::ParseFailure => PackageDiscovery::from_sources([
                package("ext/ok", "{}"),
                package("ext/broken", "{ unterminated"),
            ]),
            PackageOutcome::Unreachable => Err("control plane unreachable".into()),
        }
    }
}

fn package(path: &str, template: &str) -> PackageSource {
    PackageSource {
        name: path.replace('/', "-"),
        path: path.to_owned(),
        templates: BTreeMap::from([("main.json".to_owned(), template.to_owned())]),
    }
}

pub fn kube_config() -> kube::Config {
    kube::Config::new("https://127.0.0.1:6443".parse().expect("valid uri"))
}

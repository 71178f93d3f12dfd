#![allow(dead_code, unreachable_pub)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request};
use axum::middleware::from_fn;
use kube::client::Body as KubeBody;
use parking_lot::Mutex;
use serde_json::{Value, json};
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use velaux_cluster::{ApiClient, ClusterGateway, Scheme};
use velaux_iam::{PermissionGuard, RuleChecker, authenticate};
use velaux_kernel::domain::config::RbacRule;
use velaux_system_info::{
    ProjectRef, SystemInfo, SystemInfoError, SystemInfoInner, SystemInfoRecord, SystemInfoRequest,
    SystemInfoResponse, SystemInfoService, SystemVersion, UPDATE_PERMISSION,
};

pub const ADMIN: &str = "velaux:admins";

pub fn record() -> SystemInfoRecord {
    SystemInfoRecord {
        platform_id: "p7Xk2mQ9aRtZ".to_owned(),
        install_time: "2026-01-02T03:04:05+00:00".to_owned(),
        vela_address: "https://vela.internal:8000".to_owned(),
        dex_user_default_projects: vec![ProjectRef {
            name: "default".to_owned(),
            roles: vec!["app-developer".to_owned(), "project-viewer".to_owned()],
        }],
        ..SystemInfoRecord::default()
    }
}

/// In-memory backend counting how often it is reached.
#[derive(Debug)]
pub struct MemoryService {
    record: Mutex<SystemInfoRecord>,
    gets: AtomicUsize,
    updates: AtomicUsize,
}

impl MemoryService {
    pub fn new(record: SystemInfoRecord) -> Arc<Self> {
        Arc::new(Self { record: Mutex::new(record), gets: AtomicUsize::new(0), updates: AtomicUsize::new(0) })
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn updates(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> SystemInfoRecord {
        self.record.lock().clone()
    }
}

#[async_trait]
impl SystemInfoService for MemoryService {
    async fn get_system_info(&self) -> Result<SystemInfoResponse, SystemInfoError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(SystemInfoResponse { info: self.current(), system_version: SystemVersion::current() })
    }

    async fn update_system_info(
        &self,
        request: SystemInfoRequest,
    ) -> Result<SystemInfoResponse, SystemInfoError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.record.lock().apply(request);
        Ok(SystemInfoResponse { info: self.current(), system_version: SystemVersion::current() })
    }
}

/// Backend whose reads fail internally and whose writes hit an unavailable cluster.
#[derive(Debug, Default)]
pub struct FailingService {
    calls: AtomicUsize,
}

impl FailingService {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SystemInfoService for FailingService {
    async fn get_system_info(&self) -> Result<SystemInfoResponse, SystemInfoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SystemInfoError::from("boom"))
    }

    async fn update_system_info(
        &self,
        _request: SystemInfoRequest,
    ) -> Result<SystemInfoResponse, SystemInfoError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(SystemInfoError::from(kube::Error::Api(kube::core::ErrorResponse {
            status: "Failure".to_owned(),
            message: "etcd unavailable".to_owned(),
            reason: "ServiceUnavailable".to_owned(),
            code: 503,
        })))
    }
}

/// The system info routes behind authentication, with admins allowed to update.
pub fn app(service: Arc<dyn SystemInfoService>) -> Router {
    let rules = vec![RbacRule {
        subjects: vec![format!("group:{ADMIN}")],
        resources: vec!["*".to_owned()],
        actions: vec!["*".to_owned()],
    }];
    let checker = RuleChecker::new(rules).expect("valid rules");
    let guard = PermissionGuard::new(Arc::new(checker), UPDATE_PERMISSION);
    let slice = SystemInfo::new(SystemInfoInner { service });

    let (router, _) = velaux_system_info::router::<()>(slice, guard).split_for_parts();
    router.layer(from_fn(authenticate))
}

pub fn request(method: Method, user: Option<(&str, &str)>, body: Body) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri("/api/v1/system_info/");
    if let Some((name, group)) = user {
        builder = builder.header("x-remote-user", name).header("x-remote-group", group);
    }
    builder.body(body).expect("request")
}

pub async fn text_body(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}

pub async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// One request as seen by [`FakeApiServer`].
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: Method,
    pub path: String,
    pub impersonated: Option<String>,
}

#[derive(Debug, Default)]
struct Store {
    object: Option<Value>,
    revision: u64,
    seen: Vec<Seen>,
}

impl Store {
    fn handle(&mut self, method: &Method, body: &[u8]) -> (u16, Value) {
        match *method {
            Method::GET => self.object.clone().map_or_else(|| status(404, "NotFound"), |o| (200, o)),
            Method::POST if self.object.is_some() => status(409, "AlreadyExists"),
            Method::POST => self.store(body),
            Method::PUT => {
                let incoming: Value = serde_json::from_slice(body).expect("json");
                let current = self.revision.to_string();
                if incoming["metadata"]["resourceVersion"].as_str() == Some(current.as_str()) {
                    self.store(body)
                } else {
                    status(409, "Conflict")
                }
            },
            _ => status(405, "MethodNotAllowed"),
        }
    }

    fn store(&mut self, body: &[u8]) -> (u16, Value) {
        let mut object: Value = serde_json::from_slice(body).expect("json");
        self.revision += 1;
        object["metadata"]["resourceVersion"] = json!(self.revision.to_string());
        self.object = Some(object.clone());
        (200, object)
    }
}

fn status(code: u16, reason: &str) -> (u16, Value) {
    let body = json!({
        "kind": "Status",
        "apiVersion": "v1",
        "metadata": {},
        "status": "Failure",
        "message": reason,
        "reason": reason,
        "code": code,
    });
    (code, body)
}

/// Stand-in API server holding at most one `ConfigMap`.
#[derive(Debug, Clone, Default)]
pub struct FakeApiServer {
    store: Arc<Mutex<Store>>,
}

impl FakeApiServer {
    pub fn client(&self) -> kube::Client {
        let store = Arc::clone(&self.store);
        let service = tower::service_fn(move |req: Request<KubeBody>| {
            let store = Arc::clone(&store);
            async move {
                let (parts, body) = req.into_parts();
                let bytes = axum::body::to_bytes(Body::new(body), usize::MAX).await.expect("body");
                let (code, payload) = {
                    let mut store = store.lock();
                    store.seen.push(Seen {
                        method: parts.method.clone(),
                        path: parts.uri.path().to_owned(),
                        impersonated: parts
                            .headers
                            .get("impersonate-user")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_owned),
                    });
                    store.handle(&parts.method, &bytes)
                };

                Ok::<_, Infallible>(
                    axum::http::Response::builder()
                        .status(code)
                        .header("content-type", "application/json")
                        .body(KubeBody::from(serde_json::to_vec(&payload).expect("payload")))
                        .expect("response"),
                )
            }
        });

        kube::Client::new(service, "default")
    }

    /// Gateway whose cached client talks to this server.
    pub fn gateway(&self) -> ClusterGateway {
        let gateway = ClusterGateway::builder().build().expect("gateway");
        gateway.set_client(ApiClient::new(self.client(), Scheme::new()));
        gateway
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.store.lock().seen.clone()
    }

    pub fn object(&self) -> Option<Value> {
        self.store.lock().object.clone()
    }

    pub fn put(&self, object: Value) {
        let mut store = self.store.lock();
        store.revision += 1;
        let mut object = object;
        object["metadata"]["resourceVersion"] = json!(store.revision.to_string());
        store.object = Some(object);
    }
}

mod fixtures;

use axum::http::Method;
use fixtures::FakeApiServer;
use serde_json::json;
use velaux_cluster::RequestContext;
use velaux_kernel::domain::identity::Caller;
use velaux_system_info::{
    CONFIG_MAP_NAME, ConfigMapSystemInfoService, DATA_KEY, SystemInfoError, SystemInfoRecord,
    SystemInfoRequest, SystemInfoService,
};

const NS: &str = "vela-system";

fn stored(server: &FakeApiServer) -> SystemInfoRecord {
    let object = server.object().expect("stored object");
    let payload = object["data"][DATA_KEY].as_str().expect("data key");
    serde_json::from_str(payload).expect("record")
}

#[tokio::test]
async fn first_read_creates_the_record() {
    let server = FakeApiServer::default();
    let service = ConfigMapSystemInfoService::new(server.gateway(), NS);

    let first = service.get_system_info().await.expect("created");
    assert_eq!(first.info.platform_id.len(), 12);
    assert!(chrono::DateTime::parse_from_rfc3339(&first.info.install_time).is_ok());
    assert_eq!(first.info.login_type, "local");

    let object = server.object().expect("object");
    assert_eq!(object["metadata"]["name"], CONFIG_MAP_NAME);
    assert_eq!(object["metadata"]["namespace"], NS);

    let second = service.get_system_info().await.expect("read back");
    assert_eq!(second.info, first.info);

    let methods: Vec<_> = server.seen().into_iter().map(|s| s.method).collect();
    assert_eq!(methods, [Method::GET, Method::POST, Method::GET]);
}

#[tokio::test]
async fn update_keeps_identity_and_install_time() {
    let server = FakeApiServer::default();
    let service = ConfigMapSystemInfoService::new(server.gateway(), NS);
    let created = service.get_system_info().await.expect("created");

    let request = SystemInfoRequest {
        enable_collection: false,
        login_type: "dex".to_owned(),
        vela_address: Some("https://vela.example.com".to_owned()),
        dex_user_default_projects: Vec::new(),
    };
    let updated = service.update_system_info(request).await.expect("updated");

    assert_eq!(updated.info.platform_id, created.info.platform_id);
    assert_eq!(updated.info.install_time, created.info.install_time);
    assert_eq!(updated.info.login_type, "dex");
    assert!(!updated.info.enable_collection);
    assert_eq!(stored(&server), updated.info);
}

#[tokio::test]
async fn calls_are_made_as_the_caller() {
    let server = FakeApiServer::default();
    let service = ConfigMapSystemInfoService::new(server.gateway(), NS);

    RequestContext::new()
        .with_caller(Caller::new("alice").with_groups(["velaux:admins"]))
        .scope(service.get_system_info())
        .await
        .expect("created");

    let seen = server.seen();
    assert!(!seen.is_empty());
    assert!(seen.iter().all(|s| s.impersonated.as_deref() == Some("alice")));
    assert!(seen.iter().all(|s| s.path.starts_with("/api/v1/namespaces/vela-system/configmaps")));
}

#[tokio::test]
async fn corrupt_record_is_reported() {
    let server = FakeApiServer::default();
    server.put(json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": { "name": CONFIG_MAP_NAME, "namespace": NS },
        "data": { "system-info": "not json" },
    }));
    let service = ConfigMapSystemInfoService::new(server.gateway(), NS);

    let err = service.get_system_info().await.expect_err("corrupt");
    assert!(matches!(err, SystemInfoError::Internal { .. }), "{err}");
}

#[tokio::test]
async fn missing_client_surfaces_as_cluster_error() {
    let gateway = velaux_cluster::ClusterGateway::builder().build().expect("gateway");
    let service = ConfigMapSystemInfoService::new(gateway, NS);

    let err = service.get_system_info().await.expect_err("no cluster");
    assert!(matches!(err, SystemInfoError::Cluster { .. }), "{err}");
}

use velaux_domain::config::{ApiConfig, KubeConfig, RbacConfig, ServerConfig, SystemInfoConfig};
use serde_json::json;

#[test]
fn config_defaults_are_sane() {
    let server = ServerConfig::default();
    assert_eq!(server.port, 8000);
    assert!(server.ssl.is_none());

    let kube = KubeConfig::default();
    assert!((kube.qps - 100.0).abs() < f32::EPSILON);
    assert_eq!(kube.burst, 300);
    assert!(kube.kubeconfig.is_none());

    assert_eq!(SystemInfoConfig::default().namespace, "vela-system");

    let rbac = RbacConfig::default();
    assert_eq!(rbac.rules.len(), 1);
    assert_eq!(rbac.rules[0].resources, vec!["*".to_owned()]);
}

#[test]
fn api_config_deserializes_partial_sections() {
    let raw = json!({
        "server": { "address": "::", "port": 8080 },
        "kube": { "qps": 50.0, "burst": 75, "context": "staging" },
        "system_info": { "namespace": "velaux" }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.server.port, 8080);
    assert_eq!(cfg.kube.burst, 75);
    assert_eq!(cfg.kube.context.as_deref(), Some("staging"));
    assert_eq!(cfg.system_info.namespace, "velaux");
    assert_eq!(cfg.logging.level, "info");
}

#[test]
fn rbac_rules_replace_defaults() {
    let raw = json!({
        "security": { "rbac": { "rules": [
            { "subjects": ["user:alice"], "resources": ["systemSetting"], "actions": ["update"] }
        ] } }
    });

    let cfg: ApiConfig = serde_json::from_value(raw).expect("config deserialize");
    assert_eq!(cfg.security.rbac.rules.len(), 1);
    assert_eq!(cfg.security.rbac.rules[0].subjects, vec!["user:alice".to_owned()]);
}

#[test]
fn config_is_cheap_to_clone_and_copy_on_write() {
    let original = ApiConfig::default();
    let mut modified = original.clone();
    modified.kube.burst = 1;

    assert_eq!(original.kube.burst, 300);
    assert_eq!(modified.kube.burst, 1);
}

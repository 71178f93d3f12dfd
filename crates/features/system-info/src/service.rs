use crate::dto::{SystemInfoRecord, SystemInfoRequest, SystemInfoResponse, SystemVersion};
use crate::error::{SystemInfoError, SystemInfoErrorExt};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::{Api, ObjectMeta, PostParams};
use std::collections::BTreeMap;
use tracing::{debug, info};
use velaux_cluster::ClusterGateway;

/// Name of the `ConfigMap` holding the record.
pub const CONFIG_MAP_NAME: &str = "velaux-system-info";
/// Data key the record is stored under, as JSON.
pub const DATA_KEY: &str = "system-info";

/// Reads and updates the platform settings.
#[async_trait]
pub trait SystemInfoService: Send + Sync + std::fmt::Debug {
    /// Returns the record, creating it on first access.
    async fn get_system_info(&self) -> Result<SystemInfoResponse, SystemInfoError>;

    /// Applies a validated request and returns the stored result.
    async fn update_system_info(
        &self,
        request: SystemInfoRequest,
    ) -> Result<SystemInfoResponse, SystemInfoError>;
}

/// Keeps the record in a `ConfigMap` on the hub cluster.
///
/// All calls go through the gateway's client for the current request, so
/// they are made as the authenticated caller.
#[derive(Debug, Clone)]
pub struct ConfigMapSystemInfoService {
    gateway: ClusterGateway,
    namespace: String,
}

impl ConfigMapSystemInfoService {
    pub fn new(gateway: ClusterGateway, namespace: impl Into<String>) -> Self {
        Self { gateway, namespace: namespace.into() }
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn api(&self) -> Result<Api<ConfigMap>, SystemInfoError> {
        let client = self.gateway.client().context("resolving the cluster client")?;
        let kube = client.kube().context("deriving the request client")?;
        Ok(Api::namespaced(kube, &self.namespace))
    }

    /// Loads the stored object, creating a fresh record when there is none.
    async fn load(&self, api: &Api<ConfigMap>) -> Result<(ConfigMap, SystemInfoRecord), SystemInfoError> {
        if let Some(object) = api.get_opt(CONFIG_MAP_NAME).await.context("reading the record")? {
            let record = decode(&object)?;
            return Ok((object, record));
        }

        let record = SystemInfoRecord {
            platform_id: velaux_kernel::safe_nanoid!(),
            install_time: chrono::Utc::now().to_rfc3339(),
            ..SystemInfoRecord::default()
        };

        match api.create(&PostParams::default(), &self.encode(ObjectMeta::default(), &record)?).await {
            Ok(object) => {
                info!(namespace = %self.namespace, platform_id = %record.platform_id, "System info record created");
                Ok((object, record))
            },
            // Lost the race with a concurrent first access; use the winner's record.
            Err(kube::Error::Api(response)) if response.code == 409 => {
                let object = api.get(CONFIG_MAP_NAME).await.context("re-reading the record")?;
                let record = decode(&object)?;
                Ok((object, record))
            },
            Err(source) => {
                Err(SystemInfoError::Kube { source, context: Some("creating the record".into()) })
            },
        }
    }

    fn encode(&self, metadata: ObjectMeta, record: &SystemInfoRecord) -> Result<ConfigMap, SystemInfoError> {
        let payload = serde_json::to_string(record).map_err(|err| stored(&err))?;
        Ok(ConfigMap {
            metadata: ObjectMeta {
                name: Some(CONFIG_MAP_NAME.to_owned()),
                namespace: Some(self.namespace.clone()),
                ..metadata
            },
            data: Some(BTreeMap::from([(DATA_KEY.to_owned(), payload)])),
            ..ConfigMap::default()
        })
    }
}

fn decode(object: &ConfigMap) -> Result<SystemInfoRecord, SystemInfoError> {
    let Some(payload) = object.data.as_ref().and_then(|data| data.get(DATA_KEY)) else {
        return Err(SystemInfoError::Internal {
            message: format!("ConfigMap {CONFIG_MAP_NAME} has no '{DATA_KEY}' key").into(),
            context: None,
        });
    };
    serde_json::from_str(payload).map_err(|err| stored(&err))
}

/// Codec failure on the persisted record.
fn stored(err: &serde_json::Error) -> SystemInfoError {
    SystemInfoError::Internal { message: format!("stored record: {err}").into(), context: None }
}

fn respond(info: SystemInfoRecord) -> SystemInfoResponse {
    SystemInfoResponse { info, system_version: SystemVersion::current() }
}

#[async_trait]
impl SystemInfoService for ConfigMapSystemInfoService {
    async fn get_system_info(&self) -> Result<SystemInfoResponse, SystemInfoError> {
        let api = self.api()?;
        let (_, record) = self.load(&api).await?;
        Ok(respond(record))
    }

    async fn update_system_info(
        &self,
        request: SystemInfoRequest,
    ) -> Result<SystemInfoResponse, SystemInfoError> {
        let api = self.api()?;
        let (object, mut record) = self.load(&api).await?;
        record.apply(request);

        // The stored resourceVersion makes a concurrent writer fail with a conflict.
        let updated = self.encode(object.metadata, &record)?;
        api.replace(CONFIG_MAP_NAME, &PostParams::default(), &updated)
            .await
            .context("writing the record")?;

        debug!(login_type = %record.login_type, "System info updated");
        Ok(respond(record))
    }
}

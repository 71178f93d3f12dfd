//! Server API discovery and `Package` schema discovery.

use crate::client::ApiClient;
use crate::error::{ClusterError, ClusterErrorExt};
use kube::api::ListParams;
use kube::core::{ApiResource, DynamicObject, GroupVersionKind};
use kube::{Api, ResourceExt};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

pub const PACKAGE_GROUP: &str = "cue.oam.dev";
pub const PACKAGE_VERSION: &str = "v1alpha1";

#[must_use]
pub fn package_resource() -> ApiResource {
    ApiResource::from_gvk_with_plural(
        &GroupVersionKind::gvk(PACKAGE_GROUP, PACKAGE_VERSION, "Package"),
        "packages",
    )
}

/// An API group as advertised by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerGroup {
    pub name: String,
    pub versions: Vec<String>,
    pub preferred_version: Option<String>,
}

/// Enumerates the groups, versions and resources the control plane serves.
#[derive(Clone)]
pub struct DiscoveryClient {
    client: ApiClient,
}

impl DiscoveryClient {
    #[must_use]
    pub const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// # Errors
    /// Returns [`ClusterError::Kube`] if discovery fails.
    pub async fn server_groups(&self) -> Result<Vec<ServerGroup>, ClusterError> {
        let discovery =
            kube::Discovery::new(self.client.kube()?).run().await.context("discovering API groups")?;

        Ok(discovery
            .groups()
            .map(|group| ServerGroup {
                name: group.name().to_owned(),
                versions: group.versions().map(ToOwned::to_owned).collect(),
                preferred_version: group.preferred_version().map(ToOwned::to_owned),
            })
            .collect())
    }

    /// Recommended resources of `group`; `""` is the core group.
    ///
    /// # Errors
    /// Returns [`ClusterError::Kube`] if the group is unknown or unreachable.
    pub async fn group_resources(&self, group: &str) -> Result<Vec<ApiResource>, ClusterError> {
        let client = self.client.kube()?;
        let group = kube::discovery::group(&client, group)
            .await
            .context(format!("discovering group '{group}'"))?;

        Ok(group.recommended_resources().into_iter().map(|(resource, _)| resource).collect())
    }
}

impl fmt::Debug for DiscoveryClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscoveryClient").field("client", &self.client).finish()
    }
}

/// Raw `Package` content before its templates are parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSource {
    pub name: String,
    pub path: String,
    pub templates: BTreeMap<String, String>,
}

/// Parsed declarative schemas of one package.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageSchema {
    pub name: String,
    pub path: String,
    pub templates: BTreeMap<String, Map<String, Value>>,
}

/// A template (or whole package) that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaFailure {
    pub package: String,
    pub template: Option<String>,
    pub reason: String,
}

/// Schema definitions published as `Package` objects, keyed by package path.
///
/// Only JSON-encoded templates are understood: each template must be a JSON
/// object. Templates in any other encoding, CUE source included, are recorded
/// as [`SchemaFailure`]s rather than compiled.
///
/// A handle can be degraded: packages that failed to parse are listed in
/// [`PackageDiscovery::failures`] and simply absent from the lookup.
#[derive(Clone, Default)]
pub struct PackageDiscovery {
    client: Option<ApiClient>,
    packages: BTreeMap<String, PackageSchema>,
    failures: Vec<SchemaFailure>,
}

impl PackageDiscovery {
    /// Lists and parses every `Package`. A cluster without the CRD yields an empty set.
    ///
    /// # Errors
    /// * [`ClusterError::SchemaParse`] if some templates are malformed. The error
    ///   carries the usable partial handle.
    /// * [`ClusterError::Kube`] for any other failure.
    pub async fn load(client: ApiClient) -> Result<Self, ClusterError> {
        let api: Api<DynamicObject> = Api::all_with(client.kube()?, &package_resource());

        let objects = match api.list(&ListParams::default()).await {
            Ok(list) => list.items,
            Err(kube::Error::Api(status)) if status.code == 404 => {
                debug!("Package kind is not served, continuing without packages");
                Vec::new()
            },
            Err(err) => return Err(err).context("listing packages"),
        };

        let mut sources = Vec::with_capacity(objects.len());
        let mut failures = Vec::new();
        for object in &objects {
            match package_source(object) {
                Ok(source) => sources.push(source),
                Err(failure) => failures.push(failure),
            }
        }

        Self::assemble(Some(client), sources, failures)
    }

    /// Builds a handle from already fetched sources.
    ///
    /// # Errors
    /// Returns [`ClusterError::SchemaParse`] if any template is malformed.
    pub fn from_sources(
        sources: impl IntoIterator<Item = PackageSource>,
    ) -> Result<Self, ClusterError> {
        Self::assemble(None, sources, Vec::new())
    }

    fn assemble(
        client: Option<ApiClient>,
        sources: impl IntoIterator<Item = PackageSource>,
        mut failures: Vec<SchemaFailure>,
    ) -> Result<Self, ClusterError> {
        let mut packages = BTreeMap::new();

        for source in sources {
            let mut templates = BTreeMap::new();
            for (file, raw) in source.templates {
                match serde_json::from_str::<Value>(&raw) {
                    Ok(Value::Object(schema)) => {
                        templates.insert(file, schema);
                    },
                    Ok(_) => failures.push(SchemaFailure {
                        package: source.name.clone(),
                        template: Some(file),
                        reason: "template is not an object".to_owned(),
                    }),
                    Err(err) => failures.push(SchemaFailure {
                        package: source.name.clone(),
                        template: Some(file),
                        reason: err.to_string(),
                    }),
                }
            }
            packages.insert(
                source.path.clone(),
                PackageSchema { name: source.name, path: source.path, templates },
            );
        }

        let discovery = Self { client, packages, failures };
        if discovery.failures.is_empty() {
            return Ok(discovery);
        }

        Err(ClusterError::SchemaParse {
            message: format!("{} package template(s) could not be parsed", discovery.failures.len())
                .into(),
            partial: Box::new(discovery),
            context: None,
        })
    }

    pub fn packages(&self) -> impl Iterator<Item = &PackageSchema> {
        self.packages.values()
    }

    #[must_use]
    pub fn package(&self, path: &str) -> Option<&PackageSchema> {
        self.packages.get(path)
    }

    #[must_use]
    pub fn failures(&self) -> &[SchemaFailure] {
        &self.failures
    }

    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.failures.is_empty()
    }

    #[must_use]
    pub const fn client(&self) -> Option<&ApiClient> {
        self.client.as_ref()
    }
}

impl fmt::Debug for PackageDiscovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageDiscovery")
            .field("packages", &self.packages.keys().collect::<Vec<_>>())
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}

fn package_source(object: &DynamicObject) -> Result<PackageSource, SchemaFailure> {
    let name = object.name_any();
    let spec = object.data.get("spec");

    let Some(path) = spec.and_then(|s| s.get("path")).and_then(Value::as_str) else {
        return Err(SchemaFailure {
            package: name,
            template: None,
            reason: "spec.path is missing".to_owned(),
        });
    };

    let templates = spec
        .and_then(|s| s.get("templates"))
        .and_then(Value::as_object)
        .map(|templates| {
            templates
                .iter()
                .map(|(file, body)| {
                    let raw = body.as_str().map_or_else(|| body.to_string(), ToOwned::to_owned);
                    (file.clone(), raw)
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(PackageSource { name, path: path.to_owned(), templates })
}

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::Resource;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// The `items` of a `kubectl get ... --output json` list, kinds mixed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawResourceList {
    #[serde(default)]
    pub items: Vec<Value>,
}

impl RawResourceList {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_items(items: Vec<Value>) -> Self {
        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items tagged with `K`'s kind, decoded into the typed API object.
    ///
    /// Only the kind tag selects items. Older group versions (`batch/v1beta1`
    /// cronjobs, `extensions/v1beta1` deployments) are read with `K`'s schema.
    pub fn decode_kind<K>(&self) -> impl Iterator<Item = Result<K, serde_json::Error>> + '_
    where
        K: Resource + DeserializeOwned,
    {
        self.items
            .iter()
            .filter(|item| item.get("kind").and_then(|k| k.as_str()) == Some(K::KIND))
            .map(|item| K::deserialize(with_api_version::<K>(item)))
    }
}

fn with_api_version<K: Resource>(item: &Value) -> Value {
    let mut item = item.clone();
    if let Some(object) = item.as_object_mut() {
        let served = object.get("apiVersion").and_then(|v| v.as_str());
        if served != Some(K::API_VERSION) {
            debug!("reading {} {:?} as {}", K::KIND, served, K::API_VERSION);
            object.insert("apiVersion".to_string(), Value::String(K::API_VERSION.to_string()));
        }
    }
    item
}

/// Why a resource was left out of its summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    Malformed(String),
    MissingName,
    MissingStatus,
    /// A required counter is absent or still zero
    NotReported(&'static str),
    OwnedByDeployment,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::Malformed(e) => write!(f, "malformed: {}", e),
            Exclusion::MissingName => f.write_str("no metadata.name"),
            Exclusion::MissingStatus => f.write_str("no status"),
            Exclusion::NotReported(field) => write!(f, "status.{} not reported yet", field),
            Exclusion::OwnedByDeployment => f.write_str("managed by a deployment"),
        }
    }
}

/// Outcome of validating one resource: its summary entry or the reason to skip it
pub type Inclusion<T> = Result<(String, T), Exclusion>;

/// Decode every item of kind `K`, validate it, and keep the included ones by name
pub fn summarize<K, T, F>(raw: &RawResourceList, validate: F) -> BTreeMap<String, T>
where
    K: Resource + DeserializeOwned,
    F: Fn(&K) -> Inclusion<T>,
{
    let mut summary = BTreeMap::new();
    for item in raw.decode_kind::<K>() {
        let decision = match item {
            Ok(resource) => validate(&resource),
            Err(e) => Err(Exclusion::Malformed(e.to_string())),
        };
        match decision {
            Ok((name, entry)) => {
                summary.insert(name, entry);
            }
            Err(reason) => debug!("skipping {}: {}", K::KIND, reason),
        }
    }
    summary
}

pub fn resource_name(metadata: &ObjectMeta) -> Result<String, Exclusion> {
    metadata
        .name
        .as_ref()
        .filter(|n| !n.is_empty())
        .cloned()
        .ok_or(Exclusion::MissingName)
}

/// A counter the control plane reported with a non-zero value
pub fn reported(value: Option<i32>) -> Option<i32> {
    value.filter(|v| *v != 0)
}

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::ItemIdError;

/// Separator between the parts of an item identifier, e.g. `kube-system / deployments / coredns`
pub const ITEM_SEPARATOR: &str = " / ";

/// Everything collected for one namespace in one collection cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamespaceRecord {
    pub name: String,
    pub pods: BTreeMap<String, PodSummary>,
    pub persistent_volumes: BTreeMap<String, PersistentVolumeSummary>,
    pub deployments: BTreeMap<String, DeploymentSummary>,
    pub daemonsets: BTreeMap<String, DaemonsetSummary>,
    pub replicasets: BTreeMap<String, ReplicasetSummary>,
    pub cronjobs: BTreeMap<String, CronjobSummary>,
}

impl NamespaceRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Names of the resources of one kind, in key order
    pub fn resource_names(&self, kind: ResourceKind) -> Vec<&str> {
        fn keys<V>(map: &BTreeMap<String, V>) -> Vec<&str> {
            map.keys().map(|k| k.as_str()).collect()
        }
        match kind {
            ResourceKind::Pods => keys(&self.pods),
            ResourceKind::PersistentVolumes => keys(&self.persistent_volumes),
            ResourceKind::Deployments => keys(&self.deployments),
            ResourceKind::Daemonsets => keys(&self.daemonsets),
            ResourceKind::Replicasets => keys(&self.replicasets),
            ResourceKind::Cronjobs => keys(&self.cronjobs),
        }
    }

    pub fn has_resources(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Pods => !self.pods.is_empty(),
            ResourceKind::PersistentVolumes => !self.persistent_volumes.is_empty(),
            ResourceKind::Deployments => !self.deployments.is_empty(),
            ResourceKind::Daemonsets => !self.daemonsets.is_empty(),
            ResourceKind::Replicasets => !self.replicasets.is_empty(),
            ResourceKind::Cronjobs => !self.cronjobs.is_empty(),
        }
    }

    /// Monitored items this record would yield under full discovery
    pub fn inventory(&self) -> Vec<ItemId> {
        let mut items = Vec::new();
        for kind in ResourceKind::ALL {
            if kind.is_namespace_wide() {
                if self.has_resources(kind) {
                    items.push(ItemId::namespace_wide(&self.name, kind));
                }
            } else {
                for name in self.resource_names(kind) {
                    items.push(ItemId::named(&self.name, kind, name));
                }
            }
        }
        items
    }
}

/// Container names of one pod, bucketed by their reported state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodSummary {
    pub containers: ContainerStates,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerStates {
    pub crashing: Vec<String>,
    pub running: Vec<String>,
    pub waiting: Vec<String>,
    pub terminated: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentSummary {
    pub replicas: i32,
    pub ready_replicas: i32,
    pub unavailable_replicas: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonsetSummary {
    pub current_number_scheduled: i32,
    pub desired_number_scheduled: i32,
    pub number_ready: i32,
    pub number_unavailable: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicasetSummary {
    pub replicas: i32,
    pub ready_replicas: i32,
    pub available_replicas: i32,
}

impl ReplicasetSummary {
    pub fn unavailable_replicas(&self) -> i32 {
        (self.replicas - self.available_replicas).max(0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CronjobSummary {
    pub active: usize,
}

/// Filesystem usage of one mounted persistent volume claim. Byte values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistentVolumeSummary {
    pub namespace: String,
    pub pvc: String,
    pub percentage: u64,
    pub capacity: u64,
    pub used: u64,
    pub available: u64,
}

/// Resource kinds as they appear in records, item identifiers and discovery rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Pods,
    PersistentVolumes,
    Deployments,
    Daemonsets,
    Replicasets,
    Cronjobs,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 6] = [
        ResourceKind::Pods,
        ResourceKind::PersistentVolumes,
        ResourceKind::Deployments,
        ResourceKind::Daemonsets,
        ResourceKind::Replicasets,
        ResourceKind::Cronjobs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Pods => "pods",
            ResourceKind::PersistentVolumes => "persistent_volumes",
            ResourceKind::Deployments => "deployments",
            ResourceKind::Daemonsets => "daemonsets",
            ResourceKind::Replicasets => "replicasets",
            ResourceKind::Cronjobs => "cronjobs",
        }
    }

    /// Pods are summed up per namespace instead of being monitored one by one
    pub fn is_namespace_wide(&self) -> bool {
        matches!(self, ResourceKind::Pods)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = ItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ItemIdError::UnknownKind(s.to_string()))
    }
}

/// Address of one monitored item: `namespace / kind[ / name]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemId {
    pub namespace: String,
    pub kind: ResourceKind,
    pub name: Option<String>,
}

impl ItemId {
    pub fn namespace_wide(namespace: &str, kind: ResourceKind) -> Self {
        Self {
            namespace: namespace.to_string(),
            kind,
            name: None,
        }
    }

    pub fn named(namespace: &str, kind: ResourceKind, name: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            kind,
            name: Some(name.to_string()),
        }
    }

    /// Service name shown by the monitoring server
    pub fn service_name(&self) -> String {
        format!("K8s {}", self)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.namespace, ITEM_SEPARATOR, self.kind)?;
        if let Some(name) = &self.name {
            write!(f, "{}{}", ITEM_SEPARATOR, name)?;
        }
        Ok(())
    }
}

impl FromStr for ItemId {
    type Err = ItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(ITEM_SEPARATOR).collect();
        match parts.as_slice() {
            [namespace, kind] if !namespace.is_empty() => {
                let kind: ResourceKind = kind.parse()?;
                if !kind.is_namespace_wide() {
                    return Err(ItemIdError::Malformed(s.to_string()));
                }
                Ok(ItemId::namespace_wide(namespace, kind))
            }
            [namespace, kind, name] if !namespace.is_empty() && !name.is_empty() => {
                let kind: ResourceKind = kind.parse()?;
                if kind.is_namespace_wide() {
                    return Err(ItemIdError::Malformed(s.to_string()));
                }
                Ok(ItemId::named(namespace, kind, name))
            }
            _ => Err(ItemIdError::Malformed(s.to_string())),
        }
    }
}

/// Which resource kinds to discover, for one namespace or, without a namespace, for all others
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cronjobs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daemonsets: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployments: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistent_volumes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pods: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicasets: Option<bool>,
}

impl DiscoveryRule {
    /// Namespace this rule is pinned to; `None` for default rules
    pub fn scope(&self) -> Option<&str> {
        self.namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    pub fn enables(&self, kind: ResourceKind) -> bool {
        let flag = match kind {
            ResourceKind::Pods => self.pods,
            ResourceKind::PersistentVolumes => self.persistent_volumes,
            ResourceKind::Deployments => self.deployments,
            ResourceKind::Daemonsets => self.daemonsets,
            ResourceKind::Replicasets => self.replicasets,
            ResourceKind::Cronjobs => self.cronjobs,
        };
        flag.unwrap_or(false)
    }
}

/// Check levels as configured on the monitoring server
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    #[serde(default = "default_pv_levels")]
    pub percentage_persistent_volumes: (f64, f64),
    #[serde(default = "default_cronjob_levels")]
    pub threshold_cronjob_count: (usize, usize),
}

fn default_pv_levels() -> (f64, f64) {
    (80.0, 90.0)
}

fn default_cronjob_levels() -> (usize, usize) {
    (2, 3)
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            percentage_persistent_volumes: default_pv_levels(),
            threshold_cronjob_count: default_cronjob_levels(),
        }
    }
}

impl Thresholds {
    pub fn pv_warning(&self) -> f64 {
        self.percentage_persistent_volumes.0
    }

    pub fn pv_critical(&self) -> f64 {
        self.percentage_persistent_volumes.1
    }

    pub fn cronjob_warning(&self) -> usize {
        self.threshold_cronjob_count.0
    }

    pub fn cronjob_critical(&self) -> usize {
        self.threshold_cronjob_count.1
    }
}

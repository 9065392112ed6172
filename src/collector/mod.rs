use tracing::{info, warn};

use crate::error::CollectorError;
use crate::kubernetes::ClusterQuery;
use crate::resources::{self, RawResourceList};
use crate::types::NamespaceRecord;

/// Builds one [`NamespaceRecord`] per namespace for a single collection cycle.
///
/// Nothing is kept between cycles; every call starts from empty summaries.
pub struct NamespaceCollector<'a, C: ClusterQuery + ?Sized> {
    client: &'a C,
}

impl<'a, C: ClusterQuery + ?Sized> NamespaceCollector<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Collect every namespace of the cluster, in the order the control plane lists them
    pub async fn collect(&self) -> Result<Vec<NamespaceRecord>, CollectorError> {
        let namespaces = self.client.list_namespaces().await?;
        info!("collecting {} namespaces", namespaces.len());

        let mut records = Vec::with_capacity(namespaces.len());
        for namespace in &namespaces {
            records.push(self.collect_namespace(namespace).await?);
        }
        Ok(records)
    }

    /// Query one namespace once and run all extractors over that single dump
    pub async fn collect_namespace(&self, namespace: &str) -> Result<NamespaceRecord, CollectorError> {
        let raw = match self.client.list_namespace_resources(namespace).await {
            Ok(raw) => raw,
            Err(CollectorError::InvalidJson { command, source }) => {
                warn!("treating namespace {} as empty, `kubectl {}` returned invalid JSON: {}", namespace, command, source);
                RawResourceList::default()
            }
            Err(e) => return Err(e),
        };
        Ok(assemble_record(self.client, namespace, &raw).await)
    }
}

/// Combine the six extractor outputs for one namespace dump
pub async fn assemble_record<C: ClusterQuery + ?Sized>(
    client: &C,
    namespace: &str,
    raw: &RawResourceList,
) -> NamespaceRecord {
    let record = NamespaceRecord {
        name: namespace.to_string(),
        pods: resources::extract_pods(raw),
        persistent_volumes: resources::collect_persistent_volumes(client, namespace, raw).await,
        deployments: resources::extract_deployments(raw),
        daemonsets: resources::extract_daemonsets(raw),
        replicasets: resources::extract_replicasets(raw),
        cronjobs: resources::extract_cronjobs(raw),
    };
    info!(
        "namespace {}: {} pods, {} volumes, {} deployments, {} daemonsets, {} replicasets, {} cronjobs",
        namespace,
        record.pods.len(),
        record.persistent_volumes.len(),
        record.deployments.len(),
        record.daemonsets.len(),
        record.replicasets.len(),
        record.cronjobs.len(),
    );
    record
}

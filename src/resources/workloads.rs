use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet};
use std::collections::BTreeMap;

use crate::resources::base::{reported, resource_name, summarize, Exclusion, Inclusion, RawResourceList};
use crate::types::{DaemonsetSummary, DeploymentSummary, ReplicasetSummary};

pub fn extract_deployments(raw: &RawResourceList) -> BTreeMap<String, DeploymentSummary> {
    summarize(raw, validate_deployment)
}

pub fn extract_daemonsets(raw: &RawResourceList) -> BTreeMap<String, DaemonsetSummary> {
    summarize(raw, validate_daemonset)
}

/// Replicasets that are not managed by a deployment
pub fn extract_replicasets(raw: &RawResourceList) -> BTreeMap<String, ReplicasetSummary> {
    summarize(raw, validate_replicaset)
}

// Workloads still being provisioned report no counters yet and are left out
// instead of showing up as zero.

fn validate_deployment(deployment: &Deployment) -> Inclusion<DeploymentSummary> {
    let name = resource_name(&deployment.metadata)?;
    let status = deployment.status.as_ref().ok_or(Exclusion::MissingStatus)?;
    let replicas = reported(status.replicas).ok_or(Exclusion::NotReported("replicas"))?;
    let ready = reported(status.ready_replicas);
    let unavailable = reported(status.unavailable_replicas);
    if ready.is_none() && unavailable.is_none() {
        return Err(Exclusion::NotReported("readyReplicas"));
    }
    Ok((
        name,
        DeploymentSummary {
            replicas,
            ready_replicas: ready.unwrap_or(0),
            unavailable_replicas: unavailable.unwrap_or(0),
        },
    ))
}

fn validate_daemonset(daemonset: &DaemonSet) -> Inclusion<DaemonsetSummary> {
    let name = resource_name(&daemonset.metadata)?;
    let status = daemonset.status.as_ref().ok_or(Exclusion::MissingStatus)?;
    let current = reported(Some(status.current_number_scheduled))
        .ok_or(Exclusion::NotReported("currentNumberScheduled"))?;
    let ready = reported(Some(status.number_ready));
    let unavailable = reported(status.number_unavailable);
    if ready.is_none() && unavailable.is_none() {
        return Err(Exclusion::NotReported("numberReady"));
    }
    Ok((
        name,
        DaemonsetSummary {
            current_number_scheduled: current,
            desired_number_scheduled: status.desired_number_scheduled,
            number_ready: ready.unwrap_or(0),
            number_unavailable: unavailable.unwrap_or(0),
        },
    ))
}

fn validate_replicaset(replicaset: &ReplicaSet) -> Inclusion<ReplicasetSummary> {
    if owned_by_deployment(replicaset) {
        return Err(Exclusion::OwnedByDeployment);
    }
    let name = resource_name(&replicaset.metadata)?;
    let status = replicaset.status.as_ref().ok_or(Exclusion::MissingStatus)?;
    let replicas = reported(Some(status.replicas)).ok_or(Exclusion::NotReported("replicas"))?;
    let ready = reported(status.ready_replicas);
    let available = reported(status.available_replicas);
    if ready.is_none() && available.is_none() {
        return Err(Exclusion::NotReported("readyReplicas"));
    }
    Ok((
        name,
        ReplicasetSummary {
            replicas,
            ready_replicas: ready.unwrap_or(0),
            available_replicas: available.unwrap_or(0),
        },
    ))
}

/// Only the first owner reference counts
fn owned_by_deployment(replicaset: &ReplicaSet) -> bool {
    replicaset
        .metadata
        .owner_references
        .as_ref()
        .and_then(|refs| refs.first())
        .map(|owner| owner.kind == "Deployment")
        .unwrap_or(false)
}

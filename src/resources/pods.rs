use k8s_openapi::api::core::v1::{ContainerStatus, Pod};
use std::collections::BTreeMap;

use crate::resources::base::{resource_name, summarize, Inclusion, RawResourceList};
use crate::types::{ContainerStates, PodSummary};

/// Waiting reason of a container stuck in a crash/restart cycle
pub const CRASH_LOOP_REASON: &str = "CrashLoopBackOff";

/// Container state buckets for every named pod in the namespace
pub fn extract_pods(raw: &RawResourceList) -> BTreeMap<String, PodSummary> {
    summarize(raw, validate_pod)
}

/// A pod only needs a name; without status it gets empty buckets
fn validate_pod(pod: &Pod) -> Inclusion<PodSummary> {
    let name = resource_name(&pod.metadata)?;
    let mut containers = ContainerStates::default();
    if let Some(statuses) = pod.status.as_ref().and_then(|s| s.container_statuses.as_ref()) {
        for cs in statuses {
            classify_container(cs, &mut containers);
        }
    }
    Ok((name, PodSummary { containers }))
}

fn classify_container(cs: &ContainerStatus, buckets: &mut ContainerStates) {
    let Some(state) = cs.state.as_ref() else {
        return;
    };
    if let Some(waiting) = state.waiting.as_ref() {
        buckets.waiting.push(cs.name.clone());
        if waiting.reason.as_deref() == Some(CRASH_LOOP_REASON) {
            buckets.crashing.push(cs.name.clone());
        }
    }
    if state.running.is_some() {
        buckets.running.push(cs.name.clone());
    }
    if state.terminated.is_some() {
        buckets.terminated.push(cs.name.clone());
    }
}

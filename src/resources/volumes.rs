use k8s_openapi::api::core::v1::Pod;
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use crate::kubernetes::ClusterQuery;
use crate::parsing::parse_df_output;
use crate::resources::base::RawResourceList;
use crate::types::PersistentVolumeSummary;

/// One claim mount to sample with `df`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountTarget {
    pub pod: String,
    pub claim: String,
    pub volume: String,
    pub mount_path: String,
}

/// Claim mounts of running pods, at most one per volume name.
///
/// Pods sharing a claim under the same volume name are sampled once, through
/// whichever pod lists it first.
pub fn plan_mount_samples(raw: &RawResourceList) -> Vec<MountTarget> {
    let mut scanned: HashSet<String> = HashSet::new();
    let mut targets = Vec::new();

    for pod in raw.decode_kind::<Pod>() {
        let pod = match pod {
            Ok(pod) => pod,
            Err(e) => {
                debug!("skipping Pod for volume sampling: malformed: {}", e);
                continue;
            }
        };
        if !is_running(&pod) {
            continue;
        }
        let Some(pod_name) = pod.metadata.name.as_ref() else {
            continue;
        };
        let Some(spec) = pod.spec.as_ref() else {
            continue;
        };

        for volume in spec.volumes.iter().flatten() {
            let Some(claim) = volume.persistent_volume_claim.as_ref() else {
                continue;
            };
            for container in &spec.containers {
                for mount in container.volume_mounts.iter().flatten() {
                    if mount.name != volume.name || scanned.contains(&mount.name) {
                        continue;
                    }
                    targets.push(MountTarget {
                        pod: pod_name.clone(),
                        claim: claim.claim_name.clone(),
                        volume: volume.name.clone(),
                        mount_path: mount.mount_path.clone(),
                    });
                    scanned.insert(mount.name.clone());
                }
            }
        }
    }
    targets
}

fn is_running(pod: &Pod) -> bool {
    pod.status.as_ref().and_then(|s| s.phase.as_deref()) == Some("Running")
}

/// Sample every planned mount once and key the usable results by claim name.
///
/// A mount whose sample fails or whose `df` output cannot be read is dropped
/// without retry.
pub async fn collect_persistent_volumes<C: ClusterQuery + ?Sized>(
    client: &C,
    namespace: &str,
    raw: &RawResourceList,
) -> BTreeMap<String, PersistentVolumeSummary> {
    let mut volumes = BTreeMap::new();

    for target in plan_mount_samples(raw) {
        let output = match client
            .sample_mount_usage(namespace, &target.pod, &target.mount_path)
            .await
        {
            Ok(output) => output,
            Err(e) => {
                warn!(
                    "sampling claim {} at {}:{} failed: {}",
                    target.claim, target.pod, target.mount_path, e
                );
                continue;
            }
        };
        let Some(usage) = output.as_deref().and_then(parse_df_output) else {
            warn!(
                "no usable df output for claim {} at {}:{}",
                target.claim, target.pod, target.mount_path
            );
            continue;
        };
        debug!("claim {} uses {} of {} bytes", target.claim, usage.used, usage.capacity);
        volumes.insert(
            target.claim.clone(),
            PersistentVolumeSummary {
                namespace: namespace.to_string(),
                pvc: target.claim,
                percentage: usage.percentage(),
                capacity: usage.capacity,
                used: usage.used,
                available: usage.available,
            },
        );
    }

    volumes
}

//! Evaluates one monitored item against its thresholds.
//!
//! Pods are judged per namespace, summing the container buckets of every
//! pod. All other kinds are judged per named resource, using that resource's
//! own counters only.

use std::collections::BTreeMap;
use std::fmt;

use crate::parsing::bytes_to_human_readable;
use crate::types::{
    CronjobSummary, DaemonsetSummary, DeploymentSummary, ItemId, NamespaceRecord,
    PersistentVolumeSummary, PodSummary, ReplicasetSummary, ResourceKind, Thresholds,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum State {
    Ok,
    Warn,
    Crit,
    Unknown,
}

impl State {
    /// Numeric state code understood by the monitoring server
    pub fn code(&self) -> u8 {
        match self {
            State::Ok => 0,
            State::Warn => 1,
            State::Crit => 2,
            State::Unknown => 3,
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            State::Ok => "OK",
            State::Warn => "WARN",
            State::Crit => "CRIT",
            State::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// One graphable value of a check result
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub name: &'static str,
    pub value: f64,
    pub levels: Option<(f64, f64)>,
    pub boundaries: Option<(f64, f64)>,
}

impl Metric {
    pub fn new(name: &'static str, value: impl Into<f64>) -> Self {
        Self {
            name,
            value: value.into(),
            levels: None,
            boundaries: None,
        }
    }

    pub fn with_levels(mut self, warn: f64, crit: f64) -> Self {
        self.levels = Some((warn, crit));
        self
    }

    pub fn with_boundaries(mut self, min: f64, max: f64) -> Self {
        self.boundaries = Some((min, max));
        self
    }
}

/// State, summary and metrics of one evaluated item
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub state: State,
    pub summary: String,
    pub metrics: Vec<Metric>,
}

/// Evaluate `item` against the records of the current cycle.
///
/// Returns `None` when the namespace, the resource kind or the named resource
/// is not present (anymore).
pub fn check_item(item: &ItemId, thresholds: &Thresholds, records: &[NamespaceRecord]) -> Option<CheckResult> {
    let record = records.iter().find(|r| r.name == item.namespace)?;
    let name = item.name.as_deref();
    match item.kind {
        ResourceKind::Pods => {
            if record.pods.is_empty() {
                return None;
            }
            Some(check_pods(&record.pods))
        }
        ResourceKind::Deployments => lookup(&record.deployments, name).map(check_deployment),
        ResourceKind::Daemonsets => lookup(&record.daemonsets, name).map(check_daemonset),
        ResourceKind::Replicasets => lookup(&record.replicasets, name).map(check_replicaset),
        ResourceKind::Cronjobs => lookup(&record.cronjobs, name).map(|c| check_cronjob(c, thresholds)),
        ResourceKind::PersistentVolumes => {
            lookup(&record.persistent_volumes, name).map(|pv| check_persistent_volume(pv, thresholds))
        }
    }
}

fn lookup<'a, T>(summaries: &'a BTreeMap<String, T>, name: Option<&str>) -> Option<&'a T> {
    summaries.get(name?)
}

pub fn check_pods(pods: &BTreeMap<String, PodSummary>) -> CheckResult {
    let (mut running, mut waiting, mut terminated, mut crashing) = (0usize, 0usize, 0usize, 0usize);
    for pod in pods.values() {
        running += pod.containers.running.len();
        waiting += pod.containers.waiting.len();
        terminated += pod.containers.terminated.len();
        crashing += pod.containers.crashing.len();
    }
    let state = if crashing > 0 { State::Crit } else { State::Ok };
    CheckResult {
        state,
        summary: format!(
            "running: {}, waiting: {}, terminated: {}, crashing: {}",
            running, waiting, terminated, crashing
        ),
        metrics: vec![
            Metric::new("pods_running", running as f64),
            Metric::new("pods_waiting", waiting as f64),
            Metric::new("pods_crashing", crashing as f64),
            Metric::new("pods_terminated", terminated as f64),
        ],
    }
}

pub fn check_deployment(deployment: &DeploymentSummary) -> CheckResult {
    let state = if deployment.replicas != deployment.ready_replicas {
        State::Crit
    } else {
        State::Ok
    };
    CheckResult {
        state,
        summary: format!(
            "replicas: {}, ready: {}, unavailable: {}",
            deployment.replicas, deployment.ready_replicas, deployment.unavailable_replicas
        ),
        metrics: vec![
            Metric::new("deployments_replicas", deployment.replicas),
            Metric::new("deployments_ready_replicas", deployment.ready_replicas),
            Metric::new("deployments_unavailable_replicas", deployment.unavailable_replicas),
        ],
    }
}

pub fn check_daemonset(daemonset: &DaemonsetSummary) -> CheckResult {
    let state = if daemonset.number_unavailable > 0 {
        State::Crit
    } else {
        State::Ok
    };
    CheckResult {
        state,
        summary: format!(
            "current: {}, desired: {}, ready: {}, unavailable: {}",
            daemonset.current_number_scheduled,
            daemonset.desired_number_scheduled,
            daemonset.number_ready,
            daemonset.number_unavailable
        ),
        metrics: vec![
            Metric::new("daemonsets_current_number_scheduled", daemonset.current_number_scheduled),
            Metric::new("daemonsets_desired_number_scheduled", daemonset.desired_number_scheduled),
            Metric::new("daemonsets_number_ready", daemonset.number_ready),
            Metric::new("daemonsets_number_unavailable", daemonset.number_unavailable),
        ],
    }
}

pub fn check_replicaset(replicaset: &ReplicasetSummary) -> CheckResult {
    let unavailable = replicaset.unavailable_replicas();
    let state = if replicaset.replicas != replicaset.ready_replicas {
        State::Crit
    } else {
        State::Ok
    };
    CheckResult {
        state,
        summary: format!(
            "replicas: {}, ready: {}, unavailable: {}",
            replicaset.replicas, replicaset.ready_replicas, unavailable
        ),
        metrics: vec![
            Metric::new("replicasets_replicas", replicaset.replicas),
            Metric::new("replicasets_ready_replicas", replicaset.ready_replicas),
            Metric::new("replicasets_unavailable_replicas", unavailable),
        ],
    }
}

pub fn check_cronjob(cronjob: &CronjobSummary, thresholds: &Thresholds) -> CheckResult {
    let mut state = State::Ok;
    if cronjob.active >= thresholds.cronjob_warning() {
        state = State::Warn;
    }
    // evaluated last so it overrides WARN
    if cronjob.active >= thresholds.cronjob_critical() {
        state = State::Crit;
    }
    CheckResult {
        state,
        summary: format!("active: {}", cronjob.active),
        metrics: vec![Metric::new("cronjobs_active", cronjob.active as f64)],
    }
}

pub fn check_persistent_volume(pv: &PersistentVolumeSummary, thresholds: &Thresholds) -> CheckResult {
    let percentage = pv.percentage as f64;
    let capacity = pv.capacity as f64;
    let mut state = State::Ok;
    if percentage > thresholds.pv_warning() {
        state = State::Warn;
    }
    if percentage > thresholds.pv_critical() {
        state = State::Crit;
    }
    CheckResult {
        state,
        summary: format!(
            "used: {} capacity: {} percentage: {} %",
            bytes_to_human_readable(pv.used),
            bytes_to_human_readable(pv.capacity),
            pv.percentage
        ),
        metrics: vec![
            Metric::new("persistent_volume_used", pv.used as f64).with_boundaries(0.0, capacity),
            Metric::new("persistent_volume_capacity", capacity).with_boundaries(0.0, capacity),
            Metric::new("persistent_volume_percentage", percentage)
                .with_levels(thresholds.pv_warning(), thresholds.pv_critical())
                .with_boundaries(0.0, 100.0),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContainerStates;

    fn create_test_record() -> NamespaceRecord {
        let mut record = NamespaceRecord::new("shop");
        record.deployments.insert(
            "frontend".to_string(),
            DeploymentSummary { replicas: 3, ready_replicas: 3, unavailable_replicas: 0 },
        );
        record.deployments.insert(
            "checkout".to_string(),
            DeploymentSummary { replicas: 2, ready_replicas: 1, unavailable_replicas: 1 },
        );
        record
    }

    fn metric_names(result: &CheckResult) -> Vec<&'static str> {
        result.metrics.iter().map(|m| m.name).collect()
    }

    #[test]
    fn test_deployment_ok_and_crit() {
        let mut deployment = DeploymentSummary { replicas: 3, ready_replicas: 3, unavailable_replicas: 0 };
        let ok = check_deployment(&deployment);
        assert_eq!(ok.state, State::Ok);
        assert_eq!(ok.summary, "replicas: 3, ready: 3, unavailable: 0");

        deployment.ready_replicas = 2;
        let crit = check_deployment(&deployment);
        assert_eq!(crit.state, State::Crit);
        assert_eq!(metric_names(&ok), metric_names(&crit));
        assert_eq!(
            metric_names(&crit),
            vec!["deployments_replicas", "deployments_ready_replicas", "deployments_unavailable_replicas"]
        );
    }

    #[test]
    fn test_named_item_uses_only_its_own_counters() {
        let records = vec![create_test_record()];
        let thresholds = Thresholds::default();

        let frontend = ItemId::named("shop", ResourceKind::Deployments, "frontend");
        let result = check_item(&frontend, &thresholds, &records).unwrap();
        assert_eq!(result.state, State::Ok);
        assert_eq!(result.summary, "replicas: 3, ready: 3, unavailable: 0");

        let checkout = ItemId::named("shop", ResourceKind::Deployments, "checkout");
        let result = check_item(&checkout, &thresholds, &records).unwrap();
        assert_eq!(result.state, State::Crit);
    }

    #[test]
    fn test_missing_items_yield_nothing() {
        let records = vec![create_test_record()];
        let thresholds = Thresholds::default();
        let cases = [
            ItemId::named("shop", ResourceKind::Deployments, "gone"),
            ItemId::named("other", ResourceKind::Deployments, "frontend"),
            ItemId::named("shop", ResourceKind::Cronjobs, "frontend"),
            ItemId::namespace_wide("shop", ResourceKind::Pods),
            ItemId::namespace_wide("shop", ResourceKind::Deployments),
        ];
        for item in cases {
            assert!(check_item(&item, &thresholds, &records).is_none(), "{}", item);
        }
    }

    #[test]
    fn test_cronjob_levels() {
        let thresholds = Thresholds::default();
        let state = |active| check_cronjob(&CronjobSummary { active }, &thresholds).state;
        assert_eq!(state(1), State::Ok);
        assert_eq!(state(2), State::Warn);
        assert_eq!(state(3), State::Crit);
        assert_eq!(state(10), State::Crit);

        let result = check_cronjob(&CronjobSummary { active: 2 }, &thresholds);
        assert_eq!(result.summary, "active: 2");
        assert_eq!(result.metrics, vec![Metric::new("cronjobs_active", 2.0)]);
    }

    #[test]
    fn test_cronjob_crit_overrides_warn_when_levels_coincide() {
        let thresholds = Thresholds { threshold_cronjob_count: (1, 1), ..Default::default() };
        let result = check_cronjob(&CronjobSummary { active: 1 }, &thresholds);
        assert_eq!(result.state, State::Crit);
    }

    #[test]
    fn test_persistent_volume_levels() {
        let pv = PersistentVolumeSummary {
            namespace: "db".to_string(),
            pvc: "data".to_string(),
            percentage: 95,
            capacity: 1000,
            used: 950,
            available: 50,
        };
        let result = check_persistent_volume(&pv, &Thresholds::default());
        assert_eq!(result.state, State::Crit);
        assert_eq!(result.summary, "used: 950 B capacity: 1000 B percentage: 95 %");
        assert_eq!(
            result.metrics[0],
            Metric::new("persistent_volume_used", 950.0).with_boundaries(0.0, 1000.0)
        );
        assert_eq!(result.metrics[2].levels, Some((80.0, 90.0)));
        assert_eq!(result.metrics[2].boundaries, Some((0.0, 100.0)));

        let warn = PersistentVolumeSummary { percentage: 85, ..pv.clone() };
        assert_eq!(check_persistent_volume(&warn, &Thresholds::default()).state, State::Warn);

        // levels are exclusive
        let at_warn = PersistentVolumeSummary { percentage: 80, ..pv };
        assert_eq!(check_persistent_volume(&at_warn, &Thresholds::default()).state, State::Ok);
    }

    #[test]
    fn test_persistent_volume_summary_units() {
        let pv = PersistentVolumeSummary {
            namespace: "db".to_string(),
            pvc: "data".to_string(),
            percentage: 48,
            capacity: 1998672 * 1024,
            used: 976004 * 1024,
            available: 953428 * 1024,
        };
        let result = check_persistent_volume(&pv, &Thresholds::default());
        assert_eq!(result.summary, "used: 953.13 MB capacity: 1.91 GB percentage: 48 %");
        assert_eq!(result.state, State::Ok);
    }

    #[test]
    fn test_pods_summed_across_namespace() {
        let mut pods = BTreeMap::new();
        pods.insert(
            "a".to_string(),
            PodSummary {
                containers: ContainerStates {
                    running: vec!["app".to_string(), "proxy".to_string()],
                    ..Default::default()
                },
            },
        );
        pods.insert(
            "b".to_string(),
            PodSummary {
                containers: ContainerStates {
                    waiting: vec!["app".to_string()],
                    crashing: vec!["app".to_string()],
                    terminated: vec!["init".to_string()],
                    ..Default::default()
                },
            },
        );
        let result = check_pods(&pods);
        assert_eq!(result.state, State::Crit);
        assert_eq!(result.summary, "running: 2, waiting: 1, terminated: 1, crashing: 1");

        pods.remove("b");
        assert_eq!(check_pods(&pods).state, State::Ok);
    }

    #[test]
    fn test_daemonset_and_replicaset() {
        let ds = DaemonsetSummary {
            current_number_scheduled: 3,
            desired_number_scheduled: 3,
            number_ready: 2,
            number_unavailable: 1,
        };
        let result = check_daemonset(&ds);
        assert_eq!(result.state, State::Crit);
        assert_eq!(result.summary, "current: 3, desired: 3, ready: 2, unavailable: 1");

        let rs = ReplicasetSummary { replicas: 2, ready_replicas: 2, available_replicas: 2 };
        let result = check_replicaset(&rs);
        assert_eq!(result.state, State::Ok);
        assert_eq!(result.summary, "replicas: 2, ready: 2, unavailable: 0");

        let rs = ReplicasetSummary { replicas: 3, ready_replicas: 1, available_replicas: 1 };
        let result = check_replicaset(&rs);
        assert_eq!(result.state, State::Crit);
        assert_eq!(result.metrics[2], Metric::new("replicasets_unavailable_replicas", 2));
    }
}

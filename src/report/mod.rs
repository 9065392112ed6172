use crate::check::{check_item, CheckResult, Metric, State};
use crate::types::{ItemId, NamespaceRecord, Thresholds};

pub const ITEM_NOT_FOUND: &str = "item not found in agent output";

/// Outcome of one item in a check cycle
#[derive(Debug, Clone, PartialEq)]
pub struct ItemReport {
    pub item: ItemId,
    pub result: CheckResult,
}

impl ItemReport {
    /// Evaluate `item`, turning a vanished item into UNKNOWN
    pub fn evaluate(item: ItemId, thresholds: &Thresholds, records: &[NamespaceRecord]) -> Self {
        let result = check_item(&item, thresholds, records).unwrap_or_else(|| CheckResult {
            state: State::Unknown,
            summary: ITEM_NOT_FOUND.to_string(),
            metrics: Vec::new(),
        });
        Self { item, result }
    }

    /// `<state-code> "K8s <item>" <perfdata> <summary>`
    pub fn render(&self) -> String {
        format!(
            "{} \"{}\" {} {}",
            self.result.state.code(),
            self.item.service_name(),
            render_perfdata(&self.result.metrics),
            self.result.summary
        )
    }
}

/// Results of one check cycle, in item order
#[derive(Debug, Default)]
pub struct CheckReport {
    pub items: Vec<ItemReport>,
}

impl CheckReport {
    pub fn build(items: Vec<ItemId>, thresholds: &Thresholds, records: &[NamespaceRecord]) -> Self {
        Self {
            items: items
                .into_iter()
                .map(|item| ItemReport::evaluate(item, thresholds, records))
                .collect(),
        }
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary::default();
        for report in &self.items {
            match report.result.state {
                State::Ok => summary.ok += 1,
                State::Warn => summary.warn += 1,
                State::Crit => summary.crit += 1,
                State::Unknown => summary.unknown += 1,
            }
        }
        summary
    }

    /// Worst state over all items, OK for an empty report
    pub fn worst_state(&self) -> State {
        self.items
            .iter()
            .map(|r| r.result.state)
            .max()
            .unwrap_or(State::Ok)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for report in &self.items {
            out.push_str(&report.render());
            out.push('\n');
        }
        out
    }
}

/// Item counts per state
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    pub ok: usize,
    pub warn: usize,
    pub crit: usize,
    pub unknown: usize,
}

impl ReportSummary {
    pub fn total(&self) -> usize {
        self.ok + self.warn + self.crit + self.unknown
    }

    pub fn has_problems(&self) -> bool {
        self.warn + self.crit + self.unknown > 0
    }
}

/// `name=value;warn;crit;min;max` joined by `|`, `-` without metrics
pub fn render_perfdata(metrics: &[Metric]) -> String {
    if metrics.is_empty() {
        return "-".to_string();
    }
    let mut out = String::new();
    for (i, metric) in metrics.iter().enumerate() {
        if i > 0 {
            out.push('|');
        }
        let (warn, crit) = split_pair(metric.levels);
        let (min, max) = split_pair(metric.boundaries);
        out.push_str(&format!(
            "{}={};{};{};{};{}",
            metric.name, metric.value, warn, crit, min, max
        ));
    }
    out
}

fn split_pair(pair: Option<(f64, f64)>) -> (String, String) {
    match pair {
        Some((a, b)) => (a.to_string(), b.to_string()),
        None => (String::new(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DeploymentSummary, ResourceKind};

    fn create_test_records() -> Vec<NamespaceRecord> {
        let mut record = NamespaceRecord::new("shop");
        record.deployments.insert(
            "api".to_string(),
            DeploymentSummary { replicas: 2, ready_replicas: 1, unavailable_replicas: 1 },
        );
        vec![record]
    }

    #[test]
    fn test_render_found_item() {
        let item = ItemId::named("shop", ResourceKind::Deployments, "api");
        let report = ItemReport::evaluate(item, &Thresholds::default(), &create_test_records());
        assert_eq!(
            report.render(),
            "2 \"K8s shop / deployments / api\" \
             deployments_replicas=2;;;;|deployments_ready_replicas=1;;;;|deployments_unavailable_replicas=1;;;; \
             replicas: 2, ready: 1, unavailable: 1"
        );
    }

    #[test]
    fn test_vanished_item_is_unknown() {
        let item = ItemId::named("shop", ResourceKind::Deployments, "gone");
        let report = ItemReport::evaluate(item, &Thresholds::default(), &create_test_records());
        assert_eq!(report.result.state, State::Unknown);
        assert_eq!(
            report.render(),
            "3 \"K8s shop / deployments / gone\" - item not found in agent output"
        );
    }

    #[test]
    fn test_perfdata_with_levels_and_boundaries() {
        let metrics = vec![
            Metric::new("persistent_volume_percentage", 95.0)
                .with_levels(80.0, 90.0)
                .with_boundaries(0.0, 100.0),
            Metric::new("cronjobs_active", 1.5),
        ];
        assert_eq!(
            render_perfdata(&metrics),
            "persistent_volume_percentage=95;80;90;0;100|cronjobs_active=1.5;;;;"
        );
        assert_eq!(render_perfdata(&[]), "-");
    }

    #[test]
    fn test_report_summary_and_worst_state() {
        let records = create_test_records();
        let items = vec![
            ItemId::named("shop", ResourceKind::Deployments, "api"),
            ItemId::named("shop", ResourceKind::Cronjobs, "nightly"),
        ];
        let report = CheckReport::build(items, &Thresholds::default(), &records);
        let summary = report.summary();
        assert_eq!(summary, ReportSummary { ok: 0, warn: 0, crit: 1, unknown: 1 });
        assert_eq!(summary.total(), 2);
        assert!(summary.has_problems());
        assert_eq!(report.worst_state(), State::Unknown);
        assert_eq!(report.render().lines().count(), 2);

        assert_eq!(CheckReport::default().worst_state(), State::Ok);
    }
}

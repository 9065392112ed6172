use k8s_openapi::api::batch::v1::CronJob;
use std::collections::BTreeMap;

use crate::resources::base::{resource_name, summarize, Exclusion, Inclusion, RawResourceList};
use crate::types::CronjobSummary;

/// Number of currently running jobs per cronjob
pub fn extract_cronjobs(raw: &RawResourceList) -> BTreeMap<String, CronjobSummary> {
    summarize(raw, validate_cronjob)
}

/// A cronjob that was never scheduled reports an empty status and is left out
fn validate_cronjob(cronjob: &CronJob) -> Inclusion<CronjobSummary> {
    let name = resource_name(&cronjob.metadata)?;
    let status = cronjob
        .status
        .as_ref()
        .filter(|s| s.active.is_some() || s.last_schedule_time.is_some() || s.last_successful_time.is_some())
        .ok_or(Exclusion::MissingStatus)?;
    let active = status.active.as_ref().map(|jobs| jobs.len()).unwrap_or(0);
    Ok((name, CronjobSummary { active }))
}

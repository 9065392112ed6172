// Public modules
pub mod types;
pub mod error;
pub mod config;
pub mod parsing;
pub mod kubernetes;
pub mod resources;
pub mod collector;
pub mod section;
pub mod discovery;
pub mod check;
pub mod report;

// Re-export commonly used items
pub use types::*;
pub use error::{CollectorError, ItemIdError, RecordError};
pub use config::{
    load_collector_config, load_collector_config_with_env, load_discovery_rules, load_thresholds,
    CollectorConfig, EnvironmentProvider, MockEnvironment, SystemEnvironment,
};
pub use parsing::{bytes_to_human_readable, parse_df_output, DiskUsage};
pub use kubernetes::{locate_kubectl, ClusterQuery, Kubectl};
pub use resources::RawResourceList;
pub use collector::NamespaceCollector;
pub use section::{parse_section, write_section, SECTION_HEADER};
pub use discovery::{discover, discover_by_rule_pairs, RuleSet};
pub use check::{check_item, CheckResult, Metric, State};
pub use report::{CheckReport, ItemReport, ReportSummary};

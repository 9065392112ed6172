use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;

use kube_namespace_monitor::{
    discover, load_collector_config, load_discovery_rules, load_thresholds, parse_section,
    write_section, CheckReport, ItemId, Kubectl, NamespaceCollector, NamespaceRecord, RuleSet,
};

#[derive(Parser)]
#[command(name = "kube-namespace-monitor", version, about = "Per-namespace Kubernetes health monitoring")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Query the cluster once and print the namespace section
    Collect,
    /// Print the items to monitor, one per line
    Discover {
        /// Section to read instead of stdin
        #[arg(long)]
        input: Option<PathBuf>,
        /// JSON file with discovery rules
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Evaluate items and print one result line each
    Check {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        rules: Option<PathBuf>,
        /// JSON file with check thresholds
        #[arg(long)]
        params: Option<PathBuf>,
        /// Item to evaluate, e.g. "default / deployments / api"; defaults to every discovered item
        #[arg(long = "item")]
        items: Vec<ItemId>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Collect => collect().await,
        Command::Discover { input, rules } => {
            let records = read_records(input.as_deref())?;
            let rules = RuleSet::new(load_discovery_rules(rules.as_deref())?);
            for item in discover(&rules, &records) {
                println!("{}", item);
            }
            Ok(())
        }
        Command::Check { input, rules, params, items } => {
            let records = read_records(input.as_deref())?;
            let thresholds = load_thresholds(params.as_deref())?;
            let items = if items.is_empty() {
                let rules = RuleSet::new(load_discovery_rules(rules.as_deref())?);
                discover(&rules, &records)
            } else {
                items
            };

            let report = CheckReport::build(items, &thresholds, &records);
            let summary = report.summary();
            info!(
                "checked {} items: {} ok, {} warn, {} crit, {} unknown",
                summary.total(),
                summary.ok,
                summary.warn,
                summary.crit,
                summary.unknown
            );
            print!("{}", report.render());
            Ok(())
        }
    }
}

async fn collect() -> Result<()> {
    let cfg = load_collector_config();
    let kubectl = Kubectl::from_config(&cfg)?;
    info!("using kubectl at {}", kubectl.binary().display());

    let records = NamespaceCollector::new(&kubectl)
        .collect()
        .await
        .context("Failed to collect namespaces")?;
    write_section(std::io::stdout().lock(), &records)?;
    Ok(())
}

fn read_records(input: Option<&Path>) -> Result<Vec<NamespaceRecord>> {
    let text = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read section {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read section from stdin")?;
            text
        }
    };
    let records = parse_section(&text);
    info!("parsed {} namespace records", records.len());
    Ok(records)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

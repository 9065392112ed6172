use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::{DiscoveryRule, Thresholds};

/// Name shared by the section header, the config file and the rule set
pub const PLUGIN_NAME: &str = "kubernetes_namespaces";

const DEFAULT_CONFDIR: &str = "/etc/check_mk";

/// Places where kubectl usually lives, searched in order
pub const KUBECTL_SEARCH_PATHS: &[&str] = &[
    "/usr/local/bin/kubectl",
    "/usr/bin/kubectl",
    "/bin/kubectl",
    "/snap/bin/kubectl",
];

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

/// Settings of the collecting side
#[derive(Debug, Clone, Default)]
pub struct CollectorConfig {
    /// Explicit kubectl binary; `None` searches [`KUBECTL_SEARCH_PATHS`]
    pub kubectl: Option<PathBuf>,
    /// Variables from the config file, handed to every kubectl call
    pub kubectl_env: HashMap<String, String>,
}

pub fn config_file_path<E: EnvironmentProvider>(env: &E) -> PathBuf {
    let dir = env
        .get_var("MK_CONFDIR")
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CONFDIR.to_string());
    Path::new(&dir).join(format!("{}.cfg", PLUGIN_NAME))
}

pub fn load_collector_config() -> CollectorConfig {
    load_collector_config_with_env(&SystemEnvironment)
}

pub fn load_collector_config_with_env<E: EnvironmentProvider>(env: &E) -> CollectorConfig {
    let path = config_file_path(env);
    let kubectl_env = read_env_file(&path);
    debug!("read {} variables from {}", kubectl_env.len(), path.display());

    let kubectl = env
        .get_var("KUBECTL")
        .or_else(|| kubectl_env.get("KUBECTL").cloned())
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    CollectorConfig {
        kubectl,
        kubectl_env,
    }
}

/// Read a KEY=VALUE file. A missing or unreadable file yields nothing.
pub fn read_env_file(path: &Path) -> HashMap<String, String> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_env_file(&content),
        Err(e) => {
            debug!("config file {} not used: {}", path.display(), e);
            HashMap::new()
        }
    }
}

/// Lines that are not exactly `KEY=VALUE` are skipped
pub fn parse_env_file(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) if !key.trim().is_empty() => {
                vars.insert(key.trim().to_string(), value.trim().to_string());
            }
            _ => debug!("ignoring config line '{}'", line),
        }
    }
    vars
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RulesDocument {
    List(Vec<DiscoveryRule>),
    Wrapped { kubernetes_namespaces: Vec<DiscoveryRule> },
}

/// Discovery rules, either a bare list or wrapped in `{"kubernetes_namespaces": [...]}`
pub fn parse_discovery_rules(content: &str) -> Result<Vec<DiscoveryRule>> {
    let doc: RulesDocument =
        serde_json::from_str(content).context("Invalid discovery rules")?;
    Ok(match doc {
        RulesDocument::List(rules) => rules,
        RulesDocument::Wrapped { kubernetes_namespaces } => kubernetes_namespaces,
    })
}

pub fn load_discovery_rules(path: Option<&Path>) -> Result<Vec<DiscoveryRule>> {
    let Some(path) = path else {
        return Ok(Vec::new());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read discovery rules {}", path.display()))?;
    parse_discovery_rules(&content).with_context(|| format!("In {}", path.display()))
}

pub fn load_thresholds(path: Option<&Path>) -> Result<Thresholds> {
    let Some(path) = path else {
        return Ok(Thresholds::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read check parameters {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid check parameters in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_file_path() {
        let env = MockEnvironment::new().with_var("MK_CONFDIR", "/opt/agent/config");
        assert_eq!(
            config_file_path(&env),
            PathBuf::from("/opt/agent/config/kubernetes_namespaces.cfg")
        );

        let env = MockEnvironment::new();
        assert_eq!(
            config_file_path(&env),
            PathBuf::from("/etc/check_mk/kubernetes_namespaces.cfg")
        );
    }

    #[test]
    fn test_parse_env_file() {
        let content = "\
# Created by the agent bakery
KUBECONFIG=/etc/kubernetes/admin.conf

 HTTPS_PROXY = http://proxy:3128
broken line
A=B=C
=value
";
        let vars = parse_env_file(content);
        assert_eq!(vars.len(), 2);
        assert_eq!(vars.get("KUBECONFIG"), Some(&"/etc/kubernetes/admin.conf".to_string()));
        assert_eq!(vars.get("HTTPS_PROXY"), Some(&"http://proxy:3128".to_string()));
    }

    #[test]
    fn test_collector_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("kubernetes_namespaces.cfg")).unwrap();
        writeln!(file, "KUBECONFIG=/root/.kube/config").unwrap();
        writeln!(file, "KUBECTL=/opt/bin/kubectl").unwrap();

        let env = MockEnvironment::new().with_var("MK_CONFDIR", dir.path().to_str().unwrap());
        let config = load_collector_config_with_env(&env);
        assert_eq!(config.kubectl, Some(PathBuf::from("/opt/bin/kubectl")));
        assert_eq!(
            config.kubectl_env.get("KUBECONFIG"),
            Some(&"/root/.kube/config".to_string())
        );

        // the process environment takes precedence over the file
        let env = MockEnvironment::new()
            .with_var("MK_CONFDIR", dir.path().to_str().unwrap())
            .with_var("KUBECTL", "/usr/local/bin/kubectl");
        let config = load_collector_config_with_env(&env);
        assert_eq!(config.kubectl, Some(PathBuf::from("/usr/local/bin/kubectl")));
    }

    #[test]
    fn test_missing_config_file_is_not_fatal() {
        let env = MockEnvironment::new().with_var("MK_CONFDIR", "/nonexistent/confdir");
        let config = load_collector_config_with_env(&env);
        assert!(config.kubectl.is_none());
        assert!(config.kubectl_env.is_empty());
    }

    #[test]
    fn test_parse_discovery_rules_shapes() {
        let bare = r#"[{"namespace": "monitoring", "pods": true}, {"deployments": true}]"#;
        let rules = parse_discovery_rules(bare).unwrap();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].scope(), Some("monitoring"));
        assert_eq!(rules[1].scope(), None);

        let wrapped = r#"{"kubernetes_namespaces": [{"cronjobs": true}]}"#;
        let rules = parse_discovery_rules(wrapped).unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].cronjobs, Some(true));

        let err = parse_discovery_rules(r#"{"rules": 1}"#).unwrap_err();
        assert!(err.to_string().contains("discovery rules"));
    }

    #[test]
    fn test_load_thresholds() {
        assert_eq!(load_thresholds(None).unwrap(), Thresholds::default());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"percentage_persistent_volumes": [70.0, 85.5]}}"#).unwrap();
        let thresholds = load_thresholds(Some(file.path())).unwrap();
        assert_eq!(thresholds.percentage_persistent_volumes, (70.0, 85.5));
        assert_eq!(thresholds.threshold_cronjob_count, (2, 3));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let err = load_thresholds(Some(file.path())).unwrap_err();
        assert!(err.to_string().contains("Invalid check parameters"));
    }

    #[test]
    fn test_load_discovery_rules_missing_file() {
        assert!(load_discovery_rules(None).unwrap().is_empty());
        let err = load_discovery_rules(Some(Path::new("/nonexistent/rules.json"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read discovery rules"));
    }
}

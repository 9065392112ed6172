use async_trait::async_trait;
use k8s_openapi::api::core::v1::Namespace;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::{CollectorConfig, KUBECTL_SEARCH_PATHS};
use crate::error::CollectorError;
use crate::resources::RawResourceList;

/// Read-only access to the cluster control plane.
///
/// Empty answers are not errors: a namespace without resources, or a pod where
/// `df` printed nothing, simply yields an empty result.
#[async_trait]
pub trait ClusterQuery: Send + Sync {
    async fn list_namespaces(&self) -> Result<Vec<String>, CollectorError>;

    async fn list_namespace_resources(&self, namespace: &str) -> Result<RawResourceList, CollectorError>;

    /// Raw `df` output for a mount path inside a running pod
    async fn sample_mount_usage(
        &self,
        namespace: &str,
        pod: &str,
        mount_path: &str,
    ) -> Result<Option<String>, CollectorError>;
}

/// [`ClusterQuery`] backed by the kubectl binary
#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: PathBuf,
    env: HashMap<String, String>,
}

impl Kubectl {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            env: HashMap::new(),
        }
    }

    /// Variables passed to every kubectl call, e.g. KUBECONFIG
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn from_config(config: &CollectorConfig) -> Result<Self, CollectorError> {
        let binary = match &config.kubectl {
            Some(path) if is_executable(path) => path.clone(),
            Some(path) => {
                return Err(CollectorError::KubectlNotFound {
                    searched: vec![path.clone()],
                })
            }
            None => locate_kubectl(KUBECTL_SEARCH_PATHS)?,
        };
        debug!("using kubectl at {}", binary.display());
        Ok(Self::new(binary).with_env(config.kubectl_env.clone()))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Run kubectl once and return stdout, `None` when it printed nothing
    async fn run(&self, args: &[&str]) -> Result<Option<String>, CollectorError> {
        let output = Command::new(&self.binary)
            .args(args)
            .envs(&self.env)
            .output()
            .await
            .map_err(|source| CollectorError::Spawn {
                command: args.join(" "),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("kubectl {} exited with {}: {}", args.join(" "), output.status, stderr.trim());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(stdout.into_owned()))
    }

    async fn get_json(&self, args: &[&str]) -> Result<RawResourceList, CollectorError> {
        let mut args = args.to_vec();
        args.extend(["--output", "json"]);
        match self.run(&args).await? {
            Some(stdout) => RawResourceList::from_json(&stdout).map_err(|source| {
                CollectorError::InvalidJson {
                    command: args.join(" "),
                    source,
                }
            }),
            None => Ok(RawResourceList::default()),
        }
    }
}

#[async_trait]
impl ClusterQuery for Kubectl {
    async fn list_namespaces(&self) -> Result<Vec<String>, CollectorError> {
        let list = self.get_json(&["get", "namespace"]).await?;
        let names = list
            .decode_kind::<Namespace>()
            .filter_map(|ns| match ns {
                Ok(ns) => ns.metadata.name,
                Err(e) => {
                    warn!("skipping unreadable namespace entry: {}", e);
                    None
                }
            })
            .collect();
        Ok(names)
    }

    async fn list_namespace_resources(&self, namespace: &str) -> Result<RawResourceList, CollectorError> {
        self.get_json(&["get", "all", "--namespace", namespace]).await
    }

    async fn sample_mount_usage(
        &self,
        namespace: &str,
        pod: &str,
        mount_path: &str,
    ) -> Result<Option<String>, CollectorError> {
        self.run(&["exec", pod, "--namespace", namespace, "--", "df", mount_path])
            .await
    }
}

/// First executable kubectl among `candidates`
pub fn locate_kubectl<P: AsRef<Path>>(candidates: &[P]) -> Result<PathBuf, CollectorError> {
    candidates
        .iter()
        .map(|p| p.as_ref())
        .find(|p| is_executable(p))
        .map(Path::to_path_buf)
        .ok_or_else(|| CollectorError::KubectlNotFound {
            searched: candidates.iter().map(|p| p.as_ref().to_path_buf()).collect(),
        })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_kubectl_missing() {
        let dir = tempfile::tempdir().unwrap();
        let candidates = [dir.path().join("kubectl"), dir.path().join("bin/kubectl")];
        match locate_kubectl(&candidates) {
            Err(CollectorError::KubectlNotFound { searched }) => {
                assert_eq!(searched, candidates.to_vec());
            }
            other => panic!("expected KubectlNotFound, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_locate_kubectl_requires_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let plain = dir.path().join("plain");
        let exec = dir.path().join("kubectl");
        std::fs::write(&plain, "").unwrap();
        std::fs::write(&exec, "").unwrap();
        std::fs::set_permissions(&exec, std::fs::Permissions::from_mode(0o755)).unwrap();

        let found = locate_kubectl(&[plain.clone(), exec.clone()]).unwrap();
        assert_eq!(found, exec);

        // directories never qualify
        assert!(locate_kubectl(&[dir.path().to_path_buf()]).is_err());
    }

    #[test]
    fn test_from_config_with_missing_explicit_binary() {
        let config = CollectorConfig {
            kubectl: Some(PathBuf::from("/nonexistent/kubectl")),
            ..Default::default()
        };
        let err = Kubectl::from_config(&config).unwrap_err();
        assert!(matches!(err, CollectorError::KubectlNotFound { .. }));
    }
}

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the collection side. Empty kubectl output is never one of them.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("kubectl binary not found, searched: {}", format_paths(.searched))]
    KubectlNotFound { searched: Vec<PathBuf> },

    #[error("failed to run `kubectl {command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`kubectl {command}` returned invalid JSON: {source}")]
    InvalidJson {
        command: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write section: {0}")]
    Output(#[from] std::io::Error),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// A section line that could not be turned back into a namespace record
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("empty record line")]
    Empty,

    #[error("malformed namespace record: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ItemIdError {
    #[error("unknown resource kind '{0}'")]
    UnknownKind(String),

    #[error("item '{0}' does not match 'namespace / kind[ / name]'")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_lists_searched_paths() {
        let err = CollectorError::KubectlNotFound {
            searched: vec![PathBuf::from("/usr/bin/kubectl"), PathBuf::from("/snap/bin/kubectl")],
        };
        let msg = err.to_string();
        assert!(msg.contains("/usr/bin/kubectl, /snap/bin/kubectl"));
    }
}

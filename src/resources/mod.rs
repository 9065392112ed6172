// Per-kind extractors over one namespace's resource dump
pub mod base;
pub mod jobs;
pub mod pods;
pub mod volumes;
pub mod workloads;

// Re-export commonly used items
pub use base::{Exclusion, Inclusion, RawResourceList};
pub use jobs::extract_cronjobs;
pub use pods::extract_pods;
pub use volumes::{collect_persistent_volumes, plan_mount_samples, MountTarget};
pub use workloads::{extract_daemonsets, extract_deployments, extract_replicasets};

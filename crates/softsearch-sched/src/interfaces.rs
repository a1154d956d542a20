use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use softsearch_core::{DependencySpec, JobId, SwsError};

use crate::manifest::DependencyManifest;

/// Package manager operations the scheduler relies on.
pub trait PackageManager {
    /// Location of the dependency manifest for `env`.
    fn manifest_path(&self, env: &str) -> Result<PathBuf, SwsError>;
    /// Install prefix of an already concretized spec.
    fn resolve_install_path(&self, spec: &str) -> Result<PathBuf, SwsError>;
    /// Root directory of the environment `env`.
    fn resolve_environment_path(&self, env: &str) -> Result<PathBuf, SwsError>;
    /// Writes the aggregated dependency manifest.
    fn write_dependency_manifest(
        &self,
        path: &Path,
        manifest: &DependencyManifest,
    ) -> Result<(), SwsError>;
    /// Argument vector `install` executes for `spec`.
    fn install_command(&self, spec: &str) -> Vec<String>;
    /// Installs `spec`, optionally capturing its output in `log`, and returns
    /// the exit code.
    fn install(&self, spec: &str, log: Option<&Path>) -> Result<i32, SwsError>;
}

/// Everything the batch scheduler needs to enqueue one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSubmission {
    pub job_name: String,
    pub stdout_path: PathBuf,
    pub stderr_path: PathBuf,
    pub node_count: u32,
    #[serde(default)]
    pub task_count: Option<u32>,
    #[serde(default)]
    pub tasks_per_node: Option<u32>,
    pub wall_time: String,
    #[serde(default)]
    pub dependency: Option<DependencySpec>,
    pub script_path: PathBuf,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Batch scheduler that turns submissions into job ids.
pub trait BatchScheduler {
    fn submit(&mut self, job: &JobSubmission) -> Result<JobId, SwsError>;
}

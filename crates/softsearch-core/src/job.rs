//! Batch job records produced by the scheduler.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::descriptor::ExperimentDescriptor;

/// Identifier returned by the batch scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Wraps a raw scheduler identifier.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Raw identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stage a job belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Shared dependency build.
    Build,
    /// Single configuration run.
    Run,
}

/// How run jobs are chained behind each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChainMode {
    /// Each run depends on the previous successful submission.
    #[default]
    Sync,
    /// Every run depends on the build job only.
    Independent,
}

/// `afterok:<build>,afterany:<previous>` dependency clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    /// Job that must finish successfully.
    pub after_ok: JobId,
    /// Job that must finish in any state.
    pub after_any: JobId,
}

impl DependencySpec {
    /// Distinct ids referenced by the clause.
    pub fn ids(&self) -> BTreeSet<JobId> {
        [self.after_ok.clone(), self.after_any.clone()]
            .into_iter()
            .collect()
    }
}

impl Display for DependencySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "afterok:{},afterany:{}", self.after_ok, self.after_any)
    }
}

/// Outcome attached to a record once submission was attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "lowercase")]
pub enum JobStatus {
    /// Accepted by the batch scheduler.
    Submitted(JobId),
    /// Rejected by the batch scheduler.
    Failed(String),
    /// Never submitted because its environment could not be prepared.
    Skipped(String),
}

/// One build or run job and the outcome of its submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    /// Build or run stage.
    pub kind: JobKind,
    /// The configuration a run job executes; absent for the build job.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<ExperimentDescriptor>,
    /// Jobs this one waits for.
    #[serde(default)]
    pub dependency_ids: BTreeSet<JobId>,
    /// Environment injected into the job script.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Submission outcome.
    pub status: JobStatus,
}

impl JobRecord {
    /// Identifier assigned by the scheduler, if the submission succeeded.
    pub fn job_id(&self) -> Option<&JobId> {
        match &self.status {
            JobStatus::Submitted(id) => Some(id),
            _ => None,
        }
    }
}

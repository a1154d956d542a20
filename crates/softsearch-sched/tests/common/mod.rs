#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use softsearch_core::errors::{ErrorInfo, SwsError};
use softsearch_core::{ExperimentDescriptor, ExperimentSet, JobId, SoftwareChoice};
use softsearch_sched::{BatchScheduler, DependencyManifest, JobSubmission, PackageManager};

pub fn descriptor(app: &str, ranks: u32) -> ExperimentDescriptor {
    let mut roles = IndexMap::new();
    roles.insert(
        "compiler".to_string(),
        SoftwareChoice::new("compiler", "gcc", "9.4.0").with_module("gcc/9.4.0"),
    );
    roles.insert(
        "mpi".to_string(),
        SoftwareChoice::new("mpi", "openmpi", "4.1.0").with_module("openmpi/4.1.0"),
    );
    ExperimentDescriptor {
        roles,
        input: "-p 1".to_string(),
        ranks,
        spec: format!("{app}@1.0"),
        app_name: app.to_string(),
        max_wall_time: "00:15:00".to_string(),
    }
}

pub fn experiments(count: usize) -> ExperimentSet {
    (0..count)
        .map(|index| descriptor(&format!("app{index}"), 64))
        .collect()
}

/// Package manager double that records writes and installs.
#[derive(Debug, Default)]
pub struct FakeSpack {
    pub manifest_missing: bool,
    pub install_prefix: Option<PathBuf>,
    pub env_root: Option<PathBuf>,
    pub install_code: i32,
    pub written: RefCell<Vec<(PathBuf, DependencyManifest)>>,
    pub installs: RefCell<Vec<(String, Option<PathBuf>)>>,
}

impl FakeSpack {
    pub fn installed(prefix: &str) -> Self {
        Self {
            install_prefix: Some(PathBuf::from(prefix)),
            env_root: Some(PathBuf::from("/spack/envs/study")),
            ..Self::default()
        }
    }
}

impl PackageManager for FakeSpack {
    fn manifest_path(&self, env: &str) -> Result<PathBuf, SwsError> {
        if self.manifest_missing {
            return Err(SwsError::Manifest(
                ErrorInfo::new("spack-exit", "no such environment").with_context("env", env),
            ));
        }
        Ok(PathBuf::from(format!("/spack/envs/{env}/spack.yaml")))
    }

    fn resolve_install_path(&self, spec: &str) -> Result<PathBuf, SwsError> {
        self.install_prefix.clone().ok_or_else(|| {
            SwsError::Resolution(ErrorInfo::new("spack-exit", "not installed").with_spec(spec))
        })
    }

    fn resolve_environment_path(&self, env: &str) -> Result<PathBuf, SwsError> {
        self.env_root.clone().ok_or_else(|| {
            SwsError::Resolution(ErrorInfo::new("spack-exit", "no environment").with_context("env", env))
        })
    }

    fn write_dependency_manifest(
        &self,
        path: &Path,
        manifest: &DependencyManifest,
    ) -> Result<(), SwsError> {
        self.written
            .borrow_mut()
            .push((path.to_path_buf(), manifest.clone()));
        Ok(())
    }

    fn install_command(&self, spec: &str) -> Vec<String> {
        vec!["spack".into(), "install".into(), "--reuse".into(), spec.into()]
    }

    fn install(&self, spec: &str, log: Option<&Path>) -> Result<i32, SwsError> {
        self.installs
            .borrow_mut()
            .push((spec.to_string(), log.map(Path::to_path_buf)));
        Ok(self.install_code)
    }
}

/// Batch scheduler double handing out ids 100, 101, ... and failing the
/// submissions whose call index is listed in `fail_calls`.
#[derive(Debug)]
pub struct FakeBatch {
    pub next_id: u32,
    pub calls: usize,
    pub fail_calls: BTreeSet<usize>,
    pub submitted: Vec<JobSubmission>,
}

impl FakeBatch {
    pub fn new() -> Self {
        Self::failing(&[])
    }

    pub fn failing(calls: &[usize]) -> Self {
        Self {
            next_id: 100,
            calls: 0,
            fail_calls: calls.iter().copied().collect(),
            submitted: Vec::new(),
        }
    }
}

impl BatchScheduler for FakeBatch {
    fn submit(&mut self, job: &JobSubmission) -> Result<JobId, SwsError> {
        let call = self.calls;
        self.calls += 1;
        self.submitted.push(job.clone());
        if self.fail_calls.contains(&call) {
            return Err(SwsError::Submission(
                ErrorInfo::new("sbatch-exit", "queue full").with_context("call", call.to_string()),
            ));
        }
        let id = JobId::new(self.next_id.to_string());
        self.next_id += 1;
        Ok(id)
    }
}

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use softsearch_core::errors::{ErrorInfo, SwsError};
use softsearch_core::{
    ChainMode, DependencySpec, ExperimentDescriptor, ExperimentSet, JobId, JobKind, JobRecord,
    JobStatus,
};
use tracing::{error, info, warn};

use crate::env::{node_count, run_env, RunEnvContext};
use crate::interfaces::{BatchScheduler, JobSubmission, PackageManager};
use crate::manifest::DependencyManifest;
use crate::results::ResultsFile;

/// Settings for submitting an experiment set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleOptions {
    #[serde(default = "default_spack_env")]
    pub spack_env: String,
    pub output_root: PathBuf,
    #[serde(default = "default_ranks_per_node")]
    pub ranks_per_node: u32,
    #[serde(default = "default_build_script")]
    pub build_script: PathBuf,
    #[serde(default = "default_run_script")]
    pub run_script: PathBuf,
    #[serde(default = "default_max_build_time")]
    pub max_build_time: String,
    #[serde(default)]
    pub profile: bool,
    #[serde(default = "default_csv_file")]
    pub csv_file: String,
    #[serde(default = "default_repeat_count")]
    pub repeat_count: u32,
    #[serde(default)]
    pub chain_mode: ChainMode,
    /// Leaves the manifest and results file untouched.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_spack_env() -> String {
    "software-performance-study".to_string()
}

fn default_ranks_per_node() -> u32 {
    32
}

fn default_build_script() -> PathBuf {
    PathBuf::from("build-dependencies.slurm")
}

fn default_run_script() -> PathBuf {
    PathBuf::from("run-experiment.slurm")
}

fn default_max_build_time() -> String {
    "01:00:00".to_string()
}

fn default_csv_file() -> String {
    "data.csv".to_string()
}

fn default_repeat_count() -> u32 {
    1
}

impl Default for ScheduleOptions {
    fn default() -> Self {
        Self {
            spack_env: default_spack_env(),
            output_root: PathBuf::from("."),
            ranks_per_node: default_ranks_per_node(),
            build_script: default_build_script(),
            run_script: default_run_script(),
            max_build_time: default_max_build_time(),
            profile: false,
            csv_file: default_csv_file(),
            repeat_count: default_repeat_count(),
            chain_mode: ChainMode::default(),
            dry_run: false,
        }
    }
}

impl ScheduleOptions {
    pub fn validate(&self) -> Result<(), SwsError> {
        if self.repeat_count == 0 {
            return Err(SwsError::Config(
                ErrorInfo::new("schedule-repeat", "repeat count must be at least 1")
                    .with_hint("pass -n 1 or more"),
            ));
        }
        if self.ranks_per_node == 0 {
            return Err(SwsError::Config(ErrorInfo::new(
                "schedule-ranks-per-node",
                "ranks per node must be at least 1",
            )));
        }
        Ok(())
    }
}

fn absolute(path: &Path) -> Result<PathBuf, SwsError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|err| {
        SwsError::Config(
            ErrorInfo::new("schedule-cwd", err.to_string()).with_path(path),
        )
    })?;
    Ok(cwd.join(path))
}

fn build_submission(options: &ScheduleOptions, root: &Path) -> JobSubmission {
    JobSubmission {
        job_name: "build-dependencies".to_string(),
        stdout_path: root.join("build-%A.stdout"),
        stderr_path: root.join("build-%A.stderr"),
        node_count: 1,
        task_count: None,
        tasks_per_node: None,
        wall_time: options.max_build_time.clone(),
        dependency: None,
        script_path: options.build_script.clone(),
        env: BTreeMap::from([("SPACK_ENV_NAME".to_string(), options.spack_env.clone())]),
    }
}

fn run_submission(
    descriptor: &ExperimentDescriptor,
    options: &ScheduleOptions,
    root: &Path,
    dependency: DependencySpec,
    env: BTreeMap<String, String>,
) -> JobSubmission {
    JobSubmission {
        job_name: "run-experiment".to_string(),
        stdout_path: root.join("run-%A.stdout"),
        stderr_path: root.join("run-%A.stderr"),
        node_count: node_count(descriptor.ranks, options.ranks_per_node),
        task_count: Some(descriptor.ranks),
        tasks_per_node: Some(options.ranks_per_node),
        wall_time: descriptor.max_wall_time.clone(),
        dependency: Some(dependency),
        script_path: options.run_script.clone(),
        env,
    }
}

/// Submits one dependency build job followed by `repeat_count` run jobs per
/// experiment, chained according to `options.chain_mode`.
///
/// Failing to locate or write the manifest, to initialize the results file or
/// to submit the build job aborts before any run is submitted. Run submission
/// failures are recorded and the chain continues from the last accepted job.
pub fn schedule(
    experiments: &ExperimentSet,
    options: &ScheduleOptions,
    package_manager: &dyn PackageManager,
    batch: &mut dyn BatchScheduler,
) -> Result<Vec<JobRecord>, SwsError> {
    options.validate()?;
    for experiment in experiments {
        experiment.validate()?;
    }
    let root = absolute(&options.output_root)?;

    let manifest = DependencyManifest::collect(experiments)?;
    info!(
        packages = manifest.packages.len(),
        mpis = manifest.mpis.len(),
        compilers = manifest.compilers.len(),
        "collected dependencies"
    );
    let manifest_path = package_manager.manifest_path(&options.spack_env)?;
    let results = ResultsFile::new(root.join(&options.csv_file));
    if options.dry_run {
        info!(path = %manifest_path.display(), "dry run, manifest not written");
    } else {
        info!(path = %manifest_path.display(), "writing dependency manifest");
        package_manager.write_dependency_manifest(&manifest_path, &manifest)?;
        results.initialize()?;
    }

    let build = build_submission(options, &root);
    let build_id = batch.submit(&build).map_err(|err| {
        error!(error = %err, "build job submission failed");
        err
    })?;
    info!(id = %build_id, "submitted build job");

    let mut records = vec![JobRecord {
        kind: JobKind::Build,
        descriptor: None,
        dependency_ids: BTreeSet::new(),
        env: build.env,
        status: JobStatus::Submitted(build_id.clone()),
    }];

    info!(
        jobs = experiments.len() * options.repeat_count as usize,
        "submitting run jobs"
    );
    let context = RunEnvContext {
        spack_env: &options.spack_env,
        output_root: &root,
        csv_file: &options.csv_file,
        profile: options.profile,
    };
    let mut previous: JobId = build_id.clone();
    for experiment in experiments {
        let env = match run_env(experiment, &context, package_manager) {
            Ok(env) => env,
            Err(err) => {
                for _ in 0..options.repeat_count {
                    records.push(JobRecord {
                        kind: JobKind::Run,
                        descriptor: Some(experiment.clone()),
                        dependency_ids: BTreeSet::new(),
                        env: BTreeMap::new(),
                        status: JobStatus::Skipped(err.to_string()),
                    });
                }
                continue;
            }
        };
        for repetition in 0..options.repeat_count {
            let dependency = DependencySpec {
                after_ok: build_id.clone(),
                after_any: previous.clone(),
            };
            let dependency_ids = dependency.ids();
            let job = run_submission(experiment, options, &root, dependency, env.clone());
            let status = match batch.submit(&job) {
                Ok(id) => {
                    if options.chain_mode == ChainMode::Sync {
                        previous = id.clone();
                    }
                    JobStatus::Submitted(id)
                }
                Err(err) => {
                    warn!(app = %experiment.app_name, repetition, error = %err, "run job submission failed");
                    JobStatus::Failed(err.to_string())
                }
            };
            records.push(JobRecord {
                kind: JobKind::Run,
                descriptor: Some(experiment.clone()),
                dependency_ids,
                env: job.env,
                status,
            });
        }
    }
    Ok(records)
}

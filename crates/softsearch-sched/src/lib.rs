//! Build and run job scheduling for enumerated software experiments.
//!
//! [`schedule`] turns an [`ExperimentSet`](softsearch_core::ExperimentSet)
//! into one dependency build job and a chain of run jobs. The package manager
//! and batch scheduler sit behind the [`PackageManager`] and
//! [`BatchScheduler`] traits; [`Spack`] and [`Sbatch`] talk to the real tools
//! and [`DryRunBatch`] only prints what would be submitted.

pub mod env;
mod interfaces;
mod manifest;
mod results;
mod runner;
mod schedule;
mod slurm;
mod spack;

pub use env::{escape_quotes, node_count, run_env, source_dir, RunEnvContext};
pub use interfaces::{BatchScheduler, JobSubmission, PackageManager};
pub use manifest::DependencyManifest;
pub use results::{ResultRow, ResultsFile, RESULTS_HEADER};
pub use runner::{
    run_search, spec_digest, CommandRunner, MpiLaunch, PointReport, SearchDriverOptions,
    SearchPlan, ShellRunner,
};
pub use schedule::{schedule, ScheduleOptions};
pub use slurm::{parse_job_id, DryRunBatch, Sbatch};
pub use spack::Spack;

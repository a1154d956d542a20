use std::error::Error;
use std::io;
use std::path::PathBuf;

use clap::Args;
use softsearch_core::{ChainMode, JobRecord, JobStatus};
use softsearch_exp::read_experiment_set;
use softsearch_sched::{schedule, DryRunBatch, Sbatch, ScheduleOptions, Spack};
use tracing::{info, warn};

#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Experiments file written by `softsearch generate`.
    #[arg(short, long)]
    pub input: PathBuf,
    /// Print the sbatch commands instead of running them.
    #[arg(long, alias = "dry-run")]
    pub dry: bool,
    /// Let every run depend on the build job only, so runs may overlap.
    #[arg(long)]
    pub independent: bool,
    #[arg(long, default_value_t = 32)]
    pub ranks_per_node: u32,
    #[arg(long, default_value = "build-dependencies.slurm")]
    pub build_script: PathBuf,
    #[arg(long, default_value = "run-experiment.slurm")]
    pub run_script: PathBuf,
    #[arg(long, default_value = "01:00:00")]
    pub max_build_time: String,
    /// Record HPCToolkit profiles.
    #[arg(long)]
    pub profile: bool,
    /// Directory receiving job logs and the results file.
    #[arg(long)]
    pub output_root: PathBuf,
    #[arg(long, default_value = "software-performance-study")]
    pub spack_env: String,
    /// Results file name inside the output root.
    #[arg(long, default_value = "data.csv")]
    pub csv_file: String,
    /// How many times to run each experiment.
    #[arg(short = 'n', long, default_value_t = 1)]
    pub repeat_experiments: u32,
}

impl SubmitArgs {
    fn options(&self) -> ScheduleOptions {
        ScheduleOptions {
            spack_env: self.spack_env.clone(),
            output_root: self.output_root.clone(),
            ranks_per_node: self.ranks_per_node,
            build_script: self.build_script.clone(),
            run_script: self.run_script.clone(),
            max_build_time: self.max_build_time.clone(),
            profile: self.profile,
            csv_file: self.csv_file.clone(),
            repeat_count: self.repeat_experiments,
            chain_mode: if self.independent {
                ChainMode::Independent
            } else {
                ChainMode::Sync
            },
            dry_run: self.dry,
        }
    }
}

pub fn run(args: &SubmitArgs) -> Result<(), Box<dyn Error>> {
    let experiments = read_experiment_set(&args.input)?;
    let options = args.options();
    let spack = Spack::default();
    let records = if args.dry {
        let mut batch = DryRunBatch::new(io::stdout());
        schedule(&experiments, &options, &spack, &mut batch)?
    } else {
        let mut batch = Sbatch::default();
        schedule(&experiments, &options, &spack, &mut batch)?
    };
    report(&records);
    Ok(())
}

fn report(records: &[JobRecord]) {
    let (mut submitted, mut failed, mut skipped) = (0usize, 0usize, 0usize);
    for record in records {
        match &record.status {
            JobStatus::Submitted(_) => submitted += 1,
            JobStatus::Failed(_) => failed += 1,
            JobStatus::Skipped(_) => skipped += 1,
        }
    }
    if failed + skipped > 0 {
        warn!(submitted, failed, skipped, "some runs were not submitted");
    } else {
        info!(submitted, "all jobs submitted");
    }
}

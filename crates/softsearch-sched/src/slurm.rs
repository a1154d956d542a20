use std::io::Write;
use std::process::Command;

use softsearch_core::errors::{ErrorInfo, SwsError};
use softsearch_core::JobId;
use tracing::{debug, info};

use crate::interfaces::{BatchScheduler, JobSubmission};

/// Slurm adapter that enqueues jobs through `sbatch`.
#[derive(Debug, Clone)]
pub struct Sbatch {
    program: String,
}

impl Default for Sbatch {
    fn default() -> Self {
        Self::new("sbatch")
    }
}

impl Sbatch {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Full argument vector, program first, executed for `job`.
    pub fn render(&self, job: &JobSubmission) -> Vec<String> {
        render_with(&self.program, job)
    }
}

fn render_with(program: &str, job: &JobSubmission) -> Vec<String> {
    let mut argv = vec![
        program.to_string(),
        "-J".to_string(),
        job.job_name.clone(),
        "-o".to_string(),
        job.stdout_path.display().to_string(),
        "-e".to_string(),
        job.stderr_path.display().to_string(),
        "-N".to_string(),
        job.node_count.to_string(),
    ];
    if let Some(tasks) = job.task_count {
        argv.push("-n".to_string());
        argv.push(tasks.to_string());
    }
    if let Some(per_node) = job.tasks_per_node {
        argv.push("--ntasks-per-node".to_string());
        argv.push(per_node.to_string());
    }
    argv.push("-t".to_string());
    argv.push(job.wall_time.clone());
    if let Some(dependency) = &job.dependency {
        argv.push("--dependency".to_string());
        argv.push(dependency.to_string());
    }
    argv.push(job.script_path.display().to_string());
    argv
}

/// Extracts the job id from `sbatch` output: the last whitespace separated
/// token, e.g. `Submitted batch job 4242`.
pub fn parse_job_id(stdout: &str) -> Option<JobId> {
    stdout.split_whitespace().last().map(JobId::new)
}

impl BatchScheduler for Sbatch {
    fn submit(&mut self, job: &JobSubmission) -> Result<JobId, SwsError> {
        let argv = self.render(job);
        debug!(command = %argv.join(" "), "submitting batch job");
        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .envs(&job.env)
            .output()
            .map_err(|err| {
                SwsError::Submission(
                    ErrorInfo::new("sbatch-spawn", err.to_string())
                        .with_job(job.job_name.clone())
                        .with_hint("is Slurm available on this host?"),
                )
            })?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            return Err(SwsError::Submission(
                ErrorInfo::new(
                    "sbatch-exit",
                    String::from_utf8_lossy(&output.stderr).trim().to_string(),
                )
                .with_job(job.job_name.clone())
                .with_context("status", output.status.to_string()),
            ));
        }
        let id = parse_job_id(&stdout).ok_or_else(|| {
            SwsError::Submission(
                ErrorInfo::new("sbatch-no-id", "sbatch printed no job id")
                    .with_job(job.job_name.clone()),
            )
        })?;
        info!(job = %job.job_name, id = %id, "submitted");
        Ok(id)
    }
}

/// Renders `sbatch` commands into a writer instead of executing them and
/// hands out `dry-0`, `dry-1`, ... as ids.
#[derive(Debug)]
pub struct DryRunBatch<W: Write> {
    out: W,
    program: String,
    issued: usize,
}

impl<W: Write> DryRunBatch<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            program: "sbatch".to_string(),
            issued: 0,
        }
    }

    pub fn issued(&self) -> usize {
        self.issued
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> BatchScheduler for DryRunBatch<W> {
    fn submit(&mut self, job: &JobSubmission) -> Result<JobId, SwsError> {
        let mut line = String::new();
        for (key, value) in &job.env {
            line.push_str(&format!("{key}={value} "));
        }
        line.push_str(&render_with(&self.program, job).join(" "));
        writeln!(self.out, "{line}").map_err(|err| {
            SwsError::Submission(
                ErrorInfo::new("dry-run-write", err.to_string())
                    .with_job(job.job_name.clone()),
            )
        })?;
        let id = JobId::new(format!("dry-{}", self.issued));
        self.issued += 1;
        Ok(id)
    }
}

//! Local build-and-run loop driving a search strategy.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use softsearch_core::errors::{ErrorInfo, SwsError};
use softsearch_core::{Candidate, Compiler, Component};
use softsearch_exp::{SearchPoint, SearchStrategy};
use tracing::{debug, info, warn};

use crate::interfaces::PackageManager;

/// Executes shell command lines.
pub trait CommandRunner {
    /// Runs `command` to completion and returns its exit code.
    fn run(&mut self, command: &str) -> Result<i32, SwsError>;
}

/// Runs commands through `sh -c`.
#[derive(Debug, Clone, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&mut self, command: &str) -> Result<i32, SwsError> {
        debug!(command, "running");
        let status = Command::new("sh")
            .arg("-c")
            .arg(command)
            .status()
            .map_err(|err| {
                SwsError::Search(
                    ErrorInfo::new("command-spawn", err.to_string()).with_context("command", command),
                )
            })?;
        Ok(status.code().unwrap_or(-1))
    }
}

/// MPI launcher settings for the timed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpiLaunch {
    pub ranks: u32,
    #[serde(default = "default_mpi_command")]
    pub command: String,
}

fn default_mpi_command() -> String {
    "mpirun".to_string()
}

/// Search space read from a YAML plan file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPlan {
    pub component: Component,
    pub compilers: Vec<Compiler>,
    /// One group per dependency slot; each group lists single choices or ranges.
    #[serde(default)]
    pub dependencies: Vec<Vec<Candidate>>,
    #[serde(default)]
    pub mpi: Option<MpiLaunch>,
}

impl SearchPlan {
    pub fn from_yaml_str(text: &str) -> Result<Self, SwsError> {
        let plan: Self = serde_yaml::from_str(text).map_err(|err| {
            SwsError::Config(
                ErrorInfo::new("plan-yaml", err.to_string())
                    .with_hint("a plan needs `component` and `compilers`"),
            )
        })?;
        for group in &plan.dependencies {
            Candidate::validate_group(group)?;
        }
        Ok(plan)
    }

    pub fn load(path: &Path) -> Result<Self, SwsError> {
        let text = fs::read_to_string(path).map_err(|err| {
            SwsError::Config(
                ErrorInfo::new("plan-read", err.to_string()).with_path(path),
            )
        })?;
        Self::from_yaml_str(&text)
    }
}

/// Switches for one search run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchDriverOptions {
    pub spack_env: Option<String>,
    /// Receives `<sha256(spec)>-build.stdout` install logs.
    pub output_dir: Option<PathBuf>,
    pub skip_build: bool,
    pub skip_run: bool,
    pub dry_run: bool,
}

/// What happened at one search point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointReport {
    pub spec: String,
    pub build_commands: Vec<String>,
    pub run_commands: Vec<String>,
    #[serde(default)]
    pub build_status: Option<i32>,
    #[serde(default)]
    pub run_status: Option<i32>,
    /// Wall-clock seconds of the timed command.
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Hex SHA-256 of a spec, used to name its build log.
pub fn spec_digest(spec: &str) -> String {
    format!("{:x}", Sha256::digest(spec.as_bytes()))
}

fn build_log(options: &SearchDriverOptions, spec: &str) -> Option<PathBuf> {
    options
        .output_dir
        .as_ref()
        .map(|dir| dir.join(format!("{}-build.stdout", spec_digest(spec))))
}

fn build_commands(
    options: &SearchDriverOptions,
    package_manager: &dyn PackageManager,
    spec: &str,
) -> Vec<String> {
    let mut command = package_manager.install_command(spec).join(" ");
    if let Some(log) = build_log(options, spec) {
        command.push_str(&format!(" > {}", log.display()));
    }
    vec![command]
}

fn run_commands(
    options: &SearchDriverOptions,
    plan: &SearchPlan,
    spec: &str,
) -> Vec<String> {
    let mut commands = Vec::new();
    match &options.spack_env {
        Some(env) => {
            commands.push(format!("spack env activate {env}"));
            commands.push(format!("spack -e {env} load {spec}"));
        }
        None => commands.push(format!("spack load {spec}")),
    }
    let target = plan.component.run_command();
    commands.push(match &plan.mpi {
        Some(mpi) => format!("{} -np {} {target}", mpi.command, mpi.ranks),
        None => target,
    });
    commands
}

/// Drives `strategy` over the plan's space, building and running every point.
///
/// A build that exits non-zero skips that point's run; a failing setup
/// command skips the timed command. Durations are fed back to the strategy.
pub fn run_search(
    strategy: &mut dyn SearchStrategy,
    plan: &SearchPlan,
    options: &SearchDriverOptions,
    package_manager: &dyn PackageManager,
    runner: &mut dyn CommandRunner,
) -> Result<Vec<PointReport>, SwsError> {
    strategy.set_component(plan.component.clone());
    strategy.set_compiler_space(plan.compilers.clone());
    strategy.set_dependency_space(plan.dependencies.clone());
    let points: Vec<SearchPoint> = strategy.iterate()?.collect();
    info!(points = points.len(), component = %plan.component.name, "starting search");

    if let (Some(dir), false) = (&options.output_dir, options.dry_run) {
        fs::create_dir_all(dir).map_err(|err| {
            SwsError::Search(
                ErrorInfo::new("output-dir", err.to_string()).with_path(dir),
            )
        })?;
    }

    let mut reports = Vec::with_capacity(points.len());
    for point in points {
        let spec = plan
            .component
            .spec(Some(&point.compiler), &point.dependencies);
        let mut report = PointReport {
            build_commands: if options.skip_build {
                Vec::new()
            } else {
                build_commands(options, package_manager, &spec)
            },
            run_commands: if options.skip_run {
                Vec::new()
            } else {
                run_commands(options, plan, &spec)
            },
            spec,
            build_status: None,
            run_status: None,
            duration: None,
        };
        if options.dry_run {
            debug!(spec = %report.spec, "dry run, commands not executed");
            reports.push(report);
            continue;
        }

        if !options.skip_build {
            let log = build_log(options, &report.spec);
            let code = package_manager.install(&report.spec, log.as_deref())?;
            report.build_status = Some(code);
            if code != 0 {
                warn!(spec = %report.spec, code, "build failed, skipping run");
                reports.push(report);
                continue;
            }
        }

        let commands = report.run_commands.clone();
        if let Some((timed, setup)) = commands.split_last() {
            let mut ready = true;
            for command in setup {
                let code = runner.run(command)?;
                if code != 0 {
                    warn!(command = %command, code, "setup command failed");
                    report.run_status = Some(code);
                    ready = false;
                    break;
                }
            }
            if ready {
                let start = Instant::now();
                let code = runner.run(timed)?;
                let seconds = start.elapsed().as_secs_f64();
                info!(spec = %report.spec, code, seconds, "run finished");
                report.run_status = Some(code);
                report.duration = Some(seconds);
                strategy.observe_feedback(seconds);
            }
        }
        reports.push(report);
    }
    Ok(reports)
}

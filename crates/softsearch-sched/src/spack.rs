use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use softsearch_core::errors::{ErrorInfo, SwsError};
use tracing::{debug, warn};

use crate::interfaces::PackageManager;
use crate::manifest::DependencyManifest;

/// Spack command line adapter.
#[derive(Debug, Clone)]
pub struct Spack {
    program: String,
    env: Option<String>,
}

impl Default for Spack {
    fn default() -> Self {
        Self::new("spack")
    }
}

impl Spack {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            env: None,
        }
    }

    /// Runs `install` inside the named environment.
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    fn env_args(&self) -> Vec<String> {
        match &self.env {
            Some(env) => vec!["-e".to_string(), env.clone()],
            None => Vec::new(),
        }
    }

    fn query(&self, args: &[&str]) -> Result<String, ErrorInfo> {
        debug!(program = %self.program, ?args, "spack query");
        let output = Command::new(&self.program)
            .args(args)
            .output()
            .map_err(|err| ErrorInfo::new("spack-spawn", err.to_string()))?;
        if !output.status.success() {
            return Err(ErrorInfo::new(
                "spack-exit",
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            )
            .with_context("status", output.status.to_string()));
        }
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            return Err(ErrorInfo::new("spack-empty", "spack printed nothing"));
        }
        Ok(text)
    }
}

impl PackageManager for Spack {
    fn manifest_path(&self, env: &str) -> Result<PathBuf, SwsError> {
        self.query(&["-e", env, "config", "edit", "--print-file"])
            .map(PathBuf::from)
            .map_err(|info| {
                SwsError::Manifest(
                    info.with_context("env", env)
                        .with_hint("create the environment with `spack env create`"),
                )
            })
    }

    fn resolve_install_path(&self, spec: &str) -> Result<PathBuf, SwsError> {
        let mut args = vec!["location", "-i"];
        args.extend(spec.split_whitespace());
        self.query(&args)
            .map(PathBuf::from)
            .map_err(|info| SwsError::Resolution(info.with_spec(spec)))
    }

    fn resolve_environment_path(&self, env: &str) -> Result<PathBuf, SwsError> {
        self.query(&["location", "-e", env])
            .map(PathBuf::from)
            .map_err(|info| SwsError::Resolution(info.with_context("env", env)))
    }

    fn write_dependency_manifest(
        &self,
        path: &Path,
        manifest: &DependencyManifest,
    ) -> Result<(), SwsError> {
        let yaml = manifest.to_spack_yaml()?;
        fs::write(path, yaml).map_err(|err| {
            SwsError::Manifest(
                ErrorInfo::new("manifest-write", err.to_string()).with_path(path),
            )
        })
    }

    fn install_command(&self, spec: &str) -> Vec<String> {
        let mut argv = vec![self.program.clone()];
        argv.extend(self.env_args());
        argv.push("install".to_string());
        argv.push("--reuse".to_string());
        argv.extend(spec.split_whitespace().map(str::to_string));
        argv
    }

    fn install(&self, spec: &str, log: Option<&Path>) -> Result<i32, SwsError> {
        let argv = self.install_command(spec);
        let mut command = Command::new(&argv[0]);
        command.args(&argv[1..]);
        if let Some(log) = log {
            let file = File::create(log).map_err(|err| {
                SwsError::Resolution(
                    ErrorInfo::new("install-log", err.to_string()).with_path(log),
                )
            })?;
            command.stdout(Stdio::from(file));
        }
        let status = command.status().map_err(|err| {
            SwsError::Resolution(
                ErrorInfo::new("spack-spawn", err.to_string()).with_spec(spec),
            )
        })?;
        let code = status.code().unwrap_or(-1);
        if code != 0 {
            warn!(spec, code, "spack install failed");
        }
        Ok(code)
    }
}

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use softsearch_core::errors::{ErrorInfo, SwsError};
use softsearch_core::{to_canonical_json_string, ExperimentDescriptor};
use tracing::{debug, warn};

use crate::interfaces::PackageManager;

/// Nodes needed to host `ranks` tasks at `ranks_per_node` tasks each.
pub fn node_count(ranks: u32, ranks_per_node: u32) -> u32 {
    ranks.div_ceil(ranks_per_node.max(1))
}

/// Escapes double and single quotes with a backslash so the value survives
/// the shell in the run script.
pub fn escape_quotes(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch == '"' || ch == '\'' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Directory holding the application sources of an experiment: the install
/// prefix's `share/<app>/src`, or the environment root when the spec is not
/// installed yet.
pub fn source_dir(
    descriptor: &ExperimentDescriptor,
    spack_env: &str,
    package_manager: &dyn PackageManager,
) -> Result<PathBuf, SwsError> {
    let spec = descriptor.root_spec()?;
    match package_manager.resolve_install_path(&spec) {
        Ok(prefix) => Ok(prefix.join("share").join(&descriptor.app_name).join("src")),
        Err(install_err) => {
            debug!(%spec, error = %install_err, "install prefix unavailable, using environment root");
            package_manager
                .resolve_environment_path(spack_env)
                .map_err(|env_err| {
                    SwsError::Resolution(
                        ErrorInfo::new("source-dir-unresolved", "no install prefix or environment root")
                            .with_spec(spec)
                            .with_context("install", install_err.to_string())
                            .with_context("environment", env_err.to_string()),
                    )
                })
        }
    }
}

/// Settings shared by every run job's environment.
#[derive(Debug, Clone, Copy)]
pub struct RunEnvContext<'a> {
    pub spack_env: &'a str,
    pub output_root: &'a Path,
    pub csv_file: &'a str,
    pub profile: bool,
}

/// Environment variables the run script reads.
pub fn run_env(
    descriptor: &ExperimentDescriptor,
    context: &RunEnvContext<'_>,
    package_manager: &dyn PackageManager,
) -> Result<BTreeMap<String, String>, SwsError> {
    let spec = descriptor.root_spec()?;
    let src_dir = source_dir(descriptor, context.spack_env, package_manager).map_err(|err| {
        warn!(app = %descriptor.app_name, %spec, "could not locate sources, skipping run");
        err
    })?;
    let json = to_canonical_json_string(descriptor)?;
    let vars = [
        ("SPACK_ENV_NAME", context.spack_env.to_string()),
        ("SPACK_SPEC", spec),
        ("PROFILE", if context.profile { "1" } else { "0" }.to_string()),
        ("APP_NAME", descriptor.app_name.clone()),
        ("APP_ARGS", descriptor.input.clone()),
        ("SRC_DIR", src_dir.display().to_string()),
        ("MODULE_LIST", descriptor.modules().join(" ")),
        ("OUTPUT_ROOT", context.output_root.display().to_string()),
        ("EXPERIMENT_JSON", escape_quotes(&json)),
        (
            "CSV_FILE",
            context.output_root.join(context.csv_file).display().to_string(),
        ),
    ];
    Ok(vars
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect())
}

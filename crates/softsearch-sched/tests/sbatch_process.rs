#![cfg(unix)]

use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use softsearch_core::{JobId, SwsError};
use softsearch_sched::{BatchScheduler, JobSubmission, Sbatch};

fn fake_sbatch(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("sbatch");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn build_job(dir: &Path) -> JobSubmission {
    JobSubmission {
        job_name: "build-dependencies".into(),
        stdout_path: dir.join("build-%A.stdout"),
        stderr_path: dir.join("build-%A.stderr"),
        node_count: 1,
        task_count: None,
        tasks_per_node: None,
        wall_time: "01:00:00".into(),
        dependency: None,
        script_path: PathBuf::from("build-dependencies.slurm"),
        env: BTreeMap::from([("SPACK_ENV_NAME".to_string(), "study".to_string())]),
    }
}

// One test so no other thread forks while a script is still open for writing.
#[test]
fn sbatch_program_round_trip() {
    let dir = tempfile::tempdir().unwrap();

    let program = fake_sbatch(dir.path(), r#"echo "Submitted batch job 7$SPACK_ENV_NAME""#);
    let mut sbatch = Sbatch::new(program.display().to_string());
    let id = sbatch.submit(&build_job(dir.path())).unwrap();
    assert_eq!(id, JobId::new("7study"));

    let log = dir.path().join("args");
    let program = fake_sbatch(
        dir.path(),
        &format!("echo \"$@\" > {}\necho 1", log.display()),
    );
    let mut sbatch = Sbatch::new(program.display().to_string());
    sbatch.submit(&build_job(dir.path())).unwrap();
    let args = fs::read_to_string(&log).unwrap();
    assert!(args.starts_with("-J build-dependencies -o "));
    assert!(args.trim_end().ends_with("-N 1 -t 01:00:00 build-dependencies.slurm"));

    let program = fake_sbatch(dir.path(), "echo 'sbatch: error: invalid partition' >&2\nexit 1");
    let mut sbatch = Sbatch::new(program.display().to_string());
    let err = sbatch.submit(&build_job(dir.path())).unwrap_err();
    assert!(matches!(err, SwsError::Submission(_)));
    assert_eq!(err.info().code, "sbatch-exit");
    assert!(err.info().message.contains("invalid partition"));
}

mod common;

use softsearch_core::{ChainMode, JobId, JobKind, JobStatus};
use softsearch_sched::{schedule, ScheduleOptions};

use common::{experiments, FakeBatch, FakeSpack};

fn options(root: &std::path::Path, chain_mode: ChainMode, repeat_count: u32) -> ScheduleOptions {
    ScheduleOptions {
        output_root: root.to_path_buf(),
        chain_mode,
        repeat_count,
        ..ScheduleOptions::default()
    }
}

fn after_any(batch: &FakeBatch) -> Vec<String> {
    batch.submitted[1..]
        .iter()
        .map(|job| job.dependency.as_ref().unwrap().after_any.to_string())
        .collect()
}

#[test]
fn sync_chains_each_run_on_the_previous_one() {
    let dir = tempfile::tempdir().unwrap();
    let spack = FakeSpack::installed("/opt/app");
    let mut batch = FakeBatch::new();
    let records = schedule(
        &experiments(3),
        &options(dir.path(), ChainMode::Sync, 1),
        &spack,
        &mut batch,
    )
    .unwrap();

    assert_eq!(records.len(), 4);
    assert_eq!(records[0].kind, JobKind::Build);
    assert_eq!(records[0].job_id(), Some(&JobId::new("100")));
    assert_eq!(after_any(&batch), vec!["100", "101", "102"]);
    for job in &batch.submitted[1..] {
        assert_eq!(job.dependency.as_ref().unwrap().after_ok, JobId::new("100"));
    }
}

#[test]
fn independent_runs_all_wait_on_the_build() {
    let dir = tempfile::tempdir().unwrap();
    let spack = FakeSpack::installed("/opt/app");
    let mut batch = FakeBatch::new();
    schedule(
        &experiments(3),
        &options(dir.path(), ChainMode::Independent, 2),
        &spack,
        &mut batch,
    )
    .unwrap();

    assert_eq!(batch.submitted.len(), 7);
    assert!(after_any(&batch).iter().all(|id| id == "100"));
}

#[test]
fn repetitions_extend_the_sync_chain() {
    let dir = tempfile::tempdir().unwrap();
    let spack = FakeSpack::installed("/opt/app");
    let mut batch = FakeBatch::new();
    let records = schedule(
        &experiments(2),
        &options(dir.path(), ChainMode::Sync, 2),
        &spack,
        &mut batch,
    )
    .unwrap();

    assert_eq!(after_any(&batch), vec!["100", "101", "102", "103"]);
    let apps: Vec<&str> = records[1..]
        .iter()
        .map(|record| record.descriptor.as_ref().unwrap().app_name.as_str())
        .collect();
    assert_eq!(apps, vec!["app0", "app0", "app1", "app1"]);
}

#[test]
fn sync_skips_over_a_failed_submission() {
    let dir = tempfile::tempdir().unwrap();
    let spack = FakeSpack::installed("/opt/app");
    // call 0 is the build job, call 2 the second run
    let mut batch = FakeBatch::failing(&[2]);
    let records = schedule(
        &experiments(3),
        &options(dir.path(), ChainMode::Sync, 1),
        &spack,
        &mut batch,
    )
    .unwrap();

    assert!(matches!(records[2].status, JobStatus::Failed(_)));
    assert_eq!(after_any(&batch), vec!["100", "101", "101"]);
    assert_eq!(records[3].job_id(), Some(&JobId::new("102")));
}

#[test]
fn dependency_ids_are_recorded_per_run() {
    let dir = tempfile::tempdir().unwrap();
    let spack = FakeSpack::installed("/opt/app");
    let mut batch = FakeBatch::new();
    let records = schedule(
        &experiments(2),
        &options(dir.path(), ChainMode::Sync, 1),
        &spack,
        &mut batch,
    )
    .unwrap();

    assert!(records[0].dependency_ids.is_empty());
    assert_eq!(records[1].dependency_ids.len(), 1);
    let second: Vec<&str> = records[2].dependency_ids.iter().map(JobId::as_str).collect();
    assert_eq!(second, vec!["100", "101"]);
}

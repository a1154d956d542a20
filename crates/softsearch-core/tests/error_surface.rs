use std::path::Path;

use softsearch_core::errors::{ErrorInfo, SwsError};

fn sample_info(code: &str, message: &str) -> ErrorInfo {
    ErrorInfo::new(code, message)
        .with_spec("laghos@3.1")
        .with_context("reason", "example")
}

#[test]
fn config_error_surface() {
    let err = SwsError::Config(sample_info("C001", "malformed document"));
    assert_eq!(err.code(), "C001");
    assert_eq!(err.family(), "config");
    assert_eq!(err.info().spec(), Some("laghos@3.1"));
}

#[test]
fn manifest_error_names_the_file() {
    let info = ErrorInfo::new("M001", "no write location").with_path(Path::new("/tmp/spack.yaml"));
    assert_eq!(info.path(), Some("/tmp/spack.yaml"));
    let err = SwsError::Manifest(info);
    assert_eq!(
        err.to_string(),
        "manifest error: no write location [M001] path=/tmp/spack.yaml"
    );
}

#[test]
fn submission_error_surface() {
    let err = SwsError::Submission(
        ErrorInfo::new("S001", "sbatch rejected job")
            .with_job("run-experiment")
            .with_hint("check the partition"),
    );
    assert_eq!(err.info().context["job"], "run-experiment");
    assert_eq!(
        err.to_string(),
        "submission error: sbatch rejected job [S001] job=run-experiment; hint: check the partition"
    );
}

#[test]
fn errors_roundtrip_through_json() {
    let err = SwsError::Resolution(sample_info("R001", "spec not installed"));
    let json = serde_json::to_string(&err).unwrap();
    assert!(json.contains("\"family\":\"Resolution\""));
    let back: SwsError = serde_json::from_str(&json).unwrap();
    assert_eq!(back, err);
}

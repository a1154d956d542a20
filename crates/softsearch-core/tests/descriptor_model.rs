use indexmap::IndexMap;
use softsearch_core::{
    to_canonical_json_string, ExperimentDescriptor, ExperimentSet, SoftwareChoice,
};

fn descriptor(compiler: &str, mpi_version: &str) -> ExperimentDescriptor {
    let mut roles = IndexMap::new();
    roles.insert(
        "compiler".to_string(),
        SoftwareChoice::new("compiler", compiler, "9.4.0").with_module(format!("{compiler}/9.4.0")),
    );
    roles.insert(
        "mpi".to_string(),
        SoftwareChoice::new("mpi", "openmpi", mpi_version),
    );
    roles.insert(
        "blas".to_string(),
        SoftwareChoice::new("blas", "openblas", "0.3.12").with_module("openblas"),
    );
    ExperimentDescriptor {
        roles,
        input: "-p 1 -dim 3".to_string(),
        ranks: 64,
        spec: "laghos@3.1".to_string(),
        app_name: "laghos".to_string(),
        max_wall_time: "00:15:00".to_string(),
    }
}

#[test]
fn root_spec_lists_compiler_mpi_then_libraries() {
    let spec = descriptor("gcc", "4.1.0").root_spec().unwrap();
    assert_eq!(spec, "laghos@3.1%gcc@9.4.0 ^openmpi@4.1.0 ^openblas@0.3.12");
}

#[test]
fn modules_follow_role_order() {
    assert_eq!(descriptor("gcc", "4.1.0").modules(), vec!["gcc/9.4.0", "openblas"]);
}

#[test]
fn missing_mpi_is_a_config_error() {
    let mut d = descriptor("gcc", "4.1.0");
    d.roles.shift_remove("mpi");
    let err = d.validate().unwrap_err();
    assert_eq!(err.info().code, "descriptor-missing-role");
}

#[test]
fn with_role_leaves_original_untouched() {
    let original = descriptor("gcc", "4.1.0");
    let rewritten = original.with_role("mpi", SoftwareChoice::new("x", "mvapich2", "2.3.4"));
    assert_eq!(original.mpi().unwrap().name, "openmpi");
    assert_eq!(rewritten.mpi().unwrap().name, "mvapich2");
    assert_eq!(rewritten.mpi().unwrap().role, "mpi");
}

#[test]
fn serialized_shape_keeps_roles_at_top_level() {
    let json = to_canonical_json_string(&descriptor("gcc", "4.1.0")).unwrap();
    assert!(json.contains("\"app name\":\"laghos\""));
    assert!(json.contains("\"max wall time\":\"00:15:00\""));
    assert!(json.contains("\"mpi\":{"));
    let back: ExperimentDescriptor = serde_json::from_str(&json).unwrap();
    assert_eq!(back.roles.len(), 3);
    assert_eq!(back.ranks, 64);
}

#[test]
fn join_keeps_duplicates() {
    let a: ExperimentSet = vec![descriptor("gcc", "4.1.0")].into();
    let b: ExperimentSet = vec![descriptor("gcc", "4.1.0"), descriptor("intel", "4.0.5")].into();
    let joined = a.join(b);
    assert_eq!(joined.len(), 3);
    assert_eq!(joined.as_slice()[0], joined.as_slice()[1]);
}

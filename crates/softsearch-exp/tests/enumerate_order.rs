use indexmap::IndexMap;
use proptest::prelude::*;
use softsearch_core::SoftwareChoice;
use softsearch_exp::{enumerate, generate, EnumerationRequest};

fn choices(role: &str, names: &[(&str, &str)]) -> Vec<SoftwareChoice> {
    names
        .iter()
        .map(|(name, version)| SoftwareChoice::new(role, *name, *version))
        .collect()
}

fn request(inputs: Vec<&str>, ranks: Vec<u32>) -> EnumerationRequest {
    let mut roles = IndexMap::new();
    roles.insert(
        "compiler".to_string(),
        choices("compiler", &[("gcc", "8.3.1"), ("intel", "19.1")]),
    );
    roles.insert(
        "mpi".to_string(),
        choices("mpi", &[("openmpi", "4.0"), ("openmpi", "4.1")]),
    );
    EnumerationRequest {
        roles,
        inputs: inputs.into_iter().map(String::from).collect(),
        ranks,
        spec: "laghos@3.1".to_string(),
        app_name: "laghos".to_string(),
        max_wall_time: "00:15:00".to_string(),
    }
}

#[test]
fn ranks_vary_fastest_then_inputs_then_roles() {
    let req = request(vec!["a", "b"], vec![32, 64]);
    let out: Vec<_> = enumerate(&req).collect();
    assert_eq!(out.len(), 16);
    let keys: Vec<(String, String, String, u32)> = out
        .iter()
        .map(|d| {
            (
                d.roles["compiler"].name.clone(),
                d.roles["mpi"].version.clone(),
                d.input.clone(),
                d.ranks,
            )
        })
        .collect();
    assert_eq!(keys[0], ("gcc".into(), "4.0".into(), "a".into(), 32));
    assert_eq!(keys[1], ("gcc".into(), "4.0".into(), "a".into(), 64));
    assert_eq!(keys[2], ("gcc".into(), "4.0".into(), "b".into(), 32));
    assert_eq!(keys[4], ("gcc".into(), "4.1".into(), "a".into(), 32));
    assert_eq!(keys[8], ("intel".into(), "4.0".into(), "a".into(), 32));
    assert_eq!(keys[15], ("intel".into(), "4.1".into(), "b".into(), 64));
}

#[test]
fn constant_fields_are_copied_and_inputs_trimmed() {
    let req = request(vec!["\"-p 1 -dim 3\""], vec![64]);
    let first = enumerate(&req).next().unwrap();
    assert_eq!(first.input, "-p 1 -dim 3");
    assert_eq!(first.spec, "laghos@3.1");
    assert_eq!(first.app_name, "laghos");
    assert_eq!(first.max_wall_time, "00:15:00");
    assert_eq!(first.roles["mpi"].role, "mpi");
}

#[test]
fn empty_role_list_yields_nothing() {
    let mut req = request(vec!["a"], vec![64]);
    req.roles.insert("blas".to_string(), Vec::new());
    assert_eq!(enumerate(&req).count(), 0);
    assert_eq!(req.size(), 0);
}

#[test]
fn enumeration_is_reproducible() {
    let req = request(vec!["a", "b"], vec![16, 32, 64]);
    let first: Vec<_> = enumerate(&req).collect();
    let second: Vec<_> = enumerate(&req).collect();
    assert_eq!(first, second);
}

proptest! {
    #[test]
    fn product_size_matches_list_sizes(
        sizes in proptest::collection::vec(1usize..4, 1..4),
        inputs in 1usize..4,
        ranks in 1usize..4,
    ) {
        let mut roles = IndexMap::new();
        for (idx, size) in sizes.iter().enumerate() {
            let role = format!("role{idx}");
            let list = (0..*size)
                .map(|v| SoftwareChoice::new(role.clone(), format!("pkg{idx}"), v.to_string()))
                .collect();
            roles.insert(role, list);
        }
        let req = EnumerationRequest {
            roles,
            inputs: (0..inputs).map(|i| format!("in{i}")).collect(),
            ranks: (1..=ranks as u32).collect(),
            spec: "app".to_string(),
            app_name: "app".to_string(),
            max_wall_time: "00:01:00".to_string(),
        };
        let expected: usize = sizes.iter().product::<usize>() * inputs * ranks;
        let out: Vec<_> = enumerate(&req).collect();
        prop_assert_eq!(out.len(), expected);
        prop_assert_eq!(req.size(), expected);
        prop_assert_eq!(out.last().map(|d| d.ranks), Some(ranks as u32));
    }
}

#[test]
fn zero_rank_count_is_rejected_before_enumeration() {
    let req = request(vec!["a"], vec![32, 0]);
    let err = generate(&req, &[]).unwrap_err();
    assert_eq!(err.info().code, "enumerate-ranks");
    assert_eq!(err.info().context["position"], "1");
    assert!(request(vec!["a"], vec![32, 64]).validate().is_ok());
}

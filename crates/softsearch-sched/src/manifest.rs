use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use softsearch_core::errors::{ErrorInfo, SwsError};
use softsearch_core::ExperimentSet;

/// Distinct root specs, MPI specs and compiler specs across an experiment set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyManifest {
    pub packages: BTreeSet<String>,
    pub mpis: BTreeSet<String>,
    /// Compiler specs carry their `%` prefix.
    pub compilers: BTreeSet<String>,
}

#[derive(Serialize)]
struct SpackEnvironment {
    spack: SpackSection,
}

#[derive(Serialize)]
struct SpackSection {
    definitions: Vec<BTreeMap<&'static str, Vec<String>>>,
    specs: Vec<SpecEntry>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum SpecEntry {
    Matrix { matrix: Vec<Vec<String>> },
    Reference(String),
}

impl DependencyManifest {
    pub fn collect(experiments: &ExperimentSet) -> Result<Self, SwsError> {
        let mut manifest = Self::default();
        for experiment in experiments {
            manifest.packages.insert(experiment.spec.clone());
            manifest.mpis.insert(experiment.mpi()?.package_spec());
            manifest
                .compilers
                .insert(format!("%{}", experiment.compiler()?.spec()));
        }
        Ok(manifest)
    }

    /// Renders the manifest as a Spack environment whose spec matrix crosses
    /// packages with MPIs and compilers.
    pub fn to_spack_yaml(&self) -> Result<String, SwsError> {
        let definition = |key: &'static str, values: &BTreeSet<String>| {
            BTreeMap::from([(key, values.iter().cloned().collect::<Vec<_>>())])
        };
        let env = SpackEnvironment {
            spack: SpackSection {
                definitions: vec![
                    definition("packages", &self.packages),
                    definition("mpis", &self.mpis),
                    definition("compilers", &self.compilers),
                    BTreeMap::from([("singleton_packages", Vec::new())]),
                ],
                specs: vec![
                    SpecEntry::Matrix {
                        matrix: vec![
                            vec!["$packages".to_string()],
                            vec!["$^mpis".to_string()],
                            vec!["$compilers".to_string()],
                        ],
                    },
                    SpecEntry::Reference("$singleton_packages".to_string()),
                ],
            },
        };
        serde_yaml::to_string(&env)
            .map_err(|err| SwsError::Manifest(ErrorInfo::new("manifest-render", err.to_string())))
    }
}

//! Experiment descriptors and experiment sets.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::choice::{Compiler, SoftwareChoice};
use crate::errors::{ErrorInfo, SwsError};

/// Role key holding the compiler choice.
pub const ROLE_COMPILER: &str = "compiler";
/// Role key holding the MPI choice.
pub const ROLE_MPI: &str = "mpi";

/// One fully specified combination to build and run.
///
/// Role entries serialize as top-level keys next to the scalar fields, which is
/// the shape the run scripts read back from `EXPERIMENT_JSON`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentDescriptor {
    /// Role name to chosen software, in enumeration order.
    #[serde(flatten)]
    pub roles: IndexMap<String, SoftwareChoice>,
    /// Command line arguments for the application.
    pub input: String,
    /// Number of MPI ranks.
    pub ranks: u32,
    /// Root application spec.
    pub spec: String,
    /// Short application name.
    #[serde(rename = "app name")]
    pub app_name: String,
    /// Wall time limit passed to the batch scheduler.
    #[serde(rename = "max wall time")]
    pub max_wall_time: String,
}

impl ExperimentDescriptor {
    /// Looks up the choice filling `role`.
    pub fn role(&self, role: &str) -> Option<&SoftwareChoice> {
        self.roles.get(role)
    }

    /// Returns a new descriptor with `role` bound to `choice`.
    pub fn with_role(&self, role: &str, choice: SoftwareChoice) -> Self {
        let mut next = self.clone();
        next.roles.insert(role.to_string(), choice.in_role(role));
        next
    }

    /// The compiler role, required for scheduling.
    pub fn compiler(&self) -> Result<Compiler, SwsError> {
        self.required_role(ROLE_COMPILER).map(Compiler::from)
    }

    /// The MPI role, required for scheduling.
    pub fn mpi(&self) -> Result<&SoftwareChoice, SwsError> {
        self.required_role(ROLE_MPI)
    }

    /// Roles other than the compiler and MPI, in role order.
    pub fn library_roles(&self) -> impl Iterator<Item = (&String, &SoftwareChoice)> {
        self.roles
            .iter()
            .filter(|(role, _)| role.as_str() != ROLE_COMPILER && role.as_str() != ROLE_MPI)
    }

    /// Module names declared by any role, in role order.
    pub fn modules(&self) -> Vec<&str> {
        self.roles
            .values()
            .filter_map(|choice| choice.module.as_deref())
            .collect()
    }

    /// Root spec with compiler, MPI and library dependencies:
    /// `spec%compiler ^mpi ^lib ...`.
    pub fn root_spec(&self) -> Result<String, SwsError> {
        let mut parts = vec![format!("{}%{}", self.spec, self.compiler()?.spec())];
        parts.push(format!("^{}", self.mpi()?.spec()));
        parts.extend(self.library_roles().map(|(_, choice)| format!("^{}", choice.spec())));
        Ok(parts.join(" "))
    }

    /// Checks the invariants every scheduled descriptor must satisfy.
    pub fn validate(&self) -> Result<(), SwsError> {
        self.compiler()?;
        self.mpi()?;
        if self.ranks == 0 {
            return Err(SwsError::Config(
                ErrorInfo::new("descriptor-ranks", "rank count must be positive")
                    .with_spec(self.spec.clone()),
            ));
        }
        Ok(())
    }

    fn required_role(&self, role: &str) -> Result<&SoftwareChoice, SwsError> {
        self.roles.get(role).ok_or_else(|| {
            SwsError::Config(
                ErrorInfo::new("descriptor-missing-role", "descriptor lacks a required role")
                    .with_context("role", role)
                    .with_spec(self.spec.clone()),
            )
        })
    }
}

/// Ordered list of descriptors. Joining concatenates and keeps duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExperimentSet {
    experiments: Vec<ExperimentDescriptor>,
}

impl ExperimentSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `other` after the current descriptors.
    pub fn join(mut self, other: ExperimentSet) -> Self {
        self.experiments.extend(other.experiments);
        self
    }

    /// Appends a single descriptor.
    pub fn push(&mut self, descriptor: ExperimentDescriptor) {
        self.experiments.push(descriptor);
    }

    /// Iterates descriptors in order.
    pub fn iter(&self) -> std::slice::Iter<'_, ExperimentDescriptor> {
        self.experiments.iter()
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.experiments.len()
    }

    /// True when the set holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.experiments.is_empty()
    }

    /// Descriptors as a slice.
    pub fn as_slice(&self) -> &[ExperimentDescriptor] {
        &self.experiments
    }
}

impl From<Vec<ExperimentDescriptor>> for ExperimentSet {
    fn from(experiments: Vec<ExperimentDescriptor>) -> Self {
        Self { experiments }
    }
}

impl FromIterator<ExperimentDescriptor> for ExperimentSet {
    fn from_iter<I: IntoIterator<Item = ExperimentDescriptor>>(iter: I) -> Self {
        Self {
            experiments: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ExperimentSet {
    type Item = ExperimentDescriptor;
    type IntoIter = std::vec::IntoIter<ExperimentDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.experiments.into_iter()
    }
}

impl<'a> IntoIterator for &'a ExperimentSet {
    type Item = &'a ExperimentDescriptor;
    type IntoIter = std::slice::Iter<'a, ExperimentDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.experiments.iter()
    }
}

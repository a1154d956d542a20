use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use softsearch_core::errors::{ErrorInfo, SwsError};
use softsearch_core::{ExceptionRule, ExperimentDescriptor, ExperimentSet, SoftwareChoice};
use tracing::{debug, info};

use crate::exceptions::{apply, Outcome};
use crate::product::CartesianProduct;

/// Inputs to a full enumeration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumerationRequest {
    /// Candidate choices per role, in document order.
    pub roles: IndexMap<String, Vec<SoftwareChoice>>,
    /// Application argument strings.
    pub inputs: Vec<String>,
    /// Rank counts.
    pub ranks: Vec<u32>,
    /// Root application spec.
    pub spec: String,
    /// Short application name.
    pub app_name: String,
    /// Wall time for each run.
    pub max_wall_time: String,
}

impl EnumerationRequest {
    /// Number of descriptors [`enumerate`] yields.
    pub fn size(&self) -> usize {
        self.roles.values().map(Vec::len).product::<usize>() * self.inputs.len() * self.ranks.len()
    }

    /// Rejects rank counts that no descriptor may carry.
    pub fn validate(&self) -> Result<(), SwsError> {
        if let Some(position) = self.ranks.iter().position(|&ranks| ranks == 0) {
            return Err(SwsError::Config(
                ErrorInfo::new("enumerate-ranks", "rank counts must be positive")
                    .with_spec(self.spec.clone())
                    .with_context("position", position.to_string())
                    .with_hint("pass -r 1 or more"),
            ));
        }
        Ok(())
    }
}

#[derive(Clone)]
enum Slot {
    Choice(SoftwareChoice),
    Input(String),
    Ranks(u32),
}

/// Lazily enumerates `(roles..., inputs, ranks)`, ranks varying fastest.
pub fn enumerate(request: &EnumerationRequest) -> impl Iterator<Item = ExperimentDescriptor> + '_ {
    let mut lists: Vec<Vec<Slot>> = request
        .roles
        .iter()
        .map(|(role, choices)| {
            choices
                .iter()
                .map(|choice| Slot::Choice(choice.clone().in_role(role.clone())))
                .collect()
        })
        .collect();
    lists.push(
        request
            .inputs
            .iter()
            .map(|input| Slot::Input(clean_input(input)))
            .collect(),
    );
    lists.push(request.ranks.iter().copied().map(Slot::Ranks).collect());

    CartesianProduct::new(lists).map(move |tuple| {
        let mut roles = IndexMap::with_capacity(request.roles.len());
        let mut input = String::new();
        let mut ranks = 0;
        for slot in tuple {
            match slot {
                Slot::Choice(choice) => {
                    roles.insert(choice.role.clone(), choice);
                }
                Slot::Input(value) => input = value,
                Slot::Ranks(value) => ranks = value,
            }
        }
        ExperimentDescriptor {
            roles,
            input,
            ranks,
            spec: request.spec.clone(),
            app_name: request.app_name.clone(),
            max_wall_time: request.max_wall_time.clone(),
        }
    })
}

/// Validates the request, enumerates it and filters it through the exception rules.
pub fn generate(
    request: &EnumerationRequest,
    rules: &[ExceptionRule],
) -> Result<ExperimentSet, SwsError> {
    request.validate()?;
    info!(
        roles = request.roles.len(),
        candidates = request.size(),
        "enumerating software space"
    );
    let mut set = ExperimentSet::new();
    for descriptor in enumerate(request) {
        match apply(&descriptor, rules) {
            Outcome::Applied(descriptor) => set.push(descriptor),
            Outcome::Rejected { rule } => {
                debug!(rule, input = %descriptor.input, ranks = descriptor.ranks, "skipping experiment");
            }
        }
    }
    info!(experiments = set.len(), "created experiments");
    Ok(set)
}

/// Strips surrounding quote characters from an input string.
pub fn clean_input(input: &str) -> String {
    input.trim_matches(|c| c == '"' || c == '\'').to_string()
}

/// Short application name: the spec up to the first `%`, `@` or non-word character.
pub fn app_shorthand(spec: &str) -> String {
    spec.split(|c: char| c == '%' || c == '@' || !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or_default()
        .to_string()
}

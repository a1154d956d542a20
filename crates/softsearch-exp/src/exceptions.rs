use softsearch_core::{ExceptionRule, ExperimentDescriptor, ExperimentSet};
use tracing::trace;

/// Result of running a descriptor through the exception rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The descriptor survives, possibly rewritten.
    Applied(ExperimentDescriptor),
    /// A rejecting rule matched; `rule` is its index.
    Rejected { rule: usize },
}

impl Outcome {
    pub fn into_descriptor(self) -> Option<ExperimentDescriptor> {
        match self {
            Outcome::Applied(descriptor) => Some(descriptor),
            Outcome::Rejected { .. } => None,
        }
    }
}

/// True when every required token names some choice in the descriptor.
pub fn rule_applies(descriptor: &ExperimentDescriptor, rule: &ExceptionRule) -> bool {
    rule.required
        .iter()
        .all(|token| descriptor.roles.values().any(|choice| choice.answers_to(token)))
}

/// Applies `rules` in order. Later rules see earlier substitutions; the first
/// matching rejection stops evaluation.
pub fn apply(descriptor: &ExperimentDescriptor, rules: &[ExceptionRule]) -> Outcome {
    let mut current = descriptor.clone();
    for (idx, rule) in rules.iter().enumerate() {
        if !rule_applies(&current, rule) {
            continue;
        }
        if rule.is_rejection() {
            return Outcome::Rejected { rule: idx };
        }
        for sub in &rule.substitutions {
            if current.roles.contains_key(&sub.role) {
                trace!(role = %sub.role, from = %current.roles[&sub.role], to = %sub.replacement, "substituting");
                current = current.with_role(&sub.role, sub.replacement.clone());
            }
        }
    }
    Outcome::Applied(current)
}

/// Filters and rewrites a sequence of descriptors, preserving order.
pub fn apply_all<'a, I>(descriptors: I, rules: &[ExceptionRule]) -> ExperimentSet
where
    I: IntoIterator<Item = &'a ExperimentDescriptor>,
{
    descriptors
        .into_iter()
        .filter_map(|descriptor| apply(descriptor, rules).into_descriptor())
        .collect()
}

//! Exception rules applied after enumeration.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::choice::SoftwareChoice;

/// Replacement of one role's choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    /// Role to overwrite; ignored when the descriptor lacks it.
    pub role: String,
    /// Choice written into the role.
    pub replacement: SoftwareChoice,
}

/// Pattern-matched rewrite, or rejection when no substitutions are given.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExceptionRule {
    /// Tokens that must all name some choice in the descriptor.
    pub required: BTreeSet<String>,
    /// Ordered substitutions; empty means reject.
    #[serde(default)]
    pub substitutions: Vec<Substitution>,
}

impl ExceptionRule {
    /// Builds a rule that drops every matching descriptor.
    pub fn reject<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            substitutions: Vec::new(),
        }
    }

    /// Builds a rule that rewrites matching descriptors.
    pub fn substitute<I, S>(required: I, substitutions: Vec<Substitution>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required: required.into_iter().map(Into::into).collect(),
            substitutions,
        }
    }

    /// True when a match discards the descriptor.
    pub fn is_rejection(&self) -> bool {
        self.substitutions.is_empty()
    }
}

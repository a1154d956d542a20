//! Software choices, compilers and version ranges.

use std::collections::BTreeSet;
use std::fmt::{self, Display};

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::{ErrorInfo, SwsError};

/// Most variants a [`ChoiceRange`] may toggle; each one doubles the expansion.
pub const MAX_RANGE_VARIANTS: usize = 16;

/// One concrete selection for a component slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SoftwareChoice {
    /// Role the choice fills; filled from the document key when loading.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,
    /// Package name understood by the package manager.
    pub name: String,
    /// Package version, empty when unconstrained.
    #[serde(default, deserialize_with = "version_text")]
    pub version: String,
    /// Variant flags such as `+lapack` or `~metis`.
    #[serde(
        default,
        rename = "variants",
        alias = "variant_flags",
        skip_serializing_if = "BTreeSet::is_empty"
    )]
    pub variant_flags: BTreeSet<String>,
    /// Environment module loaded before running with this choice.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
}

impl SoftwareChoice {
    /// Creates a choice for `role` without variants or module.
    pub fn new(role: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            name: name.into(),
            version: version.into(),
            variant_flags: BTreeSet::new(),
            module: None,
        }
    }

    /// Sets the module name.
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Adds a variant flag.
    pub fn with_variant(mut self, flag: impl Into<String>) -> Self {
        self.variant_flags.insert(flag.into());
        self
    }

    /// Returns a copy bound to `role`.
    pub fn in_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// `name@version`, or `name` when the version is empty.
    pub fn package_spec(&self) -> String {
        format_spec(&self.name, non_empty(&self.version))
    }

    /// Package spec followed by the variant flags.
    pub fn spec(&self) -> String {
        let mut spec = self.package_spec();
        for flag in &self.variant_flags {
            spec.push(' ');
            spec.push_str(flag);
        }
        spec
    }

    /// Returns true when `token` names this choice by module, name or package spec.
    pub fn answers_to(&self, token: &str) -> bool {
        self.module.as_deref() == Some(token) || self.name == token || self.package_spec() == token
    }
}

impl Display for SoftwareChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec())
    }
}

/// Compiler used to build a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Compiler {
    /// Compiler name, e.g. `gcc`.
    pub name: String,
    /// Optional compiler version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Compiler {
    /// Creates a compiler descriptor.
    pub fn new(name: impl Into<String>, version: Option<&str>) -> Self {
        Self {
            name: name.into(),
            version: version.map(str::to_string),
        }
    }

    /// `name` or `name@version`.
    pub fn spec(&self) -> String {
        format_spec(&self.name, self.version.as_deref())
    }
}

impl Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec())
    }
}

impl From<&SoftwareChoice> for Compiler {
    fn from(choice: &SoftwareChoice) -> Self {
        Self::new(choice.name.clone(), non_empty(&choice.version))
    }
}

/// A package swept over several versions and, optionally, every on/off
/// combination of a list of variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceRange {
    /// Template copied for every expanded choice.
    pub base: SoftwareChoice,
    /// Versions to sweep, in order.
    pub versions: Vec<String>,
    /// Variants toggled through every mask.
    #[serde(default)]
    pub variants: Vec<String>,
}

impl ChoiceRange {
    /// Rejects ranges whose variant masks cannot be enumerated.
    pub fn validate(&self) -> Result<(), SwsError> {
        if self.variants.len() > MAX_RANGE_VARIANTS {
            return Err(SwsError::Config(
                ErrorInfo::new("range-variants", "too many variants in a version range")
                    .with_context("package", self.base.name.clone())
                    .with_context("variants", self.variants.len().to_string())
                    .with_hint(format!("split the range into groups of at most {MAX_RANGE_VARIANTS} variants")),
            ));
        }
        Ok(())
    }

    /// Expands the range. Versions vary slowest; bit `n` of the mask turns
    /// variant `n` on (`+`) or off (`~`). A range that fails
    /// [`validate`](Self::validate) expands to nothing.
    pub fn expand(&self) -> Vec<SoftwareChoice> {
        let mut out = Vec::new();
        if self.validate().is_err() {
            return out;
        }
        let masks = 1u64 << self.variants.len();
        for version in &self.versions {
            if self.variants.is_empty() {
                let mut choice = self.base.clone();
                choice.version = version.clone();
                out.push(choice);
                continue;
            }
            for mask in 0..masks {
                let mut choice = self.base.clone();
                choice.version = version.clone();
                choice.variant_flags = self
                    .variants
                    .iter()
                    .enumerate()
                    .map(|(bit, variant)| {
                        let sign = if mask & (1 << bit) != 0 { '+' } else { '~' };
                        format!("{sign}{variant}")
                    })
                    .collect();
                out.push(choice);
            }
        }
        out
    }
}

/// Entry of a dependency group: a single choice or a range of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Candidate {
    /// A version range expanded in place.
    Range(ChoiceRange),
    /// A single concrete choice.
    Single(SoftwareChoice),
}

impl Candidate {
    /// Checks every range in `group`.
    pub fn validate_group(group: &[Candidate]) -> Result<(), SwsError> {
        group.iter().try_for_each(|candidate| match candidate {
            Candidate::Single(_) => Ok(()),
            Candidate::Range(range) => range.validate(),
        })
    }

    /// Flattens a group of candidates into concrete choices, preserving order.
    pub fn flatten(group: &[Candidate]) -> Vec<SoftwareChoice> {
        group
            .iter()
            .flat_map(|candidate| match candidate {
                Candidate::Single(choice) => vec![choice.clone()],
                Candidate::Range(range) => range.expand(),
            })
            .collect()
    }
}

/// Root application driven by the search loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Package name of the application.
    pub name: String,
    /// Optional pinned version.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Variant string appended after the compiler, e.g. `+metis`.
    #[serde(default)]
    pub variants: String,
    /// Executable name; defaults to the package name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_cmd: Option<String>,
    /// Arguments passed to the executable.
    #[serde(default)]
    pub run_args: String,
}

impl Component {
    /// Creates a component with no variants or arguments.
    pub fn new(name: impl Into<String>, version: Option<&str>) -> Self {
        Self {
            name: name.into(),
            version: version.map(str::to_string),
            variants: String::new(),
            run_cmd: None,
            run_args: String::new(),
        }
    }

    /// Full spec: `name@version%compiler variants ^dep ^dep`.
    pub fn spec(&self, compiler: Option<&Compiler>, dependencies: &[SoftwareChoice]) -> String {
        let mut parts = Vec::new();
        let base = format_spec(&self.name, self.version.as_deref());
        parts.push(match compiler {
            Some(compiler) => format!("{base}%{}", compiler.spec()),
            None => base,
        });
        if !self.variants.trim().is_empty() {
            parts.push(self.variants.trim().to_string());
        }
        parts.extend(dependencies.iter().map(|dep| format!("^{}", dep.spec())));
        parts.join(" ")
    }

    /// Executable followed by its arguments.
    pub fn run_command(&self) -> String {
        let cmd = self.run_cmd.as_deref().unwrap_or(&self.name);
        if self.run_args.trim().is_empty() {
            cmd.to_string()
        } else {
            format!("{cmd} {}", self.run_args.trim())
        }
    }
}

/// Formats `name` or `name@version`.
pub fn format_spec(name: &str, version: Option<&str>) -> String {
    match version {
        Some(version) => format!("{name}@{version}"),
        None => name.to_string(),
    }
}

// Documents often write versions as bare numbers (`version: 4.1`).
fn version_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(i64),
        Float(f64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Int(value) => value.to_string(),
        Raw::Float(value) => value.to_string(),
    })
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

//! Error families raised while enumerating, scheduling and searching.

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Context key for the file a failure concerns.
pub const CONTEXT_PATH: &str = "path";
/// Context key for the package or root spec a failure concerns.
pub const CONTEXT_SPEC: &str = "spec";
/// Context key for the batch job a failure concerns.
pub const CONTEXT_JOB: &str = "job";

/// Payload carried by every [`SwsError`]: a stable code, a message and
/// whatever spec, job or path the failure was about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Stable machine-readable error code.
    pub code: String,
    /// Human-readable description of the failure.
    pub message: String,
    /// Key/value context such as the spec, job or path involved.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, String>,
    /// Optional suggestion for resolving the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorInfo {
    /// Creates an error payload with the given code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            context: BTreeMap::new(),
            hint: None,
        }
    }

    /// Adds a context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Records the file involved.
    pub fn with_path(self, path: &Path) -> Self {
        self.with_context(CONTEXT_PATH, path.display().to_string())
    }

    /// Records the spec involved.
    pub fn with_spec(self, spec: impl Into<String>) -> Self {
        self.with_context(CONTEXT_SPEC, spec)
    }

    /// Records the batch job involved, by name or id.
    pub fn with_job(self, job: impl Into<String>) -> Self {
        self.with_context(CONTEXT_JOB, job)
    }

    /// Attaches a hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Returns the recorded file path, if any.
    pub fn path(&self) -> Option<&str> {
        self.context.get(CONTEXT_PATH).map(String::as_str)
    }

    /// Returns the recorded spec, if any.
    pub fn spec(&self) -> Option<&str> {
        self.context.get(CONTEXT_SPEC).map(String::as_str)
    }
}

/// `message [code] key=value key=value; hint: ...`
impl Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.message, self.code)?;
        for (key, value) in &self.context {
            write!(f, " {key}={value}")?;
        }
        match &self.hint {
            Some(hint) => write!(f, "; hint: {hint}"),
            None => Ok(()),
        }
    }
}

/// Error families raised by softsearch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "family", content = "detail")]
pub enum SwsError {
    /// Malformed role-candidate documents, plans, exception rules or options.
    #[error("configuration error: {0}")]
    Config(ErrorInfo),
    /// The package manager could not resolve a spec or environment path.
    #[error("resolution error: {0}")]
    Resolution(ErrorInfo),
    /// The batch scheduler rejected or failed a submission.
    #[error("submission error: {0}")]
    Submission(ErrorInfo),
    /// The dependency manifest or results file could not be located or written.
    #[error("manifest error: {0}")]
    Manifest(ErrorInfo),
    /// Search strategy misuse or a failed local command.
    #[error("search error: {0}")]
    Search(ErrorInfo),
    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(ErrorInfo),
}

impl SwsError {
    /// Returns the payload shared by every family.
    pub fn info(&self) -> &ErrorInfo {
        match self {
            Self::Config(info)
            | Self::Resolution(info)
            | Self::Submission(info)
            | Self::Manifest(info)
            | Self::Search(info)
            | Self::Serde(info) => info,
        }
    }

    /// Returns the stable error code.
    pub fn code(&self) -> &str {
        &self.info().code
    }

    /// Lower-case family name used in log events.
    pub fn family(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Resolution(_) => "resolution",
            Self::Submission(_) => "submission",
            Self::Manifest(_) => "manifest",
            Self::Search(_) => "search",
            Self::Serde(_) => "serde",
        }
    }
}

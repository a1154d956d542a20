#![deny(missing_docs)]
#![doc = "Descriptor model, errors and shared helpers for softsearch experiment pipelines."]

pub mod choice;
pub mod descriptor;
pub mod errors;
pub mod job;
pub mod rng;
pub mod rules;
pub mod serde;

pub use choice::{
    format_spec, Candidate, ChoiceRange, Compiler, Component, SoftwareChoice, MAX_RANGE_VARIANTS,
};
pub use descriptor::{ExperimentDescriptor, ExperimentSet, ROLE_COMPILER, ROLE_MPI};
pub use errors::{ErrorInfo, SwsError};
pub use job::{ChainMode, DependencySpec, JobId, JobKind, JobRecord, JobStatus};
pub use rng::RngHandle;
pub use rules::{ExceptionRule, Substitution};
pub use self::serde::{from_json_slice, to_canonical_json_bytes, to_canonical_json_string};

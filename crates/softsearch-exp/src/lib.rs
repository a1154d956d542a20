//! Enumeration, exception handling and search over software configuration spaces.

mod document;
mod enumerate;
mod exceptions;
mod persist;
mod product;
mod search;

pub use document::RoleDocument;
pub use enumerate::{app_shorthand, clean_input, enumerate, generate, EnumerationRequest};
pub use exceptions::{apply, apply_all, rule_applies, Outcome};
pub use persist::{read_experiment_set, write_experiment_set};
pub use product::CartesianProduct;
pub use search::{BoundedRandom, Exhaustive, SearchPoint, SearchStrategy};

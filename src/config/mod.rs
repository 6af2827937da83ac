//! Cluster profile configuration: loading, saving, and validation.
pub mod profile;
pub mod toml_loader;
pub mod validation;

pub use profile::{ClusterProfile, load_profile};
pub use validation::{ValidationWarning, validate_all};

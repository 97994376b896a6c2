//! Dog configuration from YAML and JSON
//!
//! Everything but catch filters can be configured in files; providers are
//! referenced by their registered name.

mod dog_config;
mod file;

pub use dog_config::{extras_from_value, spec_from_value, DogConfig};
pub use file::{DogConfigFile, DogsFile};

//! Dynamic attribute providers
//!
//! Providers compute values per log event, either as extra record attributes
//! or as `>name` arg-names for templates.

mod chain;
mod registry;
mod set;
mod traits;

pub use chain::{ExtraValues, ProviderChain};
pub use registry::{global_providers, register_provider, ProviderRegistry};
pub use set::AttributeSet;
pub use traits::{is_private, AttributeContext, DynamicAttributes, SharedAttributes};

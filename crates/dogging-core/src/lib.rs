//! Dogging Core
//!
//! Guards that log calls to a function when it is entered, when it returns
//! and when it fails. What gets logged is described with format templates
//! whose fields name the function's arguments (`{bar}`), values about the
//! call (`{@ret}`, `{@err.message}`, `{@time}` ...) or values computed by
//! dynamic attribute providers (`{>user}`).
//!
//! Templates are checked against the function's signature when the function
//! is wrapped, so a typo fails at startup instead of on the first log line.
//! At call time nothing is computed for a phase whose level the logger
//! filters out, and a message is rendered only when a sink formats it.
//!
//! ```rust,ignore
//! use dogging_core::{CallArgs, Dog, Level, Signature, SpecPart};
//!
//! let dog = Dog::builder()
//!     .enter("fetching {url}")
//!     .error(vec![SpecPart::Level(Level::Error), "fetch of {url} failed: {@err.message}".into()])
//!     .build()?;
//! let fetch = dog.wrap(Signature::new("net", "fetch").arg("url"), fetch_impl)?;
//! fetch.call(&CallArgs::new().arg("https://example.com"))?;
//! ```
//!
//! Dogs can also be described in YAML or JSON files, see [`config`].

pub mod attributes;
pub mod binding;
pub mod config;
pub mod error;
pub mod format;
pub mod guard;
pub mod logging;
pub mod names;
pub mod spec;
pub mod traceback;

// Re-export commonly used types
pub use attributes::{
    global_providers, register_provider, AttributeContext, AttributeSet, DynamicAttributes,
    ProviderRegistry, SharedAttributes,
};

pub use binding::{CallArgs, Parameter, Signature};

pub use config::{DogConfig, DogConfigFile};

pub use error::{BindError, DogError, DogResult, ErrorClass};

pub use guard::{Dog, DogBuilder, Guarded};

pub use logging::{
    get_logger, register_logger, ConsoleLogger, Level, Logger, MemoryLogger, NoOpLogger,
    SharedLogger, TracingLogger,
};

pub use names::{Phase, SpecialName};

pub use spec::{PhaseSpec, SpecPart};

pub use traceback::{TraceFrame, Traceback};

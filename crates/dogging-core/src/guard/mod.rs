//! Dogs: log function calls on enter, exit and error
//!
//! A [`Dog`] holds the resolved, validated configuration of the three
//! logging phases. Wrapping a function with it checks the templates against
//! the function's signature and yields a [`Guarded`] function.
//!
//! ```
//! use std::sync::Arc;
//! use dogging_core::{CallArgs, Dog, MemoryLogger, Signature};
//!
//! let logger = Arc::new(MemoryLogger::new("example"));
//! let dog = Dog::builder()
//!     .enter("calling {@func.name} with {bar}")
//!     .exit("{@func.name} returned {@ret}")
//!     .logger(logger.clone())
//!     .build()
//!     .unwrap();
//!
//! let double = dog
//!     .wrap(Signature::new("example", "double").arg("bar"), |args: &CallArgs| {
//!         let bar = args.get(0).and_then(|v| v.as_i64()).unwrap_or_default();
//!         Ok::<_, std::io::Error>(bar * 2)
//!     })
//!     .unwrap();
//!
//! assert_eq!(double.call(&CallArgs::new().arg(21)).unwrap(), 42);
//! assert_eq!(logger.messages(), ["calling double with 21", "double returned 42"]);
//! ```

mod context;
mod wrapped;

use std::error::Error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::attributes::{DynamicAttributes, SharedAttributes};
use crate::binding::{CallArgs, Signature};
use crate::error::{DogError, DogResult};
use crate::logging::{get_logger, SharedLogger};
use crate::names::Phase;
use crate::spec::{PhaseConfig, PhaseSpec};

pub use wrapped::Guarded;

/// Decides whether an error is intercepted
pub type CatchFilter = Arc<dyn Fn(&(dyn Error + 'static)) -> bool + Send + Sync>;

/// Which logger a dog sends its messages to
#[derive(Clone)]
pub enum LoggerSpec {
    /// Looked up by name when a function is wrapped
    Named(String),
    Shared(SharedLogger),
}

impl fmt::Debug for LoggerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerSpec::Named(name) => write!(f, "{name:?}"),
            LoggerSpec::Shared(logger) => write!(f, "<{}>", logger.name()),
        }
    }
}

/// Builder for [`Dog`]
pub struct DogBuilder {
    enter: PhaseSpec,
    exit: PhaseSpec,
    error: PhaseSpec,
    extras: Vec<SharedAttributes>,
    logger: Option<LoggerSpec>,
    catch: Option<(String, CatchFilter)>,
    propagate: bool,
    exc_info: bool,
    default_ret: Value,
    pending: Option<DogError>,
}

impl Default for DogBuilder {
    fn default() -> Self {
        Self {
            enter: PhaseSpec::Disabled,
            exit: PhaseSpec::Disabled,
            error: PhaseSpec::Disabled,
            extras: Vec::new(),
            logger: None,
            catch: None,
            propagate: true,
            exc_info: false,
            default_ret: Value::Null,
            pending: None,
        }
    }
}

impl DogBuilder {
    pub fn enter(mut self, spec: impl Into<PhaseSpec>) -> Self {
        self.enter = spec.into();
        self
    }

    pub fn exit(mut self, spec: impl Into<PhaseSpec>) -> Self {
        self.exit = spec.into();
        self
    }

    pub fn error(mut self, spec: impl Into<PhaseSpec>) -> Self {
        self.error = spec.into();
        self
    }

    /// Attach an extra provider to every phase
    pub fn extra(mut self, provider: impl DynamicAttributes + 'static) -> Self {
        self.extras.push(Arc::new(provider));
        self
    }

    /// Attach extra providers to every phase, in order
    pub fn extras<I>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = SharedAttributes>,
    {
        self.extras.extend(providers);
        self
    }

    pub fn logger(mut self, logger: SharedLogger) -> Self {
        self.logger = Some(LoggerSpec::Shared(logger));
        self
    }

    /// Use the registered logger with this name
    pub fn logger_name(mut self, name: impl Into<String>) -> Self {
        self.logger = Some(LoggerSpec::Named(name.into()));
        self
    }

    /// Intercept only errors for which `filter` returns true
    pub fn catch<F>(mut self, filter: F) -> Self
    where
        F: Fn(&(dyn Error + 'static)) -> bool + Send + Sync + 'static,
    {
        let filter: CatchFilter = Arc::new(filter);
        self.catch = Some(("<filter>".to_string(), filter));
        self
    }

    /// Intercept only errors of type `T`
    pub fn catch_type<T: Error + 'static>(mut self) -> Self {
        let filter: CatchFilter = Arc::new(|err: &(dyn Error + 'static)| err.is::<T>());
        self.catch = Some((context::short_type_name::<T>(), filter));
        self
    }

    /// Whether intercepted errors are returned to the caller (default true)
    pub fn propagate(mut self, propagate: bool) -> Self {
        self.propagate = propagate;
        self
    }

    /// Attach the intercepted error to error-phase records
    pub fn exc_info(mut self, exc_info: bool) -> Self {
        self.exc_info = exc_info;
        self
    }

    /// Value returned instead of an intercepted error when errors don't propagate
    pub fn default_ret(mut self, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(value) => self.default_ret = value,
            Err(err) => self.pending = Some(err.into()),
        }
        self
    }

    /// Resolve, parse and validate every phase
    pub fn build(self) -> DogResult<Dog> {
        if let Some(err) = self.pending {
            return Err(err);
        }

        let enter = PhaseConfig::new(Phase::Enter, self.enter, &self.extras)?;
        let exit = PhaseConfig::new(Phase::Exit, self.exit, &self.extras)?;
        let error = PhaseConfig::new(Phase::Error, self.error, &self.extras)?;

        for phase in [&enter, &exit, &error] {
            phase.validate_special(self.propagate)?;
        }
        for phase in [&enter, &exit, &error] {
            phase.validate_computed()?;
        }

        let dog = Dog {
            inner: Arc::new(DogInner {
                enter,
                exit,
                error,
                logger: self.logger,
                catch: self.catch,
                propagate: self.propagate,
                exc_info: self.exc_info,
                default_ret: self.default_ret,
            }),
        };
        tracing::debug!(dog = %dog, "built dog");
        Ok(dog)
    }
}

pub(crate) struct DogInner {
    enter: PhaseConfig,
    exit: PhaseConfig,
    error: PhaseConfig,
    logger: Option<LoggerSpec>,
    catch: Option<(String, CatchFilter)>,
    propagate: bool,
    exc_info: bool,
    default_ret: Value,
}

impl DogInner {
    fn phases(&self) -> [&PhaseConfig; 3] {
        [&self.enter, &self.exit, &self.error]
    }

    fn catches(&self, err: &(dyn Error + 'static)) -> bool {
        self.catch.as_ref().map_or(true, |(_, filter)| filter(err))
    }
}

/// A validated logging configuration for wrapped functions
///
/// Cheap to clone; one dog can wrap any number of functions.
#[derive(Clone)]
pub struct Dog {
    inner: Arc<DogInner>,
}

impl Dog {
    pub fn builder() -> DogBuilder {
        DogBuilder::default()
    }

    /// Wrap `func`, whose parameters are described by `signature`
    ///
    /// Fails if a template or provider references a regular arg-name the
    /// signature does not declare, or if the default return value can not be
    /// decoded as `R` when errors don't propagate. The caller's location is
    /// what `@pathname` and `@line` report.
    #[track_caller]
    pub fn wrap<F, R, E>(&self, signature: Signature, func: F) -> DogResult<Guarded<F, R, E>>
    where
        F: Fn(&CallArgs) -> Result<R, E>,
        R: Serialize + DeserializeOwned + Clone,
        E: Error + 'static,
    {
        let location = Location::caller();
        let declared = signature.arg_names();
        let unknown: Vec<String> = self
            .inner
            .phases()
            .iter()
            .flat_map(|phase| phase.names().regular.iter())
            .filter(|name| !declared.contains(*name))
            .cloned()
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        if !unknown.is_empty() {
            return Err(DogError::unknown_arguments(signature.name.clone(), unknown));
        }

        let default_ret = if self.inner.propagate {
            None
        } else {
            let ret = serde_json::from_value::<R>(self.inner.default_ret.clone()).map_err(|e| {
                DogError::DefaultReturnType {
                    function: signature.name.clone(),
                    message: e.to_string(),
                }
            })?;
            Some(ret)
        };

        let logger = match &self.inner.logger {
            Some(LoggerSpec::Named(name)) => get_logger(name),
            Some(LoggerSpec::Shared(logger)) => logger.clone(),
            None => get_logger(&signature.module),
        };

        tracing::debug!(
            function = %signature.qualname,
            module = %signature.module,
            logger = logger.name(),
            file = location.file(),
            line = location.line(),
            "wrapped function"
        );
        Ok(Guarded::new(
            func,
            self.inner.clone(),
            signature,
            location,
            logger,
            default_ret,
        ))
    }

    pub fn enter(&self) -> &PhaseConfig {
        &self.inner.enter
    }

    pub fn exit(&self) -> &PhaseConfig {
        &self.inner.exit
    }

    pub fn error(&self) -> &PhaseConfig {
        &self.inner.error
    }

    pub fn propagates(&self) -> bool {
        self.inner.propagate
    }
}

impl fmt::Display for Dog {
    /// Non-default settings only, e.g. `Dog(enter=(INFO, "hi"), propagate=false)`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &*self.inner;
        let mut parts = Vec::new();

        for (name, phase) in [("enter", &inner.enter), ("exit", &inner.exit), ("error", &inner.error)] {
            if let Some(template) = phase.template() {
                parts.push(format!("{name}=({}, {:?})", phase.level(), template.source()));
            }
        }
        if let Some(logger) = &inner.logger {
            parts.push(format!("logger={logger:?}"));
        }
        if let Some((description, _)) = &inner.catch {
            parts.push(format!("catch={description}"));
        }
        if !inner.propagate {
            parts.push("propagate=false".to_string());
        }
        if inner.exc_info {
            parts.push("exc_info=true".to_string());
        }
        if !inner.default_ret.is_null() {
            parts.push(format!("default_ret={}", inner.default_ret));
        }

        write!(f, "Dog({})", parts.join(", "))
    }
}

impl fmt::Debug for Dog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

//! Guarded functions

use std::error::Error;
use std::fmt;
use std::marker::PhantomData;
use std::panic::Location;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::context::{basic_args, EventValues, LazyBinding, Site};
use super::DogInner;
use crate::attributes::{AttributeContext, ExtraValues};
use crate::binding::{CallArgs, Signature};
use crate::format::Message;
use crate::logging::{LogRecord, SharedLogger};
use crate::names::{Phase, SpecialName, COMPUTED_PREFIX};
use crate::spec::PhaseConfig;
use crate::traceback::{TraceFrame, Traceback};

/// Symbol prefix of the frames cut from tracebacks
const GUARD_FRAMES: &str = concat!(module_path!(), "::Guarded");

/// A function wrapped by a dog
///
/// Calling it logs the configured phases around the wrapped function. The
/// logger can be swapped between calls with [`Guarded::set_logger`].
pub struct Guarded<F, R, E> {
    func: F,
    dog: Arc<DogInner>,
    signature: Signature,
    location: &'static Location<'static>,
    logger: RwLock<SharedLogger>,
    default_ret: Option<R>,
    needs_time: bool,
    _marker: PhantomData<fn() -> E>,
}

impl<F, R, E> Guarded<F, R, E>
where
    F: Fn(&CallArgs) -> Result<R, E>,
    R: Serialize + DeserializeOwned + Clone,
    E: Error + 'static,
{
    pub(super) fn new(
        func: F,
        dog: Arc<DogInner>,
        signature: Signature,
        location: &'static Location<'static>,
        logger: SharedLogger,
        default_ret: Option<R>,
    ) -> Self {
        let needs_time = dog.phases().iter().any(|p| p.needs(SpecialName::Time));
        Self {
            func,
            dog,
            signature,
            location,
            logger: RwLock::new(logger),
            default_ret,
            needs_time,
            _marker: PhantomData,
        }
    }

    /// Call the wrapped function
    ///
    /// A non-matching error is returned as-is without logging. A matching
    /// error is logged in the error phase and then either returned unchanged
    /// or replaced by the default return value.
    ///
    /// `args` are bound to the signature only when a logged phase names a
    /// regular argument. Arguments that do not fit never stop the call.
    pub fn call(&self, args: &CallArgs) -> Result<R, E> {
        let logger = self.logger();
        let binding = LazyBinding::new(&self.signature, args);

        let mut values = EventValues::new();
        values.binding = Some(&binding);

        self.emit(&self.dog.enter, &logger, &values);

        let start = self.needs_time.then(Instant::now);
        let result = (self.func)(args);
        values.elapsed = start.map(|s| s.elapsed().as_secs_f64());

        match result {
            Ok(ret) => {
                values.ret = Some(&ret);
                self.emit(&self.dog.exit, &logger, &values);
                Ok(ret)
            }
            Err(err) => self.intercept_call(&logger, &binding, values.elapsed, err),
        }
    }

    /// Handle an error returned by the wrapped function
    ///
    /// Kept out of line so the traceback is captured from a guard frame.
    #[inline(never)]
    fn intercept_call(
        &self,
        logger: &SharedLogger,
        binding: &LazyBinding<'_>,
        elapsed: Option<f64>,
        err: E,
    ) -> Result<R, E> {
        if !self.dog.catches(&err) {
            return Err(err);
        }

        let error = &self.dog.error;
        if error.is_enabled() && logger.enabled(error.level()) {
            let traceback = if error.needs(SpecialName::Traceback) {
                Some(Traceback::capture(self.origin_frame(), GUARD_FRAMES))
            } else {
                None
            };
            let mut values = EventValues::new();
            values.binding = Some(binding);
            values.elapsed = elapsed;
            values.err = Some(&err);
            values.traceback = traceback.as_ref();
            self.emit(error, logger, &values);
        }

        let ret = match (&self.default_ret, self.dog.propagate) {
            (Some(ret), false) => ret.clone(),
            _ => return Err(err),
        };

        let mut values = EventValues::new();
        values.binding = Some(binding);
        values.elapsed = elapsed;
        values.ret = Some(&ret);
        self.emit(&self.dog.exit, logger, &values);
        Ok(ret)
    }

    fn emit(&self, config: &PhaseConfig, logger: &SharedLogger, values: &EventValues<'_, R, E>) {
        let Some(template) = config.template() else {
            return;
        };
        if !logger.enabled(config.level()) {
            return;
        }

        let site = Site {
            signature: &self.signature,
            location: self.location,
            logger: logger.as_ref(),
            default_ret: &self.dog.default_ret,
        };
        let ctx = AttributeContext::new(|| basic_args(config, &site, values));
        let extra = config.extras().map(|chain| ExtraValues::new(chain, &ctx));
        let message = Message::new(template, || {
            let mut args = ctx.args().clone();
            if let Some(chain) = config.computed() {
                for field in config.computed_fields() {
                    let attribute = field.strip_prefix(COMPUTED_PREFIX).unwrap_or(field);
                    if let Some(value) = chain.compute(attribute, &ctx) {
                        args.insert(field.clone(), value);
                    }
                }
            }
            args
        });

        let error = match values.err {
            Some(err) if config.phase() == Phase::Error && self.dog.exc_info => {
                Some(err as &(dyn Error + 'static))
            }
            _ => None,
        };

        logger.log(&LogRecord {
            logger: logger.name(),
            level: config.level(),
            message: &message,
            error,
            extra: extra.as_ref(),
        });
    }

    fn origin_frame(&self) -> TraceFrame {
        TraceFrame::new(
            self.location.file(),
            self.location.line(),
            self.signature.qualname.clone(),
        )
    }

    /// Borrow the guarded function as a plain closure, e.g. to wrap it again
    pub fn as_fn(&self) -> impl Fn(&CallArgs) -> Result<R, E> + '_ {
        move |args: &CallArgs| self.call(args)
    }
}

impl<F, R, E> Guarded<F, R, E> {
    /// The logger the next call will use
    pub fn logger(&self) -> SharedLogger {
        self.logger.read().clone()
    }

    /// Replace the logger for subsequent calls
    pub fn set_logger(&self, logger: SharedLogger) {
        *self.logger.write() = logger;
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Where the function was wrapped
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }
}

impl<F, R, E> fmt::Debug for Guarded<F, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guarded")
            .field("function", &self.signature.qualname)
            .field("module", &self.signature.module)
            .field("location", &self.location)
            .field("logger", &self.logger.read().name())
            .finish()
    }
}

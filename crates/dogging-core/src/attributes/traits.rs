//! Dynamic attribute provider trait and its per-event context

use std::fmt;
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use serde_json::Value;

use crate::format::ArgMap;
use crate::names::PRIVATE_MARKER;

/// A named group of attributes computed per log event
///
/// Providers play one of two roles in a phase:
/// - extra: every exposed attribute is attached to the log record
/// - computed: attributes are referenced in templates as `{>name}`
///
/// Attributes whose names begin with `_` are private and never exposed.
pub trait DynamicAttributes: Send + Sync {
    /// Provider name, used in configuration files and diagnostics
    fn name(&self) -> &str;

    /// Names of the attributes this provider can produce
    fn attribute_names(&self) -> Vec<String>;

    /// Arg-names the provider reads from the context beyond those the template uses
    ///
    /// These are validated exactly like template fields.
    fn required_arg_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Produce one attribute value, `None` if the provider does not have it
    fn attribute(&self, name: &str, ctx: &AttributeContext<'_>) -> Option<Value>;
}

/// Type alias for an Arc-wrapped provider
pub type SharedAttributes = Arc<dyn DynamicAttributes>;

impl fmt::Debug for dyn DynamicAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicAttributes")
            .field("name", &self.name())
            .field("attributes", &self.attribute_names())
            .finish()
    }
}

/// Whether an attribute name is private to its provider
pub fn is_private(name: &str) -> bool {
    name.starts_with(PRIVATE_MARKER)
}

/// The per-event view a provider gets of the call
///
/// Holds the phase's basic arg-names (regular arguments plus the special
/// names the phase needs), built on first access and cached for the event.
pub struct AttributeContext<'a> {
    build: Box<dyn Fn() -> ArgMap + 'a>,
    args: OnceCell<ArgMap>,
}

impl<'a> AttributeContext<'a> {
    pub fn new(build: impl Fn() -> ArgMap + 'a) -> Self {
        Self {
            build: Box::new(build),
            args: OnceCell::new(),
        }
    }

    /// A context with already built arguments
    pub fn from_args(args: ArgMap) -> Self {
        Self {
            build: Box::new(ArgMap::new),
            args: OnceCell::with_value(args),
        }
    }

    /// All basic arg-names of the event
    pub fn args(&self) -> &ArgMap {
        self.args.get_or_init(|| (self.build)())
    }

    /// One arg-name's value
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.args().get(name)
    }

    pub fn is_built(&self) -> bool {
        self.args.get().is_some()
    }
}

impl fmt::Debug for AttributeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeContext")
            .field("args", &self.args.get())
            .finish()
    }
}

//! Closure-backed attribute provider

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::traits::{AttributeContext, DynamicAttributes};

type AttributeFn = Arc<dyn Fn(&AttributeContext<'_>) -> Value + Send + Sync>;

/// A provider built from closures
///
/// # Example
///
/// ```
/// use dogging_core::attributes::AttributeSet;
/// use serde_json::json;
///
/// let user = AttributeSet::new("user")
///     .requires(["user_id"])
///     .with_attribute("user_tag", |ctx| json!(format!("user-{}", ctx.get("user_id").cloned().unwrap_or_default())));
/// ```
#[derive(Clone)]
pub struct AttributeSet {
    name: String,
    required: Vec<String>,
    attributes: Vec<(String, AttributeFn)>,
}

impl AttributeSet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: Vec::new(),
            attributes: Vec::new(),
        }
    }

    /// Arg-names the attributes read from the context
    pub fn requires<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required.extend(names.into_iter().map(Into::into));
        self
    }

    /// Define an attribute; redefining a name replaces it
    pub fn with_attribute<F, V>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&AttributeContext<'_>) -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        let name = name.into();
        let f: AttributeFn = Arc::new(move |ctx: &AttributeContext<'_>| f(ctx).into());
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = f,
            None => self.attributes.push((name, f)),
        }
        self
    }
}

impl DynamicAttributes for AttributeSet {
    fn name(&self) -> &str {
        &self.name
    }

    fn attribute_names(&self) -> Vec<String> {
        self.attributes.iter().map(|(n, _)| n.clone()).collect()
    }

    fn required_arg_names(&self) -> Vec<String> {
        self.required.clone()
    }

    fn attribute(&self, name: &str, ctx: &AttributeContext<'_>) -> Option<Value> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, f)| f(ctx))
    }
}

impl fmt::Debug for AttributeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeSet")
            .field("name", &self.name)
            .field("required", &self.required)
            .field("attributes", &self.attribute_names())
            .finish()
    }
}

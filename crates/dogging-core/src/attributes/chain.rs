//! Ordered provider chains with last-registered-wins resolution

use std::collections::BTreeMap;
use std::fmt;

use once_cell::unsync::OnceCell;
use serde_json::{Map, Value};

use super::traits::{is_private, AttributeContext, SharedAttributes};

/// Providers attached to one role of one phase
///
/// The responsible provider for every exposed attribute name is decided once,
/// when the chain is built: if several providers expose the same name, the
/// one registered last wins.
#[derive(Clone, Default)]
pub struct ProviderChain {
    providers: Vec<SharedAttributes>,
    index: BTreeMap<String, usize>,
}

impl ProviderChain {
    pub fn new(providers: Vec<SharedAttributes>) -> Self {
        let mut index = BTreeMap::new();
        for (position, provider) in providers.iter().enumerate() {
            for name in provider.attribute_names() {
                if !is_private(&name) {
                    index.insert(name, position);
                }
            }
        }
        Self { providers, index }
    }

    /// A chain with `self`'s providers followed by `later`'s
    pub fn join(&self, later: &ProviderChain) -> Self {
        Self::new(
            self.providers
                .iter()
                .chain(later.providers.iter())
                .cloned()
                .collect(),
        )
    }

    pub fn providers(&self) -> &[SharedAttributes] {
        &self.providers
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Exposed attribute names, sorted
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    pub fn supplies(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Union of every provider's required arg-names, first occurrence order
    pub fn required_arg_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for name in self.providers.iter().flat_map(|p| p.required_arg_names()) {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Compute one attribute through its responsible provider
    pub fn compute(&self, name: &str, ctx: &AttributeContext<'_>) -> Option<Value> {
        let provider = &self.providers[*self.index.get(name)?];
        provider.attribute(name, ctx)
    }

    /// Compute every exposed attribute
    pub fn evaluate(&self, ctx: &AttributeContext<'_>) -> Map<String, Value> {
        self.index
            .keys()
            .filter_map(|name| Some((name.clone(), self.compute(name, ctx)?)))
            .collect()
    }
}

impl fmt::Debug for ProviderChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderChain")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("attributes", &self.index.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl FromIterator<SharedAttributes> for ProviderChain {
    fn from_iter<I: IntoIterator<Item = SharedAttributes>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Extra attributes of one log record, evaluated when first requested
pub struct ExtraValues<'a> {
    chain: &'a ProviderChain,
    ctx: &'a AttributeContext<'a>,
    values: OnceCell<Map<String, Value>>,
}

impl<'a> ExtraValues<'a> {
    pub fn new(chain: &'a ProviderChain, ctx: &'a AttributeContext<'a>) -> Self {
        Self {
            chain,
            ctx,
            values: OnceCell::new(),
        }
    }

    /// All extra attributes, computed together on first call
    pub fn values(&self) -> &Map<String, Value> {
        self.values.get_or_init(|| self.chain.evaluate(self.ctx))
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values().get(name)
    }

    pub fn is_evaluated(&self) -> bool {
        self.values.get().is_some()
    }
}

impl fmt::Debug for ExtraValues<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtraValues")
            .field("chain", self.chain)
            .field("values", &self.values.get())
            .finish()
    }
}

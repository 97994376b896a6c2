//! Named provider registry for file-based configuration

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use super::traits::{DynamicAttributes, SharedAttributes};
use crate::error::{DogError, DogResult};

/// Providers addressable by name
#[derive(Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<String, SharedAttributes>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider under its own name, replacing any previous one
    pub fn register(&self, provider: impl DynamicAttributes + 'static) {
        self.register_shared(Arc::new(provider));
    }

    pub fn register_shared(&self, provider: SharedAttributes) {
        let name = provider.name().to_string();
        tracing::debug!(provider = %name, "registering attribute provider");
        self.providers.write().insert(name, provider);
    }

    pub fn get(&self, name: &str) -> Option<SharedAttributes> {
        self.providers.read().get(name).cloned()
    }

    /// Look up a provider, failing if it is not registered
    pub fn resolve(&self, name: &str) -> DogResult<SharedAttributes> {
        self.get(name)
            .ok_or_else(|| DogError::UnknownProvider(name.to_string()))
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.names())
            .finish()
    }
}

/// Process-wide registry of providers
static GLOBAL_PROVIDERS: Lazy<ProviderRegistry> = Lazy::new(ProviderRegistry::new);

/// The process-wide registry
pub fn global_providers() -> &'static ProviderRegistry {
    &GLOBAL_PROVIDERS
}

/// Register a provider in the process-wide registry
pub fn register_provider(provider: impl DynamicAttributes + 'static) {
    GLOBAL_PROVIDERS.register(provider);
}

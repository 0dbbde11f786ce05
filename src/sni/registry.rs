//! Adapter registry: adapter-type name → factory.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::sni::{InMemoryAdapter, SniAdapter};
use crate::tls::CertificateError;

/// Adapter-specific key/value settings.
pub type AdapterSettings = HashMap<String, String>;

/// Builds an adapter from its settings.
pub type AdapterFactory = fn(&AdapterSettings) -> Result<Arc<dyn SniAdapter>, AdapterError>;

/// Error type for adapter resolution and construction.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("{0} is not a registered adapter")]
    NotRegistered(String),

    #[error("failed to load certificate for {hostname}: {source}")]
    Certificate {
        hostname: String,
        #[source]
        source: CertificateError,
    },
}

/// Registered adapter factories, keyed by exact (case-sensitive) name.
#[derive(Debug, Clone)]
pub struct AdapterRegistry {
    factories: HashMap<String, AdapterFactory>,
}

impl AdapterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry holding every adapter shipped with this crate.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(InMemoryAdapter::NAME, InMemoryAdapter::factory);
        registry
    }

    /// Insert or replace the factory for `name`.
    pub fn register(&mut self, name: impl Into<String>, factory: AdapterFactory) {
        let name = name.into();
        if self.factories.insert(name.clone(), factory).is_some() {
            tracing::debug!(adapter = %name, "Adapter factory replaced");
        }
    }

    /// Build the adapter registered under `name`.
    pub fn resolve(
        &self,
        name: &str,
        settings: &AdapterSettings,
    ) -> Result<Arc<dyn SniAdapter>, AdapterError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| AdapterError::NotRegistered(name.to_string()))?;
        factory(settings)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

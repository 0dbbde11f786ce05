//! In-memory adapter: a fixed hostname → certificate table.

use std::collections::HashMap;
use std::sync::Arc;

use crate::sni::{AdapterError, AdapterSettings, SniAdapter};
use crate::tls::{load_certificate, Certificate};

/// Adapter backed by certificates loaded once at construction.
///
/// Settings hold one entry per hostname whose value is a comma-separated list
/// of glob patterns. Hostnames match exactly and case-insensitively.
#[derive(Debug, Default)]
pub struct InMemoryAdapter {
    table: HashMap<String, Certificate>,
}

impl InMemoryAdapter {
    /// Name the adapter is registered under.
    pub const NAME: &'static str = "inmemory";

    pub fn new(settings: &AdapterSettings) -> Result<Self, AdapterError> {
        let mut table = HashMap::with_capacity(settings.len());

        for (hostname, globs) in settings {
            let certificate =
                load_certificate(globs).map_err(|source| AdapterError::Certificate {
                    hostname: hostname.clone(),
                    source,
                })?;
            tracing::info!(hostname = %hostname, "Certificate loaded");
            table.insert(hostname.to_lowercase(), certificate);
        }

        Ok(Self { table })
    }

    /// Registry entry point.
    pub fn factory(settings: &AdapterSettings) -> Result<Arc<dyn SniAdapter>, AdapterError> {
        Ok(Arc::new(Self::new(settings)?))
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl SniAdapter for InMemoryAdapter {
    fn callback(&self, server_name: &str) -> Option<Certificate> {
        self.table.get(&server_name.to_lowercase()).cloned()
    }
}

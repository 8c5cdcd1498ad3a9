//! Static provider registry
//!
//! The registry is built once at startup from a fixed list of provider
//! factories, then only read. Each registration is independently fallible:
//! a provider whose configuration cannot be loaded is left out and the
//! reason is kept for listings.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use dnssync_core::registry::ProviderRegistry;
//!
//! let mut registry = ProviderRegistry::new();
//! dnssync_provider_cloudflare::register(&mut registry);
//! dnssync_zonefile::register(&mut registry);
//!
//! let source = registry.create("zonefile")?;
//! let destination = registry.create("cloudflare")?;
//! ```
//!
//! ## Registration
//!
//! Provider crates expose a `register` function:
//!
//! ```rust,ignore
//! pub fn register(registry: &mut ProviderRegistry) {
//!     registry.register(Box::new(CloudflareFactory));
//! }
//! ```

use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, DnsProviderFactory};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Listing entry for a registered provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    pub id: String,
    pub description: String,
    pub read_only: bool,
}

struct Entry {
    factory: Box<dyn DnsProviderFactory>,
    config: ProviderConfig,
}

/// Provider registry
///
/// Maps provider ids to a factory plus the configuration it was
/// registered with. Every [`ProviderRegistry::create`] call builds a fresh,
/// independent provider instance.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, Entry>,
    unavailable: BTreeMap<String, String>,
}

impl ProviderRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, loading its configuration from the environment
    pub fn register(&mut self, factory: Box<dyn DnsProviderFactory>) {
        let config = factory.load_config();
        self.register_with(factory, config);
    }

    /// Register a factory with an already loaded configuration
    ///
    /// # Parameters
    ///
    /// - `factory`: Factory object for creating provider instances
    /// - `config`: Its configuration, or the error that loading it produced
    ///
    /// A failed configuration leaves the provider out; the reason is logged
    /// and listed by [`ProviderRegistry::unavailable`].
    pub fn register_with(
        &mut self,
        factory: Box<dyn DnsProviderFactory>,
        config: Result<ProviderConfig>,
    ) {
        let id = factory.id().to_string();
        match config {
            Ok(config) => {
                debug!("Registered provider {}", id);
                self.unavailable.remove(&id);
                self.providers.insert(id, Entry { factory, config });
            }
            Err(e) => {
                warn!("Provider {} unavailable: {}", id, e);
                self.providers.remove(&id);
                self.unavailable.insert(id, e.to_string());
            }
        }
    }

    /// Create a provider instance
    ///
    /// # Returns
    ///
    /// - `Ok(Box<dyn DnsProvider>)`: Created provider instance
    /// - `Err(Error)`: If the provider is unknown, unavailable, or creation fails
    pub fn create(&self, id: &str) -> Result<Box<dyn DnsProvider>> {
        if let Some(entry) = self.providers.get(id) {
            return entry.factory.create(&entry.config);
        }

        match self.unavailable.get(id) {
            Some(reason) => Err(Error::config(format!(
                "Provider {id} is unavailable: {reason}"
            ))),
            None => Err(Error::config(format!("Unknown provider: {id}"))),
        }
    }

    /// Registered providers, sorted by id
    pub fn providers(&self) -> Vec<ProviderInfo> {
        self.providers
            .iter()
            .map(|(id, entry)| ProviderInfo {
                id: id.clone(),
                description: entry.factory.description().to_string(),
                read_only: entry.factory.read_only(),
            })
            .collect()
    }

    /// Providers left out, with the reason, sorted by id
    pub fn unavailable(&self) -> Vec<(String, String)> {
        self.unavailable
            .iter()
            .map(|(id, reason)| (id.clone(), reason.clone()))
            .collect()
    }

    /// Check if a provider is registered and available
    pub fn has_provider(&self, id: &str) -> bool {
        self.providers.contains_key(id)
    }
}

//! Ecosystem tag to import capability table

use follower_common::{FollowerError, Result};
use std::collections::HashMap;
use std::sync::Arc;

use super::ImportCapability;

/// Maps ecosystem tags to their import capability
///
/// An empty tag resolves to the default ecosystem, which is how older
/// producers that never set a tag keep working.
pub struct EcosystemRegistry {
    capabilities: HashMap<String, Arc<dyn ImportCapability>>,
    default_ecosystem: String,
}

impl EcosystemRegistry {
    pub fn new(default_ecosystem: impl Into<String>) -> Self {
        Self {
            capabilities: HashMap::new(),
            default_ecosystem: default_ecosystem.into(),
        }
    }

    /// Register a capability under its own ecosystem tag, replacing any previous one
    pub fn register(&mut self, capability: Arc<dyn ImportCapability>) -> &mut Self {
        self.capabilities
            .insert(capability.ecosystem().to_string(), capability);
        self
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, capability: Arc<dyn ImportCapability>) -> Self {
        self.register(capability);
        self
    }

    /// Capability for a message tag, `None` for unknown ecosystems
    pub fn resolve(&self, tag: &str) -> Option<&Arc<dyn ImportCapability>> {
        self.capabilities.get(self.canonical_tag(tag))
    }

    /// Tag a message will be routed under
    pub fn canonical_tag<'a>(&'a self, tag: &'a str) -> &'a str {
        if tag.is_empty() {
            self.default_ecosystem.as_str()
        } else {
            tag
        }
    }

    pub fn default_ecosystem(&self) -> &str {
        &self.default_ecosystem
    }

    /// Registered tags, sorted
    pub fn ecosystems(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.capabilities.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    /// Check the default ecosystem has a capability
    pub fn validate(&self) -> Result<()> {
        if !self.capabilities.contains_key(&self.default_ecosystem) {
            return Err(FollowerError::config(format!(
                "Default ecosystem '{}' is not registered (known: {})",
                self.default_ecosystem,
                self.ecosystems().join(", ")
            )));
        }
        Ok(())
    }
}

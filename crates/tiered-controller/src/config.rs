//! Controller configuration.

use crate::error::{ControllerError, Result};
use serde::{Deserialize, Serialize};
use tiered_core::SortKey;

/// Configuration for a [`Controller`](crate::Controller).
///
/// Sort keys and the relationship key are required; they are optional here
/// so partial configurations can be deserialized and then rejected with a
/// configuration error at construction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Relationship key the data source uses to resolve a parent's children.
    pub child_key: String,

    /// Order of sections. Required unless the controller tracks a single parent.
    pub section_sort: Option<SortKey>,

    /// Order of items within each section.
    pub item_sort: Option<SortKey>,

    /// Whether the observer is called for passes that changed nothing.
    pub notify_when_empty: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            child_key: String::new(),
            section_sort: None,
            item_sort: None,
            notify_when_empty: true,
        }
    }
}

impl ControllerConfig {
    pub fn builder() -> ControllerConfigBuilder {
        ControllerConfigBuilder::new()
    }

    /// Parse a configuration from JSON. Validation happens at construction.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the configuration; `needs_section_sort` is false only for
    /// single-parent controllers.
    pub fn validate(&self, needs_section_sort: bool) -> Result<()> {
        if self.child_key.trim().is_empty() {
            return Err(ControllerError::Configuration(
                "child_key must name the parent -> child relationship".to_string(),
            ));
        }
        if self.item_sort.is_none() {
            return Err(ControllerError::Configuration(
                "item_sort is required".to_string(),
            ));
        }
        if needs_section_sort && self.section_sort.is_none() {
            return Err(ControllerError::Configuration(
                "section_sort is required when fetching parents".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for controller configuration.
pub struct ControllerConfigBuilder {
    config: ControllerConfig,
}

impl ControllerConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ControllerConfig::default(),
        }
    }

    pub fn child_key(mut self, key: impl Into<String>) -> Self {
        self.config.child_key = key.into();
        self
    }

    pub fn section_sort(mut self, sort: SortKey) -> Self {
        self.config.section_sort = Some(sort);
        self
    }

    pub fn item_sort(mut self, sort: SortKey) -> Self {
        self.config.item_sort = Some(sort);
        self
    }

    pub fn notify_when_empty(mut self, enabled: bool) -> Self {
        self.config.notify_when_empty = enabled;
        self
    }

    pub fn build(self) -> ControllerConfig {
        self.config
    }
}

impl Default for ControllerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

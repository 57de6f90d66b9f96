//! Per-mock configuration.

use crate::result::{MockError, MockResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Configuration for a single mock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    /// Display name of the mocked type
    pub name: String,
    /// Value returned by live calls that no stub applies to
    ///
    /// Applies to every method without an entry in `method_defaults`. Typed
    /// calls whose return type cannot hold it fall back to the type's default.
    pub default_value: Value,
    /// Per-method overrides of `default_value`
    pub method_defaults: BTreeMap<String, Value>,
    /// Emit a `warn` event for live calls that no stub applies to
    pub warn_unstubbed: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
            default_value: Value::Null,
            method_defaults: BTreeMap::new(),
            warn_unstubbed: false,
        }
    }
}

impl MockConfig {
    /// Create a config for a mock of the named type
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Set the unstubbed default value
    #[must_use]
    pub fn with_default_value(mut self, value: Value) -> Self {
        self.default_value = value;
        self
    }

    /// Set the unstubbed default value of one method
    #[must_use]
    pub fn with_default_for(mut self, method: &str, value: Value) -> Self {
        self.method_defaults.insert(method.to_string(), value);
        self
    }

    /// Default value of `method`
    #[must_use]
    pub fn default_for(&self, method: &str) -> &Value {
        self.method_defaults
            .get(method)
            .unwrap_or(&self.default_value)
    }

    /// Warn on live calls without an applicable stub
    #[must_use]
    pub const fn with_warn_unstubbed(mut self, warn: bool) -> Self {
        self.warn_unstubbed = warn;
        self
    }

    /// Parse a config from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> MockResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        if config.name.trim().is_empty() {
            return Err(MockError::config("mock name must not be empty"));
        }
        Ok(config)
    }
}

//! Defaults applied to every mock created by a [`MockSpace`](crate::MockSpace)
//!
//! Configuration can be built in code or loaded from TOML:
//!
//! ```toml
//! auto_create = true
//! ignored_properties = ["jasmineToString"]
//! return_value_policy = "singleton"
//! instance_policy = "unique"
//! root_kind = "function"
//! ```

use crate::error::ConfigError;
use crate::factory::FactoryPolicy;
use objmock_core::TargetKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Mock space configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockConfig {
    /// Create child surrogates on reads of missing properties
    pub auto_create: bool,
    /// Property names read straight from the target without interception
    pub ignored_properties: BTreeSet<String>,
    /// Policy for calls on root mocks
    pub return_value_policy: FactoryPolicy,
    /// Policy for constructions on root mocks
    pub instance_policy: FactoryPolicy,
    /// Real structural kind of a root mock's target
    pub root_kind: TargetKind,
}

impl MockConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration from TOML; missing keys take their defaults
    ///
    /// # Errors
    /// [`ConfigError::Parse`] on malformed input or unknown policy names
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// With auto-create flag
    #[inline]
    #[must_use]
    pub fn with_auto_create(mut self, enabled: bool) -> Self {
        self.auto_create = enabled;
        self
    }

    /// With an extra ignored property name
    #[must_use]
    pub fn with_ignored_property(mut self, name: impl Into<String>) -> Self {
        self.ignored_properties.insert(name.into());
        self
    }

    /// With return-value policy
    #[inline]
    #[must_use]
    pub fn with_return_value_policy(mut self, policy: FactoryPolicy) -> Self {
        self.return_value_policy = policy;
        self
    }

    /// With instance policy
    #[inline]
    #[must_use]
    pub fn with_instance_policy(mut self, policy: FactoryPolicy) -> Self {
        self.instance_policy = policy;
        self
    }

    /// With root target kind
    #[inline]
    #[must_use]
    pub fn with_root_kind(mut self, kind: TargetKind) -> Self {
        self.root_kind = kind;
        self
    }
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            auto_create: true,
            ignored_properties: BTreeSet::new(),
            return_value_policy: FactoryPolicy::Singleton,
            instance_policy: FactoryPolicy::Unique,
            root_kind: TargetKind::Function,
        }
    }
}

//! Error types for objmock
//!
//! Every failure is reported immediately to the caller; nothing is retried.

use objmock_core::{HandlerId, MockRef, RegistryError, ReportError};

/// Main objmock error type
#[derive(Debug, thiserror::Error)]
pub enum MockError {
    /// Registry lookup on an unregistered surrogate or handler
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Report query that needs a recorded call
    #[error(transparent)]
    Report(#[from] ReportError),

    /// A segment of a dotted path does not lead to a registered surrogate
    #[error("deep child \"{path}\" is not mocked")]
    PathNotMocked {
        /// Path traversed so far, failing segment included
        path: String,
    },

    /// Surrogate handle does not belong to this heap
    #[error("unknown object: {0}")]
    UnknownObject(MockRef),

    /// Handler id does not belong to this heap
    #[error("unknown handler: {0}")]
    UnknownHandler(HandlerId),

    /// A property expected to hold a surrogate holds something else
    #[error("property \"{property}\" holds {found}, not a mock")]
    NotAMock {
        /// Property read
        property: String,
        /// Type name of the value found
        found: &'static str,
    },

    /// Failure raised by a return-value or instance factory
    #[error("factory failed: {0}")]
    Factory(String),

    /// No more handler or surrogate ids can be allocated
    #[error("mock heap exhausted")]
    HeapExhausted,

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl MockError {
    /// Check if the error comes from a lookup of something never registered
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Registry(_) | Self::PathNotMocked { .. } | Self::UnknownObject(_) | Self::UnknownHandler(_)
        )
    }

    /// Create a factory failure
    #[inline]
    pub fn factory(message: impl Into<String>) -> Self {
        Self::Factory(message.into())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML could not be parsed into a configuration
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

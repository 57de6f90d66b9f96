//! Result and error types for probar-mock.

use thiserror::Error;

/// Result type for mock operations
pub type MockResult<T> = Result<T, MockError>;

/// Errors that can occur while stubbing, dispatching or verifying mocks
#[derive(Debug, Error)]
pub enum MockError {
    /// A count assertion (`times`, `once`, `at_least`, ...) did not hold
    #[error(
        "Expected \"{spec}\" to be called {expected} time(s). But has been called {actual} time(s).\nActual calls:\n{actual_calls}"
    )]
    VerificationCount {
        /// Matcher description of the verified call
        spec: String,
        /// Expected bound
        expected: usize,
        /// Number of matching calls recorded
        actual: usize,
        /// Every recorded call of the method, one per line
        actual_calls: String,
    },

    /// An ordering assertion (`called_before` / `called_after`) did not hold
    #[error("{message}")]
    VerificationOrder {
        /// Matcher description of the verified call
        self_spec: String,
        /// Matcher description of the call it was compared against
        other_spec: String,
        /// Full diagnostic
        message: String,
    },

    /// A stub configured with `then_throw` fired
    #[error("{message}")]
    Thrown {
        /// Error message given to `then_throw`
        message: String,
    },

    /// A stub or verification was configured but no mock call was captured
    #[error("No mock call was captured for {operation}")]
    NothingCaptured {
        /// Operation that needed the capture
        operation: &'static str,
    },

    /// Regex matcher with an invalid pattern
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        /// Offending pattern
        pattern: String,
        /// Regex compiler message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// JSON conversion of an argument or return value failed
    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MockError {
    /// Create a thrown error
    #[must_use]
    pub fn thrown(message: impl Into<String>) -> Self {
        Self::Thrown {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this error is a failed verification
    #[must_use]
    pub const fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            Self::VerificationCount { .. } | Self::VerificationOrder { .. }
        )
    }
}

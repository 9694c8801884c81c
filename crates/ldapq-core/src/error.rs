//! Error types for directory operations.
//!
//! Every failure the client can report is a variant of [`Error`]. Variants are grouped into
//! coarse [`ErrorKind`]s so callers can branch on "server unreachable" versus "bad credentials"
//! versus "record does not look like we expected" without matching every variant.

use serde::Serialize;
use thiserror::Error;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transport, TLS or timeout failure. Infrastructure, not the caller's fault.
    Network,
    /// The directory rejected the bind.
    Auth,
    /// The query matched the wrong number of entries, the server rejected it, or a required
    /// attribute was absent from the record.
    Search,
    /// A record attribute was present but malformed.
    Format,
    /// Client configuration was invalid.
    Config,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::Search => "search",
            Self::Format => "format",
            Self::Config => "config",
        };
        f.write_str(name)
    }
}

/// Main error type for directory operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Connecting to or talking with the directory failed
    #[error("Network error: {0}")]
    Network(String),

    /// Operation timed out
    #[error("Timeout waiting for directory: {0}")]
    Timeout(String),

    /// Bind rejected
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Search matched no entry
    #[error("No entry matches {filter}")]
    NotFound {
        /// Filter that was searched
        filter: String,
    },

    /// Search matched more than one entry
    #[error("{count} entries match {filter}, expected exactly one")]
    Ambiguous {
        /// Filter that was searched
        filter: String,
        /// Number of entries returned
        count: usize,
    },

    /// Directory returned a non-success result for a search
    #[error("Search rejected by directory: {0}")]
    SearchRejected(String),

    /// A required attribute is not part of the record
    #[error("Attribute `{attribute}` not found in record")]
    AttributeNotFound {
        /// Attribute name
        attribute: String,
    },

    /// A required attribute is present but carries no values
    #[error("Attribute `{attribute}` has no values")]
    EmptyAttribute {
        /// Attribute name
        attribute: String,
    },

    /// An attribute carries the wrong number of values
    #[error("Attribute `{attribute}` has {actual} values, expected {expected}")]
    UnexpectedValueCount {
        /// Attribute name
        attribute: String,
        /// Required number of values
        expected: usize,
        /// Number of values present
        actual: usize,
    },

    /// A distinguished name lacks a component with the required prefix
    #[error("Attribute `{attribute}` value `{value}` has no component with prefix `{prefix}`")]
    MissingComponent {
        /// Attribute name
        attribute: String,
        /// Component prefix that was looked for (e.g. `OU=`)
        prefix: String,
        /// Value that was scanned
        value: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Specialized result type for directory operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Network(_) | Self::Timeout(_) => ErrorKind::Network,
            Self::InvalidCredentials(_) => ErrorKind::Auth,
            Self::NotFound { .. }
            | Self::Ambiguous { .. }
            | Self::SearchRejected(_)
            | Self::AttributeNotFound { .. } => ErrorKind::Search,
            Self::EmptyAttribute { .. }
            | Self::UnexpectedValueCount { .. }
            | Self::MissingComponent { .. } => ErrorKind::Format,
            Self::ConfigError(_) => ErrorKind::Config,
        }
    }

    /// Returns the error code for this error type.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "NETWORK_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::InvalidCredentials(_) => "INVALID_CREDENTIALS",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Ambiguous { .. } => "AMBIGUOUS",
            Self::SearchRejected(_) => "SEARCH_REJECTED",
            Self::AttributeNotFound { .. } => "ATTRIBUTE_NOT_FOUND",
            Self::EmptyAttribute { .. } => "EMPTY_ATTRIBUTE",
            Self::UnexpectedValueCount { .. } => "UNEXPECTED_VALUE_COUNT",
            Self::MissingComponent { .. } => "MISSING_COMPONENT",
            Self::ConfigError(_) => "CONFIG_ERROR",
        }
    }

    /// Returns true if retrying later could succeed.
    ///
    /// Only infrastructure failures qualify. Nothing in this workspace retries; the flag is for
    /// the calling application.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self.kind(), ErrorKind::Network)
    }

    /// Builds an [`Error::UnexpectedValueCount`] for a single-valued attribute.
    #[must_use]
    pub fn single_value_expected(attribute: &str, actual: usize) -> Self {
        Self::UnexpectedValueCount {
            attribute: attribute.to_string(),
            expected: 1,
            actual,
        }
    }

    /// Builds an [`Error::AttributeNotFound`].
    #[must_use]
    pub fn missing_attribute(attribute: &str) -> Self {
        Self::AttributeNotFound {
            attribute: attribute.to_string(),
        }
    }
}

// Conversions from external error types
impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::ConfigError(format!("invalid directory address: {err}"))
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(err.to_string())
    }
}

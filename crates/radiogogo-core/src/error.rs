//! Error types for radiogogo core.

use thiserror::Error;

/// Errors raised by core primitives.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Text that does not parse as a station identifier.
    #[error("malformed station identifier {input:?}: {source}")]
    MalformedIdentifier {
        input: String,
        #[source]
        source: uuid::Error,
    },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

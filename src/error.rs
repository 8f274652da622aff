//! Prompt Guard error types.
//!
//! Scanning never fails: malformed or empty input simply produces no
//! findings. Errors are confined to construction time (invalid patterns,
//! bad configuration, unreadable config files).
//!
//! The `InvalidPattern` variant preserves the underlying regex error via
//! `#[source]`, so `anyhow` can render the full chain.

use thiserror::Error;

/// Prompt Guard errors.
#[derive(Error, Debug)]
pub enum GuardError {
    /// A configured detector pattern failed to compile.
    #[error("Invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        /// The offending pattern source.
        pattern: String,
        /// Compilation error reported by the regex engine.
        #[source]
        source: regex::Error,
    },

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for Prompt Guard operations
pub type Result<T> = std::result::Result<T, GuardError>;

impl From<toml::de::Error> for GuardError {
    fn from(err: toml::de::Error) -> Self {
        GuardError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for GuardError {
    fn from(err: toml::ser::Error) -> Self {
        GuardError::Config(format!("Failed to serialize config: {err}"))
    }
}

//! Error types for the CLI

use thiserror::Error;
use tiercard::{ExportError, Locale};

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Export pipeline failure
    #[error("{message}")]
    Export {
        /// Localized banner text
        message: String,
        /// Underlying pipeline error
        #[source]
        source: ExportError,
    },

    /// Tiercard library error outside an export run
    #[error("Tiercard error: {0}")]
    Tiercard(#[from] ExportError),

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid argument
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message
        message: String,
    },
}

impl CliError {
    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Wrap a failed export with the banner shown to the user
    #[must_use]
    pub fn export(source: ExportError, locale: Locale) -> Self {
        Self::Export {
            message: source.user_message(locale).into_owned(),
            source,
        }
    }

    /// Create an invalid argument error
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_config_error() {
        let err = CliError::config("bad config");
        assert!(err.to_string().contains("Configuration"));
        assert!(err.to_string().contains("bad config"));
    }

    #[test]
    fn test_export_error_shows_banner() {
        let err = CliError::export(ExportError::NoFrames, Locale::En);
        assert_eq!(err.to_string(), "Failed to create the GIF.");
        assert!(err.source().unwrap().to_string().contains("No frames"));
    }

    #[test]
    fn test_invalid_argument_error() {
        let err = CliError::invalid_argument("bad arg");
        assert!(err.to_string().contains("Invalid argument"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let cli_err: CliError = io_err.into();
        assert!(cli_err.to_string().contains("I/O"));
    }
}

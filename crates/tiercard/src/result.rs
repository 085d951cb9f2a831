//! Result and error types for the export pipeline.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Coarse failure classification, stable across message changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// Media did not become readable before the deadline
    LoadTimeout,
    /// Media reported an error while loading
    LoadError,
    /// Snapshot was empty or undersized after all retries
    CaptureFailed,
    /// Sampling produced zero usable frames
    NoFrames,
    /// Animation assembly failed or produced no output
    EncodeFailed,
    /// User dismissed the share sheet. Never propagated.
    ShareCancelled,
    /// Host cannot share this artifact. Triggers the fallback view.
    ShareUnsupported,
    /// Share failed for another reason. Triggers the fallback view.
    ShareRejected,
    /// Tree operation referenced a missing node or slot
    InvalidTarget,
    /// Download or fallback view could not be produced
    Delivery,
    /// Configuration could not be read
    Config,
    /// Ranking API request failed or returned an error body
    Upstream,
    /// Underlying I/O failure
    Io,
}

/// Language for user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Locale {
    /// Korean (the community's language)
    #[default]
    Ko,
    /// English
    En,
}

/// Errors that can occur while exporting a card
#[derive(Debug, Error)]
pub enum ExportError {
    /// Media never fired its loaded signal
    #[error("Media did not load within {ms}ms")]
    LoadTimeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Media fired its error signal
    #[error("Media failed to load: {message}")]
    LoadError {
        /// Error message
        message: String,
    },

    /// Snapshot retries exhausted
    #[error("Capture failed after {attempts} attempt(s): {message}")]
    CaptureFailed {
        /// Attempts made
        attempts: u32,
        /// Last failure
        message: String,
    },

    /// Empty frame sequence
    #[error("No frames were captured")]
    NoFrames,

    /// GIF assembly error
    #[error("Animation encoding failed: {message}")]
    EncodeFailed {
        /// Error message
        message: String,
    },

    /// Tree operation on a node that is missing or detached
    #[error("Invalid capture target: {message}")]
    InvalidTarget {
        /// Error message
        message: String,
    },

    /// Artifact could not be handed to the user
    #[error("Delivery failed: {message}")]
    Delivery {
        /// Error message
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Ranking API failure
    #[error("Upstream request failed: {message}")]
    Upstream {
        /// HTTP status, when a response arrived
        status: Option<u16>,
        /// Upstream message or transport error
        message: String,
    },

    /// Image decode or encode error
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ExportError {
    /// Create a capture failure
    #[must_use]
    pub fn capture_failed(attempts: u32, message: impl Into<String>) -> Self {
        Self::CaptureFailed {
            attempts,
            message: message.into(),
        }
    }

    /// Create an encode failure
    #[must_use]
    pub fn encode_failed(message: impl Into<String>) -> Self {
        Self::EncodeFailed {
            message: message.into(),
        }
    }

    /// Create an invalid target error
    #[must_use]
    pub fn invalid_target(message: impl Into<String>) -> Self {
        Self::InvalidTarget {
            message: message.into(),
        }
    }

    /// Create a delivery error
    #[must_use]
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
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

    /// Create an upstream failure
    #[must_use]
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }

    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::LoadTimeout { .. } => FailureKind::LoadTimeout,
            Self::LoadError { .. } => FailureKind::LoadError,
            Self::CaptureFailed { .. } | Self::Image(_) => FailureKind::CaptureFailed,
            Self::NoFrames => FailureKind::NoFrames,
            Self::EncodeFailed { .. } => FailureKind::EncodeFailed,
            Self::InvalidTarget { .. } => FailureKind::InvalidTarget,
            Self::Delivery { .. } => FailureKind::Delivery,
            Self::Config { .. } | Self::Json(_) | Self::Yaml(_) => FailureKind::Config,
            Self::Upstream { .. } => FailureKind::Upstream,
            Self::Io(_) => FailureKind::Io,
        }
    }

    /// Short message suitable for an inline error banner.
    ///
    /// Upstream errors that came back with a response show the server's own
    /// message. Everything else maps to a fixed localized text.
    #[must_use]
    pub fn user_message(&self, locale: Locale) -> Cow<'_, str> {
        match self {
            Self::Upstream {
                status: Some(_),
                message,
            } if !message.trim().is_empty() => Cow::Borrowed(message.as_str()),
            _ => Cow::Borrowed(self.fixed_message(locale)),
        }
    }

    const fn fixed_message(&self, locale: Locale) -> &'static str {
        match (self.kind(), locale) {
            (FailureKind::LoadTimeout | FailureKind::LoadError, Locale::Ko) => {
                "티어 영상을 불러오지 못했습니다. 잠시 후 다시 시도해 주세요."
            }
            (FailureKind::LoadTimeout | FailureKind::LoadError, Locale::En) => {
                "The tier video could not be loaded. Please try again."
            }
            (FailureKind::NoFrames | FailureKind::EncodeFailed, Locale::Ko) => {
                "GIF 생성에 실패했습니다."
            }
            (FailureKind::NoFrames | FailureKind::EncodeFailed, Locale::En) => {
                "Failed to create the GIF."
            }
            (FailureKind::Upstream, Locale::Ko) => "데이터를 불러오는데 실패했습니다.",
            (FailureKind::Upstream, Locale::En) => "Failed to load player data.",
            (_, Locale::Ko) => "이미지 다운로드에 실패했습니다.",
            (_, Locale::En) => "Failed to save the image.",
        }
    }
}

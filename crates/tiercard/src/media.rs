//! Media sources embedded in a card
//!
//! A [`MediaSource`] is the looping badge video. The pipeline never owns the
//! decode side; it only reads state, pauses, seeks and draws the current frame.

use async_trait::async_trait;
use image::RgbaImage;
use std::fmt;

/// Buffering state, ordered like the HTML media `readyState` ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum ReadyState {
    /// Nothing known about the resource
    #[default]
    HaveNothing,
    /// Duration and dimensions known, no frame data
    HaveMetadata,
    /// Data for the current playback position is available
    HaveCurrentData,
    /// Data beyond the current position is available
    HaveFutureData,
    /// Enough data to play through
    HaveEnoughData,
}

impl ReadyState {
    /// Whether a frame can be drawn right now
    #[must_use]
    pub const fn has_current_data(self) -> bool {
        matches!(
            self,
            Self::HaveCurrentData | Self::HaveFutureData | Self::HaveEnoughData
        )
    }
}

/// Error reported by the media element itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaError {
    /// Human-readable reason
    pub message: String,
}

impl MediaError {
    /// Create a new media error
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for MediaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for MediaError {}

/// Play/pause state captured before sampling and restored afterward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    /// Whether the media was playing on entry
    pub was_playing: bool,
}

impl PlaybackState {
    /// Capture the current state
    #[must_use]
    pub fn capture(media: &dyn MediaSource) -> Self {
        Self {
            was_playing: media.is_playing(),
        }
    }

    /// Resume playback if it was active on entry.
    ///
    /// Resuming is cosmetic. A rejected `play()` is logged and dropped so it
    /// can never fail an export.
    pub fn restore(self, media: &mut dyn MediaSource) {
        if !self.was_playing {
            return;
        }
        if let Err(e) = media.play() {
            tracing::warn!("resume after capture rejected, ignoring: {e}");
        }
    }
}

/// A seekable, drawable video source
#[async_trait]
pub trait MediaSource: Send + Sync + fmt::Debug {
    /// Current buffering state
    fn ready_state(&self) -> ReadyState;

    /// Duration in seconds; may be zero, NaN or infinite while unknown
    fn duration(&self) -> f64;

    /// Current playback position in seconds
    fn current_time(&self) -> f64;

    /// Natural pixel size; some platforms report `(0, 0)`
    fn natural_size(&self) -> (u32, u32);

    /// Whether playback is active
    fn is_playing(&self) -> bool;

    /// Start playback
    fn play(&mut self) -> Result<(), MediaError>;

    /// Pause playback
    fn pause(&mut self);

    /// Request a seek. Completion is signalled by [`MediaSource::seeked`].
    fn set_current_time(&mut self, seconds: f64);

    /// Resolves on the next "data loaded" or "error" signal
    async fn loaded(&mut self) -> Result<(), MediaError>;

    /// Resolves when the last requested seek has completed. May never
    /// resolve on some platforms; callers bound it with a deadline.
    async fn seeked(&mut self);

    /// Draw the frame at the current position, at natural size
    fn current_frame(&self) -> Option<RgbaImage>;
}

//! Snapshot engine with bounded retry
//!
//! Rasterization can transiently come back blank (fonts not loaded, a layout
//! pass still pending). The engine waits a settle delay, then retries with a
//! linear backoff, treating undersized output the same as an error.

use crate::config::CaptureConfig;
use crate::frame::Frame;
use crate::raster::{CaptureOptions, Rasterizer};
use crate::result::{ExportError, ExportResult};
use crate::scene::CaptureTarget;
use std::fmt;

/// Captures a whole target, retrying blank or failed attempts
pub struct SnapshotEngine<'r> {
    rasterizer: &'r dyn Rasterizer,
    config: CaptureConfig,
}

impl fmt::Debug for SnapshotEngine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotEngine")
            .field("config", &self.config)
            .finish()
    }
}

impl<'r> SnapshotEngine<'r> {
    /// Create an engine over a rasterizer
    #[must_use]
    pub fn new(rasterizer: &'r dyn Rasterizer, config: CaptureConfig) -> Self {
        Self { rasterizer, config }
    }

    /// Retry settings in use
    #[must_use]
    pub const fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Capture the target.
    ///
    /// Returns the first attempt whose output reaches `min_capture_bytes`.
    /// After `max_attempts` failures the last failure is returned as
    /// [`ExportError::CaptureFailed`].
    pub async fn capture(
        &self,
        target: &CaptureTarget,
        options: &CaptureOptions,
    ) -> ExportResult<Frame> {
        let max_attempts = self.config.max_attempts.max(1);
        tokio::time::sleep(self.config.settle_delay()).await;

        let mut last_failure = String::new();
        for attempt in 1..=max_attempts {
            match self.rasterizer.rasterize(target, options).await {
                Ok(frame) if frame.size_bytes() >= self.config.min_capture_bytes => {
                    tracing::debug!(attempt, bytes = frame.size_bytes(), "capture succeeded");
                    return Ok(frame);
                }
                Ok(frame) => {
                    last_failure = format!(
                        "capture produced {} bytes, below the {} byte minimum",
                        frame.size_bytes(),
                        self.config.min_capture_bytes
                    );
                }
                Err(e) => last_failure = e.to_string(),
            }
            tracing::warn!(attempt, max_attempts, "capture attempt failed: {last_failure}");

            if attempt < max_attempts {
                tokio::time::sleep(self.config.retry_delay(attempt)).await;
            }
        }

        Err(ExportError::capture_failed(max_attempts, last_failure))
    }
}

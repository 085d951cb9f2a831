//! Single-frame swap for still exports of video cards

use crate::config::{LoaderConfig, SwapConfig};
use crate::frame::Frame;
use crate::loader::{draw_current_frame, ensure_ready};
use crate::media::MediaSource;
use crate::platform::PlatformCapabilities;
use crate::raster::CaptureOptions;
use crate::result::ExportResult;
use crate::scene::{CaptureTarget, NodeId};
use crate::snapshot::SnapshotEngine;
use image::RgbaImage;
use std::sync::Arc;

/// Swaps a video for its current frame, captures, and swaps it back
#[derive(Debug)]
pub struct SwapAdapter<'r> {
    engine: SnapshotEngine<'r>,
    loader: LoaderConfig,
    config: SwapConfig,
    caps: PlatformCapabilities,
    options: CaptureOptions,
}

impl<'r> SwapAdapter<'r> {
    /// Create an adapter
    #[must_use]
    pub fn new(
        engine: SnapshotEngine<'r>,
        loader: LoaderConfig,
        config: SwapConfig,
        caps: PlatformCapabilities,
        options: CaptureOptions,
    ) -> Self {
        Self {
            engine,
            loader,
            config,
            caps,
            options,
        }
    }

    /// Capture the target with the video at `media` replaced by its current
    /// frame
    pub async fn with_substitute(
        &self,
        target: &mut CaptureTarget,
        media: NodeId,
    ) -> ExportResult<Frame> {
        let loader = self.loader.clone();
        self.with_substitute_using(target, media, move |m| draw_current_frame(m, &loader))
            .await
    }

    /// Like [`SwapAdapter::with_substitute`] with a custom still builder.
    ///
    /// The original node is back in its slot on every return path, and a
    /// capture error takes precedence over a restore error.
    pub async fn with_substitute_using<F>(
        &self,
        target: &mut CaptureTarget,
        media: NodeId,
        build: F,
    ) -> ExportResult<Frame>
    where
        F: FnOnce(&dyn MediaSource) -> ExportResult<RgbaImage> + Send,
    {
        ensure_ready(target.media_mut(media)?, &self.loader).await?;
        let still = build(target.media(media)?)?;
        let record = target.replace_with_substitute(media, Arc::new(still))?;

        tokio::time::sleep(
            self.caps
                .stabilize_delay(self.config.desktop_stabilize_ms, self.config.handheld_stabilize_ms),
        )
        .await;

        let captured = self.engine.capture(target, &self.options).await;
        let restored = target.restore(record);
        let frame = captured?;
        restored?;
        Ok(frame)
    }
}

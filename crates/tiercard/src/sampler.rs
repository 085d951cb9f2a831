//! Frame sampler
//!
//! Seeks the badge video to evenly spaced timestamps and captures the whole
//! card at each one. The video is detached once for the whole run; each frame
//! puts a fresh substitute into the vacated slot and removes it after capture,
//! so at most one substitute exists at any time.
//!
//! Sampling never fails. A frame that cannot be drawn or captured is logged
//! and skipped, and the caller decides what an empty sequence means.

use crate::config::{LoaderConfig, SamplerConfig, MAX_FRAME_COUNT};
use crate::frame::{Frame, FrameSequence};
use crate::loader::draw_current_frame;
use crate::media::PlaybackState;
use crate::platform::PlatformCapabilities;
use crate::raster::CaptureOptions;
use crate::result::ExportResult;
use crate::scene::{CaptureTarget, DetachedNode, NodeId};
use crate::snapshot::SnapshotEngine;
use std::sync::Arc;

/// Duration used for sampling: the reported one if usable, else `fallback`
#[must_use]
pub fn effective_duration(reported: f64, fallback: f64) -> f64 {
    if reported.is_finite() && reported > 0.0 {
        reported
    } else {
        fallback
    }
}

/// `frame_count` evenly spaced timestamps across `duration`, starting at zero.
/// Counts above [`MAX_FRAME_COUNT`] are capped.
#[must_use]
pub fn sample_timestamps(duration: f64, frame_count: usize) -> Vec<f64> {
    let frame_count = frame_count.min(MAX_FRAME_COUNT);
    if frame_count == 0 || !(duration.is_finite() && duration > 0.0) {
        return Vec::new();
    }
    let interval = duration / frame_count as f64;
    (0..frame_count)
        .map(|i| (i as f64 * interval) % duration)
        .collect()
}

/// Captures a frame sequence from a target's video
#[derive(Debug)]
pub struct FrameSampler<'r> {
    engine: SnapshotEngine<'r>,
    loader: LoaderConfig,
    config: SamplerConfig,
    caps: PlatformCapabilities,
    options: CaptureOptions,
}

impl<'r> FrameSampler<'r> {
    /// Create a sampler
    #[must_use]
    pub fn new(
        engine: SnapshotEngine<'r>,
        loader: LoaderConfig,
        config: SamplerConfig,
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

    /// Sample `frame_count` frames of the video at `media`.
    ///
    /// On return the video is back in its original slot and its play state
    /// matches the state on entry.
    pub async fn sample(
        &self,
        target: &mut CaptureTarget,
        media: NodeId,
        frame_count: usize,
    ) -> FrameSequence {
        let (playback, reported) = match target.media(media) {
            Ok(m) => (PlaybackState::capture(m), m.duration()),
            Err(e) => {
                tracing::warn!("cannot sample: {e}");
                return Vec::new();
            }
        };
        let duration = effective_duration(reported, self.config.fallback_duration_secs);
        let timestamps = sample_timestamps(duration, frame_count);

        if let Ok(m) = target.media_mut(media) {
            m.pause();
        }
        let slot = match target.detach(media) {
            Ok(slot) => slot,
            Err(e) => {
                tracing::warn!("cannot detach media for sampling: {e}");
                if let Ok(m) = target.media_mut(media) {
                    playback.restore(m);
                }
                return Vec::new();
            }
        };

        let mut frames = Vec::with_capacity(timestamps.len());
        for (i, &at) in timestamps.iter().enumerate() {
            match self.capture_at(target, media, &slot, at).await {
                Ok(frame) => {
                    let index = frames.len();
                    frames.push(frame.with_index(index));
                }
                Err(e) => tracing::warn!(frame = i, at, "skipping frame: {e}"),
            }
        }

        if let Err(e) = target.reattach(slot) {
            tracing::error!("failed to reattach media after sampling: {e}");
        }
        if let Ok(m) = target.media_mut(media) {
            playback.restore(m);
        }

        tracing::debug!(
            requested = frame_count,
            captured = frames.len(),
            duration,
            "sampling finished"
        );
        frames
    }

    async fn capture_at(
        &self,
        target: &mut CaptureTarget,
        media: NodeId,
        slot: &DetachedNode,
        at: f64,
    ) -> ExportResult<Frame> {
        let source = target.media_mut(media)?;
        source.set_current_time(at);
        if tokio::time::timeout(self.loader.seek_timeout(), source.seeked())
            .await
            .is_err()
        {
            tracing::debug!(at, "no seek signal, proceeding");
        }

        let still = draw_current_frame(target.media(media)?, &self.loader)?;
        let substitute = target.insert_substitute(slot, Arc::new(still))?;
        tokio::time::sleep(self.caps.stabilize_delay(
            self.config.desktop_stabilize_ms,
            self.config.handheld_stabilize_ms,
        ))
        .await;

        let captured = self.engine.capture(target, &self.options).await;
        let removed = target.remove(substitute);
        let frame = captured?;
        removed?;
        Ok(frame)
    }
}

//! Export orchestrator
//!
//! Sequences one export call:
//!
//! ```text
//! Idle -> DetectingMedia -> Capturing ------------------> Delivering -> Done
//!                        \-> SamplingFrames -> Encoding -/
//!                 (any state) -> Failed
//! ```
//!
//! Each call takes the target by exclusive borrow, so two exports can never
//! race on the same tree.

use crate::config::{ExportConfig, MAX_FRAME_COUNT};
use crate::delivery::{DeliveryDispatcher, DeliveryHost, DeliveryMethod};
use crate::encoder::AnimationEncoder;
use crate::frame::{with_extension, ArtifactKind, ExportArtifact};
use crate::loader::ensure_ready;
use crate::platform::PlatformCapabilities;
use crate::raster::{CaptureOptions, Rasterizer};
use crate::result::{ExportError, ExportResult, FailureKind, Locale};
use crate::sampler::FrameSampler;
use crate::scene::{CaptureTarget, NodeId};
use crate::snapshot::SnapshotEngine;
use crate::swap::SwapAdapter;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Stage of an export call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportState {
    /// Not started
    Idle,
    /// Looking for a video in the target
    DetectingMedia,
    /// Capturing a single still
    Capturing,
    /// Capturing the loop frame sequence
    SamplingFrames,
    /// Assembling the animation
    Encoding,
    /// Handing the artifact to the host
    Delivering,
    /// Finished successfully
    Done,
    /// Stopped on an unrecoverable error
    Failed(FailureKind),
}

/// Loop export parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoopOptions {
    /// Frames to sample across the video's duration
    pub frame_count: usize,
    /// Display time per frame in tenths of a second
    pub frame_duration: f64,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            frame_count: 20,
            frame_duration: 1.0,
        }
    }
}

impl LoopOptions {
    /// Reject frame counts above [`MAX_FRAME_COUNT`]
    pub fn validate(&self) -> ExportResult<()> {
        if self.frame_count > MAX_FRAME_COUNT {
            return Err(ExportError::config(format!(
                "frame_count {} exceeds the limit of {MAX_FRAME_COUNT}",
                self.frame_count
            )));
        }
        Ok(())
    }
}

/// What a successful export produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportReceipt {
    /// States visited, in order
    pub states: Vec<ExportState>,
    /// Still or animation
    pub kind: ArtifactKind,
    /// Filename the artifact was delivered under
    pub filename: String,
    /// Frames in the artifact
    pub frame_count: usize,
    /// Encoded size
    pub bytes: usize,
    /// Pixel width
    pub width: u32,
    /// Pixel height
    pub height: u32,
    /// How the artifact reached the user
    pub delivery: DeliveryMethod,
}

/// Runs exports against one rasterizer and delivery host
#[derive(Debug)]
pub struct Exporter<R, H> {
    rasterizer: R,
    host: H,
    config: ExportConfig,
    caps: PlatformCapabilities,
    locale: Locale,
    states: Vec<ExportState>,
}

impl<R, H> Exporter<R, H>
where
    R: Rasterizer,
    H: DeliveryHost,
{
    /// Create an exporter with the default configuration on desktop
    #[must_use]
    pub fn new(rasterizer: R, host: H) -> Self {
        Self {
            rasterizer,
            host,
            config: ExportConfig::default(),
            caps: PlatformCapabilities::default(),
            locale: Locale::default(),
            states: vec![ExportState::Idle],
        }
    }

    /// Set the configuration
    #[must_use]
    pub fn with_config(mut self, config: ExportConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the platform
    #[must_use]
    pub const fn with_platform(mut self, caps: PlatformCapabilities) -> Self {
        self.caps = caps;
        self
    }

    /// Set the language for user-facing messages
    #[must_use]
    pub const fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Get the configuration
    #[must_use]
    pub const fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Get the platform
    #[must_use]
    pub const fn platform(&self) -> &PlatformCapabilities {
        &self.caps
    }

    /// Borrow the host
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// Consume the exporter, returning the host
    pub fn into_host(self) -> H {
        self.host
    }

    /// States visited by the most recent call
    #[must_use]
    pub fn last_states(&self) -> &[ExportState] {
        &self.states
    }

    /// Banner text for an error in the configured language
    #[must_use]
    pub fn user_message<'e>(&self, error: &'e ExportError) -> Cow<'e, str> {
        error.user_message(self.locale)
    }

    /// Export the target as a PNG
    pub async fn export_still(
        &mut self,
        target: &mut CaptureTarget,
        filename: &str,
    ) -> ExportResult<ExportReceipt> {
        self.begin();
        self.enter(ExportState::DetectingMedia);
        let media = target.find_media();
        let result = self.still(target, media, filename).await;
        self.finish(result)
    }

    /// Export the target as a looping GIF. Targets without a video degrade
    /// to a still export under a `.png` filename.
    pub async fn export_loop(
        &mut self,
        target: &mut CaptureTarget,
        filename: &str,
        options: LoopOptions,
    ) -> ExportResult<ExportReceipt> {
        self.begin();
        self.enter(ExportState::DetectingMedia);
        let result = match target.find_media() {
            None => {
                let still_name = with_extension(filename, ArtifactKind::Png.extension());
                tracing::info!(filename = %still_name, "no video in card, exporting a still instead");
                self.still(target, None, &still_name).await
            }
            Some(media) => self.animation(target, media, filename, options).await,
        };
        self.finish(result)
    }

    fn capture_options(&self) -> CaptureOptions {
        CaptureOptions::with_pixel_ratio(self.caps.capture_scale(&self.config.capture))
    }

    fn engine(&self) -> SnapshotEngine<'_> {
        SnapshotEngine::new(&self.rasterizer, self.config.capture.clone())
    }

    async fn still(
        &mut self,
        target: &mut CaptureTarget,
        media: Option<NodeId>,
        filename: &str,
    ) -> ExportResult<(ExportArtifact, DeliveryMethod)> {
        self.enter(ExportState::Capturing);
        let options = self.capture_options();
        let frame = match media {
            None => self.engine().capture(target, &options).await?,
            Some(id) => {
                SwapAdapter::new(
                    self.engine(),
                    self.config.loader.clone(),
                    self.config.swap.clone(),
                    self.caps,
                    options,
                )
                .with_substitute(target, id)
                .await?
            }
        };
        self.deliver(ExportArtifact::still(frame, filename)).await
    }

    async fn animation(
        &mut self,
        target: &mut CaptureTarget,
        media: NodeId,
        filename: &str,
        options: LoopOptions,
    ) -> ExportResult<(ExportArtifact, DeliveryMethod)> {
        options.validate()?;
        self.enter(ExportState::SamplingFrames);
        ensure_ready(target.media_mut(media)?, &self.config.loader).await?;
        let frames = FrameSampler::new(
            self.engine(),
            self.config.loader.clone(),
            self.config.sampler.clone(),
            self.caps,
            self.capture_options(),
        )
        .sample(target, media, options.frame_count)
        .await;
        if frames.is_empty() {
            return Err(ExportError::NoFrames);
        }

        self.enter(ExportState::Encoding);
        let artifact = AnimationEncoder::new(self.config.encoder.clone())
            .encode(frames, options.frame_duration, filename)
            .await?;
        self.deliver(artifact).await
    }

    async fn deliver(
        &mut self,
        artifact: ExportArtifact,
    ) -> ExportResult<(ExportArtifact, DeliveryMethod)> {
        self.enter(ExportState::Delivering);
        let method = DeliveryDispatcher::new(self.caps)
            .deliver(&mut self.host, &artifact)
            .await?;
        Ok((artifact, method))
    }

    fn begin(&mut self) {
        self.states.clear();
        self.states.push(ExportState::Idle);
    }

    fn enter(&mut self, state: ExportState) {
        tracing::debug!(?state, "export state");
        self.states.push(state);
    }

    fn finish(
        &mut self,
        result: ExportResult<(ExportArtifact, DeliveryMethod)>,
    ) -> ExportResult<ExportReceipt> {
        match result {
            Ok((artifact, delivery)) => {
                self.enter(ExportState::Done);
                Ok(ExportReceipt {
                    states: self.states.clone(),
                    kind: artifact.kind,
                    filename: artifact.filename,
                    frame_count: artifact.frame_count,
                    bytes: artifact.data.len(),
                    width: artifact.width,
                    height: artifact.height,
                    delivery,
                })
            }
            Err(e) => {
                self.enter(ExportState::Failed(e.kind()));
                tracing::warn!(kind = ?e.kind(), "export failed: {e}");
                Err(e)
            }
        }
    }
}

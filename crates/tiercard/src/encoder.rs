//! Animation encoder
//!
//! Assembles a frame sequence into a looping GIF on a fixed canvas. Palette
//! quantization is the expensive step; it runs on a rayon pool inside a
//! blocking task so the cooperative runtime stays responsive. Frames are then
//! written in sequence order.

use crate::config::EncoderConfig;
use crate::frame::{ExportArtifact, Frame, FrameSequence};
use crate::result::{ExportError, ExportResult};
use gif::{Encoder, Repeat};
use image::imageops::{self, FilterType};
use image::ImageFormat;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

/// GIF delay in centiseconds for a frame duration given in tenths of a second
#[must_use]
pub fn frame_delay_cs(frame_duration: f64) -> u16 {
    if !frame_duration.is_finite() {
        return 10;
    }
    (frame_duration * 10.0).round().clamp(1.0, f64::from(u16::MAX)) as u16
}

/// Turns frame sequences into GIF artifacts
#[derive(Debug, Clone, Default)]
pub struct AnimationEncoder {
    config: EncoderConfig,
}

impl AnimationEncoder {
    /// Create an encoder
    #[must_use]
    pub const fn new(config: EncoderConfig) -> Self {
        Self { config }
    }

    /// Get the current configuration
    #[must_use]
    pub const fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Encode `frames` into a looping animation named `filename`.
    ///
    /// `frame_duration` is in tenths of a second per frame.
    pub async fn encode(
        &self,
        frames: FrameSequence,
        frame_duration: f64,
        filename: &str,
    ) -> ExportResult<ExportArtifact> {
        if frames.is_empty() {
            return Err(ExportError::NoFrames);
        }
        let frame_count = frames.len();
        let config = self.config.clone();
        let delay = frame_delay_cs(frame_duration);

        let data = tokio::task::spawn_blocking(move || encode_gif(&config, frames, delay))
            .await
            .map_err(|e| ExportError::encode_failed(format!("encoder task failed: {e}")))??;

        tracing::info!(
            frames = frame_count,
            bytes = data.len(),
            delay_cs = delay,
            "animation encoded"
        );
        Ok(ExportArtifact::animation(
            data,
            self.config.width,
            self.config.height,
            frame_count,
            filename,
        ))
    }
}

/// Encode synchronously. Blocks for the whole quantization pass.
pub fn encode_gif(config: &EncoderConfig, frames: FrameSequence, delay_cs: u16) -> ExportResult<Vec<u8>> {
    if frames.is_empty() {
        return Err(ExportError::NoFrames);
    }
    let width = u16::try_from(config.width)
        .ok()
        .filter(|w| *w > 0)
        .ok_or_else(|| ExportError::encode_failed(format!("invalid canvas width {}", config.width)))?;
    let height = u16::try_from(config.height)
        .ok()
        .filter(|h| *h > 0)
        .ok_or_else(|| {
            ExportError::encode_failed(format!("invalid canvas height {}", config.height))
        })?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .map_err(|e| ExportError::encode_failed(format!("worker pool: {e}")))?;
    let speed = quality_to_speed(config.quality);

    let quantized: Vec<gif::Frame<'static>> = pool.install(|| {
        frames
            .into_par_iter()
            .map(|frame| quantize(&frame, width, height, speed, delay_cs))
            .collect::<ExportResult<Vec<_>>>()
    })?;

    let mut output = Vec::new();
    {
        let mut encoder = Encoder::new(&mut output, width, height, &[])
            .map_err(|e| ExportError::encode_failed(format!("Failed to create GIF encoder: {e}")))?;

        let repeat = if config.loop_count == 0 {
            Repeat::Infinite
        } else {
            Repeat::Finite(config.loop_count)
        };
        encoder
            .set_repeat(repeat)
            .map_err(|e| ExportError::encode_failed(format!("Failed to set GIF repeat: {e}")))?;

        for frame in &quantized {
            encoder
                .write_frame(frame)
                .map_err(|e| ExportError::encode_failed(format!("Failed to write GIF frame: {e}")))?;
        }
    }

    if output.is_empty() {
        return Err(ExportError::encode_failed("encoder produced no output"));
    }
    Ok(output)
}

fn quantize(
    frame: &Frame,
    width: u16,
    height: u16,
    speed: i32,
    delay_cs: u16,
) -> ExportResult<gif::Frame<'static>> {
    let img = image::load_from_memory_with_format(&frame.data, ImageFormat::Png)
        .map_err(|e| ExportError::encode_failed(format!("frame {}: {e}", frame.index)))?
        .to_rgba8();

    // Scaled to the canvas, never letterboxed or cropped
    let (w, h) = (u32::from(width), u32::from(height));
    let img = if img.dimensions() == (w, h) {
        img
    } else {
        imageops::resize(&img, w, h, FilterType::Triangle)
    };

    let mut pixels = img.into_raw();
    let mut out = gif::Frame::from_rgba_speed(width, height, &mut pixels, speed);
    out.delay = delay_cs;
    Ok(out)
}

/// Convert quality (1-100) to GIF encoder speed (1-30)
fn quality_to_speed(quality: u8) -> i32 {
    // quality 100 -> speed 1 (slowest, best palette)
    let normalized = i32::from(100 - quality.clamp(1, 100));
    (normalized * 29 / 100 + 1).clamp(1, 30)
}

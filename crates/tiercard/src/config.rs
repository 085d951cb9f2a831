//! Export configuration
//!
//! Every delay and size the pipeline uses lives here. Values are tunable; the
//! defaults are what the pipeline ships with.

use crate::result::{ExportError, ExportResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Width of the GIF canvas in pixels
pub const GIF_CANVAS_WIDTH: u32 = 352;

/// Height of the GIF canvas in pixels
pub const GIF_CANVAS_HEIGHT: u32 = 578;

/// Size substituted when media reports zero natural dimensions
pub const FALLBACK_MEDIA_SIZE: u32 = 340;

/// Most frames one loop export may sample
pub const MAX_FRAME_COUNT: usize = 600;

/// Snapshot engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Delay before the first attempt, letting pending layout settle
    pub settle_delay_ms: u64,
    /// Base of the linear backoff between attempts (`base * attempt`)
    pub retry_base_ms: u64,
    /// Maximum attempts per capture
    pub max_attempts: u32,
    /// Encoded results shorter than this are treated as blank captures
    pub min_capture_bytes: usize,
    /// Pixel-density multiplier on desktop
    pub desktop_scale: f64,
    /// Upper bound for the handheld pixel-density multiplier
    pub handheld_scale_cap: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 100,
            retry_base_ms: 200,
            max_attempts: 3,
            min_capture_bytes: 1_000,
            desktop_scale: 2.0,
            handheld_scale_cap: 2.0,
        }
    }
}

impl CaptureConfig {
    /// Set the maximum number of attempts (at least one)
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Set the blank-capture threshold
    #[must_use]
    pub const fn with_min_capture_bytes(mut self, bytes: usize) -> Self {
        self.min_capture_bytes = bytes;
        self
    }

    /// Settle delay as Duration
    #[must_use]
    pub const fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Backoff before retry number `attempt` (1-based)
    #[must_use]
    pub const fn retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_base_ms.saturating_mul(attempt as u64))
    }

    fn validate(&self) -> ExportResult<()> {
        if self.max_attempts == 0 {
            return Err(ExportError::config("capture.max_attempts must be at least 1"));
        }
        if !(self.desktop_scale.is_finite() && self.desktop_scale > 0.0) {
            return Err(ExportError::config(format!(
                "capture.desktop_scale must be a positive number, got {}",
                self.desktop_scale
            )));
        }
        if !(self.handheld_scale_cap.is_finite() && self.handheld_scale_cap >= 1.0) {
            return Err(ExportError::config(format!(
                "capture.handheld_scale_cap must be at least 1.0, got {}",
                self.handheld_scale_cap
            )));
        }
        Ok(())
    }
}

/// Media readiness and seeking
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Deadline for the loaded/error signal
    pub load_timeout_ms: u64,
    /// Deadline for a seek completion signal; sampling proceeds after it
    pub seek_timeout_ms: u64,
    /// Square size used when the media reports zero dimensions
    pub fallback_media_size: u32,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: 5_000,
            seek_timeout_ms: 300,
            fallback_media_size: FALLBACK_MEDIA_SIZE,
        }
    }
}

impl LoaderConfig {
    /// Load deadline as Duration
    #[must_use]
    pub const fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.load_timeout_ms)
    }

    /// Seek deadline as Duration
    #[must_use]
    pub const fn seek_timeout(&self) -> Duration {
        Duration::from_millis(self.seek_timeout_ms)
    }

    /// Replace zero dimensions with the fallback square
    #[must_use]
    pub const fn surface_size(&self, natural: (u32, u32)) -> (u32, u32) {
        if natural.0 == 0 || natural.1 == 0 {
            (self.fallback_media_size, self.fallback_media_size)
        } else {
            natural
        }
    }
}

/// Frame sampler timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Duration assumed when the media reports none (seconds)
    pub fallback_duration_secs: f64,
    /// Stabilization delay after inserting a substitute on desktop
    pub desktop_stabilize_ms: u64,
    /// Stabilization delay after inserting a substitute on handheld
    pub handheld_stabilize_ms: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            fallback_duration_secs: 2.0,
            desktop_stabilize_ms: 50,
            handheld_stabilize_ms: 150,
        }
    }
}

/// Single-frame swap timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwapConfig {
    /// Stabilization delay after the swap on desktop
    pub desktop_stabilize_ms: u64,
    /// Stabilization delay after the swap on handheld
    pub handheld_stabilize_ms: u64,
}

impl Default for SwapConfig {
    fn default() -> Self {
        Self {
            desktop_stabilize_ms: 150,
            handheld_stabilize_ms: 300,
        }
    }
}

/// GIF encoder settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
    /// Quality level (1-100, affects palette quantization)
    pub quality: u8,
    /// Loop count (0 = infinite)
    pub loop_count: u16,
    /// Worker threads for palette quantization (0 = one per core)
    pub workers: usize,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            width: GIF_CANVAS_WIDTH,
            height: GIF_CANVAS_HEIGHT,
            quality: 80,
            loop_count: 0,
            workers: 2,
        }
    }
}

impl EncoderConfig {
    /// Set quality (1-100)
    #[must_use]
    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    /// Set worker count hint
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set canvas size
    #[must_use]
    pub const fn with_canvas(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Snapshot engine
    pub capture: CaptureConfig,
    /// Media loader
    pub loader: LoaderConfig,
    /// Frame sampler
    pub sampler: SamplerConfig,
    /// Single-frame swap
    pub swap: SwapConfig,
    /// Animation encoder
    pub encoder: EncoderConfig,
}

impl ExportConfig {
    /// Create the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the capture section
    #[must_use]
    pub fn with_capture(mut self, capture: CaptureConfig) -> Self {
        self.capture = capture;
        self
    }

    /// Parse YAML
    pub fn from_yaml_str(text: &str) -> ExportResult<Self> {
        let config: Self = serde_yaml_ng::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse JSON
    pub fn from_json_str(text: &str) -> ExportResult<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> ExportResult<()> {
        self.capture.validate()?;
        let fallback = self.sampler.fallback_duration_secs;
        if !(fallback.is_finite() && fallback > 0.0) {
            return Err(ExportError::config(format!(
                "sampler.fallback_duration_secs must be a positive number, got {fallback}"
            )));
        }
        if self.encoder.width == 0 || self.encoder.height == 0 {
            return Err(ExportError::config("encoder canvas must be non-empty"));
        }
        Ok(())
    }

    /// Render as YAML
    pub fn to_yaml_string(&self) -> ExportResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Load from a `.yaml`, `.yml` or `.json` file
    pub fn from_file(path: &Path) -> ExportResult<Self> {
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            Some("json") => Self::from_json_str(&text),
            other => Err(ExportError::config(format!(
                "unsupported config extension {:?} for {}",
                other.unwrap_or(""),
                path.display()
            ))),
        }
    }
}

//! Frame-backed media
//!
//! [`ClipMedia`] plays a list of decoded RGBA frames. It loads badge loops from
//! animated GIF files and can emulate the quirks of handheld platforms: media
//! that never loads, seeks that never report completion, zero natural size and
//! rejected resumes.

use crate::media::{MediaError, MediaSource, ReadyState};
use crate::result::ExportResult;
use async_trait::async_trait;
use image::codecs::gif::GifDecoder;
use image::{AnimationDecoder, Rgba, RgbaImage};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// How the clip answers [`MediaSource::loaded`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadBehavior {
    /// Already buffered
    Immediate,
    /// Fires the loaded signal after a delay
    Delayed(Duration),
    /// Neither loaded nor error ever fires
    Never,
    /// Fires the error signal
    Fail(String),
}

#[derive(Debug, Clone)]
struct ClipFrame {
    at: f64,
    image: Arc<RgbaImage>,
}

/// Media backed by pre-decoded frames
#[derive(Debug)]
pub struct ClipMedia {
    frames: Vec<ClipFrame>,
    duration: f64,
    reported_duration: Option<f64>,
    natural_size: (u32, u32),
    current_time: f64,
    playing: bool,
    ready: ReadyState,
    load: LoadBehavior,
    seek_signal: bool,
    reject_play: bool,
    seek_log: Vec<f64>,
}

impl ClipMedia {
    /// Create a playing, fully buffered clip from `(timestamp, frame)` pairs
    #[must_use]
    pub fn new(mut frames: Vec<(f64, RgbaImage)>, duration: f64) -> Self {
        frames.sort_by(|a, b| a.0.total_cmp(&b.0));
        let natural_size = frames
            .first()
            .map_or((0, 0), |(_, img)| img.dimensions());
        Self {
            frames: frames
                .into_iter()
                .map(|(at, image)| ClipFrame {
                    at,
                    image: Arc::new(image),
                })
                .collect(),
            duration,
            reported_duration: None,
            natural_size,
            current_time: 0.0,
            playing: true,
            ready: ReadyState::HaveEnoughData,
            load: LoadBehavior::Immediate,
            seek_signal: true,
            reject_play: false,
            seek_log: Vec::new(),
        }
    }

    /// A clip cycling through solid colors, one per equal time slice
    #[must_use]
    pub fn color_cycle(width: u32, height: u32, colors: &[[u8; 4]], duration: f64) -> Self {
        let step = duration / colors.len().max(1) as f64;
        let frames = colors
            .iter()
            .enumerate()
            .map(|(i, color)| {
                (
                    i as f64 * step,
                    RgbaImage::from_pixel(width, height, Rgba(*color)),
                )
            })
            .collect();
        Self::new(frames, duration)
    }

    /// Decode an animated GIF into a clip
    pub fn from_gif_bytes(bytes: &[u8]) -> ExportResult<Self> {
        let decoder = GifDecoder::new(Cursor::new(bytes))?;
        let mut at = 0.0;
        let mut frames = Vec::new();
        for frame in decoder.into_frames() {
            let frame = frame?;
            let (numer, denom) = frame.delay().numer_denom_ms();
            let delay_secs = if denom == 0 {
                0.0
            } else {
                f64::from(numer) / f64::from(denom) / 1000.0
            };
            frames.push((at, frame.into_buffer()));
            // Zero-delay GIFs play at the browser minimum of 100ms
            at += if delay_secs > 0.0 { delay_secs } else { 0.1 };
        }
        Ok(Self::new(frames, at))
    }

    /// Decode an animated GIF file into a clip
    pub fn from_gif_file(path: &Path) -> ExportResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::from_gif_bytes(&bytes)
    }

    /// Set the load behavior; anything but `Immediate` starts unbuffered
    #[must_use]
    pub fn with_load(mut self, load: LoadBehavior) -> Self {
        self.ready = if load == LoadBehavior::Immediate {
            ReadyState::HaveEnoughData
        } else {
            ReadyState::HaveNothing
        };
        self.load = load;
        self
    }

    /// Report this duration instead of the real one (NaN, infinity, zero)
    #[must_use]
    pub const fn with_reported_duration(mut self, duration: f64) -> Self {
        self.reported_duration = Some(duration);
        self
    }

    /// Never fire the seek completion signal
    #[must_use]
    pub const fn without_seek_signal(mut self) -> Self {
        self.seek_signal = false;
        self
    }

    /// Report `(0, 0)` natural dimensions
    #[must_use]
    pub const fn with_zero_natural_size(mut self) -> Self {
        self.natural_size = (0, 0);
        self
    }

    /// Reject every `play()` call
    #[must_use]
    pub const fn rejecting_play(mut self) -> Self {
        self.reject_play = true;
        self
    }

    /// Start paused instead of autoplaying
    #[must_use]
    pub const fn paused(mut self) -> Self {
        self.playing = false;
        self
    }

    /// Every seek target requested so far
    #[must_use]
    pub fn seek_log(&self) -> &[f64] {
        &self.seek_log
    }

    /// Number of decoded frames
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

#[async_trait]
impl MediaSource for ClipMedia {
    fn ready_state(&self) -> ReadyState {
        self.ready
    }

    fn duration(&self) -> f64 {
        self.reported_duration.unwrap_or(self.duration)
    }

    fn current_time(&self) -> f64 {
        self.current_time
    }

    fn natural_size(&self) -> (u32, u32) {
        self.natural_size
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn play(&mut self) -> Result<(), MediaError> {
        if self.reject_play {
            return Err(MediaError::new("play() request was interrupted"));
        }
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.seek_log.push(seconds);
        self.current_time = seconds.clamp(0.0, self.duration.max(0.0));
    }

    async fn loaded(&mut self) -> Result<(), MediaError> {
        match self.load.clone() {
            LoadBehavior::Immediate => {}
            LoadBehavior::Delayed(delay) => tokio::time::sleep(delay).await,
            LoadBehavior::Never => std::future::pending::<()>().await,
            LoadBehavior::Fail(message) => return Err(MediaError::new(message)),
        }
        self.ready = ReadyState::HaveEnoughData;
        Ok(())
    }

    async fn seeked(&mut self) {
        if self.seek_signal {
            tokio::task::yield_now().await;
        } else {
            std::future::pending::<()>().await;
        }
    }

    fn current_frame(&self) -> Option<RgbaImage> {
        if !self.ready.has_current_data() {
            return None;
        }
        self.frames
            .iter()
            .take_while(|f| f.at <= self.current_time)
            .last()
            .or_else(|| self.frames.first())
            .map(|f| f.image.as_ref().clone())
    }
}

//! Frames and export artifacts
//!
//! A [`Frame`] is one encoded PNG snapshot of the whole card. Frames are moved,
//! never cloned: each is consumed by exactly one encoder or dispatcher.

use crate::result::{ExportError, ExportResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

/// PNG compression level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CompressionLevel {
    /// Fast compression (larger files)
    Fast,
    /// Default compression
    #[default]
    Default,
    /// Best compression (slowest, smallest files)
    Best,
}

impl CompressionLevel {
    fn to_png_compression(self) -> png::Compression {
        match self {
            Self::Fast => png::Compression::Fast,
            Self::Default => png::Compression::Default,
            Self::Best => png::Compression::Best,
        }
    }
}

/// Lossless RGBA PNG writer
#[derive(Debug, Clone)]
pub struct PngEncoder {
    compression: CompressionLevel,
    software: String,
}

impl Default for PngEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl PngEncoder {
    /// Create an encoder with default compression
    #[must_use]
    pub fn new() -> Self {
        Self {
            compression: CompressionLevel::Default,
            software: format!("tiercard {}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Set the compression level
    #[must_use]
    pub const fn with_compression(mut self, compression: CompressionLevel) -> Self {
        self.compression = compression;
        self
    }

    /// Encode an RGBA image
    pub fn encode(&self, img: &RgbaImage) -> ExportResult<Vec<u8>> {
        let (width, height) = img.dimensions();
        let mut output = Vec::new();

        {
            let mut encoder = png::Encoder::new(&mut output, width, height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            encoder.set_compression(self.compression.to_png_compression());
            encoder
                .add_text_chunk("Software".to_string(), self.software.clone())
                .map_err(|e| ExportError::capture_failed(1, format!("PNG metadata: {e}")))?;

            let mut writer = encoder
                .write_header()
                .map_err(|e| ExportError::capture_failed(1, format!("PNG header: {e}")))?;

            writer
                .write_image_data(img.as_raw())
                .map_err(|e| ExportError::capture_failed(1, format!("PNG data: {e}")))?;
        }

        Ok(output)
    }
}

/// One encoded snapshot of the capture target
#[derive(Debug)]
pub struct Frame {
    /// Position in the sequence
    pub index: usize,
    /// PNG bytes
    pub data: Vec<u8>,
    /// Width in device pixels
    pub width: u32,
    /// Height in device pixels
    pub height: u32,
    /// Pixel-density multiplier the frame was rendered at
    pub device_pixel_ratio: f64,
}

impl Frame {
    /// Create a frame from PNG bytes
    #[must_use]
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            index: 0,
            data,
            width,
            height,
            device_pixel_ratio: 1.0,
        }
    }

    /// Encode an RGBA image into a frame
    pub fn from_rgba(img: &RgbaImage, encoder: &PngEncoder) -> ExportResult<Self> {
        let data = encoder.encode(img)?;
        Ok(Self::new(data, img.width(), img.height()))
    }

    /// Tag the frame with its sequence position
    #[must_use]
    pub const fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Record the pixel ratio
    #[must_use]
    pub const fn with_pixel_ratio(mut self, ratio: f64) -> Self {
        self.device_pixel_ratio = ratio;
        self
    }

    /// Size of the encoded data
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Whether the frame carries any pixels at all
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.data.is_empty() && self.width > 0 && self.height > 0
    }

    /// `data:image/png;base64,...`
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        data_uri(ArtifactKind::Png.mime(), &self.data)
    }

    /// Decode back to RGBA pixels
    pub fn decode(&self) -> ExportResult<RgbaImage> {
        Ok(image::load_from_memory_with_format(&self.data, ImageFormat::Png)?.to_rgba8())
    }
}

/// Ordered frames of one loop export
pub type FrameSequence = Vec<Frame>;

/// What an artifact contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArtifactKind {
    /// Still raster
    Png,
    /// Looping animation
    Gif,
}

impl ArtifactKind {
    /// MIME type
    #[must_use]
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Gif => "image/gif",
        }
    }

    /// File extension without the dot
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }
}

/// The deliverable of one export call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// Still or animation
    pub kind: ArtifactKind,
    /// Suggested filename
    pub filename: String,
    /// Encoded bytes
    pub data: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Number of frames (1 for stills)
    pub frame_count: usize,
}

impl ExportArtifact {
    /// Wrap a still frame
    #[must_use]
    pub fn still(frame: Frame, filename: impl Into<String>) -> Self {
        Self {
            kind: ArtifactKind::Png,
            filename: filename.into(),
            data: frame.data,
            width: frame.width,
            height: frame.height,
            frame_count: 1,
        }
    }

    /// Wrap an encoded animation
    #[must_use]
    pub fn animation(
        data: Vec<u8>,
        width: u32,
        height: u32,
        frame_count: usize,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            kind: ArtifactKind::Gif,
            filename: filename.into(),
            data,
            width,
            height,
            frame_count,
        }
    }

    /// MIME type implied by the kind
    #[must_use]
    pub const fn mime(&self) -> &'static str {
        self.kind.mime()
    }

    /// Size of the encoded data
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Artifact as a data URI
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        data_uri(self.mime(), &self.data)
    }
}

fn data_uri(mime: &str, data: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(data))
}

/// Swap a filename's extension, appending one if it has none
#[must_use]
pub fn with_extension(filename: &str, extension: &str) -> String {
    let stem = match filename.rfind('.') {
        Some(dot) if dot > 0 && !filename[dot..].contains('/') => &filename[..dot],
        _ => filename,
    };
    format!("{stem}.{extension}")
}

//! Scene rasterization
//!
//! [`Rasterizer`] is the seam between the pipeline and whatever turns a
//! capture target into pixels. [`SceneRasterizer`] is the built-in software
//! implementation: it paints backgrounds, block-glyph text runs and still
//! substitutes. Live video is opaque to it and paints as its background only,
//! the same blind spot DOM serializers have, which is why the pipeline swaps
//! video for stills before capturing.

use crate::frame::{Frame, PngEncoder};
use crate::result::{ExportError, ExportResult};
use crate::scene::{CaptureTarget, NodeKind, Rect, Style};
use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

/// Per-capture rendering options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureOptions {
    /// Pixel-density multiplier
    pub pixel_ratio: f64,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self { pixel_ratio: 2.0 }
    }
}

impl CaptureOptions {
    /// Options at the given pixel ratio
    #[must_use]
    pub const fn with_pixel_ratio(pixel_ratio: f64) -> Self {
        Self { pixel_ratio }
    }
}

/// Turns a capture target into an encoded still
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Render the whole target
    async fn rasterize(&self, target: &CaptureTarget, options: &CaptureOptions)
        -> ExportResult<Frame>;
}

/// Software rasterizer for scene graphs
#[derive(Debug, Clone, Default)]
pub struct SceneRasterizer {
    encoder: PngEncoder,
}

impl SceneRasterizer {
    /// Create a rasterizer with the default PNG settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Render to raw pixels
    pub fn paint(&self, target: &CaptureTarget, options: &CaptureOptions) -> ExportResult<RgbaImage> {
        let ratio = options.pixel_ratio;
        if !(ratio.is_finite() && ratio > 0.0) {
            return Err(ExportError::capture_failed(1, format!("invalid pixel ratio {ratio}")));
        }
        let (w, h) = target.size();
        let width = (f64::from(w) * ratio).ceil() as u32;
        let height = (f64::from(h) * ratio).ceil() as u32;
        if width == 0 || height == 0 {
            return Err(ExportError::capture_failed(1, "target has no area"));
        }

        let mut canvas = RgbaImage::new(width, height);
        for id in target.paint_order() {
            let Some(node) = target.node(id) else { continue };
            let area = PixelRect::scaled(node.rect, ratio);
            if let Some(bg) = node.style.background {
                fill(&mut canvas, area, node.style.circular, Rgba(bg));
            }
            match &node.kind {
                NodeKind::Container | NodeKind::Video(_) => {}
                NodeKind::Text(text) => draw_text(&mut canvas, area, &node.style, text, ratio),
                NodeKind::Substitute(still) => {
                    draw_image(&mut canvas, area, node.style.circular, still);
                }
            }
        }
        Ok(canvas)
    }
}

#[async_trait]
impl Rasterizer for SceneRasterizer {
    async fn rasterize(
        &self,
        target: &CaptureTarget,
        options: &CaptureOptions,
    ) -> ExportResult<Frame> {
        let canvas = self.paint(target, options)?;
        Ok(Frame::from_rgba(&canvas, &self.encoder)?.with_pixel_ratio(options.pixel_ratio))
    }
}

#[derive(Debug, Clone, Copy)]
struct PixelRect {
    x: i64,
    y: i64,
    width: u32,
    height: u32,
}

impl PixelRect {
    fn scaled(rect: Rect, ratio: f64) -> Self {
        let x = (f64::from(rect.x) * ratio).round() as i64;
        let y = (f64::from(rect.y) * ratio).round() as i64;
        Self {
            x,
            y,
            width: (f64::from(rect.width) * ratio).round().max(0.0) as u32,
            height: (f64::from(rect.height) * ratio).round().max(0.0) as u32,
        }
    }

    fn contains_in_ellipse(self, dx: u32, dy: u32) -> bool {
        let rx = f64::from(self.width) / 2.0;
        let ry = f64::from(self.height) / 2.0;
        if rx <= 0.0 || ry <= 0.0 {
            return false;
        }
        let nx = (f64::from(dx) + 0.5 - rx) / rx;
        let ny = (f64::from(dy) + 0.5 - ry) / ry;
        nx * nx + ny * ny <= 1.0
    }
}

fn blend_channel(base: u8, overlay: u8, alpha: f32) -> u8 {
    let result = f32::from(base).mul_add(1.0 - alpha, f32::from(overlay) * alpha);
    result.round().clamp(0.0, 255.0) as u8
}

fn blend(canvas: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x < 0 || y < 0 || x >= i64::from(canvas.width()) || y >= i64::from(canvas.height()) {
        return;
    }
    let alpha = f32::from(color[3]) / 255.0;
    if alpha <= 0.0 {
        return;
    }
    let pixel = canvas.get_pixel_mut(x as u32, y as u32);
    let out_alpha = f32::from(pixel[3]).mul_add(1.0 - alpha, 255.0 * alpha);
    *pixel = Rgba([
        blend_channel(pixel[0], color[0], alpha),
        blend_channel(pixel[1], color[1], alpha),
        blend_channel(pixel[2], color[2], alpha),
        out_alpha.round().clamp(0.0, 255.0) as u8,
    ]);
}

fn fill(canvas: &mut RgbaImage, area: PixelRect, circular: bool, color: Rgba<u8>) {
    for dy in 0..area.height {
        for dx in 0..area.width {
            if circular && !area.contains_in_ellipse(dx, dy) {
                continue;
            }
            blend(canvas, area.x + i64::from(dx), area.y + i64::from(dy), color);
        }
    }
}

fn draw_image(canvas: &mut RgbaImage, area: PixelRect, circular: bool, still: &RgbaImage) {
    if area.width == 0 || area.height == 0 || still.width() == 0 || still.height() == 0 {
        return;
    }
    let fitted = imageops::resize(still, area.width, area.height, FilterType::Triangle);
    for (dx, dy, pixel) in fitted.enumerate_pixels() {
        if circular && !area.contains_in_ellipse(dx, dy) {
            continue;
        }
        blend(canvas, area.x + i64::from(dx), area.y + i64::from(dy), *pixel);
    }
}

/// Text is drawn as one block per visible character on a fixed advance.
fn draw_text(canvas: &mut RgbaImage, area: PixelRect, style: &Style, text: &str, ratio: f64) {
    let cell = f64::from(style.font_size) * ratio;
    let advance = (cell * 0.6).max(1.0);
    let glyph_w = (cell * 0.45).round().max(1.0) as u32;
    let glyph_h = (cell * 0.7).round().max(1.0) as u32;
    let top = area.y + (i64::from(area.height) - i64::from(glyph_h)).max(0) / 2;
    let right = area.x + i64::from(area.width);

    for (i, ch) in text.chars().enumerate() {
        let left = area.x + (i as f64 * advance).round() as i64;
        if left + i64::from(glyph_w) > right {
            break;
        }
        if ch.is_whitespace() {
            continue;
        }
        let glyph = PixelRect {
            x: left,
            y: top,
            width: glyph_w,
            height: glyph_h,
        };
        fill(canvas, glyph, false, Rgba(style.color));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clip::ClipMedia;
    use std::sync::Arc;

    const BG: [u8; 4] = [20, 20, 30, 255];
    const RED: [u8; 4] = [255, 0, 0, 255];

    fn card() -> (CaptureTarget, crate::scene::NodeId) {
        let mut target = CaptureTarget::new(40.0, 20.0, Style::default().with_background(BG));
        let root = target.root();
        let media = ClipMedia::color_cycle(4, 4, &[RED], 1.0);
        let video = target
            .append(
                root,
                NodeKind::Video(Box::new(media)),
                Rect::new(0.0, 0.0, 20.0, 20.0),
                Style::default(),
            )
            .unwrap();
        (target, video)
    }

    #[test]
    fn test_canvas_scales_with_pixel_ratio() {
        let (target, _) = card();
        let img = SceneRasterizer::new()
            .paint(&target, &CaptureOptions::with_pixel_ratio(2.0))
            .unwrap();
        assert_eq!(img.dimensions(), (80, 40));
    }

    #[test]
    fn test_live_video_paints_as_background() {
        let (target, _) = card();
        let img = SceneRasterizer::new()
            .paint(&target, &CaptureOptions::with_pixel_ratio(1.0))
            .unwrap();
        assert_eq!(img.get_pixel(10, 10).0, BG);
    }

    #[test]
    fn test_substitute_paints_frame() {
        let (mut target, video) = card();
        let still = Arc::new(RgbaImage::from_pixel(4, 4, Rgba(RED)));
        let record = target.replace_with_substitute(video, still).unwrap();
        let img = SceneRasterizer::new()
            .paint(&target, &CaptureOptions::with_pixel_ratio(1.0))
            .unwrap();
        assert_eq!(img.get_pixel(10, 10).0, RED);
        assert_eq!(img.get_pixel(30, 10).0, BG);
        target.restore(record).unwrap();
    }

    #[test]
    fn test_circular_clip_leaves_corners() {
        let mut target = CaptureTarget::new(20.0, 20.0, Style::default().with_background(BG));
        let root = target.root();
        target
            .append(
                root,
                NodeKind::Container,
                Rect::new(0.0, 0.0, 20.0, 20.0),
                Style::default().with_background(RED).circular(),
            )
            .unwrap();
        let img = SceneRasterizer::new()
            .paint(&target, &CaptureOptions::with_pixel_ratio(1.0))
            .unwrap();
        assert_eq!(img.get_pixel(0, 0).0, BG);
        assert_eq!(img.get_pixel(10, 10).0, RED);
    }

    #[test]
    fn test_text_draws_glyph_blocks() {
        let mut target = CaptureTarget::new(100.0, 20.0, Style::default().with_background(BG));
        let root = target.root();
        target
            .append(
                root,
                NodeKind::Text("A B".into()),
                Rect::new(0.0, 0.0, 100.0, 20.0),
                Style::default().with_color(RED).with_font_size(10.0),
            )
            .unwrap();
        let img = SceneRasterizer::new()
            .paint(&target, &CaptureOptions::with_pixel_ratio(1.0))
            .unwrap();
        // First glyph at x 0..5, the space leaves x 6..11 untouched
        assert_eq!(img.get_pixel(2, 10).0, RED);
        assert_eq!(img.get_pixel(8, 10).0, BG);
        assert_eq!(img.get_pixel(14, 10).0, RED);
    }

    #[test]
    fn test_invalid_ratio_rejected() {
        let (target, _) = card();
        assert!(SceneRasterizer::new()
            .paint(&target, &CaptureOptions::with_pixel_ratio(0.0))
            .is_err());
    }

    #[tokio::test]
    async fn test_rasterize_returns_png_frame() {
        let (target, _) = card();
        let frame = SceneRasterizer::new()
            .rasterize(&target, &CaptureOptions::default())
            .await
            .unwrap();
        assert_eq!((frame.width, frame.height), (80, 40));
        assert_eq!(frame.device_pixel_ratio, 2.0);
        assert!(frame.is_valid());
    }
}

//! Tier card layout
//!
//! Lays a [`TierResponse`] out as a 352x578 capture target: header with the
//! player and button mode, the tier badge (video or text), progress toward
//! the next tier, the top three records and a footer.

use crate::config::{GIF_CANVAS_HEIGHT, GIF_CANVAS_WIDTH};
use crate::media::MediaSource;
use crate::result::ExportResult;
use crate::scene::{CaptureTarget, NodeId, NodeKind, Rect, Style};
use crate::tier::{ButtonMode, TierCode, TierResponse, TopRecord};

const CARD_BG: [u8; 4] = [17, 24, 39, 255];
const PANEL_BG: [u8; 4] = [0, 0, 0, 77];
const TRACK_BG: [u8; 4] = [31, 41, 55, 255];
const DIVIDER: [u8; 4] = [55, 65, 81, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];
const MUTED: [u8; 4] = [107, 114, 128, 255];
const SOFT: [u8; 4] = [156, 163, 175, 255];
const FAINT: [u8; 4] = [75, 85, 99, 255];
const CYAN: [u8; 4] = [34, 211, 238, 255];
const MAX_COMBO: [u8; 4] = [34, 197, 94, 255];

const PAD: f32 = 16.0;
const RECORD_HEIGHT: f32 = 76.0;
const RECORD_GAP: f32 = 8.0;

fn pattern_color(pattern: &str) -> [u8; 4] {
    match pattern {
        "NM" => [37, 99, 235, 255],
        "HD" => [249, 115, 22, 255],
        "MX" => [220, 38, 38, 255],
        "SC" => [147, 51, 234, 255],
        _ => [75, 85, 99, 255],
    }
}

fn rank_color(rank: usize) -> [u8; 4] {
    match rank {
        1 => [250, 204, 21, 255],
        2 => [209, 213, 219, 255],
        3 => [217, 119, 6, 255],
        _ => MUTED,
    }
}

fn text(color: [u8; 4], size: f32) -> Style {
    Style::default().with_color(color).with_font_size(size)
}

/// Builds the capture target for one player's card
#[derive(Debug)]
pub struct CardBuilder<'a> {
    data: &'a TierResponse,
    nickname: String,
    button: ButtonMode,
    badge: Option<Box<dyn MediaSource>>,
}

impl<'a> CardBuilder<'a> {
    /// Start a card
    #[must_use]
    pub fn new(data: &'a TierResponse, nickname: impl Into<String>, button: ButtonMode) -> Self {
        Self {
            data,
            nickname: nickname.into(),
            button,
            badge: None,
        }
    }

    /// Embed the looping badge video. Ignored for tiers without one.
    #[must_use]
    pub fn with_badge_media(mut self, media: Box<dyn MediaSource>) -> Self {
        self.badge = Some(media);
        self
    }

    /// Lay out the card
    pub fn build(mut self) -> ExportResult<CaptureTarget> {
        let code = self.data.tier.tier_code();
        let accent = code.accent();
        let mut target = CaptureTarget::new(
            GIF_CANVAS_WIDTH as f32,
            GIF_CANVAS_HEIGHT as f32,
            Style::default().with_background(CARD_BG),
        );
        let root = target.root();
        let width = GIF_CANVAS_WIDTH as f32;
        let inner = width - 2.0 * PAD;

        target.append(
            root,
            NodeKind::Container,
            Rect::new(0.0, 0.0, width, 4.0),
            Style::default().with_background(accent),
        )?;

        // Header
        target.append(root, NodeKind::Text("PLAYER".into()), Rect::new(PAD, 16.0, 200.0, 10.0), text(MUTED, 9.0))?;
        target.append(
            root,
            NodeKind::Text(self.nickname.clone()),
            Rect::new(PAD, 30.0, 210.0, 24.0),
            text(WHITE, 20.0),
        )?;
        let pill = target.append(
            root,
            NodeKind::Container,
            Rect::new(PAD, 60.0, 36.0, 18.0),
            Style::default().with_background(accent),
        )?;
        target.append(
            pill,
            NodeKind::Text(format!("{}B", self.button)),
            Rect::new(PAD + 8.0, 60.0, 28.0, 18.0),
            text(CARD_BG, 11.0),
        )?;
        target.append(
            root,
            NodeKind::Text(format!("TOP50: {:.2}", self.data.top50sum)),
            Rect::new(60.0, 62.0, 160.0, 14.0),
            text(MUTED, 9.0),
        )?;

        let badge_bottom = badge(&mut target, root, code, self.badge.take())?;
        target.append(
            root,
            NodeKind::Text(self.data.tier.name.clone()),
            Rect::new(236.0, badge_bottom + 6.0, 116.0, 18.0),
            text(accent, 14.0),
        )?;
        target.append(
            root,
            NodeKind::Text(format!("{:.2} TP", self.data.tier_point)),
            Rect::new(236.0, badge_bottom + 26.0, 116.0, 14.0),
            text(SOFT, 10.0),
        )?;

        // Progress toward the next tier
        if let Some(next) = &self.data.next {
            target.append(
                root,
                NodeKind::Text(format!("Next: {}", next.name)),
                Rect::new(PAD, 150.0, 180.0, 12.0),
                text(SOFT, 9.0),
            )?;
            let remaining = self
                .data
                .points_to_next()
                .map_or_else(|| "Achieved!".to_string(), |gap| format!("{gap:.2} TP needed"));
            target.append(
                root,
                NodeKind::Text(remaining),
                Rect::new(200.0, 150.0, inner - 184.0, 12.0),
                text(SOFT, 9.0),
            )?;
            let track = target.append(
                root,
                NodeKind::Container,
                Rect::new(PAD, 166.0, inner, 6.0),
                Style::default().with_background(TRACK_BG),
            )?;
            let progress = self.data.progress().unwrap_or(1.0) as f32;
            target.append(
                track,
                NodeKind::Container,
                Rect::new(PAD, 166.0, inner * progress, 6.0),
                Style::default().with_background(accent),
            )?;
        }

        target.append(
            root,
            NodeKind::Container,
            Rect::new(PAD, 184.0, inner, 1.0),
            Style::default().with_background(DIVIDER),
        )?;
        target.append(
            root,
            NodeKind::Text("TOP 3 PERFORMANCE".into()),
            Rect::new(PAD, 196.0, 200.0, 12.0),
            text(MUTED, 9.0),
        )?;
        for (i, record) in self.data.top_records(3).iter().enumerate() {
            let y = 216.0 + i as f32 * (RECORD_HEIGHT + RECORD_GAP);
            record_row(&mut target, root, record, i + 1, y)?;
        }

        // Footer
        target.append(
            root,
            NodeKind::Container,
            Rect::new(PAD, 530.0, inner, 1.0),
            Style::default().with_background(TRACK_BG),
        )?;
        target.append(
            root,
            NodeKind::Text("V-ARCHIVE TIER CARD".into()),
            Rect::new(PAD, 544.0, 200.0, 12.0),
            text(FAINT, 8.0),
        )?;
        target.append(
            root,
            NodeKind::Text("v-archive.net".into()),
            Rect::new(width - PAD - 70.0, 544.0, 70.0, 12.0),
            text(FAINT, 8.0),
        )?;

        Ok(target)
    }
}

/// Ring, inner disc and either the video or a text label. Returns the
/// badge's bottom edge.
fn badge(
    target: &mut CaptureTarget,
    root: NodeId,
    code: TierCode,
    media: Option<Box<dyn MediaSource>>,
) -> ExportResult<f32> {
    const SIZE: f32 = 80.0;
    const RING: f32 = 3.0;
    let x = GIF_CANVAS_WIDTH as f32 - PAD - SIZE;
    let y = 16.0;

    let ring = target.append(
        root,
        NodeKind::Container,
        Rect::new(x, y, SIZE, SIZE),
        Style::default().with_background(code.accent()).circular(),
    )?;
    let disc_rect = Rect::new(x + RING, y + RING, SIZE - 2.0 * RING, SIZE - 2.0 * RING);
    let disc = target.append(
        ring,
        NodeKind::Container,
        disc_rect,
        Style::default().with_background(CARD_BG).circular(),
    )?;

    match media {
        Some(media) if code.has_video() => {
            target.append(disc, NodeKind::Video(media), disc_rect, Style::default().circular())?;
        }
        media => {
            if media.is_some() {
                tracing::debug!(tier = %code, "tier has no video badge, dropping media");
            }
            let label_height = 14.0;
            target.append(
                disc,
                NodeKind::Text(code.badge_label().to_string()),
                Rect::new(
                    disc_rect.x + 6.0,
                    disc_rect.y + (disc_rect.height - label_height) / 2.0,
                    disc_rect.width - 12.0,
                    label_height,
                ),
                text(code.accent(), 10.0),
            )?;
        }
    }
    Ok(y + SIZE)
}

fn record_row(
    target: &mut CaptureTarget,
    root: NodeId,
    record: &TopRecord,
    rank: usize,
    y: f32,
) -> ExportResult<()> {
    let row = target.append(
        root,
        NodeKind::Container,
        Rect::new(PAD, y, 320.0, RECORD_HEIGHT),
        Style::default().with_background(PANEL_BG),
    )?;
    target.append(
        row,
        NodeKind::Text(rank.to_string()),
        Rect::new(28.0, y + 24.0, 24.0, 28.0),
        text(rank_color(rank), 24.0),
    )?;
    target.append(
        row,
        NodeKind::Text(record.name.clone()),
        Rect::new(64.0, y + 12.0, 160.0, 16.0),
        text(WHITE, 13.0),
    )?;
    let pill = target.append(
        row,
        NodeKind::Container,
        Rect::new(64.0, y + 36.0, 48.0, 16.0),
        Style::default().with_background(pattern_color(&record.pattern)),
    )?;
    target.append(
        pill,
        NodeKind::Text(format!("{} {}", record.pattern, record.level)),
        Rect::new(68.0, y + 36.0, 44.0, 16.0),
        text(WHITE, 9.0),
    )?;
    if let Some(floor) = &record.floor {
        target.append(
            row,
            NodeKind::Text(format!("SC {floor}")),
            Rect::new(120.0, y + 36.0, 80.0, 16.0),
            text(MUTED, 10.0),
        )?;
    }
    target.append(
        row,
        NodeKind::Text(format!("{}%", record.score)),
        Rect::new(232.0, y + 12.0, 68.0, 18.0),
        text(WHITE, 14.0),
    )?;
    if record.is_max_combo() {
        let mc = target.append(
            row,
            NodeKind::Container,
            Rect::new(304.0, y + 14.0, 24.0, 14.0),
            Style::default().with_background(MAX_COMBO),
        )?;
        target.append(
            mc,
            NodeKind::Text("MC".into()),
            Rect::new(307.0, y + 14.0, 20.0, 14.0),
            text(WHITE, 8.0),
        )?;
    }
    target.append(
        row,
        NodeKind::Text(format!("{:.2}", record.rating_value())),
        Rect::new(260.0, y + 50.0, 68.0, 14.0),
        text(CYAN, 10.0),
    )?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::clip::ClipMedia;
    use crate::config::CaptureConfig;
    use crate::raster::{CaptureOptions, Rasterizer, SceneRasterizer};
    use crate::tier::TierInfo;

    fn record(name: &str, max_combo: u8) -> TopRecord {
        TopRecord {
            name: name.to_string(),
            button: 4,
            pattern: "SC".into(),
            level: 12,
            floor: Some("12.3".into()),
            max_rating: None,
            score: "99.50".into(),
            max_combo,
            rating: "170.25".into(),
            updated_at: None,
        }
    }

    fn response(code: &str) -> TierResponse {
        TierResponse {
            success: true,
            top50sum: 7420.5,
            tier_point: 7420.5,
            tier: TierInfo {
                rating: 7000.0,
                name: "Tier".into(),
                code: code.into(),
            },
            next: Some(TierInfo {
                rating: 7500.0,
                name: "Next".into(),
                code: code.into(),
            }),
            top_list: vec![record("a", 1), record("b", 0), record("c", 0), record("d", 1)],
        }
    }

    fn texts(target: &CaptureTarget) -> Vec<String> {
        target
            .paint_order()
            .into_iter()
            .filter_map(|id| match &target.node(id)?.kind {
                NodeKind::Text(t) => Some(t.clone()),
                _ => None,
            })
            .collect()
    }

    fn clip() -> Box<dyn MediaSource> {
        Box::new(ClipMedia::color_cycle(16, 16, &[[200, 50, 50, 255]], 2.0))
    }

    #[test]
    fn test_video_tier_embeds_media_in_circle() {
        let data = response("GM");
        let target = CardBuilder::new(&data, "player", ButtonMode::Four)
            .with_badge_media(clip())
            .build()
            .unwrap();

        let video = target.find_media().unwrap();
        let node = target.node(video).unwrap();
        assert!(node.style.circular);
        let (parent, index) = target.position(video).unwrap();
        assert_eq!(index, 0);
        assert!(target.node(parent).unwrap().style.circular);
        assert_eq!(target.size(), (352.0, 578.0));
    }

    #[test]
    fn test_text_tier_shows_label() {
        let data = response("AM");
        let target = CardBuilder::new(&data, "player", ButtonMode::Five)
            .with_badge_media(clip())
            .build()
            .unwrap();

        assert!(target.find_media().is_none());
        let texts = texts(&target);
        assert!(texts.contains(&"Amateur".to_string()));
        assert!(texts.contains(&"5B".to_string()));
    }

    #[test]
    fn test_video_tier_without_media_falls_back_to_code() {
        let data = response("DM");
        let target = CardBuilder::new(&data, "player", ButtonMode::Four).build().unwrap();
        assert!(target.find_media().is_none());
        assert!(texts(&target).contains(&"DM".to_string()));
    }

    #[test]
    fn test_header_and_records() {
        let data = response("GD");
        let target = CardBuilder::new(&data, "흑우", ButtonMode::Eight).build().unwrap();
        let texts = texts(&target);

        assert!(texts.contains(&"흑우".to_string()));
        assert!(texts.contains(&"TOP50: 7420.50".to_string()));
        assert!(texts.contains(&"79.50 TP needed".to_string()));
        assert!(texts.contains(&"170.25".to_string()));
        // Only three records and two of them max combos
        assert!(texts.contains(&"3".to_string()));
        assert!(!texts.contains(&"d".to_string()));
        assert_eq!(texts.iter().filter(|t| *t == "MC").count(), 1);
    }

    #[test]
    fn test_reached_next_tier() {
        let mut data = response("PT");
        data.tier_point = 7600.0;
        let target = CardBuilder::new(&data, "p", ButtonMode::Six).build().unwrap();
        assert!(texts(&target).contains(&"Achieved!".to_string()));
    }

    #[tokio::test]
    async fn test_full_card_clears_capture_threshold() {
        let data = response("SV");
        let target = CardBuilder::new(&data, "player", ButtonMode::Four).build().unwrap();
        let frame = SceneRasterizer::new()
            .rasterize(&target, &CaptureOptions::default())
            .await
            .unwrap();
        assert_eq!((frame.width, frame.height), (704, 1156));
        assert!(frame.size_bytes() >= CaptureConfig::default().min_capture_bytes);
    }
}

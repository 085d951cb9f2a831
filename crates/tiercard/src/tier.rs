//! Tier data returned by the V-ARCHIVE ranking API

use crate::frame::ArtifactKind;
use crate::result::{ExportError, ExportResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Key-count mode the ranking is computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ButtonMode {
    /// 4 buttons
    Four,
    /// 5 buttons
    Five,
    /// 6 buttons
    Six,
    /// 8 buttons
    Eight,
}

impl ButtonMode {
    /// Number of buttons
    #[must_use]
    pub const fn count(self) -> u8 {
        match self {
            Self::Four => 4,
            Self::Five => 5,
            Self::Six => 6,
            Self::Eight => 8,
        }
    }
}

impl From<ButtonMode> for u8 {
    fn from(mode: ButtonMode) -> Self {
        mode.count()
    }
}

impl TryFrom<u8> for ButtonMode {
    type Error = ExportError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(Self::Four),
            5 => Ok(Self::Five),
            6 => Ok(Self::Six),
            8 => Ok(Self::Eight),
            other => Err(ExportError::config(format!(
                "button mode must be 4, 5, 6 or 8, got {other}"
            ))),
        }
    }
}

impl FromStr for ButtonMode {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_end_matches(['B', 'b']);
        let value: u8 = digits
            .parse()
            .map_err(|_| ExportError::config(format!("invalid button mode {s:?}")))?;
        Self::try_from(value)
    }
}

impl fmt::Display for ButtonMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count())
    }
}

/// Tier classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TierCode {
    /// Grand Master
    #[serde(rename = "GM")]
    GrandMaster,
    /// Master
    #[serde(rename = "M")]
    Master,
    /// Diamond
    #[serde(rename = "DM")]
    Diamond,
    /// Platinum
    #[serde(rename = "PT")]
    Platinum,
    /// Gold
    #[serde(rename = "GD")]
    Gold,
    /// Silver
    #[serde(rename = "SV")]
    Silver,
    /// Bronze
    #[serde(rename = "BR")]
    Bronze,
    /// Iron
    #[serde(rename = "IR")]
    Iron,
    /// Amateur
    #[serde(rename = "AM")]
    Amateur,
    /// Beginner
    #[serde(rename = "BG")]
    Beginner,
}

impl TierCode {
    /// Parse an API code; unknown codes style as Beginner
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code {
            "GM" => Self::GrandMaster,
            "M" => Self::Master,
            "DM" => Self::Diamond,
            "PT" => Self::Platinum,
            "GD" => Self::Gold,
            "SV" => Self::Silver,
            "BR" => Self::Bronze,
            "IR" => Self::Iron,
            "AM" => Self::Amateur,
            _ => Self::Beginner,
        }
    }

    /// API code
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GrandMaster => "GM",
            Self::Master => "M",
            Self::Diamond => "DM",
            Self::Platinum => "PT",
            Self::Gold => "GD",
            Self::Silver => "SV",
            Self::Bronze => "BR",
            Self::Iron => "IR",
            Self::Amateur => "AM",
            Self::Beginner => "BG",
        }
    }

    /// Whether the badge is an animated video
    #[must_use]
    pub const fn has_video(self) -> bool {
        !matches!(self, Self::Silver | Self::Amateur | Self::Beginner)
    }

    /// Text shown in place of a video badge
    #[must_use]
    pub const fn badge_label(self) -> &'static str {
        match self {
            Self::Amateur => "Amateur",
            Self::Beginner => "Beginner",
            Self::Silver => "Silver",
            other => other.as_str(),
        }
    }

    /// Accent color for text and borders
    #[must_use]
    pub const fn accent(self) -> [u8; 4] {
        match self {
            Self::GrandMaster => [0xf8, 0x71, 0x71, 0xff],
            Self::Master => [0xc0, 0x84, 0xfc, 0xff],
            Self::Diamond => [0x67, 0xe8, 0xf9, 0xff],
            Self::Platinum => [0x5e, 0xea, 0xd4, 0xff],
            Self::Gold => [0xfa, 0xcc, 0x15, 0xff],
            Self::Silver => [0xd1, 0xd5, 0xdb, 0xff],
            Self::Bronze => [0xf5, 0x9e, 0x0b, 0xff],
            Self::Iron => [0x94, 0xa3, 0xb8, 0xff],
            Self::Amateur => [0xa8, 0xa2, 0x9e, 0xff],
            Self::Beginner => [0xa3, 0xa3, 0xa3, 0xff],
        }
    }
}

impl fmt::Display for TierCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tier with its entry rating
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierInfo {
    /// Tier point needed to enter the tier
    pub rating: f64,
    /// Display name
    pub name: String,
    /// API code
    pub code: String,
}

impl TierInfo {
    /// Parsed tier code
    #[must_use]
    pub fn tier_code(&self) -> TierCode {
        TierCode::from_code(&self.code)
    }
}

/// One of the player's best records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopRecord {
    /// Song title
    pub name: String,
    /// Button mode of the chart
    pub button: u8,
    /// Chart difficulty (NM, HD, MX, SC)
    pub pattern: String,
    /// Chart level
    pub level: u32,
    /// Floor within the level
    #[serde(default)]
    pub floor: Option<String>,
    /// Maximum rating obtainable
    #[serde(default)]
    pub max_rating: Option<String>,
    /// Accuracy percentage
    pub score: String,
    /// 1 when the play was a max combo
    pub max_combo: u8,
    /// Rating earned
    pub rating: String,
    /// Last update timestamp
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl TopRecord {
    /// Whether the record is a max combo
    #[must_use]
    pub const fn is_max_combo(&self) -> bool {
        self.max_combo == 1
    }

    /// Rating as a number, zero when unparseable
    #[must_use]
    pub fn rating_value(&self) -> f64 {
        self.rating.trim().parse().unwrap_or(0.0)
    }
}

/// Successful tier lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierResponse {
    /// Always true for this shape
    pub success: bool,
    /// Sum of the top 50 ratings
    pub top50sum: f64,
    /// Current tier point
    pub tier_point: f64,
    /// Current tier
    pub tier: TierInfo,
    /// Next tier, absent at the top
    #[serde(default)]
    pub next: Option<TierInfo>,
    /// Best records, best first
    #[serde(default)]
    pub top_list: Vec<TopRecord>,
}

impl TierResponse {
    /// Parse a response body
    pub fn from_json(text: &str) -> ExportResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// The first `n` records
    #[must_use]
    pub fn top_records(&self, n: usize) -> &[TopRecord] {
        &self.top_list[..n.min(self.top_list.len())]
    }

    /// Tier points still needed for the next tier; `None` when reached or
    /// at the top
    #[must_use]
    pub fn points_to_next(&self) -> Option<f64> {
        let next = self.next.as_ref()?;
        let gap = next.rating - self.tier_point;
        (gap > 0.0).then_some(gap)
    }

    /// Progress from the current tier's entry to the next, in `[0, 1]`
    #[must_use]
    pub fn progress(&self) -> Option<f64> {
        let next = self.next.as_ref()?;
        let span = next.rating - self.tier.rating;
        if span <= 0.0 {
            return Some(1.0);
        }
        Some(((self.tier_point - self.tier.rating) / span).clamp(0.0, 1.0))
    }
}

/// Error body returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierErrorResponse {
    /// Always false for this shape
    pub success: bool,
    /// Machine-readable code
    pub error_code: i64,
    /// Human-readable message
    pub message: String,
}

/// `{nickname}-{button}B-tier-card.{png|gif}`
#[must_use]
pub fn default_filename(nickname: &str, button: ButtonMode, kind: ArtifactKind) -> String {
    format!("{nickname}-{button}B-tier-card.{}", kind.extension())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "success": true,
        "top50sum": 8123.456,
        "tierPoint": 8123.456,
        "tier": {"rating": 8000, "name": "Diamond IV", "code": "DM"},
        "next": {"rating": 8300, "name": "Diamond III", "code": "DM"},
        "topList": [
            {"name": "Urban Night", "button": 4, "pattern": "SC", "level": 12,
             "floor": "12.3", "maxRating": "178.000", "score": "99.87",
             "maxCombo": 1, "rating": "177.512", "updatedAt": "2024-05-01 12:00:00"},
            {"name": "Kamui", "button": 4, "pattern": "MX", "level": 15,
             "floor": null, "maxRating": "170.000", "score": "98.10",
             "maxCombo": 0, "rating": "168.2", "updatedAt": "2024-05-02 12:00:00"}
        ]
    }"#;

    mod response_tests {
        use super::*;

        #[test]
        fn test_parse_sample() {
            let data = TierResponse::from_json(SAMPLE).unwrap();
            assert_eq!(data.tier.tier_code(), TierCode::Diamond);
            assert_eq!(data.top_list.len(), 2);
            assert!(data.top_list[0].is_max_combo());
            assert!(data.top_list[1].floor.is_none());
            assert!((data.top_list[1].rating_value() - 168.2).abs() < 1e-9);
        }

        #[test]
        fn test_progress_and_gap() {
            let data = TierResponse::from_json(SAMPLE).unwrap();
            assert!((data.points_to_next().unwrap() - 176.544).abs() < 1e-6);
            assert!((data.progress().unwrap() - 0.41152).abs() < 1e-4);
        }

        #[test]
        fn test_top_tier_has_no_next() {
            let mut data = TierResponse::from_json(SAMPLE).unwrap();
            data.next = None;
            assert!(data.points_to_next().is_none());
            assert!(data.progress().is_none());
            assert_eq!(data.top_records(3).len(), 2);
        }

        #[test]
        fn test_error_body() {
            let err: TierErrorResponse = serde_json::from_str(
                r#"{"success": false, "errorCode": 101, "message": "유저 정보가 없습니다."}"#,
            )
            .unwrap();
            assert_eq!(err.error_code, 101);
        }
    }

    mod code_tests {
        use super::*;

        #[test]
        fn test_video_tiers() {
            let video: Vec<_> = ["BR", "DM", "GD", "GM", "IR", "M", "PT"]
                .iter()
                .map(|c| TierCode::from_code(c))
                .collect();
            assert!(video.iter().all(|c| c.has_video()));
            assert!(!TierCode::Silver.has_video());
            assert_eq!(TierCode::Amateur.badge_label(), "Amateur");
            assert_eq!(TierCode::Gold.badge_label(), "GD");
        }

        #[test]
        fn test_unknown_code_styles_as_beginner() {
            assert_eq!(TierCode::from_code("??"), TierCode::Beginner);
        }

        #[test]
        fn test_button_mode_parse() {
            assert_eq!("4".parse::<ButtonMode>().unwrap(), ButtonMode::Four);
            assert_eq!("8B".parse::<ButtonMode>().unwrap(), ButtonMode::Eight);
            assert!("7".parse::<ButtonMode>().is_err());
            assert_eq!(serde_json::to_string(&ButtonMode::Six).unwrap(), "6");
            assert!(serde_json::from_str::<ButtonMode>("3").is_err());
        }

        #[test]
        fn test_default_filename() {
            assert_eq!(
                default_filename("흑우", ButtonMode::Four, ArtifactKind::Png),
                "흑우-4B-tier-card.png"
            );
            assert_eq!(
                default_filename("nick", ButtonMode::Eight, ArtifactKind::Gif),
                "nick-8B-tier-card.gif"
            );
        }
    }
}

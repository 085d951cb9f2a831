//! Platform capabilities
//!
//! The dispatcher and capture timing branch on what the host can do, not on
//! what it is called. Hosts inject a [`PlatformCapabilities`]; a user-agent
//! helper and a few device presets cover the common cases.

use crate::config::CaptureConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;

const HANDHELD_UA_PATTERN: &str = r"(?i)android|webos|iphone|ipad|ipod|blackberry|iemobile|opera mini";

fn handheld_ua() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(HANDHELD_UA_PATTERN).ok())
        .as_ref()
}

/// Capability class of the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlatformClass {
    /// Pointer-driven, direct file download
    Desktop,
    /// Touch platform, share sheet or long-press save
    Handheld,
}

/// What the host environment can do
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// A native share sheet exists
    pub supports_native_share: bool,
    /// Small touch display without direct downloads
    pub is_constrained_display: bool,
    /// Device pixel ratio (e.g., 3.0 for recent phones)
    pub device_pixel_ratio: f64,
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self::desktop()
    }
}

impl PlatformCapabilities {
    /// Desktop browser
    #[must_use]
    pub const fn desktop() -> Self {
        Self {
            supports_native_share: false,
            is_constrained_display: false,
            device_pixel_ratio: 1.0,
        }
    }

    /// Handheld with a native share sheet
    #[must_use]
    pub const fn handheld(device_pixel_ratio: f64) -> Self {
        Self {
            supports_native_share: true,
            is_constrained_display: true,
            device_pixel_ratio,
        }
    }

    /// Recent iPhone
    #[must_use]
    pub const fn iphone() -> Self {
        Self::handheld(3.0)
    }

    /// Pixel-class Android phone
    #[must_use]
    pub const fn android() -> Self {
        Self::handheld(2.625)
    }

    /// Classify from a user-agent string. Share support cannot be sniffed, so
    /// the caller says whether the share API is present.
    #[must_use]
    pub fn from_user_agent(user_agent: &str, device_pixel_ratio: f64, has_share_api: bool) -> Self {
        let handheld = handheld_ua().is_some_and(|re| re.is_match(user_agent));
        Self {
            supports_native_share: handheld && has_share_api,
            is_constrained_display: handheld,
            device_pixel_ratio,
        }
    }

    /// Override share support
    #[must_use]
    pub const fn with_native_share(mut self, supported: bool) -> Self {
        self.supports_native_share = supported;
        self
    }

    /// Capability class
    #[must_use]
    pub const fn class(&self) -> PlatformClass {
        if self.is_constrained_display {
            PlatformClass::Handheld
        } else {
            PlatformClass::Desktop
        }
    }

    /// Whether this is a handheld platform
    #[must_use]
    pub const fn is_handheld(&self) -> bool {
        self.is_constrained_display
    }

    /// Pixel-density multiplier for snapshots: fixed on desktop, the device
    /// ratio capped on handheld
    #[must_use]
    pub fn capture_scale(&self, capture: &CaptureConfig) -> f64 {
        if self.is_handheld() {
            self.device_pixel_ratio
                .min(capture.handheld_scale_cap)
                .max(1.0)
        } else {
            capture.desktop_scale
        }
    }

    /// Pick the stabilization delay for this class
    #[must_use]
    pub const fn stabilize_delay(&self, desktop_ms: u64, handheld_ms: u64) -> Duration {
        if self.is_handheld() {
            Duration::from_millis(handheld_ms)
        } else {
            Duration::from_millis(desktop_ms)
        }
    }
}

//! Tiercard: snapshot-and-export pipeline for rhythm-game tier cards
//!
//! Turns a card scene into a PNG still or a looping 352x578 GIF and hands the
//! result to the platform: a direct download on desktop, the native share sheet
//! on handheld devices, or a long-press fallback page when sharing is refused.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────┐   ┌──────────────┐   ┌────────────┐
//! │ CardBuilder  │──►│ CaptureTarget │──►│ Exporter     │──►│ Delivery   │
//! │ (tier data)  │   │ (scene tree)  │   │ still / loop │   │ Dispatcher │
//! └──────────────┘   └───────────────┘   └──────┬───────┘   └────────────┘
//!                                               │
//!               ┌──────────────┬────────────────┼───────────────┐
//!               ▼              ▼                ▼               ▼
//!         Media Loader   Swap Adapter     Frame Sampler   Animation Encoder
//!               └──────────────┴───── Snapshot Engine ──┘
//! ```
//!
//! A live video cannot be rasterized, so both export paths replace it with a
//! static substitute painted from its current frame, capture, then restore the
//! original node in place.

#![warn(missing_docs)]

mod card;
mod clip;
mod delivery;
mod encoder;
mod frame;
mod loader;
mod media;
mod orchestrator;
mod raster;
mod result;
mod sampler;
mod scene;
mod snapshot;
mod swap;

/// Tunable delays, thresholds and canvas settings
pub mod config;

/// Platform classification and capture scaling
pub mod platform;

/// Upstream data model: tiers, records and button modes
pub mod tier;

/// V-ARCHIVE HTTP client
#[cfg(feature = "fetch")]
pub mod api;

pub use card::CardBuilder;
pub use clip::{ClipMedia, LoadBehavior};
pub use config::{
    CaptureConfig, EncoderConfig, ExportConfig, LoaderConfig, SamplerConfig, SwapConfig,
    FALLBACK_MEDIA_SIZE, GIF_CANVAS_HEIGHT, GIF_CANVAS_WIDTH, MAX_FRAME_COUNT,
};
pub use delivery::{
    fallback_page, DeliveryDispatcher, DeliveryHost, DeliveryMethod, DirectoryHost, MockHost,
    ShareOutcome, LONG_PRESS_HINT,
};
pub use encoder::{encode_gif, frame_delay_cs, AnimationEncoder};
pub use frame::{
    with_extension, ArtifactKind, CompressionLevel, ExportArtifact, Frame, FrameSequence,
    PngEncoder,
};
pub use loader::{draw_current_frame, ensure_ready};
pub use media::{MediaError, MediaSource, PlaybackState, ReadyState};
pub use orchestrator::{ExportReceipt, ExportState, Exporter, LoopOptions};
pub use platform::{PlatformCapabilities, PlatformClass};
pub use raster::{CaptureOptions, Rasterizer, SceneRasterizer};
pub use result::{ExportError, ExportResult, FailureKind, Locale};
pub use sampler::{effective_duration, sample_timestamps, FrameSampler};
pub use scene::{CaptureTarget, DetachedNode, Node, NodeId, NodeKind, Rect, Style, SwapRecord};
pub use snapshot::SnapshotEngine;
pub use swap::SwapAdapter;
pub use tier::{ButtonMode, TierCode, TierErrorResponse, TierInfo, TierResponse, TopRecord};

#[cfg(feature = "fetch")]
pub use api::ArchiveClient;

//! CLI command definitions using clap

use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tiercard::{ButtonMode, Locale, LoopOptions, PlatformCapabilities};

/// Tiercard: export V-ARCHIVE tier cards as PNG stills or looping GIFs
#[derive(Parser, Debug)]
#[command(name = "tiercard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Log format (pretty, compact, json)
    #[arg(long, default_value = "compact", global = true)]
    pub log_format: LogFormatArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export the card as a PNG still
    Still(ExportArgs),

    /// Export the card as a looping GIF of the badge video
    Loop(LoopArgs),

    /// Show the effective export configuration
    Config(ConfigArgs),
}

/// Where the card data comes from and how the artifact is delivered
#[derive(Args, Debug, Clone)]
#[command(group(ArgGroup::new("source").required(true).args(["data", "fetch"])))]
pub struct ExportArgs {
    /// Tier response JSON file
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Fetch tier data for this nickname
    #[arg(long, value_name = "NICKNAME")]
    pub fetch: Option<String>,

    /// Ranking API base URL used by --fetch
    #[arg(long, value_name = "URL", env = "TIERCARD_API_BASE")]
    pub api_base: Option<String>,

    /// Nickname printed on the card (defaults to the fetched nickname)
    #[arg(long)]
    pub nickname: Option<String>,

    /// Button mode (4, 5, 6 or 8)
    #[arg(short, long, default_value = "4")]
    pub button: ButtonMode,

    /// Animated GIF played inside the tier badge
    #[arg(long, value_name = "GIF")]
    pub badge: Option<PathBuf>,

    /// Platform to emulate for scaling and delivery
    #[arg(long, default_value = "desktop")]
    pub platform: PlatformArg,

    /// Classify the platform from a browser user-agent instead
    #[arg(long, value_name = "UA", conflicts_with = "platform")]
    pub user_agent: Option<String>,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Artifact filename (defaults to `{nickname}-{button}B-tier-card.{ext}`)
    #[arg(long)]
    pub filename: Option<String>,

    /// Export configuration file (.yaml, .yml or .json)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Language of error banners
    #[arg(long, default_value = "ko")]
    pub locale: LocaleArg,
}

impl ExportArgs {
    /// Nickname shown on the card
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .or(self.fetch.as_deref())
            .unwrap_or("player")
    }

    /// Platform the export runs as
    #[must_use]
    pub fn capabilities(&self) -> PlatformCapabilities {
        self.user_agent.as_deref().map_or_else(
            || self.platform.into(),
            |ua| PlatformCapabilities::from_user_agent(ua, 2.0, true),
        )
    }
}

/// Arguments for the loop command
#[derive(Args, Debug, Clone)]
pub struct LoopArgs {
    /// Source and delivery options
    #[command(flatten)]
    pub export: ExportArgs,

    /// Frames sampled across the badge video (1-600)
    #[arg(long, default_value = "20", value_parser = clap::value_parser!(u16).range(1..=600))]
    pub frames: u16,

    /// Display time per frame in tenths of a second
    #[arg(long, default_value = "1")]
    pub frame_duration: f64,
}

impl LoopArgs {
    /// Loop options for the exporter
    #[must_use]
    pub fn options(&self) -> LoopOptions {
        LoopOptions {
            frame_count: usize::from(self.frames),
            frame_duration: self.frame_duration,
        }
    }
}

/// Arguments for the config command
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Merge this file over the defaults before printing
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Print as JSON instead of YAML
    #[arg(long)]
    pub json: bool,
}

/// Color argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Auto-detect
    #[default]
    Auto,
    /// Always color
    Always,
    /// Never color
    Never,
}

impl From<ColorArg> for crate::config::ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormatArg {
    /// Multi-line human output
    Pretty,
    /// Single-line output
    #[default]
    Compact,
    /// Newline-delimited JSON
    Json,
}

/// Platform to emulate
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlatformArg {
    /// Pointer platform with direct download
    #[default]
    Desktop,
    /// Generic handheld at 2x density
    Handheld,
    /// iPhone profile
    Iphone,
    /// Android profile
    Android,
}

impl From<PlatformArg> for PlatformCapabilities {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Desktop => Self::desktop(),
            PlatformArg::Handheld => Self::handheld(2.0),
            PlatformArg::Iphone => Self::iphone(),
            PlatformArg::Android => Self::android(),
        }
    }
}

/// Message language
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LocaleArg {
    /// Korean
    #[default]
    Ko,
    /// English
    En,
}

impl From<LocaleArg> for Locale {
    fn from(arg: LocaleArg) -> Self {
        match arg {
            LocaleArg::Ko => Self::Ko,
            LocaleArg::En => Self::En,
        }
    }
}

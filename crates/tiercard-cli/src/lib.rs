//! Tiercard CLI library
//!
//! Argument parsing, configuration, progress output and the export runner
//! behind the `tiercard` binary.

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

mod commands;
mod config;
mod error;
mod output;
mod runner;

pub use commands::{
    Cli, ColorArg, Commands, ConfigArgs, ExportArgs, LocaleArg, LogFormatArg, LoopArgs,
    PlatformArg,
};
pub use config::{CliConfig, ColorChoice, Verbosity};
pub use error::{CliError, CliResult};
pub use output::{describe, ProgressReporter};
pub use runner::{build_runtime, ExportOutcome, ExportRunner};

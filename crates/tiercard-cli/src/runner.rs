//! Export runner: tier data in, delivered artifact out

use crate::commands::ExportArgs;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;
use std::path::PathBuf;
use tiercard::tier::default_filename;
use tiercard::{
    ArtifactKind, CardBuilder, ClipMedia, DirectoryHost, ExportConfig, ExportReceipt, Exporter,
    Locale, LoopOptions, SceneRasterizer, TierResponse,
};

/// Runtime the binary drives exports on: one thread with timers and network I/O
pub fn build_runtime() -> CliResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::config(format!("Failed to create tokio runtime: {e}")))
}

/// What an export run left behind
#[derive(Debug, Clone)]
pub struct ExportOutcome {
    /// Exporter summary
    pub receipt: ExportReceipt,
    /// Files written into the output directory
    pub written: Vec<PathBuf>,
}

/// Runs still and loop exports for parsed CLI arguments
#[derive(Debug)]
pub struct ExportRunner<'a> {
    args: &'a ExportArgs,
    reporter: &'a mut ProgressReporter,
}

impl<'a> ExportRunner<'a> {
    /// Create a runner
    pub fn new(args: &'a ExportArgs, reporter: &'a mut ProgressReporter) -> Self {
        Self { args, reporter }
    }

    fn locale(&self) -> Locale {
        self.args.locale.into()
    }

    /// Export configuration from `--config`, or the defaults
    pub fn export_config(&self) -> CliResult<ExportConfig> {
        match self.args.config.as_deref() {
            Some(path) => {
                let config = ExportConfig::from_file(path)?;
                self.reporter.info(&format!("Using config {}", path.display()));
                Ok(config)
            }
            None => Ok(ExportConfig::default()),
        }
    }

    /// Read `--data` or fetch by nickname
    pub async fn load_data(&self) -> CliResult<TierResponse> {
        if let Some(path) = &self.args.data {
            let text = tokio::fs::read_to_string(path).await?;
            return Ok(TierResponse::from_json(&text)?);
        }
        if let Some(nickname) = &self.args.fetch {
            self.reporter.info(&format!(
                "Fetching {}B tier data for {nickname}",
                self.args.button
            ));
            return fetch(nickname, self.args, self.locale()).await;
        }
        Err(CliError::invalid_argument("either --data or --fetch is required"))
    }

    /// Build the card and run one export. `None` exports a still.
    pub async fn run(&mut self, loop_options: Option<LoopOptions>) -> CliResult<ExportOutcome> {
        let config = self.export_config()?;
        let data = self.load_data().await?;
        let badge = self
            .args
            .badge
            .as_deref()
            .map(ClipMedia::from_gif_file)
            .transpose()?;

        let nickname = self.args.display_name();
        let mut builder = CardBuilder::new(&data, nickname, self.args.button);
        if let Some(clip) = badge {
            builder = builder.with_badge_media(Box::new(clip));
        }
        let mut target = builder.build()?;

        let kind = if loop_options.is_some() {
            ArtifactKind::Gif
        } else {
            ArtifactKind::Png
        };
        let filename = self
            .args
            .filename
            .clone()
            .unwrap_or_else(|| default_filename(nickname, self.args.button, kind));

        let locale = self.locale();
        let mut exporter = Exporter::new(SceneRasterizer::new(), DirectoryHost::new(self.args.out.clone()))
            .with_config(config)
            .with_platform(self.args.capabilities())
            .with_locale(locale);

        self.reporter.start(match loop_options {
            Some(_) => "Recording badge loop",
            None => "Capturing card",
        });
        let result = match loop_options {
            Some(options) => exporter.export_loop(&mut target, &filename, options).await,
            None => exporter.export_still(&mut target, &filename).await,
        };
        self.reporter.finish();

        match result {
            Ok(receipt) => {
                self.reporter.receipt(&receipt);
                Ok(ExportOutcome {
                    receipt,
                    written: exporter.into_host().written().to_vec(),
                })
            }
            Err(e) => {
                tracing::error!(error = %e, states = ?exporter.last_states(), "export failed");
                Err(CliError::export(e, locale))
            }
        }
    }
}

#[cfg(feature = "fetch")]
async fn fetch(nickname: &str, args: &ExportArgs, locale: Locale) -> CliResult<TierResponse> {
    let mut client = tiercard::ArchiveClient::new();
    if let Some(base) = &args.api_base {
        client = client.with_base_url(base.as_str());
    }
    client
        .fetch_tier(nickname, args.button)
        .await
        .map_err(|e| CliError::export(e, locale))
}

#[cfg(not(feature = "fetch"))]
async fn fetch(_nickname: &str, _args: &ExportArgs, _locale: Locale) -> CliResult<TierResponse> {
    Err(CliError::invalid_argument(
        "--fetch needs a build with the `fetch` feature",
    ))
}

//! Tiercard CLI: export tier cards from the command line
//!
//! ## Usage
//!
//! ```bash
//! tiercard still --data tier.json --nickname 흑우        # PNG still
//! tiercard loop --fetch 흑우 -b 6 --badge gm.gif         # looping GIF
//! tiercard still --data tier.json --platform iphone      # fallback page
//! tiercard config > export.yaml                          # default config
//! ```

use clap::Parser;
use std::process::ExitCode;
use tiercard::ExportConfig;
use tiercard_cli::{
    build_runtime, Cli, CliConfig, CliError, CliResult, ColorChoice, Commands, ConfigArgs,
    ExportRunner, LogFormatArg, ProgressReporter, Verbosity,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = build_config(&cli);
    init_logging(&config, cli.log_format);

    match run(cli, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let reporter = reporter(&config);
            reporter.failure(&format!("Error: {e}"));
            if config.verbosity.is_verbose() {
                let mut source = std::error::Error::source(&e);
                while let Some(cause) = source {
                    reporter.failure(&format!("  caused by: {cause}"));
                    source = cause.source();
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, config: &CliConfig) -> CliResult<()> {
    match cli.command {
        Commands::Still(args) => {
            let mut reporter = reporter(config);
            let runtime = build_runtime()?;
            let outcome = runtime.block_on(ExportRunner::new(&args, &mut reporter).run(None))?;
            print_written(&outcome.written);
            Ok(())
        }
        Commands::Loop(args) => {
            let mut reporter = reporter(config);
            let runtime = build_runtime()?;
            let outcome = runtime.block_on(
                ExportRunner::new(&args.export, &mut reporter).run(Some(args.options())),
            )?;
            print_written(&outcome.written);
            Ok(())
        }
        Commands::Config(args) => run_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    let color: ColorChoice = cli.color.into();
    CliConfig::new().with_verbosity(verbosity).with_color(color)
}

fn init_logging(config: &CliConfig, format: LogFormatArg) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.verbosity.log_directive()));
    let ansi = config.color.should_color();
    let debug = matches!(config.verbosity, Verbosity::Debug);

    let fmt_layer = match format {
        LogFormatArg::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        LogFormatArg::Pretty => fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .with_target(true)
            .with_file(debug)
            .with_line_number(debug)
            .boxed(),
        LogFormatArg::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
            .with_target(false)
            .boxed(),
    };

    if let Err(e) = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
    {
        eprintln!("Warning: logging was not initialized: {e}");
    }
}

fn reporter(config: &CliConfig) -> ProgressReporter {
    ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet())
}

fn print_written(paths: &[std::path::PathBuf]) {
    for path in paths {
        println!("{}", path.display());
    }
}

fn run_config(args: &ConfigArgs) -> CliResult<()> {
    let config = args
        .file
        .as_deref()
        .map(ExportConfig::from_file)
        .transpose()?
        .unwrap_or_default();
    let text = if args.json {
        serde_json::to_string_pretty(&config)
            .map_err(|e| CliError::config(format!("Failed to render config: {e}")))?
    } else {
        config.to_yaml_string()?
    };
    print!("{text}");
    if args.json {
        println!();
    }
    Ok(())
}

mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use tokenforge_core::config::AppConfig;
use tokenforge_core::export::ExportFormat;
use tokenforge_core::models::{ColorRole, FontCategory, Unit};
use tokenforge_core::scale::{Lighting, ScaleMethod, TextType};

#[derive(Debug, Parser)]
#[command(name = "tokenforge", version, about = "Manage typography scales and design tokens")]
pub struct Cli {
    /// Log level for tokenforge crates (overrides config; RUST_LOG wins over both).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a type scale.
    Scale {
        #[command(flatten)]
        scale: ScaleArgs,
        /// Unit for the second column.
        #[arg(long, default_value = "rem")]
        unit: Unit,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Recommend a base size from viewing conditions.
    Distance {
        #[command(flatten)]
        distance: DistanceArgs,
        /// Also print a modular scale built on the recommended base.
        #[arg(long)]
        ratio: Option<String>,
        #[arg(long, default_value_t = 5)]
        up: u32,
        #[arg(long, default_value_t = 2)]
        down: u32,
    },
    /// List the named ratios.
    Ratios,
    #[command(subcommand)]
    Brand(BrandCommand),
    #[command(subcommand)]
    Platform(PlatformCommand),
    #[command(subcommand)]
    Typography(TypographyCommand),
    #[command(subcommand)]
    Color(ColorCommand),
    #[command(subcommand)]
    Font(FontCommand),
    /// Export a brand's tokens.
    Export {
        brand: String,
        #[arg(long, short, default_value = "json")]
        format: ExportFormat,
        /// Write to a file instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Ask an AI provider to review a platform's typography.
    Analyze {
        platform: String,
        /// anthropic, gemini or deepseek (default from config).
        #[arg(long)]
        provider: Option<String>,
    },
    /// Apply one recommendation of a stored analysis to its platform.
    Apply { analysis: String, index: usize },
    /// Commit a brand's JSON tokens to the configured GitHub repository.
    Publish {
        brand: String,
        #[arg(long, short)]
        message: Option<String>,
    },
    /// Copy a brand from the hosted backend into the local snapshot.
    Pull { brand: String },
    /// Upsert a brand from the local snapshot into the hosted backend.
    Push { brand: String },
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Debug, Subcommand)]
pub enum BrandCommand {
    List,
    Create {
        name: String,
        #[arg(long, short)]
        description: Option<String>,
    },
    /// Delete a brand with its platforms, styles, colors, fonts and analyses.
    Delete { id: String },
}

#[derive(Debug, Subcommand)]
pub enum PlatformCommand {
    List { brand: String },
    Create {
        brand: String,
        name: String,
        #[arg(long, default_value = "rem")]
        units: Unit,
        #[arg(long, short)]
        description: Option<String>,
        #[command(flatten)]
        scale: ScaleArgs,
        #[command(flatten)]
        distance: DistanceArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum TypographyCommand {
    /// List a platform's styles with resolved sizes.
    List { platform: String },
    /// Create the default style set (captions, body, headings).
    Generate { platform: String },
}

#[derive(Debug, Subcommand)]
pub enum ColorCommand {
    List { brand: String },
    Add {
        brand: String,
        name: String,
        hex: String,
        #[arg(long, default_value = "primary")]
        role: ColorRole,
    },
    /// WCAG contrast ratio between two hex colors.
    Contrast { foreground: String, background: String },
}

#[derive(Debug, Subcommand)]
pub enum FontCommand {
    List { brand: String },
    Add {
        brand: String,
        family: String,
        #[arg(long, default_value = "sans-serif")]
        category: FontCategory,
        #[arg(long, value_delimiter = ',', default_value = "400,700")]
        weights: Vec<u16>,
        /// Font file to upload (remote backend only).
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective config with secrets redacted.
    Show,
    /// Print the config file path.
    Path,
    /// Write the default config file if none exists.
    Init,
}

/// Scale overrides; unset fields come from config.
#[derive(Debug, Clone, Default, Args)]
pub struct ScaleArgs {
    #[arg(long)]
    pub base: Option<f64>,
    /// Number or named ratio (e.g. 1.25, major-third).
    #[arg(long)]
    pub ratio: Option<String>,
    #[arg(long)]
    pub up: Option<u32>,
    #[arg(long)]
    pub down: Option<u32>,
    #[arg(long)]
    pub method: Option<ScaleMethod>,
}

/// Viewing-condition overrides; unset fields come from config.
#[derive(Debug, Clone, Default, Args)]
pub struct DistanceArgs {
    #[arg(long)]
    pub distance_mm: Option<f64>,
    #[arg(long)]
    pub acuity: Option<f64>,
    #[arg(long)]
    pub mean_length_ratio: Option<f64>,
    #[arg(long)]
    pub lighting: Option<Lighting>,
    #[arg(long)]
    pub text_type: Option<TextType>,
    #[arg(long)]
    pub ppi: Option<f64>,
}

fn init_tracing(level: &str) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tokenforge={level}")));

    let dir = AppConfig::data_dir();
    let (file_layer, guard) = match std::fs::create_dir_all(&dir) {
        Ok(()) => {
            let appender = tracing_appender::rolling::daily(&dir, "tokenforge.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();
    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };
    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| config.general.log_level.clone());
    let _guard = init_tracing(&level);

    match commands::run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("command failed: {e:?}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

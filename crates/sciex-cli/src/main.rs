//! SCIEX CLI - Command-line interface
//!
//! Usage:
//!   sciex extract <pdf> [--model <path>] [--window <n>] [--pretty]
//!   sciex text <pdf>
//!   sciex model [--model <path>]

use anyhow::Context;
use clap::{Parser, Subcommand};
use sciex_core::config::AppConfig;
use sciex_extractor::{EntityRecognizer, ExtractionPipeline, LexiconModel};
use sciex_parser::PdfTextExtractor;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sciex")]
#[command(about = "Scientific entity extraction from PDF documents")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract entities with context and print them as JSON
    Extract {
        /// PDF document
        pdf: PathBuf,
        /// NER model artifact, overrides the configured path
        #[arg(long)]
        model: Option<PathBuf>,
        /// Context window in chars on each side of an entity
        #[arg(long)]
        window: Option<usize>,
        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Print the normalized text of a PDF
    Text {
        /// PDF document
        pdf: PathBuf,
    },
    /// Load an NER model and describe it
    Model {
        /// NER model artifact, overrides the configured path
        #[arg(long)]
        model: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };

    // Logs go to stderr so stdout stays machine readable
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "sciex_parser={0},sciex_extractor={0}",
                    config.logging.level
                )
                .into()
            }),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Extract {
            pdf,
            model,
            window,
            pretty,
        } => {
            if let Some(path) = model {
                config.model.path = path;
            }
            if let Some(window) = window {
                config.context.window_size = window;
            }

            let recognizer = LexiconModel::load(&config.model.path)?;
            let pipeline = ExtractionPipeline::new(Arc::new(recognizer), config.context.window_size);
            let records = pipeline
                .process_file(&pdf)
                .with_context(|| format!("Failed to extract entities from {}", pdf.display()))?;

            let output = if pretty {
                serde_json::to_string_pretty(&records)?
            } else {
                serde_json::to_string(&records)?
            };
            println!("{output}");
        }
        Commands::Text { pdf } => {
            let text = PdfTextExtractor::new()
                .extract(&pdf)
                .with_context(|| format!("Failed to extract text from {}", pdf.display()))?;
            println!("{text}");
        }
        Commands::Model { model } => {
            if let Some(path) = model {
                config.model.path = path;
            }

            let model = LexiconModel::load(&config.model.path)?;
            println!("Model:    {}", model.name());
            println!("Version:  {}", model.version());
            println!("Path:     {}", config.model.path.display());
            println!("Terms:    {}", model.term_count());
            println!("Patterns: {}", model.pattern_count());
            println!(
                "Sentence segmentation: {}",
                if model.segments_sentences() { "on" } else { "off" }
            );
        }
    }

    Ok(())
}

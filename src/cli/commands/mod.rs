//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod classify;
mod keywords;
mod ocr_check;
mod records;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::load_settings;

#[derive(Parser)]
#[command(name = "phishscope")]
#[command(about = "Phishing site classification and target identification")]
#[command(version)]
pub struct Cli {
    /// Config file path (overrides auto-discovery)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a site as phish, suspicious or not phish
    Classify {
        /// Fetch the site from this URL
        #[arg(long, conflicts_with = "record", required_unless_present = "record")]
        url: Option<String>,
        /// Site record JSON file or saved site id (screenshot read from <siteid>.png beside it)
        #[arg(long)]
        record: Option<PathBuf>,
        /// Replay search results cached in the record instead of searching
        #[arg(long, requires = "record")]
        cached: bool,
        /// Store the fetched record in the data directory
        #[arg(long, requires = "url")]
        save: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the keyword sets selected for a site record
    Keywords {
        /// Site record JSON file or saved site id
        #[arg(long)]
        record: PathBuf,
    },

    /// List site records saved in the data directory
    Records,

    /// Check OCR backend availability
    OcrCheck,
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (settings, _config) = load_settings(cli.config.as_deref()).await;

    match cli.command {
        Commands::Classify {
            url,
            record,
            cached,
            save,
            json,
        } => match (url, record) {
            (_, Some(record)) => classify::cmd_classify_record(&settings, &record, cached, json).await,
            (Some(url), None) => classify::cmd_classify_url(&settings, &url, save, json).await,
            (None, None) => anyhow::bail!("Either --url or --record is required"),
        },
        Commands::Keywords { record } => keywords::cmd_keywords(&settings, &record).await,
        Commands::Records => records::cmd_records(&settings).await,
        Commands::OcrCheck => ocr_check::cmd_ocr_check(&settings).await,
    }
}

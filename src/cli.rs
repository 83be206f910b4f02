//! Command-line interface definitions for KudaGo News.
//!
//! Flags choose the output files and the ranking window, and can override
//! the sizing values from the YAML config file.

use crate::config::AppConfig;
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the KudaGo News application.
///
/// # Examples
///
/// ```sh
/// # Defaults: 100 news, top 10 into news.csv, everything into news.md
/// kudago_news
///
/// # Larger run from a config file, 8 workers
/// kudago_news -c config.yaml --total-count 1000 -w 8
///
/// # Only the streaming pass
/// kudago_news --stream-only -m /tmp/all_news.md
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output file for the ranked CSV report
    #[arg(long, default_value = "news.csv")]
    pub csv_output: PathBuf,

    /// Output file for the streamed Markdown of every fetched news item
    #[arg(short, long, default_value = "news.md")]
    pub markdown_output: PathBuf,

    /// How many of the most rated news go into the report
    #[arg(short, long, default_value_t = 10)]
    pub top: usize,

    /// First publication date (inclusive) considered for the report
    #[arg(long, default_value = "2023-10-31")]
    pub from: NaiveDate,

    /// Last publication date (inclusive) considered for the report
    #[arg(long, default_value = "2024-10-31")]
    pub to: NaiveDate,

    /// Override `total_news_count` from the config
    #[arg(long)]
    pub total_count: Option<usize>,

    /// Override `worker_count` from the config
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Override `base_url` from the config
    #[arg(long, env = "KUDAGO_BASE_URL")]
    pub base_url: Option<String>,

    /// Skip the bulk fetch and the ranked report
    #[arg(long)]
    pub stream_only: bool,
}

impl Cli {
    /// Apply flag overrides on top of the loaded config.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(n) = self.total_count {
            config.total_news_count = n;
        }
        if let Some(n) = self.workers {
            config.worker_count = n;
        }
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
    }
}

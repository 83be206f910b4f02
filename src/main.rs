//! # KudaGo News
//!
//! Downloads Moscow news from the KudaGo public API and produces two reports:
//! a CSV of the most rated stories in a date window, and a Markdown file
//! holding every fetched story, written while the fetch is still running.
//!
//! ## Usage
//!
//! ```sh
//! kudago_news -c config.yaml --csv-output news.csv -m news.md
//! ```
//!
//! ## Architecture
//!
//! 1. **Bulk fetch**: all pages up front, bounded by a permit pool
//! 2. **Ranking**: filter by publication date, sort by score, keep the top N
//! 3. **Report**: write the CSV and print the ranked news as Markdown
//! 4. **Streaming**: a fixed pool of workers splits the pages between them
//!    and feeds a single sink that appends each story to the Markdown file

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod limiter;
mod models;
mod outputs;
mod pipeline;
mod ranking;
mod utils;

use api::KudaGoClient;
use cli::Cli;
use config::AppConfig;
use outputs::{csv, markdown};
use pipeline::NewsPipeline;
use utils::ensure_writable_parent;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("kudago_news starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let mut app_config = AppConfig::load(args.config.as_deref())?;
    args.apply_overrides(&mut app_config);
    let settings = app_config.validate()?;
    info!(
        total = app_config.total_news_count,
        workers = app_config.worker_count,
        page_size = app_config.page_size,
        max_retries = app_config.max_retries,
        base_url = %settings.client.base_url,
        "Loaded configuration"
    );

    ensure_writable_parent(&args.markdown_output).await?;
    if !args.stream_only {
        ensure_writable_parent(&args.csv_output).await?;
    }

    let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
    let client = Arc::new(KudaGoClient::new(http, settings.client.clone()));

    // ---- Ranked report ----
    if args.stream_only {
        info!("Skipping bulk fetch and ranked report");
    } else {
        if args.from > args.to {
            warn!(from = %args.from, to = %args.to, "Empty date window; the report will have no rows");
        }

        info!("Downloading news from API");
        let news = client.fetch_all(app_config.total_news_count).await?;

        info!(count = news.len(), top = args.top, "Filtering downloaded news");
        let top_news = ranking::most_rated(&news, args.top, &(args.from..=args.to));

        info!(path = %args.csv_output.display(), rows = top_news.len(), "Saving ranked news");
        csv::save_news(&args.csv_output, &top_news).await?;

        println!("{}", markdown::news_to_markdown(&top_news));
    }

    // ---- Streaming pipeline ----
    let mut pipeline = NewsPipeline::new(Arc::clone(&client), settings.pipeline)?;
    let stream_t0 = std::time::Instant::now();
    let report = pipeline.execute_to_file(&args.markdown_output).await?;
    debug!(state = ?pipeline.state(), "Pipeline stopped");
    info!(
        path = %args.markdown_output.display(),
        total_pages = report.total_pages,
        pages = report.pages_fetched,
        sent = report.records_sent,
        records = report.records_written,
        elapsed_ms = stream_t0.elapsed().as_millis(),
        "Streaming pass completed"
    );

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}

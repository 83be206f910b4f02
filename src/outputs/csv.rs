//! Semicolon-separated report of the ranked news.
//!
//! Fields are written as-is; text fields are already single-line after
//! decoding, but embedded semicolons are not escaped.

use crate::models::News;
use std::error::Error;
use std::fmt::Write;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

pub const CSV_HEADER: &str =
    "id;title;place;description;site_url;favorites_count;comments_count;publication_date;rating";

/// Format used for the `publication_date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Render the header plus one row per record.
pub fn news_to_csv(news: &[News]) -> String {
    let mut out = String::with_capacity(CSV_HEADER.len() + 1 + news.len() * 256);
    out.push_str(CSV_HEADER);
    out.push('\n');
    for n in news {
        // Writing into a String cannot fail.
        let _ = writeln!(
            out,
            "{};{};{};{};{};{};{};{};{}",
            n.id,
            n.title,
            n.place_or_unknown(),
            n.description,
            n.site_url,
            n.favorites_count,
            n.comments_count,
            n.publication_date.format(DATE_FORMAT),
            n.score()
        );
    }
    out
}

/// Write the report to `path`, replacing any existing file.
#[instrument(level = "info", skip_all, fields(path = %path.display(), rows = news.len()))]
pub async fn save_news(path: &Path, news: &[News]) -> Result<(), Box<dyn Error>> {
    if fs::try_exists(path).await? {
        warn!("Report file already exists and will be overwritten");
    }
    fs::write(path, news_to_csv(news)).await?;
    info!("Wrote ranked CSV report");
    Ok(())
}

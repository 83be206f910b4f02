//! Small helpers shared by the decoder, the fetcher and the output writers.
//!
//! - Line-break normalisation for text fields coming from the API
//! - String truncation for log lines
//! - Output path validation before a long run starts

use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Any Unicode line break sequence: CRLF first so it collapses to one space.
static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\r\n|[\n\x0B\x0C\r\x{85}\x{2028}\x{2029}]").unwrap());

/// Replace every line break in `s` with a single space.
///
/// KudaGo titles and descriptions regularly carry embedded newlines, which
/// would break both the one-line CSV rows and the Markdown headings.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(strip_newlines("a\r\nb\nc"), "a b c");
/// ```
pub fn strip_newlines(s: &str) -> String {
    LINE_BREAK.replace_all(s, " ").into_owned()
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes (backing off to a char
/// boundary) with an ellipsis and byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure the directory that will hold `file` exists and is writable.
///
/// Creates the parent directory if needed, then writes and removes a probe
/// file next to the target. Checked up front so a multi-minute fetch does
/// not end with nowhere to put the result.
#[instrument(level = "info", skip_all, fields(path = %file.display()))]
pub async fn ensure_writable_parent(file: &Path) -> Result<(), Box<dyn Error>> {
    let dir = match file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&dir).await?;

    let probe_path = dir.join("..__probe_write__");
    stdfs::File::create(&probe_path)?;
    let _ = stdfs::remove_file(&probe_path);
    info!(dir = %dir.display(), "Output directory is writable");
    Ok(())
}

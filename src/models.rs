//! Data models for KudaGo news records and the paged API response.
//!
//! - [`News`]: one decoded news item, immutable once built
//! - [`NewsPage`]: the `{count, next, previous, results}` envelope of one page
//!
//! Text fields are normalised at the decode boundary (line breaks become
//! spaces) so nothing downstream has to care about the raw API shape.

use crate::utils::strip_newlines;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Rendered in place of a missing `place`.
pub const UNKNOWN_PLACE: &str = "unknown";

/// A single news item as returned by the KudaGo `news` endpoint.
///
/// The JSON field names follow the API; `place` arrives as an expanded
/// object (`{"title": ...}`) or is absent/null.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct News {
    pub id: u64,
    #[serde(deserialize_with = "de_single_line")]
    pub title: String,
    /// Title of the expanded place object, `None` when the API omits it.
    #[serde(default, deserialize_with = "de_place", serialize_with = "ser_place")]
    pub place: Option<String>,
    #[serde(deserialize_with = "de_single_line")]
    pub description: String,
    #[serde(deserialize_with = "de_single_line")]
    pub site_url: String,
    pub favorites_count: u64,
    pub comments_count: u64,
    /// Epoch seconds on the wire, decoded as UTC.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub publication_date: DateTime<Utc>,
}

impl News {
    /// Popularity score: `sigmoid(favorites / (comments + 1))`, always in `(0, 1)`.
    pub fn score(&self) -> f64 {
        let ratio = self.favorites_count as f64 / (self.comments_count as f64 + 1.0);
        1.0 / (1.0 + (-ratio).exp())
    }

    /// Place title, or [`UNKNOWN_PLACE`] when absent.
    pub fn place_or_unknown(&self) -> &str {
        self.place.as_deref().unwrap_or(UNKNOWN_PLACE)
    }
}

/// One page of the paged `news` endpoint. Only `results` is consumed.
#[derive(Debug, Deserialize, Serialize)]
pub struct NewsPage {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<News>,
}

fn de_single_line<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(strip_newlines(&raw))
}

fn de_place<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    // Anything other than an object with a string `title` counts as absent.
    let place = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(place
        .as_ref()
        .and_then(|p| p.get("title"))
        .and_then(|t| t.as_str())
        .map(strip_newlines))
}

fn ser_place<S>(place: &Option<String>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeStruct;
    match place {
        Some(title) => {
            let mut s = serializer.serialize_struct("PlaceRef", 1)?;
            s.serialize_field("title", title)?;
            s.end()
        }
        None => serializer.serialize_none(),
    }
}

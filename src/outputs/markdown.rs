//! Markdown rendering for news records.
//!
//! [`NewsPrinter`] is a reusable string buffer. The sink formats one record,
//! takes the text, then clears the buffer so its memory never grows with the
//! number of records written.

use crate::models::News;
use std::fmt::Write;

/// Format used for the `Published:` line.
pub const PUBLISHED_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

#[derive(Debug, Default)]
pub struct NewsPrinter {
    buf: String,
}

impl NewsPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// `#`-style heading followed by a blank line.
    pub fn header(&mut self, level: usize, content: &str) -> &mut Self {
        self.buf.push_str(&"#".repeat(level));
        self.buf.push(' ');
        self.buf.push_str(content);
        self.buf.push_str("\n\n");
        self
    }

    /// One line of body text.
    pub fn text(&mut self, content: &str) -> &mut Self {
        self.buf.push_str(content);
        self.buf.push('\n');
        self
    }

    pub fn bold(content: &str) -> String {
        format!("**{content}**")
    }

    pub fn underlined(content: &str) -> String {
        format!("__{content}__")
    }

    pub fn link(url: &str, text: &str) -> String {
        format!("[{text}]({url})")
    }

    pub fn divider(&mut self) -> &mut Self {
        self.buf.push_str("\n---\n\n");
        self
    }

    /// Append the full block for one record, ending with a divider.
    pub fn format_news(&mut self, news: &News) -> &mut Self {
        self.header(1, &Self::bold(&news.title));
        self.text(&format!(
            "Published: {}",
            news.publication_date.format(PUBLISHED_FORMAT)
        ));
        self.text(&Self::underlined(news.place_or_unknown()));
        self.buf.push('\n');

        self.header(2, "Description");
        self.text(&news.description);
        self.buf.push('\n');

        self.header(2, "Statistics");
        let _ = writeln!(self.buf, "Favorites: {}", news.favorites_count);
        let _ = writeln!(self.buf, "Comments: {}", news.comments_count);
        let _ = writeln!(self.buf, "Score: {:.2}", news.score());
        self.buf.push('\n');

        self.text(&Self::link(&news.site_url, "Source"));
        self.divider()
    }

    pub fn build(&self) -> &str {
        &self.buf
    }

    /// Drop the contents but keep the allocation.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

/// Render a list of records as one Markdown document.
pub fn news_to_markdown(news: &[News]) -> String {
    let mut printer = NewsPrinter::new();
    for item in news {
        printer.format_news(item);
    }
    printer.build().to_string()
}

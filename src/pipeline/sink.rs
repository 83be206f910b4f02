//! The single consumer of the pipeline channel.

use crate::models::News;
use crate::outputs::markdown::NewsPrinter;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

/// Renders every received record into `writer`, one Markdown block at a time.
#[derive(Debug)]
pub struct Sink<W> {
    writer: W,
    printer: NewsPrinter,
}

/// What the sink hands back once the channel is drained.
#[derive(Debug)]
pub struct SinkOutcome<W> {
    pub records: usize,
    pub writer: W,
}

impl<W> Sink<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            printer: NewsPrinter::new(),
        }
    }

    /// Receive until every sender is gone and the queue is empty.
    ///
    /// Each record is written as soon as it arrives; nothing is held past
    /// its own iteration. The writer is flushed before it is returned.
    pub async fn drain(mut self, mut rx: UnboundedReceiver<News>) -> std::io::Result<SinkOutcome<W>> {
        let mut records = 0usize;
        while let Some(news) = rx.recv().await {
            self.printer.format_news(&news);
            self.writer.write_all(self.printer.build().as_bytes()).await?;
            self.writer.write_all(b"\n").await?;
            self.printer.clear();
            records += 1;
            debug!(id = news.id, records, "Wrote news record");
        }
        self.writer.flush().await?;
        info!(records, "Sink drained");
        Ok(SinkOutcome {
            records,
            writer: self.writer,
        })
    }
}

//! Concurrent paginated fetch feeding a single Markdown writer.
//!
//! ```text
//!            ┌ Worker 0: pages 1, 1+n, …  ┐
//! NewsPipeline ─ Worker 1: pages 2, 2+n, …  ├─▶ unbounded mpsc ─▶ Sink ─▶ news.md
//!            └ Worker n-1: …              ┘
//! ```
//!
//! The pool size is fixed at construction. The coordinator keeps its own
//! sender until every worker has been joined, then drops it; the sink sees
//! the channel end only after it has drained what was already queued.
//! Records from different workers interleave in arbitrary order; within one
//! worker they keep page order.
//!
//! A page that exhausts its retries yields no records (see [`crate::api`]).
//! Any other worker failure is reported as the run's error, but only after
//! the sink has drained and flushed, so the output file is always closed.

pub mod partition;
pub mod sink;
pub mod worker;

use crate::api::PageSource;
use crate::config::MAX_PAGE_SIZE;
use crate::error::PipelineError;
use partition::{WorkAssignment, total_pages};
use sink::Sink;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::fs::File;
use tokio::io::{AsyncWrite, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument};
use worker::Worker;

/// Sizing of one streaming run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    pub total_count: usize,
    pub worker_count: usize,
    pub page_size: usize,
}

/// `Idle → Running → Draining → Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    /// Workers and sink are both active.
    Running,
    /// Workers joined, channel closed, sink still writing.
    Draining,
    Done,
}

/// Counters of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub total_pages: u32,
    pub pages_fetched: usize,
    pub records_sent: usize,
    pub records_written: usize,
}

pub struct NewsPipeline<S> {
    source: Arc<S>,
    config: PipelineConfig,
    total_pages: u32,
    state: PipelineState,
}

impl<S: PageSource> NewsPipeline<S> {
    pub fn new(source: Arc<S>, config: PipelineConfig) -> Result<Self, PipelineError> {
        if config.worker_count == 0 {
            return Err(PipelineError::NoWorkers);
        }
        if config.page_size == 0 {
            return Err(PipelineError::ZeroPageSize);
        }
        if config.page_size > MAX_PAGE_SIZE {
            return Err(PipelineError::PageSizeTooLarge {
                page_size: config.page_size,
                max: MAX_PAGE_SIZE,
            });
        }
        let total_pages =
            total_pages(config.total_count, config.page_size).ok_or(PipelineError::TooManyPages {
                total_count: config.total_count,
                page_size: config.page_size,
            })?;
        Ok(Self {
            source,
            config,
            total_pages,
            state: PipelineState::Idle,
        })
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn transition(&mut self, next: PipelineState) {
        info!(from = ?self.state, to = ?next, "Pipeline state change");
        self.state = next;
    }

    /// Run the pool against `writer` and hand the writer back when done.
    #[instrument(
        level = "info",
        skip_all,
        fields(
            total_count = self.config.total_count,
            workers = self.config.worker_count,
            page_size = self.config.page_size
        )
    )]
    pub async fn execute<W>(&mut self, writer: W) -> Result<(PipelineReport, W), PipelineError>
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let t0 = Instant::now();
        let PipelineConfig {
            worker_count,
            page_size,
            ..
        } = self.config;
        let total_pages = self.total_pages;
        let mut report = PipelineReport {
            total_pages,
            ..PipelineReport::default()
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let sink = tokio::spawn(Sink::new(writer).drain(rx));

        let mut workers = JoinSet::new();
        for worker_index in 0..worker_count {
            let worker = Worker {
                assignment: WorkAssignment::new(worker_index, worker_count, total_pages),
                page_size,
                source: Arc::clone(&self.source),
                tx: tx.clone(),
            };
            workers.spawn(worker.run());
        }
        self.transition(PipelineState::Running);

        let mut first_error = None;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(Ok(summary)) => {
                    debug!(
                        worker = summary.worker,
                        pages = summary.pages,
                        records = summary.records,
                        "Worker joined"
                    );
                    report.pages_fetched += summary.pages;
                    report.records_sent += summary.records;
                }
                Ok(Err(e)) => {
                    error!(error = %e, "Worker failed");
                    first_error.get_or_insert(e);
                }
                Err(e) => {
                    error!(error = %e, "Worker task panicked");
                    first_error.get_or_insert(PipelineError::WorkerPanicked(e));
                }
            }
        }

        drop(tx);
        self.transition(PipelineState::Draining);

        let drained = sink.await.map_err(PipelineError::SinkPanicked)?;
        self.transition(PipelineState::Done);
        let outcome = drained?;

        if let Some(e) = first_error {
            return Err(e);
        }

        report.records_written = outcome.records;
        info!(
            total_pages,
            pages_fetched = report.pages_fetched,
            records = report.records_written,
            elapsed_ms = t0.elapsed().as_millis(),
            "Pipeline finished"
        );
        Ok((report, outcome.writer))
    }

    /// Run the pool writing Markdown into a freshly created file at `path`.
    pub async fn execute_to_file(&mut self, path: &Path) -> Result<PipelineReport, PipelineError> {
        let file = File::create(path).await?;
        let (report, _writer) = self.execute(BufWriter::new(file)).await?;
        Ok(report)
    }
}

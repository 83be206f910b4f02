//! One producer in the worker pool.

use super::partition::WorkAssignment;
use crate::api::PageSource;
use crate::error::PipelineError;
use crate::models::News;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

/// Fetches the pages of one [`WorkAssignment`] and forwards every record.
#[derive(Debug)]
pub struct Worker<S> {
    pub assignment: WorkAssignment,
    pub page_size: usize,
    pub source: Arc<S>,
    pub tx: UnboundedSender<News>,
}

/// Per-worker tally, logged by the coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerSummary {
    pub worker: usize,
    pub pages: usize,
    pub records: usize,
}

impl<S: PageSource> Worker<S> {
    /// Walk the assigned pages in increasing order, then drop the sender.
    pub async fn run(self) -> Result<WorkerSummary, PipelineError> {
        let worker = self.assignment.worker_index;
        let mut summary = WorkerSummary {
            worker,
            ..WorkerSummary::default()
        };
        debug!(worker, "Worker started");

        for page in self.assignment {
            debug!(worker, page, "Worker fetching page");
            let news = self
                .source
                .fetch_page(page, self.page_size)
                .await
                .map_err(|source| PipelineError::Worker { worker, source })?;

            summary.pages += 1;
            for item in news {
                self.tx.send(item).map_err(|_| PipelineError::SinkClosed)?;
                summary.records += 1;
            }
        }

        debug!(worker, pages = summary.pages, records = summary.records, "Worker finished");
        Ok(summary)
    }
}

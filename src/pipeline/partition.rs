//! Page arithmetic: how many pages a run needs and which pages each worker owns.
//!
//! Worker `i` of `n` owns pages `i+1, i+1+n, i+1+2n, …` up to the last page,
//! so the assignments of all workers tile `1..=total_pages` with no overlap.

use std::iter::StepBy;
use std::ops::RangeInclusive;

/// `ceil(total_count / page_size)`, or `None` when page numbers would not
/// fit in `u32`. `page_size` must be non-zero.
pub fn total_pages(total_count: usize, page_size: usize) -> Option<u32> {
    u32::try_from(total_count.div_ceil(page_size)).ok()
}

/// One request in the bulk page plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    pub size: usize,
}

/// Pages needed to fetch exactly `total_count` records, the last one sized
/// to the remainder: `(5, 2)` gives sizes `[2, 2, 1]`. `None` under the
/// same condition as [`total_pages`].
pub fn page_plan(total_count: usize, page_size: usize) -> Option<Vec<PageRequest>> {
    let pages = total_pages(total_count, page_size)?;
    let plan = (1..=pages)
        .map(|page| {
            let already = (page as usize - 1) * page_size;
            PageRequest {
                page,
                size: page_size.min(total_count - already),
            }
        })
        .collect();
    Some(plan)
}

/// The pages owned by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkAssignment {
    pub worker_index: usize,
    pub worker_count: usize,
    pub total_pages: u32,
}

impl WorkAssignment {
    /// `worker_count` must be non-zero and `worker_index < worker_count`.
    pub fn new(worker_index: usize, worker_count: usize, total_pages: u32) -> Self {
        debug_assert!(worker_count > 0 && worker_index < worker_count);
        Self {
            worker_index,
            worker_count,
            total_pages,
        }
    }

    /// Owned page numbers in increasing order.
    pub fn pages(&self) -> StepBy<RangeInclusive<u32>> {
        (self.worker_index as u32 + 1..=self.total_pages).step_by(self.worker_count)
    }
}

impl IntoIterator for WorkAssignment {
    type Item = u32;
    type IntoIter = StepBy<RangeInclusive<u32>>;

    fn into_iter(self) -> Self::IntoIter {
        self.pages()
    }
}

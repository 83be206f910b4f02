//! Output generation for the two report files.
//!
//! # Submodules
//!
//! - [`markdown`]: renders records as Markdown blocks; used by the streaming
//!   sink (`news.md`) and for the stdout summary
//! - [`csv`]: writes the ranked top-N report (`news.csv`)

pub mod csv;
pub mod markdown;

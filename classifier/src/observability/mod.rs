//! Observability Module
//!
//! Progress tracking for batch dispatch and reconciliation, plus table
//! formatting for run summaries.

mod common;

pub use common::{format_elapsed_secs, format_table, Progress, ProgressStage, TrackFn};

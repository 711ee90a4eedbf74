//! Shared utilities for `tracker_metrics`.
//!
//! Common functionality used across modules:
//! - Date parsing and formatting (report windows, cache week stamps)
//! - Progress indicators (for long-running fetches)

pub mod progress;
pub mod time;

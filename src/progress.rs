//! Progress-callback trait for per-stage pipeline events.
//!
//! Inject an [`Arc<dyn ProcessProgressCallback>`] via
//! [`crate::process::ProcessOptions::progress`] to be told as each stage
//! starts and finishes, and whenever a page problem is absorbed.
//!
//! # Example
//!
//! ```rust
//! use labelcrop::{ProcessOptions, ProcessProgressCallback, Stage};
//! use std::sync::Arc;
//!
//! struct Log;
//!
//! impl ProcessProgressCallback for Log {
//!     fn on_stage_complete(&self, stage: Stage, pages: usize) {
//!         eprintln!("{stage}: {pages} pages");
//!     }
//! }
//!
//! let options = ProcessOptions {
//!     progress: Some(Arc::new(Log)),
//!     ..Default::default()
//! };
//! # let _ = options;
//! ```

use crate::error::{PageIssue, Stage};
use std::sync::Arc;

/// Called by the pipeline as it moves through its stages.
///
/// Stages run one after another on a single blocking thread, but the
/// callback is shared with the caller's thread, so implementations must be
/// `Send + Sync`. All methods default to no-ops.
pub trait ProcessProgressCallback: Send + Sync {
    /// Called before a stage does any work. Skipped stages are not reported.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called after a stage finishes.
    ///
    /// # Arguments
    /// * `stage` — the stage that just finished
    /// * `pages` — page count of the document the stage produced
    fn on_stage_complete(&self, stage: Stage, pages: usize) {
        let _ = (stage, pages);
    }

    /// Called for each page-level problem the pipeline recovered from.
    fn on_page_issue(&self, issue: &PageIssue) {
        let _ = issue;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ProcessProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::process::ProcessOptions`].
pub type ProgressCallback = Arc<dyn ProcessProgressCallback>;

//! Pipeline entry points.
//!
//! [`process_with`] is the synchronous core: it runs load/merge → crop →
//! sort → timestamp → custom text → serialise over any [`PdfBackend`]. The
//! async entry points read inputs first, then run the core on a blocking
//! thread because pdfium must not be driven from async worker threads.
//!
//! Every run owns its own documents and shares no mutable state with
//! concurrent runs; the only shared piece is the process-wide pdfium binding,
//! which is created on first use and never torn down. A failure in
//! any stage aborts the run and no partial output is returned.

use crate::backend::pdfium::PdfiumBackend;
use crate::backend::{PdfBackend, TextExtractor};
use crate::error::{PageIssue, ProcessError, Stage};
use crate::output::{ProcessOutput, ProcessReport, StageTiming};
use crate::pipeline::annotate::{self, format_timestamp};
use crate::pipeline::crop::{self, CropPlan};
use crate::pipeline::input::{self, LoadedInput, PdfInput};
use crate::pipeline::{merge, sort};
use crate::progress::ProgressCallback;
use crate::settings::Settings;
use chrono::{DateTime, Local};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Run-level options that are not part of the settings record.
#[derive(Clone, Default)]
pub struct ProcessOptions {
    /// Stage/issue events. Default: none.
    pub progress: Option<ProgressCallback>,
    /// Time to stamp instead of "now". Default: none (use the local clock).
    pub timestamp: Option<DateTime<Local>>,
}

impl std::fmt::Debug for ProcessOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessOptions")
            .field(
                "progress",
                &self.progress.as_ref().map(|_| "<dyn ProcessProgressCallback>"),
            )
            .field("timestamp", &self.timestamp)
            .finish()
    }
}

/// Process PDFs with the settings and return the output PDF bytes.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Returns `Err(ProcessError)` when an input is missing, unreadable or not a
/// PDF, or when any codec operation fails. Page-level text-extraction and
/// crop-geometry problems are absorbed and never surface here.
pub async fn process(inputs: Vec<PdfInput>, settings: &Settings) -> Result<Vec<u8>, ProcessError> {
    process_detailed(inputs, settings, &ProcessOptions::default())
        .await
        .map(ProcessOutput::into_bytes)
}

/// Like [`process`], also returning a [`ProcessReport`].
pub async fn process_detailed(
    inputs: Vec<PdfInput>,
    settings: &Settings,
    options: &ProcessOptions,
) -> Result<ProcessOutput, ProcessError> {
    process_on(PdfiumBackend::bind, inputs, settings, options).await
}

/// Run the pipeline on a backend obtained from `make_backend` on the blocking thread.
pub async fn process_on<B, F>(
    make_backend: F,
    inputs: Vec<PdfInput>,
    settings: &Settings,
    options: &ProcessOptions,
) -> Result<ProcessOutput, ProcessError>
where
    B: PdfBackend + TextExtractor,
    F: FnOnce() -> Result<B, ProcessError> + Send + 'static,
{
    let loaded = input::load_inputs(inputs, settings.merge_pdf).await?;
    let settings = settings.clone();
    let options = options.clone();

    tokio::task::spawn_blocking(move || {
        let backend = make_backend()?;
        process_with(&backend, &backend, loaded, &settings, &options)
    })
    .await
    .map_err(|e| ProcessError::Internal(format!("Pipeline task panicked: {}", e)))?
}

/// Process PDFs and write the output atomically to `output_path`.
///
/// Uses a temp file + rename so a failed run never leaves a partial file.
pub async fn process_to_file(
    inputs: Vec<PdfInput>,
    output_path: impl AsRef<Path>,
    settings: &Settings,
    options: &ProcessOptions,
) -> Result<ProcessReport, ProcessError> {
    let output = process_detailed(inputs, settings, options).await?;
    let path = output_path.as_ref();

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ProcessError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    tokio::fs::write(&tmp_path, &output.pdf)
        .await
        .map_err(|e| ProcessError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| ProcessError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    info!("Wrote {} bytes to {}", output.pdf.len(), path.display());
    Ok(output.report)
}

/// Synchronous wrapper around [`process_detailed`].
///
/// Creates a temporary tokio runtime internally.
pub fn process_sync(
    inputs: Vec<PdfInput>,
    settings: &Settings,
    options: &ProcessOptions,
) -> Result<ProcessOutput, ProcessError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ProcessError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(process_detailed(inputs, settings, options))
}

/// Times stages and forwards events to the progress callback.
struct StageTracker<'o> {
    progress: Option<&'o ProgressCallback>,
    timings: Vec<StageTiming>,
    started: Option<(Stage, Instant)>,
}

impl<'o> StageTracker<'o> {
    fn new(options: &'o ProcessOptions) -> Self {
        Self {
            progress: options.progress.as_ref(),
            timings: Vec::new(),
            started: None,
        }
    }

    fn start(&mut self, stage: Stage) {
        debug!("Stage {} started", stage);
        if let Some(cb) = self.progress {
            cb.on_stage_start(stage);
        }
        self.started = Some((stage, Instant::now()));
    }

    fn complete(&mut self, pages: usize, new_issues: &[PageIssue]) {
        let Some((stage, at)) = self.started.take() else {
            return;
        };
        if let Some(cb) = self.progress {
            for issue in new_issues {
                cb.on_page_issue(issue);
            }
            cb.on_stage_complete(stage, pages);
        }
        self.timings.push(StageTiming {
            stage,
            duration_ms: at.elapsed().as_millis() as u64,
            pages,
        });
    }
}

/// Run every enabled stage over `backend`, reading page text with `extractor`.
///
/// Inputs must already be in memory; see [`LoadedInput`].
pub fn process_with<B, X>(
    backend: &B,
    extractor: &X,
    inputs: Vec<LoadedInput>,
    settings: &Settings,
    options: &ProcessOptions,
) -> Result<ProcessOutput, ProcessError>
where
    B: PdfBackend,
    X: TextExtractor + ?Sized,
{
    let total_start = Instant::now();
    let mut tracker = StageTracker::new(options);
    let mut issues: Vec<PageIssue> = Vec::new();
    let mut report = ProcessReport::default();
    info!(
        "Processing {} input(s): platform={}, merge={}, sort={}",
        inputs.len(),
        settings.platform,
        settings.merge_pdf,
        settings.sort_sku
    );

    // ── Step 1: Load / merge ─────────────────────────────────────────────
    report.merged = settings.merge_pdf && inputs.len() > 1;
    tracker.start(if report.merged { Stage::Merge } else { Stage::Load });
    let loaded = merge::load_document(backend, inputs, settings.merge_pdf)?;
    let mut doc = loaded.document;
    report.input_pages = loaded.input_pages;
    tracker.complete(backend.page_count(&doc), &[]);

    // ── Step 2: Crop ─────────────────────────────────────────────────────
    let plan = CropPlan::resolve(settings);
    if plan.is_skip() {
        debug!("Crop skipped: no margin for platform {}", settings.platform);
    } else {
        tracker.start(Stage::Crop);
        let before = issues.len();
        doc = crop::apply(backend, doc, plan, &mut issues)?;
        report.crop = Some(plan);
        tracker.complete(backend.page_count(&doc), &issues[before..]);
    }

    // ── Step 3: Sort by SKU ──────────────────────────────────────────────
    if settings.sort_sku {
        tracker.start(Stage::Sort);
        let before = issues.len();
        let sorted = sort::apply(backend, extractor, doc, &mut issues)?;
        doc = sorted.document;
        report.sort_keys = sorted.keys;
        tracker.complete(backend.page_count(&doc), &issues[before..]);
    }

    // ── Step 4: Timestamp ────────────────────────────────────────────────
    if settings.add_date_time {
        tracker.start(Stage::Timestamp);
        let at = options.timestamp.unwrap_or_else(Local::now);
        let text = format_timestamp(&at);
        annotate::stamp_timestamp(backend, &mut doc, &text)?;
        report.timestamp = Some(text);
        tracker.complete(backend.page_count(&doc), &[]);
    }

    // ── Step 5: Custom text ──────────────────────────────────────────────
    if let Some(text) = settings.stamp_text() {
        tracker.start(Stage::CustomText);
        annotate::stamp_custom_text(backend, &mut doc, text)?;
        report.custom_text = Some(text.to_string());
        tracker.complete(backend.page_count(&doc), &[]);
    }

    // ── Step 6: Serialise ────────────────────────────────────────────────
    tracker.start(Stage::Serialize);
    let pdf = backend
        .save(&doc)
        .map_err(|e| e.in_stage(Stage::Serialize))?;
    report.output_pages = backend.page_count(&doc);
    tracker.complete(report.output_pages, &[]);

    report.issues = issues;
    report.stages = tracker.timings;
    report.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "Processing complete: {} pages, {} bytes, {} page issue(s), {}ms",
        report.output_pages,
        pdf.len(),
        report.issues.len(),
        report.total_duration_ms
    );

    Ok(ProcessOutput { pdf, report })
}

//! Error types for the labelcrop library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ProcessError`] — **Fatal**: the run cannot produce output at all
//!   (unreadable input, corrupt PDF, a codec failure while copying or
//!   serialising). Returned as `Err(ProcessError)` from the `process*`
//!   entry points. No partial document is ever returned alongside it.
//!
//! * [`PageIssue`] — **Absorbed**: a single page could not be handled the
//!   normal way (text extraction failed, a margin was too large for the page)
//!   but the pipeline recovered locally. Collected into
//!   [`crate::output::ProcessReport`] so callers can see what was skipped.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage, used to prefix codec failures with their context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Merge,
    Crop,
    Sort,
    Timestamp,
    CustomText,
    Serialize,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Load => "load",
            Stage::Merge => "merge",
            Stage::Crop => "crop",
            Stage::Sort => "sort",
            Stage::Timestamp => "timestamp",
            Stage::CustomText => "custom text",
            Stage::Serialize => "serialize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All fatal errors returned by the labelcrop library.
#[derive(Debug, Error)]
pub enum ProcessError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The caller supplied an empty file list.
    #[error("No input PDF files were supplied")]
    NoInput,

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input was read, but is not a PDF.
    #[error("Input {input} is not a valid PDF ({source_name})\nFirst bytes: {magic:?}")]
    NotAPdf {
        input: usize,
        source_name: String,
        magic: Vec<u8>,
    },

    /// The PDF could not be decoded by the codec.
    #[error("Input {input} ({source_name}) is corrupt: {detail}")]
    CorruptPdf {
        input: usize,
        source_name: String,
        detail: String,
    },

    // ── Codec errors ──────────────────────────────────────────────────────
    /// A copy/crop/draw/serialise call failed; the whole run is aborted.
    #[error("PDF processing failed during {stage}: {message}")]
    Failed { stage: Stage, message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// The settings record could not be parsed.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium (or its directory), place the library\n\
in the working directory, or install it system-wide.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ProcessError {
    /// The stage a codec failure happened in, if this is one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ProcessError::Failed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// A failure reported by a [`crate::backend::PdfBackend`] or
/// [`crate::backend::TextExtractor`].
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    #[error("failed to decode PDF: {0}")]
    Load(String),

    #[error("page {index} out of range (document has {total} pages)")]
    PageOutOfRange { index: usize, total: usize },

    #[error("{0}")]
    Codec(String),

    #[error("text extraction failed: {0}")]
    Extraction(String),
}

impl BackendError {
    /// Wrap a codec failure with the stage it happened in.
    pub fn in_stage(self, stage: Stage) -> ProcessError {
        ProcessError::Failed {
            stage,
            message: self.to_string(),
        }
    }
}

/// A per-page problem that was recovered from without aborting the run.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageIssue {
    /// Text extraction failed; the page was given a fallback sort key.
    #[error("Page {page}: text extraction failed: {detail}")]
    ExtractionFailed { page: usize, detail: String },

    /// The margin left no visible area; the page kept its crop box.
    #[error("Page {page}: margin crop skipped (would leave {width}x{height})")]
    CropSkipped { page: usize, width: f32, height: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_display_names_stage_and_message() {
        let e = BackendError::Codec("object stream truncated".into()).in_stage(Stage::Sort);
        let msg = e.to_string();
        assert!(msg.starts_with("PDF processing failed during sort"), "got: {msg}");
        assert!(msg.contains("object stream truncated"));
        assert_eq!(e.stage(), Some(Stage::Sort));
    }

    #[test]
    fn input_errors_have_no_stage() {
        assert_eq!(ProcessError::NoInput.stage(), None);
    }

    #[test]
    fn corrupt_display() {
        let e = ProcessError::CorruptPdf {
            input: 2,
            source_name: "labels.pdf".into(),
            detail: "bad xref".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("Input 2"));
        assert!(msg.contains("labels.pdf"));
        assert!(msg.contains("bad xref"));
    }

    #[test]
    fn page_issue_display() {
        let issue = PageIssue::CropSkipped {
            page: 3,
            width: -20.0,
            height: 100.0,
        };
        assert!(issue.to_string().contains("Page 3"));
    }
}

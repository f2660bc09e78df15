//! # labelcrop
//!
//! Merge, crop, SKU-sort and stamp e-commerce shipping-label PDFs.
//!
//! Sellers download label sheets from several marketplaces, each with its own
//! layout. This crate takes one or more of those PDFs plus a flat settings
//! record and produces a single print-ready PDF: labels cropped to the
//! platform's label area, optionally ordered by the SKU printed on each label
//! so picking follows the pile, and optionally stamped with the print time
//! and a custom note.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDFs
//!  │
//!  ├─ 1. Load    first input, or merge all inputs in order
//!  ├─ 2. Crop    fixed platform box (Flipkart) or symmetric margin
//!  ├─ 3. Sort    extract page text, derive SKU keys, stable-sort pages
//!  ├─ 4. Stamp   timestamp bottom-right
//!  ├─ 5. Stamp   custom text top-centre
//!  └─ 6. Save    serialised output bytes
//! ```
//!
//! Each stage after loading is toggled by [`Settings`]. Any codec failure
//! aborts the whole run; per-page text-extraction failures and margins too
//! large for a page are absorbed and listed in the [`ProcessReport`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use labelcrop::{process, PdfInput, Platform, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::builder()
//!         .merge_pdf(true)
//!         .platform(Platform::Flipkart)
//!         .sort_sku(true)
//!         .add_date_time(true)
//!         .build();
//!     let pdf = process(
//!         vec![PdfInput::path("flipkart-1.pdf"), PdfInput::path("flipkart-2.pdf")],
//!         &settings,
//!     )
//!     .await?;
//!     std::fs::write("labels.pdf", pdf)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Backends
//!
//! The default entry points use [`backend::pdfium::PdfiumBackend`], which
//! needs a pdfium shared library at runtime (see `PDFIUM_LIB_PATH`).
//! [`process_with`] runs the same pipeline over any [`PdfBackend`], e.g. the
//! pure-Rust [`backend::memory::MemoryBackend`] used by the tests.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `labelcrop` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod backend;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod presets;
pub mod process;
pub mod progress;
pub mod settings;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use backend::{CropBox, PdfBackend, TextExtractor};
pub use error::{BackendError, PageIssue, ProcessError, Stage};
pub use output::{ProcessOutput, ProcessReport, StageTiming};
pub use pipeline::crop::CropPlan;
pub use pipeline::input::{LoadedInput, PdfInput};
pub use pipeline::sku::{extract_sku, PageSortKey};
pub use presets::{preset_for, CropPreset, Platform};
pub use process::{
    process, process_detailed, process_on, process_sync, process_to_file, process_with,
    ProcessOptions,
};
pub use progress::{NoopProgressCallback, ProcessProgressCallback, ProgressCallback};
pub use settings::{MarginSetting, Settings, SettingsBuilder};

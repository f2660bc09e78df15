//! Pipeline stages for label processing.
//!
//! Each submodule implements exactly one transformation step over a document
//! handle owned by [`crate::process`]. Stages that have to reorder or
//! re-crop pages hand back a *new* document built by copying pages, which is
//! the only way the codec can express reordering.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ merge ──▶ crop ──▶ sort ──▶ annotate ──▶ save
//! (bytes)  (load)   (box)    (SKU)    (stamps)
//! ```
//!
//! 1. [`input`]    — read paths/buffers once and check the `%PDF` magic
//! 2. [`merge`]    — decode the first input, or merge all of them in order
//! 3. [`crop`]     — fixed platform box or symmetric margin
//! 4. [`sort`]     — extract text, derive [`sku`] keys, stable-sort pages
//! 5. [`annotate`] — timestamp and custom-text stamps

pub mod annotate;
pub mod crop;
pub mod input;
pub mod merge;
pub mod sku;
pub mod sort;

//! Result types returned by the `process*` entry points.

use crate::error::{PageIssue, Stage};
use crate::pipeline::crop::CropPlan;
use crate::pipeline::sku::PageSortKey;
use serde::Serialize;

/// The output PDF plus a report of what the run did.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutput {
    /// Final serialised PDF.
    #[serde(skip)]
    pub pdf: Vec<u8>,
    pub report: ProcessReport,
}

impl ProcessOutput {
    pub fn into_bytes(self) -> Vec<u8> {
        self.pdf
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProcessReport {
    /// Page count of each input that was decoded, in input order.
    pub input_pages: Vec<usize>,
    pub output_pages: usize,
    /// Whether several inputs were merged.
    pub merged: bool,
    pub crop: Option<CropPlan>,
    /// Sort keys in output page order; empty when sorting was off.
    pub sort_keys: Vec<PageSortKey>,
    /// The timestamp text that was stamped, if any.
    pub timestamp: Option<String>,
    /// The custom text that was stamped, if any.
    pub custom_text: Option<String>,
    /// Page problems that were recovered from.
    pub issues: Vec<PageIssue>,
    pub stages: Vec<StageTiming>,
    pub total_duration_ms: u64,
}

impl ProcessReport {
    /// Pages for which a real SKU was extracted.
    pub fn sku_pages(&self) -> usize {
        self.sort_keys.iter().filter(|k| !k.fallback).count()
    }

    pub fn ran(&self, stage: Stage) -> bool {
        self.stages.iter().any(|t| t.stage == stage)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub duration_ms: u64,
    /// Page count after the stage.
    pub pages: usize,
}

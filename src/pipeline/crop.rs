//! Crop: narrow every page's visible rectangle.
//!
//! Two mutually exclusive modes, decided once per run by [`CropPlan::resolve`]:
//!
//! * **Fixed box** (Flipkart): pages are copied into a new document and each
//!   copy gets the same rectangle. Page size is not consulted, so a page
//!   smaller than the rectangle ends up with an out-of-bounds crop box.
//! * **Margin**: each page's current crop box is inset by `m` points on every
//!   side. A fresh page therefore gets `(m, m, w - 2m, h - 2m)`; cropping an
//!   already-cropped page narrows it further. If the inset leaves no area the
//!   page keeps its crop box and a [`PageIssue::CropSkipped`] is recorded.
//!
//! Cropping never adds or removes pages.

use crate::backend::{CropBox, PdfBackend};
use crate::error::{PageIssue, ProcessError, Stage};
use crate::presets::CropPreset;
use crate::settings::{MarginRequest, Settings};
use serde::Serialize;
use tracing::{debug, info, warn};

/// The crop a run will perform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CropPlan {
    Skip,
    FixedBox(CropBox),
    Margin(i32),
}

impl CropPlan {
    /// The Flipkart preset always wins; otherwise the margin setting decides,
    /// falling back to the preset margin only when it isn't a number.
    pub fn resolve(settings: &Settings) -> Self {
        match settings.preset() {
            CropPreset::FixedBox(rect) => CropPlan::FixedBox(rect),
            CropPreset::Margin(preset_margin) => {
                match settings.margin.as_ref().map(|m| m.request()) {
                    None | Some(MarginRequest::Disabled) => CropPlan::Skip,
                    Some(MarginRequest::Points(m)) => CropPlan::Margin(m),
                    Some(MarginRequest::PresetDefault) => CropPlan::Margin(preset_margin),
                }
            }
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, CropPlan::Skip)
    }
}

/// Inset `current` by `margin` on every side; `None` if nothing would remain.
pub fn margin_box(current: CropBox, margin: i32) -> Option<CropBox> {
    let m = margin as f32;
    let rect = CropBox::new(
        current.x + m,
        current.y + m,
        current.width - 2.0 * m,
        current.height - 2.0 * m,
    );
    (rect.width > 0.0 && rect.height > 0.0).then_some(rect)
}

/// Apply `plan` and return the resulting document, which is a new one for
/// the fixed-box mode and the same one otherwise.
pub fn apply<'a, B: PdfBackend>(
    backend: &'a B,
    doc: B::Document<'a>,
    plan: CropPlan,
    issues: &mut Vec<PageIssue>,
) -> Result<B::Document<'a>, ProcessError> {
    match plan {
        CropPlan::Skip => Ok(doc),
        CropPlan::FixedBox(rect) => apply_fixed_box(backend, &doc, rect),
        CropPlan::Margin(margin) => {
            let mut doc = doc;
            apply_margin(backend, &mut doc, margin, issues)?;
            Ok(doc)
        }
    }
}

fn apply_fixed_box<'a, B: PdfBackend>(
    backend: &'a B,
    source: &B::Document<'a>,
    rect: CropBox,
) -> Result<B::Document<'a>, ProcessError> {
    let count = backend.page_count(source);
    let mut out = backend.create().map_err(|e| e.in_stage(Stage::Crop))?;
    let indices: Vec<usize> = (0..count).collect();
    backend
        .copy_pages_into(source, &indices, &mut out)
        .map_err(|e| e.in_stage(Stage::Crop))?;

    for idx in 0..count {
        backend
            .set_crop_box(&mut out, idx, rect)
            .map_err(|e| e.in_stage(Stage::Crop))?;
    }
    info!(
        "Applied fixed crop box ({}, {}, {}x{}) to {} pages",
        rect.x, rect.y, rect.width, rect.height, count
    );
    Ok(out)
}

/// Margin-crop every page of `doc` in place.
pub fn apply_margin<B: PdfBackend>(
    backend: &B,
    doc: &mut B::Document<'_>,
    margin: i32,
    issues: &mut Vec<PageIssue>,
) -> Result<(), ProcessError> {
    let count = backend.page_count(doc);
    let mut cropped = 0;

    for idx in 0..count {
        let current = backend
            .crop_box(doc, idx)
            .map_err(|e| e.in_stage(Stage::Crop))?;
        match margin_box(current, margin) {
            Some(rect) => {
                backend
                    .set_crop_box(doc, idx, rect)
                    .map_err(|e| e.in_stage(Stage::Crop))?;
                debug!("Page {}: crop box → {:?}", idx + 1, rect);
                cropped += 1;
            }
            None => {
                let issue = PageIssue::CropSkipped {
                    page: idx + 1,
                    width: current.width - 2.0 * margin as f32,
                    height: current.height - 2.0 * margin as f32,
                };
                warn!("{}", issue);
                issues.push(issue);
            }
        }
    }

    info!("Applied margin {} to {}/{} pages", margin, cropped, count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{MemoryBackend, MemoryDocument, MemoryPage};
    use crate::presets::{Platform, FLIPKART_CROP_BOX};

    fn plan(platform: &str, margin: Option<&str>) -> CropPlan {
        let mut b = Settings::builder().platform_key(platform);
        if let Some(m) = margin {
            b = b.margin(m);
        }
        CropPlan::resolve(&b.build())
    }

    #[test]
    fn flipkart_ignores_margin() {
        assert_eq!(plan("flipkart", None), CropPlan::FixedBox(FLIPKART_CROP_BOX));
        assert_eq!(plan("flipkart", Some("40")), CropPlan::FixedBox(FLIPKART_CROP_BOX));
        assert_eq!(plan("flipkart", Some("0")), CropPlan::FixedBox(FLIPKART_CROP_BOX));
    }

    #[test]
    fn falsy_margin_skips() {
        assert_eq!(plan("meesho", None), CropPlan::Skip);
        assert_eq!(plan("meesho", Some("")), CropPlan::Skip);
        assert_eq!(plan("amazon", Some("0")), CropPlan::Skip);
    }

    #[test]
    fn explicit_margin_wins_over_preset() {
        assert_eq!(plan("amazon", Some("12")), CropPlan::Margin(12));
    }

    #[test]
    fn unparsable_margin_uses_preset() {
        assert_eq!(plan("citymall", Some("auto")), CropPlan::Margin(25));
        assert_eq!(
            plan("unknown-platform", Some("auto")),
            CropPlan::Margin(Platform::Custom.preset().margin().unwrap())
        );
    }

    #[test]
    fn margin_box_formula() {
        let rect = margin_box(CropBox::page(595.0, 842.0), 20).unwrap();
        assert_eq!(rect, CropBox::new(20.0, 20.0, 555.0, 802.0));
    }

    #[test]
    fn margin_box_rejects_non_positive() {
        assert_eq!(margin_box(CropBox::page(100.0, 842.0), 50), None);
        assert_eq!(margin_box(CropBox::page(100.0, 842.0), 60), None);
        assert!(margin_box(CropBox::page(101.0, 842.0), 50).is_some());
    }

    #[test]
    fn zero_margin_is_identity() {
        let page = CropBox::new(5.0, 5.0, 90.0, 90.0);
        assert_eq!(margin_box(page, 0), Some(page));
    }

    #[test]
    fn margin_compounds_when_reapplied() {
        let mut doc = MemoryDocument::new(vec![MemoryPage::a4("x")]);
        let mut issues = Vec::new();
        apply_margin(&MemoryBackend, &mut doc, 10, &mut issues).unwrap();
        apply_margin(&MemoryBackend, &mut doc, 10, &mut issues).unwrap();
        assert_eq!(doc.pages[0].crop_box, Some(CropBox::new(20.0, 20.0, 555.0, 802.0)));
        assert!(issues.is_empty());
    }

    #[test]
    fn oversized_margin_keeps_original_box() {
        let mut doc = MemoryDocument::new(vec![
            MemoryPage::new(80.0, 80.0),
            MemoryPage::a4("big"),
        ]);
        let mut issues = Vec::new();
        apply_margin(&MemoryBackend, &mut doc, 40, &mut issues).unwrap();
        assert_eq!(doc.pages[0].crop_box, None);
        assert_eq!(doc.pages[1].crop_box, Some(CropBox::new(40.0, 40.0, 515.0, 762.0)));
        assert_eq!(issues.len(), 1);
        assert!(matches!(issues[0], PageIssue::CropSkipped { page: 1, .. }));
    }

    #[test]
    fn fixed_box_rebuilds_and_ignores_page_size() {
        let doc = MemoryDocument::new(vec![MemoryPage::new(100.0, 100.0), MemoryPage::a4("a")]);
        let mut issues = Vec::new();
        let out = apply(
            &MemoryBackend,
            doc,
            CropPlan::FixedBox(FLIPKART_CROP_BOX),
            &mut issues,
        )
        .unwrap();
        assert_eq!(out.pages.len(), 2);
        for page in &out.pages {
            assert_eq!(page.crop_box, Some(FLIPKART_CROP_BOX));
        }
        assert!(issues.is_empty());
    }
}

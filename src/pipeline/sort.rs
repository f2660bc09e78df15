//! Sort by SKU: reorder pages by the SKU printed on them.
//!
//! The current document is serialised once and every page's text is pulled
//! back out through a single [`TextExtractor::extract_pages_text`] call. A
//! page whose extraction fails is not fatal: it is logged, recorded as a
//! [`PageIssue::ExtractionFailed`] and treated as having no SKU. Pages are
//! then stable-sorted by [`PageSortKey::ordering`] and copied into a new
//! document in that order.

use super::sku::{extract_sku, PageSortKey};
use crate::backend::{PdfBackend, TextExtractor};
use crate::error::{BackendError, PageIssue, ProcessError, Stage};
use tracing::{debug, info, warn};

/// Derive one sort key per page of the serialised document `pdf`.
pub fn page_sort_keys<X: TextExtractor + ?Sized>(
    extractor: &X,
    pdf: &[u8],
    page_count: usize,
    issues: &mut Vec<PageIssue>,
) -> Vec<PageSortKey> {
    let mut texts = extractor.extract_pages_text(pdf, page_count).into_iter();
    (0..page_count)
        .map(|idx| {
            let text = texts.next().unwrap_or_else(|| {
                Err(BackendError::Extraction("no text returned for page".into()))
            });
            let sku = match text {
                Ok(text) => extract_sku(&text),
                Err(e) => {
                    let issue = PageIssue::ExtractionFailed {
                        page: idx + 1,
                        detail: e.to_string(),
                    };
                    warn!("{}", issue);
                    issues.push(issue);
                    None
                }
            };
            let key = PageSortKey::from_extracted(idx, sku);
            debug!("Page {}: sort key {:?}", idx + 1, key.key);
            key
        })
        .collect()
}

/// Stable order of page indices for `keys`.
pub fn sorted_order(keys: &[PageSortKey]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..keys.len()).collect();
    order.sort_by_cached_key(|&i| keys[i].ordering());
    order
}

/// The sorted document and the keys in their new page order.
pub struct Sorted<D> {
    pub document: D,
    pub keys: Vec<PageSortKey>,
}

pub fn apply<'a, B, X>(
    backend: &'a B,
    extractor: &X,
    doc: B::Document<'a>,
    issues: &mut Vec<PageIssue>,
) -> Result<Sorted<B::Document<'a>>, ProcessError>
where
    B: PdfBackend,
    X: TextExtractor + ?Sized,
{
    let count = backend.page_count(&doc);
    let pdf = backend.save(&doc).map_err(|e| e.in_stage(Stage::Sort))?;
    let keys = page_sort_keys(extractor, &pdf, count, issues);
    drop(pdf);

    let order = sorted_order(&keys);
    let mut sorted = backend.create().map_err(|e| e.in_stage(Stage::Sort))?;
    backend
        .copy_pages_into(&doc, &order, &mut sorted)
        .map_err(|e| e.in_stage(Stage::Sort))?;

    let found = keys.iter().filter(|k| !k.fallback).count();
    info!("Sorted {} pages by SKU ({} with SKU, {} without)", count, found, count - found);

    let mut keys: Vec<Option<PageSortKey>> = keys.into_iter().map(Some).collect();
    let keys = order.iter().filter_map(|&i| keys[i].take()).collect();

    Ok(Sorted {
        document: sorted,
        keys,
    })
}

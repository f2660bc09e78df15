//! Pure-Rust backend over a plain list of pages.
//!
//! A [`MemoryDocument`] serialises to `%PDF-memory` followed by JSON, so it
//! passes the same `%PDF` magic check as real input and round-trips through
//! the load/save primitives exactly like a real codec would. Text width is
//! approximated as half the font size per character, which is enough to
//! verify alignment arithmetic.

use super::{CropBox, PdfBackend, StandardFont, TextExtractor, TextPlacement};
use crate::error::BackendError;
use serde::{Deserialize, Serialize};

const MAGIC: &[u8] = b"%PDF-memory\n";

/// One page: geometry, extractable text and everything stamped onto it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryPage {
    pub width: f32,
    pub height: f32,
    pub crop_box: Option<CropBox>,
    pub text: String,
    /// Make text extraction fail for this page.
    #[serde(default)]
    pub unreadable: bool,
    #[serde(default)]
    pub stamps: Vec<TextPlacement>,
}

impl MemoryPage {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            crop_box: None,
            text: String::new(),
            unreadable: false,
            stamps: Vec::new(),
        }
    }

    /// An A4 page carrying `text`.
    pub fn a4(text: impl Into<String>) -> Self {
        Self::new(595.0, 842.0).with_text(text)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn unreadable(mut self) -> Self {
        self.unreadable = true;
        self
    }

    pub fn visible_box(&self) -> CropBox {
        self.crop_box
            .unwrap_or_else(|| CropBox::page(self.width, self.height))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryDocument {
    pub pages: Vec<MemoryPage>,
}

impl MemoryDocument {
    pub fn new(pages: Vec<MemoryPage>) -> Self {
        Self { pages }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = MAGIC.to_vec();
        // A plain struct of numbers and strings always serialises.
        out.extend(serde_json::to_vec(self).unwrap_or_default());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BackendError> {
        let body = bytes
            .strip_prefix(MAGIC)
            .ok_or_else(|| BackendError::Load("missing %PDF-memory header".into()))?;
        serde_json::from_slice(body).map_err(|e| BackendError::Load(e.to_string()))
    }

    fn page(&self, index: usize) -> Result<&MemoryPage, BackendError> {
        self.pages.get(index).ok_or(BackendError::PageOutOfRange {
            index,
            total: self.pages.len(),
        })
    }

    fn page_mut(&mut self, index: usize) -> Result<&mut MemoryPage, BackendError> {
        let total = self.pages.len();
        self.pages
            .get_mut(index)
            .ok_or(BackendError::PageOutOfRange { index, total })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryBackend;

impl MemoryBackend {
    /// Average glyph advance as a fraction of the font size.
    pub const GLYPH_WIDTH: f32 = 0.5;
}

impl PdfBackend for MemoryBackend {
    type Document<'a> = MemoryDocument where Self: 'a;

    fn load(&self, bytes: Vec<u8>) -> Result<MemoryDocument, BackendError> {
        MemoryDocument::from_bytes(&bytes)
    }

    fn create(&self) -> Result<MemoryDocument, BackendError> {
        Ok(MemoryDocument::default())
    }

    fn page_count(&self, doc: &MemoryDocument) -> usize {
        doc.pages.len()
    }

    fn crop_box(&self, doc: &MemoryDocument, index: usize) -> Result<CropBox, BackendError> {
        Ok(doc.page(index)?.visible_box())
    }

    fn set_crop_box(
        &self,
        doc: &mut MemoryDocument,
        index: usize,
        rect: CropBox,
    ) -> Result<(), BackendError> {
        doc.page_mut(index)?.crop_box = Some(rect);
        Ok(())
    }

    fn copy_pages_into(
        &self,
        source: &MemoryDocument,
        indices: &[usize],
        target: &mut MemoryDocument,
    ) -> Result<(), BackendError> {
        for &idx in indices {
            let page = source.page(idx)?.clone();
            target.pages.push(page);
        }
        Ok(())
    }

    fn measure_text(
        &self,
        _doc: &mut MemoryDocument,
        text: &str,
        _font: StandardFont,
        size: f32,
    ) -> Result<f32, BackendError> {
        Ok(text.chars().count() as f32 * size * Self::GLYPH_WIDTH)
    }

    fn draw_text(
        &self,
        doc: &mut MemoryDocument,
        index: usize,
        placement: &TextPlacement,
    ) -> Result<(), BackendError> {
        doc.page_mut(index)?.stamps.push(placement.clone());
        Ok(())
    }

    fn save(&self, doc: &MemoryDocument) -> Result<Vec<u8>, BackendError> {
        Ok(doc.to_bytes())
    }
}

impl TextExtractor for MemoryBackend {
    fn extract_page_text(&self, pdf: &[u8], page_number: usize) -> Result<String, BackendError> {
        let doc = MemoryDocument::from_bytes(pdf)?;
        let page = page_number
            .checked_sub(1)
            .and_then(|idx| doc.pages.get(idx))
            .ok_or(BackendError::PageOutOfRange {
                index: page_number,
                total: doc.pages.len(),
            })?;
        if page.unreadable {
            return Err(BackendError::Extraction(format!(
                "page {page_number} has no readable text layer"
            )));
        }
        Ok(page.text.clone())
    }

    fn extract_pages_text(
        &self,
        pdf: &[u8],
        page_count: usize,
    ) -> Vec<Result<String, BackendError>> {
        let doc = match MemoryDocument::from_bytes(pdf) {
            Ok(doc) => doc,
            Err(e) => return vec![Err(e); page_count],
        };
        (0..page_count)
            .map(|idx| match doc.pages.get(idx) {
                Some(page) if page.unreadable => Err(BackendError::Extraction(format!(
                    "page {} has no readable text layer",
                    idx + 1
                ))),
                Some(page) => Ok(page.text.clone()),
                None => Err(BackendError::PageOutOfRange {
                    index: idx + 1,
                    total: doc.pages.len(),
                }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_start_with_pdf_magic() {
        let doc = MemoryDocument::new(vec![MemoryPage::a4("x")]);
        assert!(doc.to_bytes().starts_with(b"%PDF"));
        assert_eq!(MemoryDocument::from_bytes(&doc.to_bytes()).unwrap(), doc);
    }

    #[test]
    fn rejects_foreign_bytes() {
        assert!(matches!(
            MemoryBackend.load(b"%PDF-1.7\n".to_vec()),
            Err(BackendError::Load(_))
        ));
    }

    #[test]
    fn copy_preserves_requested_order() {
        let source = MemoryDocument::new(vec![
            MemoryPage::a4("a"),
            MemoryPage::a4("b"),
            MemoryPage::a4("c"),
        ]);
        let mut target = MemoryBackend.create().unwrap();
        MemoryBackend
            .copy_pages_into(&source, &[2, 0], &mut target)
            .unwrap();
        let texts: Vec<_> = target.pages.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(texts, ["c", "a"]);
    }

    #[test]
    fn copy_out_of_range_fails() {
        let source = MemoryDocument::new(vec![MemoryPage::a4("a")]);
        let mut target = MemoryDocument::default();
        let err = MemoryBackend
            .copy_pages_into(&source, &[1], &mut target)
            .unwrap_err();
        assert!(matches!(err, BackendError::PageOutOfRange { index: 1, total: 1 }));
    }

    #[test]
    fn extraction_is_one_based() {
        let doc = MemoryDocument::new(vec![MemoryPage::a4("first"), MemoryPage::a4("second")]);
        let bytes = doc.to_bytes();
        assert_eq!(MemoryBackend.extract_page_text(&bytes, 2).unwrap(), "second");
        assert!(MemoryBackend.extract_page_text(&bytes, 0).is_err());
    }

    #[test]
    fn batch_extraction_matches_single_pages() {
        let doc = MemoryDocument::new(vec![
            MemoryPage::a4("first"),
            MemoryPage::a4("second").unreadable(),
        ]);
        let bytes = doc.to_bytes();
        let batch = MemoryBackend.extract_pages_text(&bytes, 2);
        assert_eq!(batch[0].as_deref().ok(), Some("first"));
        assert!(matches!(batch[1], Err(BackendError::Extraction(_))));
        assert!(MemoryBackend.extract_page_text(&bytes, 2).is_err());
    }

    #[test]
    fn batch_extraction_of_foreign_bytes_fails_every_page() {
        let batch = MemoryBackend.extract_pages_text(b"%PDF-1.7\n", 3);
        assert_eq!(batch.len(), 3);
        assert!(batch.iter().all(|r| matches!(r, Err(BackendError::Load(_)))));
    }
}

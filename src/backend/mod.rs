//! PDF codec and text-extraction collaborators.
//!
//! The pipeline never touches a PDF library directly. Every stage goes
//! through [`PdfBackend`], which exposes only the primitives the stages need:
//! load, create, copy pages into another document, read/set the crop box,
//! measure/draw text, and serialise. Page text comes from a separate
//! [`TextExtractor`] that works on serialised bytes, matching how the sort
//! stage re-reads the document it has just produced.
//!
//! Two implementations ship with the crate:
//!
//! * [`pdfium::PdfiumBackend`] — pdfium-render over the native pdfium library.
//! * [`memory::MemoryBackend`] — a pure-Rust page list used by the test suite
//!   and for dry runs where no pdfium library is available.

pub mod memory;
pub mod pdfium;

use crate::error::BackendError;
use serde::{Deserialize, Serialize};

/// A page rectangle in points, origin bottom-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The full-page box for a page of the given size.
    pub fn page(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn top(&self) -> f32 {
        self.y + self.height
    }
}

/// The standard-14 fonts the annotator uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

/// An opaque RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl PageColor {
    pub const BLACK: PageColor = PageColor { r: 0, g: 0, b: 0 };
    pub const GRAY: PageColor = PageColor {
        r: 128,
        g: 128,
        b: 128,
    };
}

/// A single line of text to draw, with its baseline origin already computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPlacement {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font: StandardFont,
    pub size: f32,
    pub color: PageColor,
}

/// In-memory PDF manipulation primitives.
///
/// `Document<'a>` may borrow from the backend (pdfium documents borrow the
/// library bindings), hence the generic associated type. Page indices are
/// zero-based throughout.
pub trait PdfBackend {
    type Document<'a>
    where
        Self: 'a;

    /// Decode a PDF from bytes. Takes ownership so the document may keep them.
    fn load(&self, bytes: Vec<u8>) -> Result<Self::Document<'_>, BackendError>;

    /// Create an empty document.
    fn create(&self) -> Result<Self::Document<'_>, BackendError>;

    fn page_count(&self, doc: &Self::Document<'_>) -> usize;

    /// The page's current visible rectangle (the media box if no crop box is set).
    fn crop_box(&self, doc: &Self::Document<'_>, index: usize) -> Result<CropBox, BackendError>;

    fn set_crop_box(
        &self,
        doc: &mut Self::Document<'_>,
        index: usize,
        rect: CropBox,
    ) -> Result<(), BackendError>;

    /// Append copies of `indices` (in the given order) from `source` to the
    /// end of `target`. The copies must not depend on `source` afterwards.
    fn copy_pages_into(
        &self,
        source: &Self::Document<'_>,
        indices: &[usize],
        target: &mut Self::Document<'_>,
    ) -> Result<(), BackendError>;

    /// Rendered width of `text` in the given font and size, in points.
    fn measure_text(
        &self,
        doc: &mut Self::Document<'_>,
        text: &str,
        font: StandardFont,
        size: f32,
    ) -> Result<f32, BackendError>;

    fn draw_text(
        &self,
        doc: &mut Self::Document<'_>,
        index: usize,
        placement: &TextPlacement,
    ) -> Result<(), BackendError>;

    fn save(&self, doc: &Self::Document<'_>) -> Result<Vec<u8>, BackendError>;
}

/// Best-effort page text extraction over serialised PDF bytes.
pub trait TextExtractor {
    /// Concatenated text of page `page_number` (one-based). May be empty.
    fn extract_page_text(&self, pdf: &[u8], page_number: usize) -> Result<String, BackendError>;

    /// Text of pages `1..=page_count`, one result per page, in page order.
    ///
    /// The default extracts page by page. Implementations that have to parse
    /// the whole document to read any page should override it to parse once.
    fn extract_pages_text(
        &self,
        pdf: &[u8],
        page_count: usize,
    ) -> Vec<Result<String, BackendError>> {
        (1..=page_count)
            .map(|n| self.extract_page_text(pdf, n))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crop_box_edges() {
        let b = CropBox::new(10.0, 20.0, 100.0, 50.0);
        assert_eq!(b.right(), 110.0);
        assert_eq!(b.top(), 70.0);
        assert_eq!(CropBox::page(595.0, 842.0), CropBox::new(0.0, 0.0, 595.0, 842.0));
    }

    struct PerPage;

    impl TextExtractor for PerPage {
        fn extract_page_text(&self, _pdf: &[u8], page_number: usize) -> Result<String, BackendError> {
            match page_number {
                2 => Err(BackendError::Extraction("blank".into())),
                n => Ok(format!("page {n}")),
            }
        }
    }

    #[test]
    fn default_batch_extraction_goes_page_by_page() {
        let texts = PerPage.extract_pages_text(b"", 3);
        assert_eq!(texts.len(), 3);
        assert_eq!(texts[0].as_deref().ok(), Some("page 1"));
        assert!(texts[1].is_err());
        assert_eq!(texts[2].as_deref().ok(), Some("page 3"));
    }
}

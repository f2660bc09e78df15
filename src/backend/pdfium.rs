//! pdfium-render implementation of the codec and text-extraction primitives.
//!
//! ## Why not async?
//!
//! pdfium keeps thread-local state and is not safe to drive from async
//! contexts. The orchestrator obtains a [`PdfiumBackend`] inside
//! `tokio::task::spawn_blocking` and runs every stage on that thread. The
//! library itself is bound once per process and shared by concurrent runs.
//!
//! ## Crop boxes
//!
//! pdfium stores page boxes as `(left, bottom, right, top)`. Pages without an
//! explicit `/CropBox` report their media box instead, which is also what a
//! viewer shows for them.

use super::{CropBox, PageColor, PdfBackend, StandardFont, TextExtractor, TextPlacement};
use crate::error::{BackendError, ProcessError};
use once_cell::sync::OnceCell;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::{debug, info};

/// Environment variable naming a pdfium library file or the directory holding it.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

// `Pdfium::new` initialises and `Drop` destroys pdfium's process-global state,
// so there must be exactly one instance for the life of the process.
static PDFIUM: OnceCell<Pdfium> = OnceCell::new();

/// Handle to the process-wide pdfium bindings.
///
/// Cheap to copy; every run gets its own documents, and the `thread_safe`
/// feature serialises calls into the library.
#[derive(Clone, Copy)]
pub struct PdfiumBackend {
    pdfium: &'static Pdfium,
}

impl PdfiumBackend {
    /// Bind to pdfium on first use: `PDFIUM_LIB_PATH` first, then the working
    /// directory, then the system library search path. Later calls reuse the
    /// same bindings. A failed bind is not cached.
    pub fn bind() -> Result<Self, ProcessError> {
        let pdfium = PDFIUM.get_or_try_init(|| {
            let bindings = bind_library()
                .map_err(|e| ProcessError::PdfiumBindingFailed(format!("{:?}", e)))?;
            info!("Bound pdfium library");
            Ok::<_, ProcessError>(Pdfium::new(bindings))
        })?;
        Ok(Self { pdfium })
    }

    pub fn pdfium(&self) -> &'static Pdfium {
        self.pdfium
    }
}

fn bind_library() -> Result<Box<dyn PdfiumLibraryBindings>, PdfiumError> {
    match std::env::var_os(PDFIUM_LIB_PATH_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            let lib = if path.is_dir() {
                Pdfium::pdfium_platform_library_name_at_path(&path)
            } else {
                path
            };
            debug!("Binding pdfium from {}", lib.display());
            Pdfium::bind_to_library(lib)
        }
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
}

fn codec(e: PdfiumError) -> BackendError {
    BackendError::Codec(format!("{:?}", e))
}

fn page_at<'a>(doc: &PdfDocument<'a>, index: usize) -> Result<PdfPage<'a>, BackendError> {
    let total = doc.pages().len() as usize;
    if index >= total {
        return Err(BackendError::PageOutOfRange { index, total });
    }
    doc.pages().get(index as u16).map_err(codec)
}

fn font_token(doc: &mut PdfDocument<'_>, font: StandardFont) -> PdfFontToken {
    match font {
        StandardFont::Helvetica => doc.fonts_mut().helvetica(),
        StandardFont::HelveticaBold => doc.fonts_mut().helvetica_bold(),
    }
}

fn to_pdf_rect(rect: CropBox) -> PdfRect {
    PdfRect::new_from_values(rect.y, rect.x, rect.top(), rect.right())
}

fn from_pdf_rect(rect: &PdfRect) -> CropBox {
    CropBox::new(
        rect.left().value,
        rect.bottom().value,
        rect.width().value,
        rect.height().value,
    )
}

fn to_pdf_color(color: PageColor) -> PdfColor {
    PdfColor::new(color.r, color.g, color.b, 255)
}

impl PdfBackend for PdfiumBackend {
    type Document<'a> = PdfDocument<'static> where Self: 'a;

    fn load(&self, bytes: Vec<u8>) -> Result<PdfDocument<'static>, BackendError> {
        self.pdfium
            .load_pdf_from_byte_vec(bytes, None)
            .map_err(|e| BackendError::Load(format!("{:?}", e)))
    }

    fn create(&self) -> Result<PdfDocument<'static>, BackendError> {
        self.pdfium.create_new_pdf().map_err(codec)
    }

    fn page_count(&self, doc: &PdfDocument<'static>) -> usize {
        doc.pages().len() as usize
    }

    fn crop_box(&self, doc: &PdfDocument<'static>, index: usize) -> Result<CropBox, BackendError> {
        let page = page_at(doc, index)?;
        let boxes = page.boundaries();
        match boxes.crop().or_else(|_| boxes.media()) {
            Ok(boundary) => Ok(from_pdf_rect(&boundary.bounds)),
            Err(_) => Ok(CropBox::page(page.width().value, page.height().value)),
        }
    }

    fn set_crop_box(
        &self,
        doc: &mut PdfDocument<'static>,
        index: usize,
        rect: CropBox,
    ) -> Result<(), BackendError> {
        let mut page = page_at(doc, index)?;
        page.boundaries_mut().set_crop(to_pdf_rect(rect)).map_err(codec)
    }

    fn copy_pages_into(
        &self,
        source: &PdfDocument<'static>,
        indices: &[usize],
        target: &mut PdfDocument<'static>,
    ) -> Result<(), BackendError> {
        let total = source.pages().len() as usize;
        for &idx in indices {
            if idx >= total {
                return Err(BackendError::PageOutOfRange { index: idx, total });
            }
            let destination = target.pages().len();
            target
                .pages_mut()
                .copy_page_from_document(source, idx as u16, destination)
                .map_err(codec)?;
        }
        Ok(())
    }

    fn measure_text(
        &self,
        doc: &mut PdfDocument<'static>,
        text: &str,
        font: StandardFont,
        size: f32,
    ) -> Result<f32, BackendError> {
        let token = font_token(doc, font);
        let object =
            PdfPageTextObject::new(doc, text, token, PdfPoints::new(size)).map_err(codec)?;
        Ok(object.width().map_err(codec)?.value)
    }

    fn draw_text(
        &self,
        doc: &mut PdfDocument<'static>,
        index: usize,
        placement: &TextPlacement,
    ) -> Result<(), BackendError> {
        let token = font_token(doc, placement.font);
        let mut object = PdfPageTextObject::new(
            doc,
            &placement.text,
            token,
            PdfPoints::new(placement.size),
        )
        .map_err(codec)?;
        object
            .set_fill_color(to_pdf_color(placement.color))
            .map_err(codec)?;
        object
            .translate(PdfPoints::new(placement.x), PdfPoints::new(placement.y))
            .map_err(codec)?;

        let mut page = page_at(doc, index)?;
        page.objects_mut()
            .add_text_object(object)
            .map_err(codec)?;
        Ok(())
    }

    fn save(&self, doc: &PdfDocument<'static>) -> Result<Vec<u8>, BackendError> {
        doc.save_to_bytes().map_err(codec)
    }
}

impl PdfiumBackend {
    fn parse_for_text<'a>(&self, pdf: &'a [u8]) -> Result<PdfDocument<'a>, BackendError> {
        self.pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|e| BackendError::Extraction(format!("{:?}", e)))
    }
}

fn page_text(doc: &PdfDocument<'_>, index: usize) -> Result<String, BackendError> {
    let page = page_at(doc, index)?;
    let text = page
        .text()
        .map_err(|e| BackendError::Extraction(format!("{:?}", e)))?;
    Ok(text.all())
}

impl TextExtractor for PdfiumBackend {
    fn extract_page_text(&self, pdf: &[u8], page_number: usize) -> Result<String, BackendError> {
        let doc = self.parse_for_text(pdf)?;
        let index = page_number.checked_sub(1).ok_or(BackendError::PageOutOfRange {
            index: page_number,
            total: doc.pages().len() as usize,
        })?;
        page_text(&doc, index)
    }

    /// Parses `pdf` once for the whole batch.
    fn extract_pages_text(
        &self,
        pdf: &[u8],
        page_count: usize,
    ) -> Vec<Result<String, BackendError>> {
        match self.parse_for_text(pdf) {
            Ok(doc) => (0..page_count).map(|idx| page_text(&doc, idx)).collect(),
            Err(e) => vec![Err(e); page_count],
        }
    }
}

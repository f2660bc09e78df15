//! Page annotation: timestamp and custom-text stamps.
//!
//! Placement is computed from the measured width of the text in its font, so
//! alignment holds for any string length. Coordinates are taken relative to
//! each page's current crop box so stamps land inside the visible area of a
//! cropped label.
//!
//! | Stamp     | Font           | Size | Colour | Position                         |
//! |-----------|----------------|------|--------|----------------------------------|
//! | timestamp | Helvetica      | 8    | gray   | right edge − 10, bottom + 10     |
//! | custom    | Helvetica-Bold | 12   | black  | horizontally centred, top − 25   |

use crate::backend::{CropBox, PageColor, PdfBackend, StandardFont, TextPlacement};
use crate::error::{ProcessError, Stage};
use chrono::{DateTime, TimeZone};
use tracing::info;

pub const TIMESTAMP_FONT: StandardFont = StandardFont::Helvetica;
pub const TIMESTAMP_SIZE: f32 = 8.0;
pub const TIMESTAMP_MARGIN: f32 = 10.0;

pub const CUSTOM_TEXT_FONT: StandardFont = StandardFont::HelveticaBold;
pub const CUSTOM_TEXT_SIZE: f32 = 12.0;
pub const CUSTOM_TEXT_TOP_OFFSET: f32 = 25.0;

/// Day/month/year with a 12-hour clock, e.g. `19/10/2026, 3:04:05 pm`.
pub const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %-I:%M:%S %P";

pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Baseline origin for right-aligned timestamp text.
pub fn timestamp_origin(page: CropBox, text_width: f32) -> (f32, f32) {
    (
        page.right() - text_width - TIMESTAMP_MARGIN,
        page.y + TIMESTAMP_MARGIN,
    )
}

/// Baseline origin for centred custom text.
pub fn custom_text_origin(page: CropBox, text_width: f32) -> (f32, f32) {
    (
        page.x + (page.width - text_width) / 2.0,
        page.top() - CUSTOM_TEXT_TOP_OFFSET,
    )
}

/// Stamp `timestamp` bottom-right on every page.
///
/// "Bottom-right" is that of the page's current crop box, not its media box:
/// after a Flipkart crop the stamp sits inside the label rectangle rather
/// than at the sheet's edge.
pub fn stamp_timestamp<B: PdfBackend>(
    backend: &B,
    doc: &mut B::Document<'_>,
    timestamp: &str,
) -> Result<(), ProcessError> {
    stamp_every_page(
        backend,
        doc,
        timestamp,
        TIMESTAMP_FONT,
        TIMESTAMP_SIZE,
        PageColor::GRAY,
        timestamp_origin,
        Stage::Timestamp,
    )
}

/// Stamp `text` top-centre on every page. Blank text is a no-op.
///
/// Centred on, and offset down from the top of, the page's current crop box,
/// so a cropped label carries the text inside its visible area.
pub fn stamp_custom_text<B: PdfBackend>(
    backend: &B,
    doc: &mut B::Document<'_>,
    text: &str,
) -> Result<(), ProcessError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(());
    }
    stamp_every_page(
        backend,
        doc,
        text,
        CUSTOM_TEXT_FONT,
        CUSTOM_TEXT_SIZE,
        PageColor::BLACK,
        custom_text_origin,
        Stage::CustomText,
    )
}

#[allow(clippy::too_many_arguments)]
fn stamp_every_page<B: PdfBackend>(
    backend: &B,
    doc: &mut B::Document<'_>,
    text: &str,
    font: StandardFont,
    size: f32,
    color: PageColor,
    origin: fn(CropBox, f32) -> (f32, f32),
    stage: Stage,
) -> Result<(), ProcessError> {
    let width = backend
        .measure_text(doc, text, font, size)
        .map_err(|e| e.in_stage(stage))?;
    let count = backend.page_count(doc);

    for idx in 0..count {
        let page = backend.crop_box(doc, idx).map_err(|e| e.in_stage(stage))?;
        let (x, y) = origin(page, width);
        let placement = TextPlacement {
            text: text.to_string(),
            x,
            y,
            font,
            size,
            color,
        };
        backend
            .draw_text(doc, idx, &placement)
            .map_err(|e| e.in_stage(stage))?;
    }

    info!("Stamped {} on {} pages", stage, count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::{MemoryBackend, MemoryDocument, MemoryPage};
    use chrono::{FixedOffset, TimeZone};

    #[test]
    fn timestamp_format_is_twelve_hour_day_first() {
        let at = FixedOffset::east_opt(5 * 3600 + 1800)
            .unwrap()
            .with_ymd_and_hms(2026, 3, 7, 15, 4, 5)
            .unwrap();
        assert_eq!(format_timestamp(&at), "07/03/2026, 3:04:05 pm");
    }

    #[test]
    fn timestamp_is_right_aligned() {
        let (x, y) = timestamp_origin(CropBox::page(595.0, 842.0), 75.0);
        assert_eq!((x, y), (510.0, 10.0));
    }

    #[test]
    fn custom_text_is_centred_below_top() {
        let (x, y) = custom_text_origin(CropBox::page(600.0, 800.0), 100.0);
        assert_eq!((x, y), (250.0, 775.0));
    }

    #[test]
    fn origins_follow_crop_box() {
        let cropped = CropBox::new(20.0, 20.0, 200.0, 300.0);
        assert_eq!(timestamp_origin(cropped, 50.0), (160.0, 30.0));
        assert_eq!(custom_text_origin(cropped, 50.0), (95.0, 295.0));
    }

    #[test]
    fn custom_text_stamped_on_every_page() {
        let mut doc = MemoryDocument::new(vec![MemoryPage::a4("a"), MemoryPage::a4("b")]);
        stamp_custom_text(&MemoryBackend, &mut doc, "  FRAGILE  ").unwrap();
        for page in &doc.pages {
            assert_eq!(page.stamps.len(), 1);
            let stamp = &page.stamps[0];
            assert_eq!(stamp.text, "FRAGILE");
            assert_eq!(stamp.font, StandardFont::HelveticaBold);
            assert_eq!(stamp.color, PageColor::BLACK);
            // 7 chars * 12pt * 0.5 = 42pt wide
            assert_eq!(stamp.x, (595.0 - 42.0) / 2.0);
            assert_eq!(stamp.y, 842.0 - 25.0);
        }
    }

    #[test]
    fn blank_custom_text_is_noop() {
        let mut doc = MemoryDocument::new(vec![MemoryPage::a4("a")]);
        stamp_custom_text(&MemoryBackend, &mut doc, " \t ").unwrap();
        assert!(doc.pages[0].stamps.is_empty());
    }

    #[test]
    fn timestamp_uses_small_gray_helvetica() {
        let mut doc = MemoryDocument::new(vec![MemoryPage::a4("a")]);
        stamp_timestamp(&MemoryBackend, &mut doc, "07/03/2026, 3:04:05 pm").unwrap();
        let stamp = &doc.pages[0].stamps[0];
        assert_eq!(stamp.font, StandardFont::Helvetica);
        assert_eq!(stamp.size, TIMESTAMP_SIZE);
        assert_eq!(stamp.color, PageColor::GRAY);
        assert_eq!(stamp.y, 10.0);
    }
}

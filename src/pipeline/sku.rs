//! SKU extraction from raw page text.
//!
//! Label text comes out of the extractor as one long run of words, so the SKU
//! is found by shape rather than by position. Three patterns are tried in
//! order and the first non-empty (trimmed) capture wins:
//!
//! 1. `<qty> <sku> | <Marker>` — a quantity, the SKU, then a pipe and a
//!    letter (case-insensitive): `1 sp_megha red chiku | MFTEXO`.
//! 2. `QTY <qty> <sku> |` — the same shape after a literal upper-case `QTY`.
//! 3. `SKU ID … qty <qty> <sku> |` — a `SKU ID` header anywhere earlier,
//!    case-insensitive, with the SKU allowed to wrap onto the next line.
//!
//! The order matters and is part of the observable behaviour: changing it
//! changes which pages sort where.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_QTY_PIPE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\d+\s+(.+?)\s*\|\s*[A-Z]").unwrap());

static RE_QTY_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"QTY\s+\d+\s+(.+?)\s*\|").unwrap());

static RE_SKU_ID_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)SKU ID.*?QTY\s+\d+\s+(.+?)\s*\|").unwrap());

/// Prefix of the sort key given to pages without an extractable SKU.
pub const FALLBACK_PREFIX: &str = "zzz_no_sku_";

/// Best-effort SKU for one page of label text.
pub fn extract_sku(page_text: &str) -> Option<String> {
    [&*RE_QTY_PIPE_MARKER, &*RE_QTY_TOKEN, &*RE_SKU_ID_HEADER]
        .into_iter()
        .find_map(|re| {
            re.captures(page_text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
}

/// The key a page sorts by.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PageSortKey {
    pub key: String,
    /// True when no SKU was found and `key` is the positional fallback.
    pub fallback: bool,
}

impl PageSortKey {
    pub fn sku(sku: impl Into<String>) -> Self {
        Self {
            key: sku.into(),
            fallback: false,
        }
    }

    /// `zzz_no_sku_` plus the zero-based page index, zero-padded.
    pub fn fallback(index: usize) -> Self {
        Self {
            key: format!("{FALLBACK_PREFIX}{index:05}"),
            fallback: true,
        }
    }

    pub fn from_extracted(index: usize, sku: Option<String>) -> Self {
        match sku {
            Some(s) => Self::sku(s),
            None => Self::fallback(index),
        }
    }

    /// Fallback keys after every real SKU, then case-insensitive order.
    pub fn ordering(&self) -> (bool, String) {
        (self.fallback, self.key.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_quantity_with_marker() {
        assert_eq!(
            extract_sku("1 sp_megha red chiku | MFTEXO").as_deref(),
            Some("sp_megha red chiku")
        );
    }

    #[test]
    fn marker_match_is_case_insensitive() {
        assert_eq!(extract_sku("2 tote-bag | free size").as_deref(), Some("tote-bag"));
    }

    #[test]
    fn qty_token_pattern() {
        assert_eq!(
            extract_sku("Product QTY 2 blue-owl-lamp | ABC123").as_deref(),
            Some("blue-owl-lamp")
        );
    }

    #[test]
    fn qty_token_without_marker_letter() {
        // No letter after the pipe, so only the QTY pattern applies.
        assert_eq!(
            extract_sku("QTY 3 brass-bell | 499.00").as_deref(),
            Some("brass-bell")
        );
    }

    #[test]
    fn sku_id_header_allows_wrapped_sku() {
        let text = "SKU ID | Description\nqty 1 cotton kurta\nXL | 899";
        assert_eq!(extract_sku(text).as_deref(), Some("cotton kurta\nXL"));
    }

    #[test]
    fn first_pattern_takes_priority() {
        let text = "4 first-sku | A QTY 1 second-sku | B";
        assert_eq!(extract_sku(text).as_deref(), Some("first-sku"));
    }

    #[test]
    fn candidate_is_trimmed() {
        assert_eq!(extract_sku("1    padded   | X").as_deref(), Some("padded"));
    }

    #[test]
    fn no_match_is_none() {
        assert_eq!(extract_sku(""), None);
        assert_eq!(extract_sku("Invoice total 499"), None);
        assert_eq!(extract_sku("Ship to | Bengaluru"), None);
    }

    #[test]
    fn fallback_key_is_zero_padded() {
        let key = PageSortKey::fallback(7);
        assert_eq!(key.key, "zzz_no_sku_00007");
        assert!(key.fallback);
    }

    #[test]
    fn fallback_orders_after_any_sku() {
        let real = PageSortKey::sku("zzzz-last-alphabetically");
        let missing = PageSortKey::fallback(0);
        assert!(real.ordering() < missing.ordering());
    }

    #[test]
    fn ordering_ignores_case() {
        assert_eq!(PageSortKey::sku("ABC").ordering(), PageSortKey::sku("abc").ordering());
    }
}

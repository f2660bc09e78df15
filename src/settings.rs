//! Per-run settings for the label pipeline.
//!
//! All pipeline behaviour is controlled through [`Settings`], a flat record
//! mirroring the upload form the pipeline is driven from. Build it with
//! [`Settings::builder()`] in code, or deserialise it from the form's JSON
//! with [`Settings::from_json`]. Form posts are loose about types, so the
//! boolean fields also accept `"on"`/`"true"`/`"1"`/`"yes"` strings and the
//! margin accepts either a number or a string.

use crate::error::ProcessError;
use crate::presets::{CropPreset, Platform};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Configuration for one pipeline run.
///
/// # Example
/// ```rust
/// use labelcrop::{Platform, Settings};
///
/// let settings = Settings::builder()
///     .merge_pdf(true)
///     .platform(Platform::Meesho)
///     .margin("20")
///     .sort_sku(true)
///     .build();
/// assert!(settings.merge_pdf);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Merge every input before further processing. Default: false.
    ///
    /// Without it only the first input is processed.
    #[serde(deserialize_with = "loose_bool")]
    pub merge_pdf: bool,

    /// Label platform; selects the crop preset. Unknown keys mean `custom`.
    pub platform: Platform,

    /// Margin override in points. Ignored for Flipkart.
    ///
    /// Missing, empty and zero margins disable margin cropping altogether.
    pub margin: Option<MarginSetting>,

    /// Extract a SKU from every page and reorder pages by it. Default: false.
    #[serde(deserialize_with = "loose_bool")]
    pub sort_sku: bool,

    /// Stamp the current local date/time bottom-right. Default: false.
    #[serde(deserialize_with = "loose_bool")]
    pub add_date_time: bool,

    /// Stamp `custom_text` top-centre. Default: false.
    #[serde(deserialize_with = "loose_bool")]
    pub add_text: bool,

    /// Text for the custom stamp. Blank text disables the stamp.
    pub custom_text: String,
}

impl Settings {
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder {
            settings: Self::default(),
        }
    }

    /// Parse the flat settings record sent by the upload form.
    pub fn from_json(json: &str) -> Result<Self, ProcessError> {
        serde_json::from_str(json).map_err(|e| ProcessError::InvalidSettings(e.to_string()))
    }

    pub fn preset(&self) -> CropPreset {
        self.platform.preset()
    }

    /// The custom stamp text, if the stamp is enabled and the text is not blank.
    pub fn stamp_text(&self) -> Option<&str> {
        if !self.add_text {
            return None;
        }
        let text = self.custom_text.trim();
        (!text.is_empty()).then_some(text)
    }
}

/// Builder for [`Settings`].
#[derive(Debug)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn merge_pdf(mut self, v: bool) -> Self {
        self.settings.merge_pdf = v;
        self
    }

    pub fn platform(mut self, platform: Platform) -> Self {
        self.settings.platform = platform;
        self
    }

    pub fn platform_key(mut self, key: &str) -> Self {
        self.settings.platform = Platform::from_key(key);
        self
    }

    pub fn margin(mut self, margin: impl Into<MarginSetting>) -> Self {
        self.settings.margin = Some(margin.into());
        self
    }

    pub fn sort_sku(mut self, v: bool) -> Self {
        self.settings.sort_sku = v;
        self
    }

    pub fn add_date_time(mut self, v: bool) -> Self {
        self.settings.add_date_time = v;
        self
    }

    pub fn add_text(mut self, v: bool) -> Self {
        self.settings.add_text = v;
        self
    }

    pub fn custom_text(mut self, text: impl Into<String>) -> Self {
        self.settings.custom_text = text.into();
        self
    }

    pub fn build(self) -> Settings {
        self.settings
    }
}

/// The margin as submitted: either a number or free text from a form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarginSetting {
    Number(f64),
    Text(String),
}

/// What a margin setting asks the crop stage to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarginRequest {
    /// No margin crop.
    Disabled,
    /// Inset by this many points.
    Points(i32),
    /// Something was entered but it isn't a number; use the preset margin.
    PresetDefault,
}

impl MarginSetting {
    /// Interpret the setting the way a form field is read: the leading
    /// integer counts, fractions are truncated, blank or zero disables.
    pub fn request(&self) -> MarginRequest {
        match self {
            MarginSetting::Number(n) if !n.is_finite() => MarginRequest::PresetDefault,
            MarginSetting::Number(n) => match n.trunc() as i32 {
                0 => MarginRequest::Disabled,
                m => MarginRequest::Points(m),
            },
            MarginSetting::Text(s) => {
                let s = s.trim();
                if s.is_empty() || s == "0" {
                    return MarginRequest::Disabled;
                }
                match leading_integer(s) {
                    Some(0) => MarginRequest::Disabled,
                    Some(m) => MarginRequest::Points(m),
                    None => MarginRequest::PresetDefault,
                }
            }
        }
    }
}

impl From<i32> for MarginSetting {
    fn from(v: i32) -> Self {
        MarginSetting::Number(v as f64)
    }
}

impl From<f64> for MarginSetting {
    fn from(v: f64) -> Self {
        MarginSetting::Number(v)
    }
}

impl From<&str> for MarginSetting {
    fn from(v: &str) -> Self {
        MarginSetting::Text(v.to_string())
    }
}

impl From<String> for MarginSetting {
    fn from(v: String) -> Self {
        MarginSetting::Text(v)
    }
}

impl fmt::Display for MarginSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarginSetting::Number(n) => write!(f, "{n}"),
            MarginSetting::Text(s) => f.write_str(s),
        }
    }
}

/// Optional sign followed by digits, ignoring whatever follows.
fn leading_integer(s: &str) -> Option<i32> {
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i32>().ok().map(|m| sign * m)
}

fn loose_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Bool(bool),
        Number(i64),
        Text(String),
        Null(()),
    }

    Ok(match Loose::deserialize(deserializer)? {
        Loose::Bool(b) => b,
        Loose::Number(n) => n != 0,
        Loose::Text(s) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "on" | "1" | "yes"
        ),
        Loose::Null(()) => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_disable_everything() {
        let s = Settings::default();
        assert!(!s.merge_pdf && !s.sort_sku && !s.add_date_time && !s.add_text);
        assert_eq!(s.platform, Platform::Custom);
        assert_eq!(s.margin, None);
    }

    #[test]
    fn parses_form_record() {
        let s = Settings::from_json(
            r#"{"mergePdf":"on","platform":"Meesho","margin":"15","sortSku":true,
                "addDateTime":"false","addText":"1","customText":"Batch 7"}"#,
        )
        .unwrap();
        assert!(s.merge_pdf);
        assert_eq!(s.platform, Platform::Meesho);
        assert_eq!(s.margin.as_ref().map(|m| m.request()), Some(MarginRequest::Points(15)));
        assert!(s.sort_sku);
        assert!(!s.add_date_time);
        assert_eq!(s.stamp_text(), Some("Batch 7"));
    }

    #[test]
    fn numeric_margin_and_null_flags() {
        let s = Settings::from_json(r#"{"margin":12.9,"mergePdf":null}"#).unwrap();
        assert!(!s.merge_pdf);
        assert_eq!(s.margin.unwrap().request(), MarginRequest::Points(12));
    }

    #[test]
    fn malformed_json_is_invalid_settings() {
        let err = Settings::from_json("{not json").unwrap_err();
        assert!(matches!(err, ProcessError::InvalidSettings(_)));
    }

    #[test]
    fn margin_requests() {
        assert_eq!(MarginSetting::from("0").request(), MarginRequest::Disabled);
        assert_eq!(MarginSetting::from("  ").request(), MarginRequest::Disabled);
        assert_eq!(MarginSetting::from(0).request(), MarginRequest::Disabled);
        assert_eq!(MarginSetting::from("12.7").request(), MarginRequest::Points(12));
        assert_eq!(MarginSetting::from(" 30px").request(), MarginRequest::Points(30));
        assert_eq!(MarginSetting::from("-5").request(), MarginRequest::Points(-5));
        assert_eq!(MarginSetting::from("wide").request(), MarginRequest::PresetDefault);
    }

    #[test]
    fn blank_custom_text_is_no_stamp() {
        let s = Settings::builder().add_text(true).custom_text("   ").build();
        assert_eq!(s.stamp_text(), None);
        let s = Settings::builder().add_text(false).custom_text("hi").build();
        assert_eq!(s.stamp_text(), None);
    }
}

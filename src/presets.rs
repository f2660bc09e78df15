//! Platform crop presets.
//!
//! Each e-commerce platform prints its shipping labels on a known sheet
//! layout, so the crop is decided by a small fixed table rather than by
//! inspecting pages. Flipkart labels sit at a fixed position on an A4 sheet
//! and get a fixed crop box; every other platform gets a symmetric margin.
//!
//! | Platform   | Preset                              |
//! |------------|-------------------------------------|
//! | `flipkart` | fixed box `x=185 y=465 w=225 h=345` |
//! | `meesho`   | margin 20                           |
//! | `amazon`   | margin 30                           |
//! | `citymall` | margin 25                           |
//! | `custom`   | margin 50 (default for unknown keys)|

use crate::backend::CropBox;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Fixed Flipkart label rectangle, in points, origin bottom-left.
pub const FLIPKART_CROP_BOX: CropBox = CropBox {
    x: 185.0,
    y: 465.0,
    width: 225.0,
    height: 345.0,
};

/// Margin used by the `custom` preset and by any unknown platform key.
pub const DEFAULT_MARGIN: i32 = 50;

/// The shipping platform whose label layout drives the crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Flipkart,
    Meesho,
    Amazon,
    Citymall,
    #[default]
    Custom,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::Flipkart,
        Platform::Meesho,
        Platform::Amazon,
        Platform::Citymall,
        Platform::Custom,
    ];

    /// Resolve a platform key. Unknown keys degrade to [`Platform::Custom`].
    pub fn from_key(key: &str) -> Self {
        match key.trim().to_ascii_lowercase().as_str() {
            "flipkart" => Platform::Flipkart,
            "meesho" => Platform::Meesho,
            "amazon" => Platform::Amazon,
            "citymall" => Platform::Citymall,
            _ => Platform::Custom,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Platform::Flipkart => "flipkart",
            Platform::Meesho => "meesho",
            Platform::Amazon => "amazon",
            Platform::Citymall => "citymall",
            Platform::Custom => "custom",
        }
    }

    pub fn preset(&self) -> CropPreset {
        match self {
            Platform::Flipkart => CropPreset::FixedBox(FLIPKART_CROP_BOX),
            Platform::Meesho => CropPreset::Margin(20),
            Platform::Amazon => CropPreset::Margin(30),
            Platform::Citymall => CropPreset::Margin(25),
            Platform::Custom => CropPreset::Margin(DEFAULT_MARGIN),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// Never fails: the registry has a default entry for anything it doesn't know.
impl<'de> Deserialize<'de> for Platform {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(Platform::from_key(&key))
    }
}

/// How a platform's labels are cropped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropPreset {
    /// Identical rectangle on every page, regardless of page size.
    FixedBox(CropBox),
    /// Symmetric inset in points.
    Margin(i32),
}

impl CropPreset {
    pub fn margin(&self) -> Option<i32> {
        match self {
            CropPreset::Margin(m) => Some(*m),
            CropPreset::FixedBox(_) => None,
        }
    }
}

/// Look up the preset for a platform key; unknown keys get the `custom` preset.
pub fn preset_for(platform: &str) -> CropPreset {
    Platform::from_key(platform).preset()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flipkart_is_fixed_box() {
        assert_eq!(preset_for("flipkart"), CropPreset::FixedBox(FLIPKART_CROP_BOX));
    }

    #[test]
    fn unknown_platform_falls_back_to_custom() {
        assert_eq!(preset_for("unknown-platform"), CropPreset::Margin(50));
        assert_eq!(preset_for(""), Platform::Custom.preset());
    }

    #[test]
    fn keys_are_case_insensitive() {
        assert_eq!(Platform::from_key(" Meesho "), Platform::Meesho);
        assert_eq!(Platform::from_key("AMAZON"), Platform::Amazon);
    }

    #[test]
    fn every_platform_round_trips_its_key() {
        for p in Platform::ALL {
            assert_eq!(Platform::from_key(p.key()), p);
        }
    }

    #[test]
    fn only_flipkart_has_no_margin() {
        for p in Platform::ALL {
            assert_eq!(p.preset().margin().is_none(), p == Platform::Flipkart);
        }
    }

    #[test]
    fn deserialize_unknown_key() {
        let p: Platform = serde_json::from_str("\"shopsy\"").unwrap();
        assert_eq!(p, Platform::Custom);
    }
}

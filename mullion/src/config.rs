//! Config descriptors and their JSON loader.
//!
//! The loader validates up front; the stores consume already-validated
//! structured input and never re-check it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, FontError, ImageStoreError};
use crate::font::{FontId, FontStore};
use crate::images::{ImageStore, SliceMargins};
use crate::raster::FontdueRasterizer;

fn default_atlas_size() -> u32 {
    256
}

fn default_max_atlas_size() -> u32 {
    4096
}

/// One font to register: name, face file, pixel size, coverage mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontSpec {
    pub name: String,
    pub path: PathBuf,
    pub size: f32,
    /// Rasterize 3-channel subpixel masks instead of plain coverage.
    #[serde(default)]
    pub subpixel: bool,
}

/// One nine-slice image to register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSpec {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub margins: SliceMargins,
}

/// Toplevel UI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_atlas_size")]
    pub atlas_size: u32,
    #[serde(default = "default_max_atlas_size")]
    pub max_atlas_size: u32,
    #[serde(default)]
    pub fonts: Vec<FontSpec>,
    #[serde(default)]
    pub images: Vec<ImageSpec>,
}

impl UiConfig {
    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: UiConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.atlas_size.is_power_of_two() {
            return Err(ConfigError::Invalid(format!(
                "atlas_size {} is not a power of two",
                self.atlas_size
            )));
        }
        if !self.max_atlas_size.is_power_of_two() || self.max_atlas_size < self.atlas_size {
            return Err(ConfigError::Invalid(format!(
                "max_atlas_size {} must be a power of two >= atlas_size",
                self.max_atlas_size
            )));
        }
        for font in &self.fonts {
            if font.name.is_empty() {
                return Err(ConfigError::Invalid("font with empty name".into()));
            }
            if !(font.size > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "font {:?} has non-positive size {}",
                    font.name, font.size
                )));
            }
        }
        for image in &self.images {
            if image.name.is_empty() {
                return Err(ConfigError::Invalid("image with empty name".into()));
            }
        }
        Ok(())
    }
}

impl FontStore {
    /// Register every font from `specs`. A face that fails to load is fatal:
    /// no usable font object can come out of it.
    pub fn load_fonts(&mut self, specs: &[FontSpec]) -> Result<HashMap<String, FontId>, FontError> {
        let mut ids = HashMap::new();
        for spec in specs {
            let rasterizer = FontdueRasterizer::from_file(&spec.path, spec.size, spec.subpixel)?;
            let id = self.add_font(Box::new(rasterizer))?;
            ids.insert(spec.name.clone(), id);
        }
        Ok(ids)
    }
}

impl ImageStore {
    /// Register every image from `specs`. An unreadable source at initial
    /// load is fatal, unlike during reloads.
    pub fn load_images(&mut self, specs: &[ImageSpec]) -> Result<(), ImageStoreError> {
        for spec in specs {
            self.add_image(&spec.name, &spec.path, spec.margins)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Parse tests
    // =========================================================================

    #[test]
    fn full_config_parses() {
        let config = UiConfig::from_json(
            r#"{
                "atlas_size": 512,
                "max_atlas_size": 2048,
                "fonts": [
                    {"name": "body", "path": "fonts/body.ttf", "size": 14.0},
                    {"name": "mono", "path": "fonts/mono.ttf", "size": 12.0, "subpixel": true}
                ],
                "images": [
                    {"name": "panel", "path": "ui/panel.png",
                     "margins": {"left": 4, "right": 4, "top": 4, "bottom": 4}},
                    {"name": "icon", "path": "ui/icon.png"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.atlas_size, 512);
        assert_eq!(config.fonts.len(), 2);
        assert!(config.fonts[1].subpixel);
        assert_eq!(config.images[0].margins.left, 4);
        assert_eq!(config.images[1].margins, SliceMargins::default());
    }

    #[test]
    fn defaults_fill_in() {
        let config = UiConfig::from_json("{}").unwrap();
        assert_eq!(config.atlas_size, 256);
        assert_eq!(config.max_atlas_size, 4096);
        assert!(config.fonts.is_empty());
        assert!(config.images.is_empty());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            UiConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    // =========================================================================
    // Validation tests
    // =========================================================================

    #[test]
    fn non_power_of_two_atlas_is_rejected() {
        let err = UiConfig::from_json(r#"{"atlas_size": 100}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn max_smaller_than_initial_is_rejected() {
        let err =
            UiConfig::from_json(r#"{"atlas_size": 512, "max_atlas_size": 256}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn non_positive_font_size_is_rejected() {
        let err = UiConfig::from_json(
            r#"{"fonts": [{"name": "bad", "path": "x.ttf", "size": 0.0}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn empty_names_are_rejected() {
        let err = UiConfig::from_json(
            r#"{"images": [{"name": "", "path": "x.png"}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }
}

//! Table-wide constants, passed explicitly to every stack and the cache.

use std::path::Path;

use anyhow::Context;
use asset::catalog::PAPER_NORMAL;
use renderer::CardDimensions;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub card_width: f32,
    /// width / height
    pub card_aspect_ratio: f32,
    pub card_thickness: f32,
    /// Horizontal UV extent of the face and back artwork.
    pub uv_split: f32,
    /// Cards drawn by a decorative stack.
    pub deck_visual_height: usize,
    /// Vertical spacing of decorative stack layers.
    pub deck_gap: f32,
    pub shuffle_iterations: u32,
    pub max_yaw_deg: f32,
    pub max_offset: f32,
    pub halo_margin: f32,
    pub halo_thickness: f32,
    /// Normal map shared by all card materials.
    pub normal_map: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            card_width: 0.5,
            card_aspect_ratio: 0.627_155_2,
            card_thickness: 0.01,
            uv_split: 0.629,
            deck_visual_height: 70,
            deck_gap: 0.01,
            shuffle_iterations: 2,
            max_yaw_deg: 2.0,
            max_offset: 0.01,
            halo_margin: 0.05,
            halo_thickness: 0.03,
            normal_map: PAPER_NORMAL.to_string(),
        }
    }
}

impl TableConfig {
    pub fn card_height(&self) -> f32 {
        self.card_width / self.card_aspect_ratio
    }

    pub fn dimensions(&self) -> CardDimensions {
        CardDimensions {
            width: self.card_width,
            height: self.card_height(),
            thickness: self.card_thickness,
            uv_split: self.uv_split,
            max_yaw_deg: self.max_yaw_deg,
            max_offset: self.max_offset,
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read table config {}", path.display()))?;
        let config = Self::from_toml_str(&source)
            .with_context(|| format!("Invalid table config {}", path.display()))?;
        log::info!("Loaded table config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("card_width", self.card_width),
            ("card_aspect_ratio", self.card_aspect_ratio),
            ("card_thickness", self.card_thickness),
            ("deck_gap", self.deck_gap),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid { field, value });
            }
        }
        let non_negative = [
            ("max_yaw_deg", self.max_yaw_deg),
            ("max_offset", self.max_offset),
            ("halo_margin", self.halo_margin),
            ("halo_thickness", self.halo_thickness),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid { field, value });
            }
        }
        if !(0.0..=1.0).contains(&self.uv_split) {
            return Err(ConfigError::Invalid {
                field: "uv_split",
                value: self.uv_split,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_card_proportions() {
        let config = TableConfig::default();
        assert!((config.card_height() - 0.797_250_3).abs() < 1e-4);
        assert_eq!(config.dimensions().thickness, 0.01);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = TableConfig::from_toml_str("deck_visual_height = 12\nshuffle_iterations = 5\n")
            .expect("valid config");
        assert_eq!(config.deck_visual_height, 12);
        assert_eq!(config.shuffle_iterations, 5);
        assert_eq!(config.card_width, 0.5);
    }

    #[test]
    fn rejects_non_positive_thickness() {
        let err = TableConfig::from_toml_str("card_thickness = 0.0").expect_err("invalid");
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "card_thickness",
                ..
            }
        ));
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            TableConfig::from_toml_str("card_width = \"wide\""),
            Err(ConfigError::Parse(_))
        ));
    }
}

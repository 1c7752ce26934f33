//! # Unified Configuration System
//!
//! This module consolidates every tunable of the composer into a single,
//! serializable tree. It covers logging, the default card, the layout
//! constants that drive placement, the font source, the label catalog and
//! export naming.
//!
//! ## Design Goals
//!
//! - **Centralized**: All configuration types in one place for easy discovery
//! - **Serializable**: Loadable from TOML or RON through [`Config`]
//! - **Data, not code**: The recognized label ids and their default
//!   positions are a list of [`LabelSpec`] values, not branches

use std::collections::HashSet;

use serde::{Serialize, Deserialize};

use crate::config::{Config, ConfigError};
use crate::render::text::{LabelSpec, PlacementMode};
use crate::scene::CardParameters;

/// Clearance added to the base depth for frame segments (mm)
pub const DEFAULT_FRAME_CLEARANCE: f32 = 0.5;

/// Recess left above an engraved label's front face (mm)
pub const DEFAULT_ENGRAVE_REVEAL: f32 = 0.2;

/// Total padding added to a label's width and height for its picking proxy (mm)
pub const DEFAULT_PROXY_MARGIN: f32 = 2.0;

/// Default typeface location
pub const DEFAULT_FONT_URL: &str =
    "https://cdn.jsdelivr.net/npm/three@0.160.0/examples/fonts/helvetiker_bold.typeface.json";

/// # Layout Constants
///
/// Presentation constants that placement rules depend on. They are kept
/// overridable because emboss/engrave depths and the frame reveal are
/// measured against them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConstants {
    /// Extra depth of frame segments over the base depth
    pub frame_clearance: f32,
    /// Distance between the card face and an engraved label's front face
    pub engrave_reveal: f32,
    /// Padding added to a label's width/height for hit-testing
    pub proxy_margin: f32,
}

impl Default for LayoutConstants {
    fn default() -> Self {
        Self {
            frame_clearance: DEFAULT_FRAME_CLEARANCE,
            engrave_reveal: DEFAULT_ENGRAVE_REVEAL,
            proxy_margin: DEFAULT_PROXY_MARGIN,
        }
    }
}

impl LayoutConstants {
    /// Validate the constants
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("frame_clearance", self.frame_clearance),
            ("engrave_reveal", self.engrave_reveal),
            ("proxy_margin", self.proxy_margin),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be a non-negative number, got {value}"));
            }
        }
        Ok(())
    }
}

/// # Engine Configuration
///
/// Core behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level used when `RUST_LOG` is not set
    pub log_level: String,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
    
    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Font Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Location handed to the glyph outline service's font loader
    pub url: String,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FONT_URL.to_string(),
        }
    }
}

/// # Export Configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// File name without extension
    pub base_name: String,
    /// Format keyword used when none is requested (`stl`, `stl-ascii`, `obj`)
    pub default_format: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            base_name: "cardforge_card".to_string(),
            default_format: "stl".to_string(),
        }
    }
}

/// Default label catalog: recognized label ids and where they sit
pub fn default_label_catalog() -> Vec<LabelSpec> {
    vec![
        LabelSpec::new("fullName", "CardForge")
            .with_size(8.0)
            .with_extrusion(1.0)
            .with_position(0.0, 10.0),
        LabelSpec::new("jobTitle", "")
            .with_size(5.0)
            .with_extrusion(0.8)
            .with_position(0.0, -15.0),
        LabelSpec::new("phone", "")
            .with_size(4.0)
            .with_extrusion(0.8)
            .with_position(0.0, -25.0),
        LabelSpec::new("email", "")
            .with_size(4.0)
            .with_extrusion(0.8)
            .with_position(0.0, -32.0)
            .with_mode(PlacementMode::Emboss),
    ]
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all subsystems.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForgeConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Card created at start-up
    pub card: CardParameters,
    /// Placement constants
    pub layout: LayoutConstants,
    /// Font source
    pub font: FontConfig,
    /// Label catalog, in display order
    pub labels: Vec<LabelSpec>,
    /// Export naming
    pub export: ExportConfig,
}

impl Default for ForgeConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            card: CardParameters::default(),
            layout: LayoutConstants::default(),
            font: FontConfig::default(),
            labels: default_label_catalog(),
            export: ExportConfig::default(),
        }
    }
}

impl ForgeConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.card.validate().map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.layout.validate().map_err(ConfigError::Invalid)?;

        let mut seen = HashSet::new();
        for label in &self.labels {
            if !seen.insert(label.id.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate label id '{}'", label.id)));
            }
            if !(label.size > 0.0) || !(label.extrusion > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "label '{}' needs a positive size and extrusion", label.id
                )));
            }
        }

        if self.export.base_name.is_empty() {
            return Err(ConfigError::Invalid("export base name cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Catalog entry for a label id
    pub fn label(&self, id: &str) -> Option<&LabelSpec> {
        self.labels.iter().find(|label| label.id == id)
    }
}

impl Config for ForgeConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ForgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.card.width, 63.0);
        assert_eq!(config.card.height, 88.0);
        assert_eq!(config.layout.engrave_reveal, 0.2);
        assert_eq!(config.layout.frame_clearance, 0.5);
    }

    #[test]
    fn test_catalog_lookup_by_id() {
        let config = ForgeConfig::default();
        let full_name = config.label("fullName").expect("catalog has fullName");
        assert_eq!(full_name.text, "CardForge");
        assert_eq!(full_name.y, 10.0);
        assert!(config.label("fax").is_none());
    }

    #[test]
    fn test_duplicate_label_ids_rejected() {
        let mut config = ForgeConfig::default();
        config.labels.push(LabelSpec::new("phone", "555"));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_negative_constant_rejected() {
        let mut config = ForgeConfig::default();
        config.layout.engrave_reveal = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip_through_file() {
        let path = std::env::temp_dir().join(format!("cardforge_config_{}.toml", std::process::id()));
        let mut config = ForgeConfig::default();
        config.card.frame_enabled = true;
        config.layout.engrave_reveal = 0.3;
        config.save_to_file(&path).expect("save");

        let loaded = ForgeConfig::load_from_file(&path).expect("load");
        std::fs::remove_file(&path).ok();

        assert!(loaded.card.frame_enabled);
        assert_eq!(loaded.layout.engrave_reveal, 0.3);
        assert_eq!(loaded.labels.len(), config.labels.len());
    }

    #[test]
    fn test_ron_partial_file_uses_defaults() {
        let path = std::env::temp_dir().join(format!("cardforge_config_{}.ron", std::process::id()));
        std::fs::write(&path, "(card: (width: 85.0, height: 55.0, depth: 1.5))").expect("write");

        let loaded = ForgeConfig::load_from_file(&path).expect("load");
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.card.width, 85.0);
        assert!(!loaded.card.frame_enabled);
        assert_eq!(loaded.export.base_name, "cardforge_card");
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let result = ForgeConfig::load_from_file("settings.json");
        assert!(result.is_err());
    }
}

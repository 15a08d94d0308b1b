//! Renderer configuration
//!
//! Stored as RON; every field is optional in the file and falls back to
//! the default below.

use std::fs;
use std::path::Path;

use serde::{Serialize, Deserialize};
use thiserror::Error;

use crate::rasterizer::{BlendState, Color, RasterError, RenderPath, SpecularModel};

/// Error type for config loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("Serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error(transparent)]
    Invalid(#[from] RasterError),
}

/// Everything the renderer is set up with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    pub path: RenderPath,
    /// Blend function for objects flagged transparent
    pub blend: BlendState,
    pub backface_cull: bool,
    /// Draw transparent objects far-to-near after the opaque ones
    pub sort_transparent: bool,
    /// Rasterize row bands on the rayon pool
    pub parallel: bool,
    /// Scanlines per band
    pub tile_rows: usize,
    /// Specular term of the forward and deferred paths
    pub pixel_specular: SpecularModel,
    /// Specular term of the vertex-lit path
    pub vertex_specular: SpecularModel,
    pub point_color: Color,
    pub wire_color: Color,
    /// Corner colors of the unlit path, in triangle index order
    pub unlit_colors: [Color; 3],
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 600,
            path: RenderPath::Forward,
            blend: BlendState::ALPHA,
            backface_cull: true,
            sort_transparent: true,
            parallel: true,
            tile_rows: 32,
            pixel_specular: SpecularModel::BlinnHalfVector,
            vertex_specular: SpecularModel::PhongReflect,
            point_color: Color::WHITE,
            wire_color: Color::WHITE,
            unlit_colors: [Color::WHITE, Color::RED, Color::BLUE],
        }
    }
}

impl RenderConfig {
    /// Same defaults at a different resolution
    pub fn with_size(width: usize, height: usize) -> Self {
        Self { width, height, ..Self::default() }
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn validate(&self) -> Result<(), RasterError> {
        if self.width == 0 || self.height == 0 {
            return Err(RasterError::Config(format!(
                "resolution must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.tile_rows == 0 {
            return Err(RasterError::Config("tile_rows must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Load and validate a config from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    /// Parse and validate a config from a RON string
    pub fn from_ron(s: &str) -> Result<Self, ConfigError> {
        let config: RenderConfig = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to a RON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .indentor("  ".to_string());
        let contents = ron::ser::to_string_pretty(self, pretty)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rasterizer::BlendMode;

    #[test]
    fn test_defaults_round_trip_through_ron() {
        let config = RenderConfig::default();
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new()).unwrap();
        assert_eq!(RenderConfig::from_ron(&text).unwrap(), config);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config = RenderConfig::from_ron("(width: 320, path: Deferred)").unwrap();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 600);
        assert_eq!(config.path, RenderPath::Deferred);
        assert_eq!(config.blend.dst, BlendMode::OneMinusSrcAlpha);
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let err = RenderConfig::from_ron("(height: 0)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(RasterError::Config(_))));
        assert!(RenderConfig { tile_rows: 0, ..RenderConfig::default() }.validate().is_err());
    }

    #[test]
    fn test_bad_ron_is_a_parse_error() {
        assert!(matches!(RenderConfig::from_ron("(width: )"), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join("softlight_config_test.ron");
        let config = RenderConfig { parallel: false, ..RenderConfig::with_size(64, 48) };
        config.save(&path).unwrap();
        assert_eq!(RenderConfig::load(&path).unwrap(), config);
        let _ = std::fs::remove_file(path);
    }
}

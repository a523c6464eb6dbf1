/// Render configuration.
/// Every field has a default, so a JSON file only needs the values it changes.
use crate::error::RenderError;
use crate::rendering::shadow::PcssConfig;
use crate::rendering::tile::DEFAULT_TILE_SIZE;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which triangle winding is rejected before rasterization.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CullMode {
    /// Reject clockwise (negative signed area) triangles.
    Back,
    /// Reject counter-clockwise triangles. Used by the shadow pass.
    Front,
    /// Only degenerate triangles are rejected.
    None,
}

impl Default for CullMode {
    fn default() -> Self {
        CullMode::Back
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShadowMode {
    None,
    Hard,
    Pcss,
}

/// Settings for the per-light depth pass and the shadow lookup.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowConfig {
    pub mode: ShadowMode,
    /// Side length of the square shadow map in texels.
    pub map_size: usize,
    /// Vertical field of view of each light's projection.
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub pcss: PcssConfig,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            mode: ShadowMode::Pcss,
            map_size: 1024,
            fov_degrees: 60.0,
            near: 0.1,
            far: 100.0,
            pcss: PcssConfig::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: usize,
    pub height: usize,
    /// Supersampling factor per axis; each pixel holds `ssaa * ssaa` samples.
    pub ssaa: usize,
    /// Tile edge length in pixels.
    pub tile_size: usize,
    /// Linear RGB background; alpha is always 1.
    pub clear_color: [f32; 3],
    pub cull_mode: CullMode,
    pub shadow: ShadowConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 800,
            ssaa: 2,
            tile_size: DEFAULT_TILE_SIZE,
            clear_color: [0.0, 0.0, 0.0],
            cull_mode: CullMode::Back,
            shadow: ShadowConfig::default(),
        }
    }
}

impl RenderConfig {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_ssaa(mut self, ssaa: usize) -> Self {
        self.ssaa = ssaa;
        self
    }

    pub fn with_tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_shadow_mode(mut self, mode: ShadowMode) -> Self {
        self.shadow.mode = mode;
        self
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RenderError> {
        let text = std::fs::read_to_string(path)?;
        let config: RenderConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidConfig(format!(
                "surface size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        if self.ssaa == 0 {
            return Err(RenderError::InvalidConfig("ssaa must be at least 1".into()));
        }
        if self.tile_size == 0 {
            return Err(RenderError::InvalidConfig(
                "tile_size must be at least 1".into(),
            ));
        }
        if self.shadow.mode != ShadowMode::None && self.shadow.map_size == 0 {
            return Err(RenderError::InvalidConfig(
                "shadow map_size must be non-zero when shadows are enabled".into(),
            ));
        }
        Ok(())
    }
}

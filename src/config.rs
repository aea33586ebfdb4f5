use egui::{Pos2, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::{ComposerError, Result};

/// Logical size of the canvas in pixels.
///
/// Exports are always produced at this size; device pixel ratio never leaks
/// into the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
        }
    }
}

impl CanvasConfig {
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width as f32, self.height as f32)
    }

    pub fn center(&self) -> Pos2 {
        Pos2::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }
}

/// How corner handles change a layer's scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScaleMode {
    /// Both axes follow the pointer's distance from the anchor.
    #[default]
    Uniform,
    /// Each axis follows the pointer's offset along the layer's own axes.
    PerAxis,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SilhouetteConfig {
    /// Radius of the face circle relative to the smaller canvas side.
    pub radius_ratio: f32,
    /// Width of the outline ring, used only when a stroke color is set.
    pub stroke_width: f32,
}

impl Default for SilhouetteConfig {
    fn default() -> Self {
        Self {
            radius_ratio: 0.42,
            stroke_width: 6.0,
        }
    }
}

/// Session-wide settings.
///
/// Every field has a default, so partial JSON documents are fine:
///
/// ```
/// let config = face_maker::ComposerConfig::from_json(r#"{ "min_scale": 0.1 }"#).unwrap();
/// assert_eq!(config.canvas.width, 512);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)] // if we add new fields, give them default values when deserializing old configs
pub struct ComposerConfig {
    pub canvas: CanvasConfig,
    /// Lower bound for both scale components of every layer.
    pub min_scale: f32,
    /// Pick radius around scale and rotation handles, in canvas pixels.
    pub handle_radius: f32,
    /// Distance of the rotation handle above the layer's top edge.
    pub rotation_handle_offset: f32,
    pub rotation_snap_degrees: Option<f32>,
    pub scale_mode: ScaleMode,
    /// Bring a layer to the top of the stack when it gets selected.
    pub raise_on_select: bool,
    pub silhouette: SilhouetteConfig,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasConfig::default(),
            min_scale: 0.05,
            handle_radius: 10.0,
            rotation_handle_offset: 30.0,
            rotation_snap_degrees: None,
            scale_mode: ScaleMode::Uniform,
            raise_on_select: false,
            silhouette: SilhouetteConfig::default(),
        }
    }
}

impl ComposerConfig {
    /// Parses and validates a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(ComposerError::InvalidConfig(format!(
                "canvas must be non-empty, got {}x{}",
                self.canvas.width, self.canvas.height
            )));
        }
        if !(self.min_scale.is_finite() && self.min_scale > 0.0) {
            return Err(ComposerError::InvalidConfig(format!(
                "min_scale must be positive, got {}",
                self.min_scale
            )));
        }
        if !(self.handle_radius.is_finite() && self.handle_radius >= 0.0) {
            return Err(ComposerError::InvalidConfig(format!(
                "handle_radius must be non-negative, got {}",
                self.handle_radius
            )));
        }
        if let Some(snap) = self.rotation_snap_degrees {
            if !(snap.is_finite() && snap > 0.0) {
                return Err(ComposerError::InvalidConfig(format!(
                    "rotation_snap_degrees must be positive, got {snap}"
                )));
            }
        }
        if !(self.silhouette.radius_ratio.is_finite() && self.silhouette.radius_ratio >= 0.0) {
            return Err(ComposerError::InvalidConfig(format!(
                "silhouette.radius_ratio must be non-negative, got {}",
                self.silhouette.radius_ratio
            )));
        }
        Ok(())
    }
}

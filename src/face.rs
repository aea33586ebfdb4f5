use egui::Color32;
use serde::{Deserialize, Serialize};

use crate::catalog::AssetRef;
use crate::colors;

pub const DEFAULT_EYES: &str = "eyes/000";
pub const DEFAULT_MOUTH: &str = "mouths/000";

/// What sits under everything else on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Background {
    #[default]
    Transparent,
    Color(Color32),
}

/// The single-slot selections that make up the base face.
///
/// Setters replace a slot wholesale; validation against the catalog happens in
/// [`crate::Session`], this type is just the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaceState {
    eyes_sprite: AssetRef,
    mouth_sprite: AssetRef,
    background: Background,
    background_image: Option<AssetRef>,
    fill_color: Color32,
    stroke_color: Option<Color32>,
}

impl Default for FaceState {
    fn default() -> Self {
        Self {
            eyes_sprite: AssetRef::new(DEFAULT_EYES),
            mouth_sprite: AssetRef::new(DEFAULT_MOUTH),
            background: Background::Transparent,
            background_image: None,
            fill_color: colors::YELLOW,
            stroke_color: None,
        }
    }
}

impl FaceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eyes_sprite(&self) -> &AssetRef {
        &self.eyes_sprite
    }

    pub fn set_eyes_sprite(&mut self, asset: AssetRef) {
        self.eyes_sprite = asset;
    }

    pub fn mouth_sprite(&self) -> &AssetRef {
        &self.mouth_sprite
    }

    pub fn set_mouth_sprite(&mut self, asset: AssetRef) {
        self.mouth_sprite = asset;
    }

    pub fn background(&self) -> Background {
        self.background
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    /// Convenience for the common "solid color" case.
    pub fn set_background_color(&mut self, color: Color32) {
        self.background = Background::Color(color);
    }

    pub fn background_image(&self) -> Option<&AssetRef> {
        self.background_image.as_ref()
    }

    pub fn set_background_image(&mut self, asset: Option<AssetRef>) {
        self.background_image = asset;
    }

    pub fn fill_color(&self) -> Color32 {
        self.fill_color
    }

    pub fn set_fill_color(&mut self, color: Color32) {
        self.fill_color = color;
    }

    pub fn stroke_color(&self) -> Option<Color32> {
        self.stroke_color
    }

    pub fn set_stroke_color(&mut self, color: Option<Color32>) {
        self.stroke_color = color;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

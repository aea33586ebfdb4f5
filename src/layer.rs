use std::fmt;

use egui::emath::Rot2;
use egui::{Pos2, Rect, Vec2};
use serde::{Deserialize, Serialize};

use crate::catalog::AssetRef;

/// Placement of a sprite on the canvas.
///
/// The anchor is the sprite's center: the sprite is scaled, then rotated about
/// the anchor, then translated so the anchor lands on `position`. Rotation is in
/// degrees, clockwise on screen (y points down).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Transform {
    pub position: Pos2,
    pub scale: Vec2,
    pub rotation_degrees: f32,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Pos2::ZERO,
            scale: Vec2::new(1.0, 1.0),
            rotation_degrees: 0.0,
        }
    }
}

impl Transform {
    /// Identity scale and rotation with the anchor at `position`
    pub fn at(position: Pos2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    fn rotation(&self) -> Rot2 {
        Rot2::from_angle(self.rotation_degrees.to_radians())
    }

    /// Maps a point in sprite space (origin at the anchor, unscaled pixels)
    /// into canvas space.
    pub fn to_canvas(&self, local: Vec2) -> Pos2 {
        self.position + self.rotation() * (local * self.scale)
    }

    /// Inverse of [`Transform::to_canvas`].
    ///
    /// Scale components are never zero for layers living in a store, so the
    /// division is well defined there.
    pub fn to_local(&self, canvas: Pos2) -> Vec2 {
        (self.rotation().inverse() * (canvas - self.position)) / self.scale
    }

    /// Rotates a canvas-space vector into the layer's (unscaled) axes.
    pub fn unrotate(&self, v: Vec2) -> Vec2 {
        self.rotation().inverse() * v
    }
}

/// A partial transform. `None` fields are left untouched when merged.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TransformDelta {
    pub position: Option<Pos2>,
    pub scale: Option<Vec2>,
    pub rotation_degrees: Option<f32>,
}

impl TransformDelta {
    pub fn position(position: Pos2) -> Self {
        Self {
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn scale(scale: Vec2) -> Self {
        Self {
            scale: Some(scale),
            ..Self::default()
        }
    }

    pub fn rotation(degrees: f32) -> Self {
        Self {
            rotation_degrees: Some(degrees),
            ..Self::default()
        }
    }

    /// Merges into `transform`, dropping non-finite values and clamping both
    /// scale components to at least `min_scale`.
    pub fn apply_to(&self, transform: &mut Transform, min_scale: f32) {
        if let Some(position) = self.position.filter(|p| p.x.is_finite() && p.y.is_finite()) {
            transform.position = position;
        }
        if let Some(scale) = self.scale.filter(|s| s.x.is_finite() && s.y.is_finite()) {
            transform.scale = scale.max(Vec2::splat(min_scale));
        }
        if let Some(rotation) = self.rotation_degrees.filter(|r| r.is_finite()) {
            transform.rotation_degrees = rotation;
        }
    }
}

/// Identifier of an accessory layer. Never reused within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub u64);

impl LayerId {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One placed accessory sprite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessoryLayer {
    id: LayerId,
    asset: AssetRef,
    /// Intrinsic sprite size in pixels.
    size: Vec2,
    pub(crate) transform: Transform,
    pub(crate) z_index: u64,
}

impl AccessoryLayer {
    pub(crate) fn new(
        id: LayerId,
        asset: AssetRef,
        size: Vec2,
        transform: Transform,
        z_index: u64,
    ) -> Self {
        Self {
            id,
            asset,
            size,
            transform,
            z_index,
        }
    }

    pub fn id(&self) -> LayerId {
        self.id
    }

    pub fn asset(&self) -> &AssetRef {
        &self.asset
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    pub fn z_index(&self) -> u64 {
        self.z_index
    }

    /// Sprite-space rectangle, centered on the anchor.
    pub fn local_rect(&self) -> Rect {
        Rect::from_center_size(Pos2::ZERO, self.size)
    }

    /// The four corners of the painted quad in canvas space, in the order
    /// top-left, top-right, bottom-right, bottom-left (before rotation).
    pub fn corners(&self) -> [Pos2; 4] {
        let half = self.size / 2.0;
        [
            Vec2::new(-half.x, -half.y),
            Vec2::new(half.x, -half.y),
            Vec2::new(half.x, half.y),
            Vec2::new(-half.x, half.y),
        ]
        .map(|corner| self.transform.to_canvas(corner))
    }

    /// Axis-aligned box around the painted quad.
    pub fn bounding_rect(&self) -> Rect {
        let corners = self.corners();
        let mut rect = Rect::NOTHING;
        for corner in corners {
            rect.extend_with(corner);
        }
        rect
    }
}

use egui::emath::RectTransform;
use egui::{Color32, Painter, Pos2, Shape, Stroke, Vec2};

use crate::layer::AccessoryLayer;

const HANDLE_SIZE: f32 = 8.0;
const HANDLE_COLOR: Color32 = Color32::from_rgb(30, 144, 255);
const HANDLE_STROKE_WIDTH: f32 = 2.0;

/// Which part of the selection chrome a pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GizmoHandle {
    Move,
    ScaleTopLeft,
    ScaleTopRight,
    ScaleBottomRight,
    ScaleBottomLeft,
    Rotate,
}

impl GizmoHandle {
    pub fn is_scale(&self) -> bool {
        matches!(
            self,
            Self::ScaleTopLeft
                | Self::ScaleTopRight
                | Self::ScaleBottomRight
                | Self::ScaleBottomLeft
        )
    }
}

/// Handle layout for the selected layer.
///
/// Handles follow the layer's rotation: the corner handles sit on the corners
/// of the painted quad and the rotation handle sits `rotation_offset` pixels
/// above the middle of the top edge, along the layer's own "up".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformGizmo {
    pub handle_radius: f32,
    pub rotation_offset: f32,
}

impl TransformGizmo {
    pub fn new(handle_radius: f32, rotation_offset: f32) -> Self {
        Self {
            handle_radius,
            rotation_offset,
        }
    }

    /// Canvas positions of the corner and rotation handles.
    pub fn handle_positions(&self, layer: &AccessoryLayer) -> [(GizmoHandle, Pos2); 5] {
        let [top_left, top_right, bottom_right, bottom_left] = layer.corners();
        [
            (GizmoHandle::ScaleTopLeft, top_left),
            (GizmoHandle::ScaleTopRight, top_right),
            (GizmoHandle::ScaleBottomRight, bottom_right),
            (GizmoHandle::ScaleBottomLeft, bottom_left),
            (GizmoHandle::Rotate, self.rotation_handle(layer)),
        ]
    }

    fn rotation_handle(&self, layer: &AccessoryLayer) -> Pos2 {
        let transform = layer.transform();
        let top_center = transform.to_canvas(Vec2::new(0.0, -layer.size().y / 2.0));
        // Offset in canvas pixels regardless of the layer's scale
        let up = (top_center - transform.position).normalized();
        let up = if up.is_finite() && up != Vec2::ZERO {
            up
        } else {
            transform.to_canvas(Vec2::new(0.0, -1.0)) - transform.position
        };
        top_center + up.normalized() * self.rotation_offset
    }

    /// Finds the handle under `pos`. Corner and rotation handles take priority
    /// over the body so they stay grabbable where they overlap it.
    pub fn handle_at(&self, layer: &AccessoryLayer, pos: Pos2) -> Option<GizmoHandle> {
        let nearest = self
            .handle_positions(layer)
            .into_iter()
            .map(|(handle, at)| (handle, at.distance(pos)))
            .filter(|(_, distance)| *distance <= self.handle_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((handle, _)) = nearest {
            return Some(handle);
        }
        crate::geometry::contains_point(layer, pos).then_some(GizmoHandle::Move)
    }

    /// Draws the selection outline and handles for a host egui canvas.
    pub fn paint(&self, painter: &Painter, layer: &AccessoryLayer, to_screen: RectTransform) {
        let outline: Vec<Pos2> = layer
            .corners()
            .into_iter()
            .map(|corner| to_screen.transform_pos(corner))
            .collect();
        let stroke = Stroke::new(1.0, HANDLE_COLOR);
        painter.add(Shape::closed_line(outline, stroke));

        let handles = self.handle_positions(layer);
        let top_center = to_screen.transform_pos(
            layer
                .transform()
                .to_canvas(Vec2::new(0.0, -layer.size().y / 2.0)),
        );
        for (handle, pos) in handles {
            let pos = to_screen.transform_pos(pos);
            match handle {
                GizmoHandle::Rotate => {
                    painter.line_segment([top_center, pos], stroke);
                    painter.circle_stroke(
                        pos,
                        HANDLE_SIZE / 2.0,
                        Stroke::new(HANDLE_STROKE_WIDTH, HANDLE_COLOR),
                    );
                }
                _ => {
                    painter.rect_filled(
                        egui::Rect::from_center_size(pos, Vec2::splat(HANDLE_SIZE)),
                        0.0,
                        HANDLE_COLOR,
                    );
                }
            }
        }
    }
}

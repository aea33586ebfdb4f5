use egui::{Pos2, Vec2};
use log::debug;

use crate::command::Command;
use crate::config::{ComposerConfig, ScaleMode};
use crate::geometry::hit_testing::topmost_layer_at;
use crate::gizmo::{GizmoHandle, TransformGizmo};
use crate::layer::{LayerId, Transform, TransformDelta};
use crate::store::LayerStore;

/// Below this many pixels from the anchor, distances and angles are too
/// unstable to derive a scale or rotation from.
const MIN_GESTURE_RADIUS: f32 = 1e-3;

/// Gesture in progress. Every gesture remembers the values it started from, so
/// each pointer move recomputes the transform from scratch instead of
/// accumulating deltas.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionState {
    Idle,
    Dragging {
        layer_id: LayerId,
        start_pointer: Pos2,
        start_transform: Transform,
    },
    Scaling {
        layer_id: LayerId,
        handle: GizmoHandle,
        start_pointer: Pos2,
        start_transform: Transform,
    },
    Rotating {
        layer_id: LayerId,
        start_angle: f32,
        start_transform: Transform,
    },
}

impl SelectionState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Dragging { .. } => "Dragging",
            Self::Scaling { .. } => "Scaling",
            Self::Rotating { .. } => "Rotating",
        }
    }

    pub fn layer_id(&self) -> Option<LayerId> {
        match self {
            Self::Idle => None,
            Self::Dragging { layer_id, .. }
            | Self::Scaling { layer_id, .. }
            | Self::Rotating { layer_id, .. } => Some(*layer_id),
        }
    }
}

/// Turns pointer gestures on the canvas into selection changes and transform
/// updates for the selected accessory.
#[derive(Debug, Clone)]
pub struct SelectionTool {
    state: SelectionState,
    gizmo: TransformGizmo,
    min_scale: f32,
    scale_mode: ScaleMode,
    rotation_snap_degrees: Option<f32>,
    raise_on_select: bool,
}

impl SelectionTool {
    pub fn new(config: &ComposerConfig) -> Self {
        Self {
            state: SelectionState::Idle,
            gizmo: TransformGizmo::new(config.handle_radius, config.rotation_handle_offset),
            min_scale: config.min_scale,
            scale_mode: config.scale_mode,
            rotation_snap_degrees: config.rotation_snap_degrees,
            raise_on_select: config.raise_on_select,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SelectionState::Idle
    }

    pub fn gizmo(&self) -> &TransformGizmo {
        &self.gizmo
    }

    fn transition(&mut self, next: SelectionState) {
        if self.state.name() != next.name() {
            debug!("Selection tool: {} -> {}", self.state.name(), next.name());
        }
        self.state = next;
    }

    /// Abandons any gesture. The layer keeps whatever transform it reached.
    pub fn cancel(&mut self) {
        self.transition(SelectionState::Idle);
    }

    /// Pointer pressed at `pos` (canvas coordinates).
    ///
    /// Handles of the selected layer are tested first, then layer bodies from
    /// the top down. A press on empty canvas clears the selection.
    pub fn on_pointer_down(&mut self, pos: Pos2, store: &LayerStore) -> Option<Command> {
        if !self.is_idle() {
            // Missed the release of the previous gesture
            self.cancel();
        }

        if let Some(layer) = store.selected_layer() {
            match self.gizmo.handle_at(layer, pos) {
                Some(handle) if handle.is_scale() => {
                    self.transition(SelectionState::Scaling {
                        layer_id: layer.id(),
                        handle,
                        start_pointer: pos,
                        start_transform: *layer.transform(),
                    });
                    return None;
                }
                Some(GizmoHandle::Rotate) => {
                    let start_angle = pointer_angle(layer.transform().position, pos)?;
                    self.transition(SelectionState::Rotating {
                        layer_id: layer.id(),
                        start_angle,
                        start_transform: *layer.transform(),
                    });
                    return None;
                }
                _ => {}
            }
        }

        let Some(layer_id) = topmost_layer_at(store.list(), pos) else {
            return (store.selected().is_some()).then_some(Command::Select {
                layer_id: None,
                raise: false,
            });
        };
        let start_transform = *store.get(layer_id)?.transform();
        self.transition(SelectionState::Dragging {
            layer_id,
            start_pointer: pos,
            start_transform,
        });

        let is_top = store.list().last().map(|layer| layer.id()) == Some(layer_id);
        let raise = self.raise_on_select && !is_top;
        (store.selected() != Some(layer_id) || raise).then_some(Command::Select {
            layer_id: Some(layer_id),
            raise,
        })
    }

    /// Pointer moved to `pos` while a gesture may be running.
    pub fn on_pointer_move(&mut self, pos: Pos2, store: &LayerStore) -> Option<Command> {
        let layer_id = self.state.layer_id()?;
        if store.get(layer_id).is_none() {
            debug!("Layer {} vanished mid-gesture", layer_id);
            self.cancel();
            return None;
        }

        let delta = match &self.state {
            SelectionState::Idle => return None,
            SelectionState::Dragging {
                start_pointer,
                start_transform,
                ..
            } => TransformDelta::position(start_transform.position + (pos - *start_pointer)),
            SelectionState::Scaling {
                start_pointer,
                start_transform,
                ..
            } => TransformDelta::scale(self.scaled(start_transform, *start_pointer, pos)?),
            SelectionState::Rotating {
                start_angle,
                start_transform,
                ..
            } => {
                let angle = pointer_angle(start_transform.position, pos)?;
                TransformDelta::rotation(
                    self.snapped(start_transform.rotation_degrees + angle - start_angle),
                )
            }
        };

        Some(Command::UpdateTransform { layer_id, delta })
    }

    /// Pointer released, wherever that happened. Always ends the gesture.
    pub fn on_pointer_up(&mut self) {
        self.transition(SelectionState::Idle);
    }

    fn scaled(&self, start: &Transform, start_pointer: Pos2, pos: Pos2) -> Option<Vec2> {
        let anchor = start.position;
        let factor = match self.scale_mode {
            ScaleMode::Uniform => {
                let start_distance = start_pointer.distance(anchor);
                if start_distance < MIN_GESTURE_RADIUS {
                    return None;
                }
                Vec2::splat(pos.distance(anchor) / start_distance)
            }
            ScaleMode::PerAxis => {
                let from = start.unrotate(start_pointer - anchor);
                let to = start.unrotate(pos - anchor);
                let axis = |from: f32, to: f32| {
                    if from.abs() < MIN_GESTURE_RADIUS {
                        1.0
                    } else {
                        to.abs() / from.abs()
                    }
                };
                Vec2::new(axis(from.x, to.x), axis(from.y, to.y))
            }
        };
        Some((start.scale * factor).max(Vec2::splat(self.min_scale)))
    }

    fn snapped(&self, degrees: f32) -> f32 {
        let degrees = match self.rotation_snap_degrees {
            Some(step) => (degrees / step).round() * step,
            None => degrees,
        };
        degrees.rem_euclid(360.0)
    }
}

/// Screen-space angle of `pos` around `anchor` in degrees, clockwise from +x.
fn pointer_angle(anchor: Pos2, pos: Pos2) -> Option<f32> {
    let v = pos - anchor;
    (v.length() >= MIN_GESTURE_RADIUS).then(|| v.y.atan2(v.x).to_degrees())
}

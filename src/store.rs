use std::collections::HashSet;

use egui::{Pos2, Vec2};
use log::{debug, info, warn};

use crate::catalog::AssetRef;
use crate::error::{ComposerError, Result};
use crate::layer::{AccessoryLayer, LayerId, Transform, TransformDelta};

/// Ordered collection of placed accessories plus the single selection.
///
/// `layers` is kept sorted ascending by z-index, so it doubles as the paint
/// order. Ids and z-indices come from counters that only ever move forward.
#[derive(Debug, Clone)]
pub struct LayerStore {
    layers: Vec<AccessoryLayer>,
    selected: Option<LayerId>,
    next_id: u64,
    next_z: u64,
    /// Where new layers are anchored
    spawn_point: Pos2,
    min_scale: f32,
}

impl LayerStore {
    pub fn new(spawn_point: Pos2, min_scale: f32) -> Self {
        Self {
            layers: Vec::new(),
            selected: None,
            next_id: 1,
            next_z: 0,
            spawn_point,
            min_scale,
        }
    }

    /// Rebuilds a store from saved parts.
    ///
    /// Fails if ids or z-indices collide, or if the counters would hand out an
    /// id or z-index that is already taken.
    pub fn from_parts(
        mut layers: Vec<AccessoryLayer>,
        selected: Option<LayerId>,
        next_id: u64,
        next_z: u64,
        spawn_point: Pos2,
        min_scale: f32,
    ) -> Result<Self> {
        let mut ids = HashSet::new();
        let mut zs = HashSet::new();
        for layer in &layers {
            if !ids.insert(layer.id()) {
                return Err(ComposerError::InvalidSnapshot(format!(
                    "duplicate layer id {}",
                    layer.id()
                )));
            }
            if !zs.insert(layer.z_index()) {
                return Err(ComposerError::InvalidSnapshot(format!(
                    "duplicate z-index {}",
                    layer.z_index()
                )));
            }
            if layer.id().get() >= next_id || layer.z_index() >= next_z {
                return Err(ComposerError::InvalidSnapshot(format!(
                    "layer {} is not below the counters (next id {}, next z {})",
                    layer.id(),
                    next_id,
                    next_z
                )));
            }
        }
        if let Some(id) = selected {
            if !ids.contains(&id) {
                return Err(ComposerError::InvalidSnapshot(format!(
                    "selected layer {id} does not exist"
                )));
            }
        }
        if next_id == u64::MAX || next_z == u64::MAX {
            return Err(ComposerError::InvalidSnapshot(format!(
                "layer counters out of range (next id {next_id}, next z {next_z})"
            )));
        }
        if next_id == 0 {
            return Err(ComposerError::InvalidSnapshot("layer ids start at 1".to_string()));
        }

        for layer in &mut layers {
            TransformDelta::scale(layer.transform.scale).apply_to(&mut layer.transform, min_scale);
        }
        layers.sort_by_key(AccessoryLayer::z_index);

        Ok(Self {
            layers,
            selected,
            next_id,
            next_z,
            spawn_point,
            min_scale,
        })
    }

    /// Places a new layer on top of the stack and selects it.
    ///
    /// Returns `None` once the id or z counter is exhausted.
    pub fn add(&mut self, asset: AssetRef, size: Vec2) -> Option<LayerId> {
        let next_id = self.next_id.checked_add(1);
        let next_z = self.next_z.checked_add(1);
        let (Some(next_id), Some(next_z)) = (next_id, next_z) else {
            warn!("Layer counters exhausted, not adding {}", asset);
            return None;
        };
        let id = LayerId(self.next_id);
        let z_index = self.next_z;
        self.next_id = next_id;
        self.next_z = next_z;

        info!("Adding accessory layer {} ({}) at z {}", id, asset, z_index);
        self.layers.push(AccessoryLayer::new(
            id,
            asset,
            size,
            Transform::at(self.spawn_point),
            z_index,
        ));
        self.selected = Some(id);
        Some(id)
    }

    /// Removes a layer. Returns `false` (and does nothing) if it is already gone.
    pub fn remove(&mut self, id: LayerId) -> bool {
        let Some(index) = self.index_of(id) else {
            debug!("Ignoring remove of missing layer {}", id);
            return false;
        };
        self.layers.remove(index);
        if self.selected == Some(id) {
            self.selected = None;
        }
        info!("Removed accessory layer {}", id);
        true
    }

    /// Removes whatever is selected, if anything.
    pub fn remove_selected(&mut self) -> Option<LayerId> {
        let id = self.selected?;
        self.remove(id).then_some(id)
    }

    /// Merges a partial transform into a layer. Missing layers are ignored.
    pub fn update(&mut self, id: LayerId, delta: TransformDelta) -> bool {
        let min_scale = self.min_scale;
        match self.get_mut(id) {
            Some(layer) => {
                delta.apply_to(&mut layer.transform, min_scale);
                true
            }
            None => {
                debug!("Ignoring update of missing layer {}", id);
                false
            }
        }
    }

    /// Moves a layer above every other layer by giving it a fresh z-index.
    pub fn reorder_to_top(&mut self, id: LayerId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        if index + 1 == self.layers.len() {
            return true;
        }
        let Some(next_z) = self.next_z.checked_add(1) else {
            warn!("Z counter exhausted, layer {} stays where it is", id);
            return false;
        };
        let mut layer = self.layers.remove(index);
        layer.z_index = self.next_z;
        self.next_z = next_z;
        debug!("Layer {} raised to z {}", id, layer.z_index);
        self.layers.push(layer);
        true
    }

    /// Selects a layer, or clears the selection with `None`.
    /// Selecting a missing layer clears the selection.
    pub fn select(&mut self, id: Option<LayerId>) {
        self.selected = id.filter(|id| self.index_of(*id).is_some());
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.selected
    }

    pub fn selected_layer(&self) -> Option<&AccessoryLayer> {
        self.selected.and_then(|id| self.get(id))
    }

    /// Layers bottom to top.
    pub fn list(&self) -> &[AccessoryLayer] {
        &self.layers
    }

    pub fn get(&self, id: LayerId) -> Option<&AccessoryLayer> {
        self.layers.iter().find(|layer| layer.id() == id)
    }

    fn get_mut(&mut self, id: LayerId) -> Option<&mut AccessoryLayer> {
        self.layers.iter_mut().find(|layer| layer.id() == id)
    }

    fn index_of(&self, id: LayerId) -> Option<usize> {
        self.layers.iter().position(|layer| layer.id() == id)
    }

    /// Drops every layer. Counters keep running so ids are not reused.
    pub fn clear(&mut self) {
        self.layers.clear();
        self.selected = None;
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn next_z(&self) -> u64 {
        self.next_z
    }

    pub fn min_scale(&self) -> f32 {
        self.min_scale
    }
}

use egui::Pos2;

use crate::layer::{AccessoryLayer, LayerId};

/// True if `pos` falls inside the layer's painted quad.
///
/// The test runs in sprite space, so rotated and non-uniformly scaled layers
/// are hit exactly on their oriented box rather than on its axis-aligned hull.
pub fn contains_point(layer: &AccessoryLayer, pos: Pos2) -> bool {
    let local = layer.transform().to_local(pos);
    let half = layer.size() / 2.0;
    local.x.abs() <= half.x && local.y.abs() <= half.y
}

/// The layer painted topmost at `pos`, if any.
///
/// `layers` must be in paint order (ascending z-index), as returned by
/// [`crate::LayerStore::list`].
pub fn topmost_layer_at(layers: &[AccessoryLayer], pos: Pos2) -> Option<LayerId> {
    layers
        .iter()
        .rev()
        .find(|layer| contains_point(layer, pos))
        .map(AccessoryLayer::id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::TransformDelta;
    use crate::store::LayerStore;
    use egui::Vec2;

    #[test]
    fn test_rotated_box_excludes_hull_corners() {
        let mut store = LayerStore::new(Pos2::new(100.0, 100.0), 0.05);
        let id = store.add("accessories/bar".into(), Vec2::new(100.0, 10.0)).unwrap();
        store.update(id, TransformDelta::rotation(45.0));
        let layer = store.get(id).unwrap();

        // Along the rotated long axis
        assert!(contains_point(layer, Pos2::new(130.0, 130.0)));
        // Inside the axis-aligned hull but off the bar
        assert!(!contains_point(layer, Pos2::new(130.0, 70.0)));
    }

    #[test]
    fn test_topmost_wins() {
        let mut store = LayerStore::new(Pos2::new(50.0, 50.0), 0.05);
        let below = store.add("a".into(), Vec2::splat(40.0)).unwrap();
        let above = store.add("b".into(), Vec2::splat(20.0)).unwrap();

        assert_eq!(topmost_layer_at(store.list(), Pos2::new(50.0, 50.0)), Some(above));
        assert_eq!(topmost_layer_at(store.list(), Pos2::new(35.0, 35.0)), Some(below));
        assert_eq!(topmost_layer_at(store.list(), Pos2::new(0.0, 0.0)), None);
    }
}

use egui::{Pos2, Vec2};
use face_maker::{LayerId, LayerStore, TransformDelta};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// Store with three accessories stacked in insertion order
fn create_test_store() -> (LayerStore, [LayerId; 3]) {
    init_logging();
    let mut store = LayerStore::new(Pos2::new(256.0, 256.0), 0.05);
    let a = store.add("accessories/hat".into(), Vec2::new(40.0, 20.0)).unwrap();
    let b = store.add("accessories/glasses".into(), Vec2::new(60.0, 20.0)).unwrap();
    let c = store.add("accessories/hat".into(), Vec2::new(40.0, 20.0)).unwrap();
    (store, [a, b, c])
}

fn ids(store: &LayerStore) -> Vec<LayerId> {
    store.list().iter().map(|layer| layer.id()).collect()
}

#[test]
fn test_ids_are_distinct_and_z_strictly_increases() {
    let (store, [a, b, c]) = create_test_store();
    assert!(a != b && b != c && a != c);
    assert_eq!(ids(&store), vec![a, b, c]);

    let zs: Vec<u64> = store.list().iter().map(|layer| layer.z_index()).collect();
    assert!(zs.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn test_same_asset_may_be_added_twice() {
    let (store, [a, _, c]) = create_test_store();
    assert_eq!(store.get(a).unwrap().asset(), store.get(c).unwrap().asset());
    assert_eq!(store.len(), 3);
}

#[test]
fn test_new_layer_is_placed_at_spawn_point_and_selected() {
    let (store, [_, _, c]) = create_test_store();
    let layer = store.get(c).unwrap();
    assert_eq!(layer.transform().position, Pos2::new(256.0, 256.0));
    assert_eq!(layer.transform().scale, Vec2::splat(1.0));
    assert_eq!(layer.transform().rotation_degrees, 0.0);
    assert_eq!(store.selected(), Some(c));
}

#[test]
fn test_remove_is_idempotent() {
    let (mut store, [a, b, c]) = create_test_store();
    assert!(store.remove(b));
    assert!(!store.remove(b));
    assert_eq!(ids(&store), vec![a, c]);
}

#[test]
fn test_update_after_remove_is_noop() {
    let (mut store, [a, _, _]) = create_test_store();
    store.remove(a);
    assert!(!store.update(a, TransformDelta::position(Pos2::new(1.0, 2.0))));
    assert!(store.get(a).is_none());
    assert_eq!(store.len(), 2);
}

#[test]
fn test_add_after_remove_goes_on_top_with_fresh_id() {
    let (mut store, [a, b, c]) = create_test_store();
    store.remove(c);
    let d = store.add("accessories/bow".into(), Vec2::new(10.0, 10.0)).unwrap();
    assert_eq!(ids(&store), vec![a, b, d]);
    assert!(d.get() > c.get());
    assert!(store.get(d).unwrap().z_index() > store.get(b).unwrap().z_index());
}

#[test]
fn test_delete_selected_scenario() {
    init_logging();
    let mut store = LayerStore::new(Pos2::ZERO, 0.05);
    let a = store.add("accessories/a".into(), Vec2::splat(10.0)).unwrap();
    let b = store.add("accessories/b".into(), Vec2::splat(10.0)).unwrap();
    assert_eq!(store.selected(), Some(b));

    assert_eq!(store.remove_selected(), Some(b));
    assert_eq!(ids(&store), vec![a]);
    assert_eq!(store.selected(), None);

    // Nothing selected now, nothing else goes away
    assert_eq!(store.remove_selected(), None);
    assert_eq!(ids(&store), vec![a]);
}

#[test]
fn test_scale_never_drops_below_minimum() {
    let (mut store, [a, _, _]) = create_test_store();

    // A 1px drag towards the anchor from far away would be ~0.0
    store.update(a, TransformDelta::scale(Vec2::new(0.001, -3.0)));
    assert_eq!(store.get(a).unwrap().transform().scale, Vec2::splat(0.05));

    // Non-finite values are ignored outright
    store.update(a, TransformDelta::scale(Vec2::new(f32::NAN, 2.0)));
    assert_eq!(store.get(a).unwrap().transform().scale, Vec2::splat(0.05));
}

#[test]
fn test_partial_update_keeps_other_fields() {
    let (mut store, [a, _, _]) = create_test_store();
    store.update(a, TransformDelta::rotation(45.0));
    store.update(a, TransformDelta::position(Pos2::new(10.0, 20.0)));

    let transform = store.get(a).unwrap().transform();
    assert_eq!(transform.rotation_degrees, 45.0);
    assert_eq!(transform.position, Pos2::new(10.0, 20.0));
    assert_eq!(transform.scale, Vec2::splat(1.0));
}

#[test]
fn test_reorder_to_top() {
    let (mut store, [a, b, c]) = create_test_store();
    assert!(store.reorder_to_top(a));
    assert_eq!(ids(&store), vec![b, c, a]);
    assert!(!store.reorder_to_top(LayerId(99)));
}

#[test]
fn test_clear_keeps_counters_running() {
    let (mut store, [_, _, c]) = create_test_store();
    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.selected(), None);

    let d = store.add("accessories/hat".into(), Vec2::splat(1.0)).unwrap();
    assert!(d.get() > c.get());
}

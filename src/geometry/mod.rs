pub mod hit_testing;

pub use hit_testing::{contains_point, topmost_layer_at};

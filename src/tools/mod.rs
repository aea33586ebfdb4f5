//! Pointer tools acting on the accessory layers.

mod selection_tool;

pub use selection_tool::{SelectionState, SelectionTool};

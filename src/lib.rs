#![warn(clippy::all, rust_2018_idioms)]

pub mod catalog;
pub mod colors;
pub mod command;
pub mod compositor;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod face;
pub mod geometry;
pub mod gizmo;
pub mod input;
pub mod layer;
pub mod session;
pub mod store;
pub mod tools;

pub use catalog::{AssetCatalog, AssetKind, AssetRef};
pub use command::Command;
pub use compositor::render;
pub use config::{CanvasConfig, ComposerConfig, ScaleMode, SilhouetteConfig};
pub use error::{ComposerError, Result};
pub use event::{AccessoryCommand, CommandBus, CommandHandler, SubscriptionId};
pub use face::{Background, FaceState};
pub use gizmo::{GizmoHandle, TransformGizmo};
pub use input::{InputEvent, InputHandler, InputLocation};
pub use layer::{AccessoryLayer, LayerId, Transform, TransformDelta};
pub use session::{Session, SessionSnapshot};
pub use store::LayerStore;
pub use tools::{SelectionState, SelectionTool};

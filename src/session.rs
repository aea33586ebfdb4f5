use std::cell::RefCell;
use std::rc::{Rc, Weak};

use egui::{Color32, Key, PointerButton, Pos2};
use image::RgbaImage;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::catalog::{AssetCatalog, AssetKind, AssetRef};
use crate::command::Command;
use crate::compositor;
use crate::config::ComposerConfig;
use crate::error::{ComposerError, Result};
use crate::event::{AccessoryCommand, CommandBus, CommandHandler, SubscriptionId};
use crate::export;
use crate::face::{Background, FaceState};
use crate::input::InputEvent;
use crate::layer::{AccessoryLayer, LayerId};
use crate::store::LayerStore;
use crate::tools::SelectionTool;

/// One editing session: the face, the accessory layers, the gesture state and
/// the catalog they draw from.
///
/// Mutations never trigger a redraw themselves. They raise a dirty flag that
/// the host collects with [`Session::take_dirty`] before re-rendering.
#[derive(Debug)]
pub struct Session {
    config: ComposerConfig,
    catalog: AssetCatalog,
    face: FaceState,
    layers: LayerStore,
    tool: SelectionTool,
    dirty: bool,
}

impl Session {
    pub fn new(config: ComposerConfig, catalog: AssetCatalog) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            layers: LayerStore::new(config.canvas.center(), config.min_scale),
            tool: SelectionTool::new(&config),
            face: FaceState::default(),
            catalog,
            config,
            dirty: true,
        })
    }

    /// Subscribes `session` to `bus`.
    ///
    /// The subscriber only holds a weak reference: once the session is
    /// dropped, commands on the bus are ignored.
    pub fn connect(session: &Rc<RefCell<Session>>, bus: &CommandBus) -> SubscriptionId {
        bus.subscribe(SessionHandler {
            session: Rc::downgrade(session),
        })
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    /// Mutable access for registering assets as they finish loading.
    pub fn catalog_mut(&mut self) -> &mut AssetCatalog {
        self.dirty = true;
        &mut self.catalog
    }

    pub fn face(&self) -> &FaceState {
        &self.face
    }

    pub fn layers(&self) -> &LayerStore {
        &self.layers
    }

    pub fn tool(&self) -> &SelectionTool {
        &self.tool
    }

    pub fn selected(&self) -> Option<LayerId> {
        self.layers.selected()
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // Face setters ----------------------------------------------------------

    pub fn set_eyes_sprite(&mut self, asset: AssetRef) -> Result<()> {
        self.catalog.require(&asset, AssetKind::Eyes)?;
        self.face.set_eyes_sprite(asset);
        self.dirty = true;
        Ok(())
    }

    pub fn set_mouth_sprite(&mut self, asset: AssetRef) -> Result<()> {
        self.catalog.require(&asset, AssetKind::Mouth)?;
        self.face.set_mouth_sprite(asset);
        self.dirty = true;
        Ok(())
    }

    pub fn set_background(&mut self, background: Background) {
        self.face.set_background(background);
        self.dirty = true;
    }

    pub fn set_background_color(&mut self, color: Color32) {
        self.set_background(Background::Color(color));
    }

    pub fn set_background_image(&mut self, asset: Option<AssetRef>) -> Result<()> {
        if let Some(asset) = &asset {
            self.catalog.require(asset, AssetKind::Background)?;
        }
        self.face.set_background_image(asset);
        self.dirty = true;
        Ok(())
    }

    pub fn set_fill_color(&mut self, color: Color32) {
        self.face.set_fill_color(color);
        self.dirty = true;
    }

    pub fn set_stroke_color(&mut self, color: Option<Color32>) {
        self.face.set_stroke_color(color);
        self.dirty = true;
    }

    // Accessories -----------------------------------------------------------

    /// Places a new accessory on top and selects it.
    ///
    /// Unknown assets and non-accessory assets are rejected without touching
    /// the layers.
    pub fn add_accessory(&mut self, asset: &AssetRef) -> Result<LayerId> {
        self.catalog.require(asset, AssetKind::Accessory)?;
        let size = self
            .catalog
            .size(asset)
            .ok_or_else(|| ComposerError::UnknownAsset(asset.clone()))?;
        self.tool.cancel();
        let id = self
            .layers
            .add(asset.clone(), size)
            .ok_or(ComposerError::LayersExhausted)?;
        self.dirty = true;
        Ok(id)
    }

    /// Deletes the selected layer. Does nothing when nothing is selected.
    pub fn delete_selected(&mut self) -> Option<LayerId> {
        let removed = self.layers.remove_selected()?;
        if self.tool.state().layer_id() == Some(removed) {
            self.tool.cancel();
        }
        self.dirty = true;
        Some(removed)
    }

    /// Brings the selected layer above all others.
    pub fn bring_selected_to_front(&mut self) -> bool {
        let Some(id) = self.layers.selected() else {
            return false;
        };
        let was_top = self.layers.list().last().map(AccessoryLayer::id) == Some(id);
        let raised = self.layers.reorder_to_top(id);
        self.dirty |= raised && !was_top;
        raised
    }

    /// Applies a command coming from the command bus.
    pub fn apply_command(&mut self, command: &AccessoryCommand) {
        match command {
            AccessoryCommand::Add { asset } => {
                if let Err(err) = self.add_accessory(asset) {
                    warn!("Rejected add command: {}", err);
                }
            }
            AccessoryCommand::DeleteSelected => {
                if self.delete_selected().is_none() {
                    debug!("deleteSelected with nothing selected");
                }
            }
        }
    }

    // Pointer input ---------------------------------------------------------

    pub fn pointer_down(&mut self, pos: Pos2) {
        let command = self.tool.on_pointer_down(pos, &self.layers);
        self.execute(command);
    }

    pub fn pointer_move(&mut self, pos: Pos2) {
        let command = self.tool.on_pointer_move(pos, &self.layers);
        self.execute(command);
    }

    pub fn pointer_up(&mut self) {
        self.tool.on_pointer_up();
    }

    fn execute(&mut self, command: Option<Command>) {
        if let Some(command) = command {
            self.dirty |= command.execute(&mut self.layers);
        }
    }

    /// Routes an input event to the selection tool. Only the primary button
    /// drives gestures; Delete and Backspace remove the selected layer.
    pub fn handle_input(&mut self, event: &InputEvent) {
        match event {
            InputEvent::PointerDown {
                location,
                button: PointerButton::Primary,
            } => {
                // Presses outside the canvas are not canvas gestures
                if location.is_in_canvas {
                    self.pointer_down(location.position);
                }
            }
            InputEvent::PointerMove {
                location,
                held_buttons,
            } => {
                // The release got lost, e.g. it happened outside the window
                if !self.tool.is_idle() && !held_buttons.contains(&PointerButton::Primary) {
                    debug!("Primary button no longer held, ending gesture");
                    self.pointer_up();
                    return;
                }
                self.pointer_move(location.position);
            }
            InputEvent::PointerUp {
                button: PointerButton::Primary,
                ..
            } => self.pointer_up(),
            InputEvent::KeyDown {
                key: Key::Delete | Key::Backspace,
                ..
            } => {
                self.delete_selected();
            }
            _ => {}
        }
    }

    // Output ----------------------------------------------------------------

    /// Flattens the current model. Never mutates the session.
    pub fn render(&self) -> RgbaImage {
        compositor::render(&self.face, self.layers.list(), &self.catalog, &self.config)
    }

    pub fn export_png(&self) -> Result<Vec<u8>> {
        export::encode_png(&self.render())
    }

    /// PNG at `pixel_ratio` times the logical canvas size.
    pub fn export_png_scaled(&self, pixel_ratio: f32) -> Result<Vec<u8>> {
        export::encode_png(&export::scale_for_pixel_ratio(&self.render(), pixel_ratio)?)
    }

    /// Current render, ready to upload as an egui texture.
    pub fn color_image(&self) -> egui::ColorImage {
        export::to_color_image(&self.render())
    }

    // Lifecycle -------------------------------------------------------------

    /// Back to the default face with no accessories. Layer ids keep counting up.
    pub fn reset(&mut self) {
        info!("Resetting session");
        self.tool.cancel();
        self.face.reset();
        self.layers.clear();
        self.dirty = true;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            face: self.face.clone(),
            layers: self.layers.list().to_vec(),
            selected: self.layers.selected(),
            next_layer_id: self.layers.next_id(),
            next_z_index: self.layers.next_z(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Replaces the face and layers with a snapshot's. On error the session is
    /// left untouched.
    pub fn restore(&mut self, snapshot: SessionSnapshot) -> Result<()> {
        if snapshot.version != env!("CARGO_PKG_VERSION") {
            warn!(
                "Restoring snapshot from version {} into {}",
                snapshot.version,
                env!("CARGO_PKG_VERSION")
            );
        }
        self.check_snapshot_assets(&snapshot)?;
        let layers = LayerStore::from_parts(
            snapshot.layers,
            snapshot.selected,
            snapshot.next_layer_id,
            snapshot.next_z_index,
            self.config.canvas.center(),
            self.config.min_scale,
        )?;
        self.tool.cancel();
        self.layers = layers;
        self.face = snapshot.face;
        self.dirty = true;
        Ok(())
    }

    /// Every asset a snapshot names must exist in the catalog with the kind
    /// its slot expects.
    fn check_snapshot_assets(&self, snapshot: &SessionSnapshot) -> Result<()> {
        let face = &snapshot.face;
        let face_slots = [
            (Some(face.eyes_sprite()), AssetKind::Eyes),
            (Some(face.mouth_sprite()), AssetKind::Mouth),
            (face.background_image(), AssetKind::Background),
        ];
        let layer_slots = snapshot
            .layers
            .iter()
            .map(|layer| (Some(layer.asset()), AssetKind::Accessory));

        for (asset, kind) in face_slots.into_iter().chain(layer_slots) {
            if let Some(asset) = asset {
                self.catalog
                    .require(asset, kind)
                    .map_err(|err| ComposerError::InvalidSnapshot(err.to_string()))?;
            }
        }
        Ok(())
    }
}

/// Bus subscriber forwarding commands into a session.
struct SessionHandler {
    session: Weak<RefCell<Session>>,
}

impl CommandHandler for SessionHandler {
    fn handle_command(&mut self, command: &AccessoryCommand) {
        let Some(session) = self.session.upgrade() else {
            debug!("Session gone, ignoring {}", command.name());
            return;
        };
        match session.try_borrow_mut() {
            Ok(mut session) => session.apply_command(command),
            Err(_) => warn!("Session busy, dropping {}", command.name()),
        };
    }
}

/// Serializable copy of a session's model, for local save/restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub face: FaceState,
    pub layers: Vec<AccessoryLayer>,
    pub selected: Option<LayerId>,
    pub next_layer_id: u64,
    pub next_z_index: u64,
    pub version: String,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn session() -> Session {
        let mut catalog = AssetCatalog::new();
        catalog.insert("eyes/000", AssetKind::Eyes, RgbaImage::new(8, 8));
        catalog.insert("mouths/000", AssetKind::Mouth, RgbaImage::new(8, 8));
        catalog.insert(
            "accessories/hat",
            AssetKind::Accessory,
            RgbaImage::from_pixel(20, 10, Rgba([0, 0, 0, 255])),
        );
        let config = ComposerConfig {
            canvas: crate::config::CanvasConfig {
                width: 64,
                height: 64,
            },
            ..ComposerConfig::default()
        };
        Session::new(config, catalog).unwrap()
    }

    #[test]
    fn test_dirty_flag() {
        let mut session = session();
        assert!(session.take_dirty());
        assert!(!session.take_dirty());

        session.set_fill_color(Color32::RED);
        assert!(session.take_dirty());

        // Rendering is a pure read
        let _ = session.render();
        assert!(!session.is_dirty());

        // Nothing selected, nothing deleted
        session.apply_command(&AccessoryCommand::DeleteSelected);
        assert!(!session.take_dirty());
    }

    #[test]
    fn test_setters_validate_kind() {
        let mut session = session();
        assert!(matches!(
            session.set_eyes_sprite("mouths/000".into()),
            Err(ComposerError::WrongAssetKind { .. })
        ));
        assert_eq!(session.face().eyes_sprite().as_str(), "eyes/000");
        assert!(session.set_background_image(None).is_ok());
        assert!(session.set_background_image(Some("backgrounds/none".into())).is_err());
    }

    #[test]
    fn test_keyboard_delete() {
        let mut session = session();
        session.add_accessory(&"accessories/hat".into()).unwrap();
        session.handle_input(&InputEvent::KeyDown {
            key: Key::Delete,
            modifiers: egui::Modifiers::NONE,
        });
        assert!(session.layers().is_empty());
    }

    fn at(x: f32, y: f32) -> crate::input::InputLocation {
        crate::input::InputLocation {
            position: Pos2::new(x, y),
            is_in_canvas: (0.0..64.0).contains(&x) && (0.0..64.0).contains(&y),
        }
    }

    fn drag_move(x: f32, y: f32, held: bool) -> InputEvent {
        InputEvent::PointerMove {
            location: at(x, y),
            held_buttons: if held {
                vec![PointerButton::Primary]
            } else {
                Vec::new()
            },
        }
    }

    #[test]
    fn test_input_drag_ends_on_release_outside_canvas() {
        let mut session = session();
        let id = session.add_accessory(&"accessories/hat".into()).unwrap();

        session.handle_input(&InputEvent::PointerDown {
            location: at(32.0, 32.0),
            button: PointerButton::Primary,
        });
        session.handle_input(&drag_move(40.0, 30.0, true));
        session.handle_input(&drag_move(80.0, 10.0, true));
        assert_eq!(
            session.layers().get(id).unwrap().transform().position,
            Pos2::new(80.0, 10.0)
        );

        session.handle_input(&InputEvent::PointerUp {
            location: at(80.0, 10.0),
            button: PointerButton::Primary,
        });
        assert!(session.tool().is_idle());

        session.handle_input(&drag_move(20.0, 20.0, false));
        assert_eq!(
            session.layers().get(id).unwrap().transform().position,
            Pos2::new(80.0, 10.0)
        );
    }

    #[test]
    fn test_hover_without_button_ends_gesture() {
        let mut session = session();
        let id = session.add_accessory(&"accessories/hat".into()).unwrap();

        session.handle_input(&InputEvent::PointerDown {
            location: at(32.0, 32.0),
            button: PointerButton::Primary,
        });
        assert!(!session.tool().is_idle());

        // Release never arrived; the next move has no buttons held
        session.handle_input(&drag_move(50.0, 5.0, false));
        assert!(session.tool().is_idle());
        assert_eq!(
            session.layers().get(id).unwrap().transform().position,
            Pos2::new(32.0, 32.0)
        );
    }

    #[test]
    fn test_secondary_button_does_not_start_gesture() {
        let mut session = session();
        session.add_accessory(&"accessories/hat".into()).unwrap();
        session.handle_input(&InputEvent::PointerDown {
            location: at(32.0, 32.0),
            button: PointerButton::Secondary,
        });
        assert!(session.tool().is_idle());
    }

    #[test]
    fn test_restore_checks_asset_kinds() {
        let mut session = session();
        session.add_accessory(&"accessories/hat".into()).unwrap();

        let mut wrong_eyes = session.snapshot();
        wrong_eyes.face.set_eyes_sprite("accessories/hat".into());
        assert!(matches!(
            session.restore(wrong_eyes),
            Err(ComposerError::InvalidSnapshot(_))
        ));

        let mut unknown_background = session.snapshot();
        unknown_background
            .face
            .set_background_image(Some("backgrounds/gone".into()));
        assert!(session.restore(unknown_background).is_err());

        let mut wrong_layer = session.snapshot();
        wrong_layer.layers[0] = AccessoryLayer::new(
            LayerId(1),
            "mouths/000".into(),
            egui::Vec2::splat(8.0),
            crate::layer::Transform::default(),
            0,
        );
        assert!(session.restore(wrong_layer).is_err());

        assert_eq!(session.face().eyes_sprite().as_str(), "eyes/000");
        assert_eq!(session.layers().list()[0].asset().as_str(), "accessories/hat");
        assert!(session.restore(session.snapshot()).is_ok());
    }

    #[test]
    fn test_restore_rejects_exhausted_counters() {
        let mut session = session();
        let mut snapshot = session.snapshot();
        snapshot.next_layer_id = u64::MAX;
        assert!(session.restore(snapshot).is_err());
        assert!(session.add_accessory(&"accessories/hat".into()).is_ok());
    }

    #[test]
    fn test_reset_keeps_counting() {
        let mut session = session();
        session.add_accessory(&"accessories/hat".into()).unwrap();
        session.set_fill_color(Color32::RED);
        session.reset();

        assert!(session.layers().is_empty());
        assert_eq!(session.face(), &FaceState::default());
        assert_eq!(
            session.add_accessory(&"accessories/hat".into()).unwrap(),
            LayerId(2)
        );
    }
}

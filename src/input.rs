use egui::emath::RectTransform;
use egui::{Context, Key, Modifiers, PointerButton, Pos2, Rect, Vec2};

/// Where a pointer event happened, already in canvas logical coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputLocation {
    /// Position in canvas coordinates (may lie outside the canvas)
    pub position: Pos2,
    /// Whether this position is within the canvas bounds
    pub is_in_canvas: bool,
}

/// Input the interaction controller understands.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    PointerDown {
        location: InputLocation,
        button: PointerButton,
    },
    PointerUp {
        location: InputLocation,
        button: PointerButton,
    },
    PointerMove {
        location: InputLocation,
        /// Buttons that are currently held down
        held_buttons: Vec<PointerButton>,
    },
    /// Pointer left the window. Gestures keep going until the button is released.
    PointerLeave { last_known_location: InputLocation },
    KeyDown { key: Key, modifiers: Modifiers },
}

impl InputEvent {
    /// Helper to check if an input event occurred within the canvas
    pub fn is_in_canvas(&self) -> bool {
        match self {
            InputEvent::PointerDown { location, .. }
            | InputEvent::PointerUp { location, .. }
            | InputEvent::PointerMove { location, .. } => location.is_in_canvas,
            InputEvent::PointerLeave {
                last_known_location,
            } => last_known_location.is_in_canvas,
            InputEvent::KeyDown { .. } => false,
        }
    }
}

/// Converts raw egui input into [`InputEvent`]s.
///
/// The canvas may be drawn at any size on screen; positions are mapped from
/// the on-screen rectangle onto the logical canvas so the model never sees
/// screen pixels or the device pixel ratio.
#[derive(Debug, Clone)]
pub struct InputHandler {
    last_pointer_pos: Option<Pos2>,
    to_canvas: RectTransform,
    canvas_size: Vec2,
}

impl InputHandler {
    pub fn new(screen_rect: Rect, canvas_size: Vec2) -> Self {
        Self {
            last_pointer_pos: None,
            to_canvas: Self::mapping(screen_rect, canvas_size),
            canvas_size,
        }
    }

    fn mapping(screen_rect: Rect, canvas_size: Vec2) -> RectTransform {
        RectTransform::from_to(screen_rect, Rect::from_min_size(Pos2::ZERO, canvas_size))
    }

    /// Update the on-screen canvas rectangle (e.g. if the window is resized)
    pub fn set_screen_rect(&mut self, rect: Rect) {
        self.to_canvas = Self::mapping(rect, self.canvas_size);
    }

    /// Maps a screen position onto the canvas
    pub fn make_location(&self, screen_pos: Pos2) -> InputLocation {
        let position = self.to_canvas.transform_pos(screen_pos);
        InputLocation {
            position,
            is_in_canvas: Rect::from_min_size(Pos2::ZERO, self.canvas_size).contains(position),
        }
    }

    /// Process this frame's egui input and generate our InputEvents
    pub fn process_input(&mut self, ctx: &Context) -> Vec<InputEvent> {
        let mut events = Vec::new();

        ctx.input(|input| {
            let hover = input.pointer.hover_pos();
            if let Some(pos) = hover {
                if Some(pos) != self.last_pointer_pos {
                    let held_buttons = [
                        PointerButton::Primary,
                        PointerButton::Secondary,
                        PointerButton::Middle,
                    ]
                    .into_iter()
                    .filter(|button| input.pointer.button_down(*button))
                    .collect();
                    events.push(InputEvent::PointerMove {
                        location: self.make_location(pos),
                        held_buttons,
                    });
                }
            } else if let Some(last) = self.last_pointer_pos {
                events.push(InputEvent::PointerLeave {
                    last_known_location: self.make_location(last),
                });
            }

            // Button transitions carry their own position, which is still known
            // when the release happens outside the window.
            for event in &input.raw.events {
                match event {
                    egui::Event::PointerButton {
                        pos,
                        button,
                        pressed,
                        ..
                    } => {
                        let location = self.make_location(*pos);
                        events.push(if *pressed {
                            InputEvent::PointerDown {
                                location,
                                button: *button,
                            }
                        } else {
                            InputEvent::PointerUp {
                                location,
                                button: *button,
                            }
                        });
                    }
                    egui::Event::Key {
                        key,
                        pressed: true,
                        modifiers,
                        ..
                    } => events.push(InputEvent::KeyDown {
                        key: *key,
                        modifiers: *modifiers,
                    }),
                    _ => {}
                }
            }

            self.last_pointer_pos = hover;
        });

        events
    }
}

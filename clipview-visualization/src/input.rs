//! Input events consumed by the viewport
//!
//! The viewport reacts to a small closed set of events. Windowing backends
//! translate their native events into [`InputEvent`]; [`WinitInputTranslator`]
//! does this for winit.

use clipview_core::Real;
use instant::Instant;
use nalgebra::Point2;
use std::time::Duration;
use winit::event::{ElementState, MouseScrollDelta, WindowEvent};
use winit::keyboard::{Key as WinitKey, NamedKey};

/// Wheel units per notch (eighths of a degree, as most toolkits report)
pub const WHEEL_UNITS_PER_LINE: Real = 120.0;

/// Keys the viewport cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// F1, F2, ...
    Function(u8),
    /// 0-9
    Digit(u8),
    /// Any other printable character, lowercased
    Char(char),
    Space,
    Escape,
}

/// Keyboard modifiers held during an event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
    };

    pub const ALT: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: true,
    };

    pub fn is_empty(&self) -> bool {
        *self == Self::NONE
    }
}

/// Mouse buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Viewport input event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyPress { key: Key, modifiers: Modifiers },
    MousePress { button: MouseButton, position: Point2<Real>, modifiers: Modifiers },
    MouseRelease { button: MouseButton },
    MouseMove { position: Point2<Real> },
    MouseDoubleClick { button: MouseButton, modifiers: Modifiers },
    /// Vertical wheel delta in wheel units; positive away from the user
    Wheel { delta: Real, modifiers: Modifiers },
}

impl InputEvent {
    /// Key press without modifiers
    pub fn key(key: Key) -> Self {
        InputEvent::KeyPress {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    /// Key press with modifiers
    pub fn key_with(key: Key, modifiers: Modifiers) -> Self {
        InputEvent::KeyPress { key, modifiers }
    }

    /// Wheel event without modifiers
    pub fn wheel(delta: Real) -> Self {
        InputEvent::Wheel {
            delta,
            modifiers: Modifiers::NONE,
        }
    }
}

/// Map a named winit key
pub fn translate_named_key(key: NamedKey) -> Option<Key> {
    let function = match key {
        NamedKey::Escape => return Some(Key::Escape),
        NamedKey::Space => return Some(Key::Space),
        NamedKey::F1 => 1,
        NamedKey::F2 => 2,
        NamedKey::F3 => 3,
        NamedKey::F4 => 4,
        NamedKey::F5 => 5,
        NamedKey::F6 => 6,
        NamedKey::F7 => 7,
        NamedKey::F8 => 8,
        NamedKey::F9 => 9,
        NamedKey::F10 => 10,
        NamedKey::F11 => 11,
        NamedKey::F12 => 12,
        _ => return None,
    };
    Some(Key::Function(function))
}

/// Map the text of a character key
pub fn translate_character(text: &str) -> Option<Key> {
    let mut chars = text.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    if c == ' ' {
        return Some(Key::Space);
    }
    match c.to_digit(10) {
        Some(d) => Some(Key::Digit(d as u8)),
        None => Some(Key::Char(c.to_ascii_lowercase())),
    }
}

/// Wheel delta in wheel units
pub fn wheel_delta(delta: MouseScrollDelta) -> Real {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => y as Real * WHEEL_UNITS_PER_LINE,
        MouseScrollDelta::PixelDelta(position) => position.y,
    }
}

fn translate_button(button: winit::event::MouseButton) -> Option<MouseButton> {
    match button {
        winit::event::MouseButton::Left => Some(MouseButton::Left),
        winit::event::MouseButton::Middle => Some(MouseButton::Middle),
        winit::event::MouseButton::Right => Some(MouseButton::Right),
        _ => None,
    }
}

/// Detects double clicks from press timing; winit only reports single presses.
#[derive(Debug, Clone)]
pub struct ClickTracker {
    interval: Duration,
    last: Option<(MouseButton, Instant)>,
}

impl ClickTracker {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// Register a press; true when it completes a double click
    pub fn register(&mut self, button: MouseButton, now: Instant) -> bool {
        match self.last {
            Some((previous, at)) if previous == button && now.duration_since(at) <= self.interval => {
                self.last = None;
                true
            }
            _ => {
                self.last = Some((button, now));
                false
            }
        }
    }
}

/// Translates winit window events into viewport input events
#[derive(Debug, Clone)]
pub struct WinitInputTranslator {
    modifiers: Modifiers,
    cursor: Point2<Real>,
    clicks: ClickTracker,
}

impl WinitInputTranslator {
    pub fn new(double_click_interval: Duration) -> Self {
        Self {
            modifiers: Modifiers::NONE,
            cursor: Point2::origin(),
            clicks: ClickTracker::new(double_click_interval),
        }
    }

    /// Translate one window event. A press that completes a double click
    /// yields the double-click event instead of a second press.
    pub fn translate(&mut self, event: &WindowEvent) -> Option<InputEvent> {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                let state = modifiers.state();
                self.modifiers = Modifiers {
                    shift: state.shift_key(),
                    ctrl: state.control_key(),
                    alt: state.alt_key(),
                };
                None
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return None;
                }
                let key = match &event.logical_key {
                    WinitKey::Named(named) => translate_named_key(*named),
                    WinitKey::Character(text) => translate_character(text.as_str()),
                    _ => None,
                }?;
                Some(InputEvent::KeyPress {
                    key,
                    modifiers: self.modifiers,
                })
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = Point2::new(position.x, position.y);
                Some(InputEvent::MouseMove { position: self.cursor })
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let button = translate_button(*button)?;
                match state {
                    ElementState::Pressed => {
                        if self.clicks.register(button, Instant::now()) {
                            Some(InputEvent::MouseDoubleClick {
                                button,
                                modifiers: self.modifiers,
                            })
                        } else {
                            Some(InputEvent::MousePress {
                                button,
                                position: self.cursor,
                                modifiers: self.modifiers,
                            })
                        }
                    }
                    ElementState::Released => Some(InputEvent::MouseRelease { button }),
                }
            }
            WindowEvent::MouseWheel { delta, .. } => Some(InputEvent::Wheel {
                delta: wheel_delta(*delta),
                modifiers: self.modifiers,
            }),
            _ => None,
        }
    }
}

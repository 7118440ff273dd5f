//! Input state management for mouse and keyboard events.

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Key names as delivered by the host, following DOM `KeyboardEvent.key`.
pub mod keys {
    pub const ESCAPE: &str = "Escape";
    pub const DELETE: &str = "Delete";
    pub const BACKSPACE: &str = "Backspace";
    pub const ENTER: &str = "Enter";
    pub const SPACE: &str = " ";
    pub const SHIFT: &str = "Shift";
    pub const CONTROL: &str = "Control";
    pub const META: &str = "Meta";
}

/// Session command reachable from the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Undo,
    Redo,
    Cancel,
    DeleteSelection,
    ClosePolygon,
}

impl KeyAction {
    pub fn description(self) -> &'static str {
        match self {
            KeyAction::Undo => "Undo",
            KeyAction::Redo => "Redo",
            KeyAction::Cancel => "Cancel placement or clear selection",
            KeyAction::DeleteSelection => "Delete selected element",
            KeyAction::ClosePolygon => "Close polygon",
        }
    }

    /// First binding in [`KEY_BINDINGS`] matching the key and modifiers.
    pub fn lookup(key: &str, modifiers: Modifiers) -> Option<KeyAction> {
        KEY_BINDINGS
            .iter()
            .find(|binding| binding.matches(key, modifiers))
            .map(|binding| binding.action)
    }
}

/// A key with its required modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub key: &'static str,
    /// Ctrl, or Cmd on macOS.
    pub command: bool,
    pub shift: bool,
    pub action: KeyAction,
}

impl KeyBinding {
    const fn new(key: &'static str, command: bool, shift: bool, action: KeyAction) -> Self {
        Self {
            key,
            command,
            shift,
            action,
        }
    }

    /// Letter keys compare case-insensitively. Shift is only checked when
    /// the binding requires it, so more specific bindings come first.
    pub fn matches(&self, key: &str, modifiers: Modifiers) -> bool {
        self.command == modifiers.command() && (!self.shift || modifiers.shift) && key.eq_ignore_ascii_case(self.key)
    }
}

/// Every keyboard binding a session dispatches, in match order.
pub const KEY_BINDINGS: &[KeyBinding] = &[
    KeyBinding::new("Z", true, true, KeyAction::Redo),
    KeyBinding::new("Z", true, false, KeyAction::Undo),
    KeyBinding::new("Y", true, false, KeyAction::Redo),
    KeyBinding::new(keys::ESCAPE, false, false, KeyAction::Cancel),
    KeyBinding::new(keys::DELETE, false, false, KeyAction::DeleteSelection),
    KeyBinding::new(keys::BACKSPACE, false, false, KeyAction::DeleteSelection),
    KeyBinding::new(keys::ENTER, false, false, KeyAction::ClosePolygon),
];

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        meta: false,
    };

    /// Ctrl on most platforms, Cmd on macOS.
    pub fn command(&self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer event in screen coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down {
        position: Point,
        button: MouseButton,
    },
    Up {
        position: Point,
        button: MouseButton,
    },
    Move {
        position: Point,
    },
    /// Wheel input. Positive `delta.y` scrolls down.
    Scroll {
        position: Point,
        delta: Vec2,
    },
}

impl PointerEvent {
    pub fn position(&self) -> Point {
        match self {
            PointerEvent::Down { position, .. }
            | PointerEvent::Up { position, .. }
            | PointerEvent::Move { position }
            | PointerEvent::Scroll { position, .. } => *position,
        }
    }
}

/// Keyboard event type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

/// Tracks the current input state across events.
#[derive(Debug, Clone, Default)]
pub struct InputState {
    /// Current pointer position in screen coordinates.
    pub pointer_position: Point,
    /// Current modifier keys state.
    pub modifiers: Modifiers,
    pressed_keys: HashSet<String>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a pointer event.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent) {
        self.pointer_position = event.position();
    }

    /// Process a key event. Modifier key names also update [`Modifiers`].
    pub fn handle_key_event(&mut self, event: &KeyEvent) {
        let (key, down) = match event {
            KeyEvent::Pressed(key) => (key.as_str(), true),
            KeyEvent::Released(key) => (key.as_str(), false),
        };
        match key {
            keys::SHIFT => self.modifiers.shift = down,
            keys::CONTROL => self.modifiers.ctrl = down,
            keys::META => self.modifiers.meta = down,
            _ => {}
        }
        if down {
            self.pressed_keys.insert(key.to_string());
        } else {
            self.pressed_keys.remove(key);
        }
    }

    /// Update modifier keys state.
    pub fn set_modifiers(&mut self, modifiers: Modifiers) {
        self.modifiers = modifiers;
    }

    pub fn is_key_pressed(&self, key: &str) -> bool {
        self.pressed_keys.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_position_follows_events() {
        let mut input = InputState::new();
        input.handle_pointer_event(&PointerEvent::Down {
            position: Point::new(100.0, 100.0),
            button: MouseButton::Left,
        });
        input.handle_pointer_event(&PointerEvent::Move {
            position: Point::new(150.0, 120.0),
        });
        assert_eq!(input.pointer_position, Point::new(150.0, 120.0));
    }

    #[test]
    fn test_modifier_keys_tracked() {
        let mut input = InputState::new();
        input.handle_key_event(&KeyEvent::Pressed(keys::SHIFT.to_string()));
        assert!(input.modifiers.shift);
        input.handle_key_event(&KeyEvent::Pressed(keys::META.to_string()));
        assert!(input.modifiers.command());
        input.handle_key_event(&KeyEvent::Released(keys::SHIFT.to_string()));
        assert!(!input.modifiers.shift);
        assert!(input.is_key_pressed(keys::META));
    }

    #[test]
    fn test_key_press() {
        let mut input = InputState::new();
        input.handle_key_event(&KeyEvent::Pressed("a".to_string()));
        assert!(input.is_key_pressed("a"));
        input.handle_key_event(&KeyEvent::Released("a".to_string()));
        assert!(!input.is_key_pressed("a"));
    }

    #[test]
    fn test_key_lookup() {
        let ctrl = Modifiers {
            ctrl: true,
            ..Modifiers::NONE
        };
        let ctrl_shift = Modifiers { shift: true, ..ctrl };
        let cmd = Modifiers {
            meta: true,
            ..Modifiers::NONE
        };
        assert_eq!(KeyAction::lookup("z", ctrl), Some(KeyAction::Undo));
        assert_eq!(KeyAction::lookup("z", cmd), Some(KeyAction::Undo));
        assert_eq!(KeyAction::lookup("Z", ctrl_shift), Some(KeyAction::Redo));
        assert_eq!(KeyAction::lookup("y", ctrl_shift), Some(KeyAction::Redo));
        assert_eq!(KeyAction::lookup("z", Modifiers::NONE), None);
        assert_eq!(KeyAction::lookup(keys::ESCAPE, ctrl), None);
        assert_eq!(KeyAction::lookup(keys::BACKSPACE, Modifiers::NONE), Some(KeyAction::DeleteSelection));
        assert_eq!(
            KeyAction::lookup(keys::ENTER, Modifiers { shift: true, ..Modifiers::NONE }),
            Some(KeyAction::ClosePolygon)
        );
    }

    #[test]
    fn test_every_binding_reaches_its_action() {
        for binding in KEY_BINDINGS {
            let modifiers = Modifiers {
                ctrl: binding.command,
                shift: binding.shift,
                ..Modifiers::NONE
            };
            assert_eq!(KeyAction::lookup(binding.key, modifiers), Some(binding.action), "{binding:?}");
        }
    }
}

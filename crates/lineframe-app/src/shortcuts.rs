//! Keyboard shortcut registry and documentation.

use lineframe_core::{KEY_BINDINGS, KeyBinding};

/// A keyboard shortcut definition.
#[derive(Debug, Clone)]
pub struct Shortcut {
    pub key: &'static str,
    pub ctrl: bool,
    pub shift: bool,
    pub description: &'static str,
}

impl Shortcut {
    pub const fn new(key: &'static str, ctrl: bool, shift: bool, description: &'static str) -> Self {
        Self {
            key,
            ctrl,
            shift,
            description,
        }
    }

    fn from_binding(binding: &KeyBinding) -> Self {
        Self::new(binding.key, binding.command, binding.shift, binding.action.description())
    }

    /// Format the shortcut for display (e.g., "Ctrl+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.shift {
            parts.push("Shift");
        }
        parts.push(self.key);
        parts.join("+")
    }
}

/// Registry of the keyboard and pointer bindings a session understands.
pub struct ShortcutRegistry;

impl ShortcutRegistry {
    /// Pointer gestures handled outside the key table.
    const POINTER: [Shortcut; 4] = [
        Shortcut::new("Click", false, true, "Constrain to 45 degree steps"),
        Shortcut::new("Space+Drag", false, false, "Pan view"),
        Shortcut::new("Middle Drag", false, false, "Pan view"),
        Shortcut::new("Wheel", false, false, "Zoom at cursor"),
    ];

    pub fn all() -> Vec<Shortcut> {
        KEY_BINDINGS
            .iter()
            .map(Shortcut::from_binding)
            .chain(Self::POINTER)
            .collect()
    }

    /// Render the shortcut table.
    pub fn describe() -> String {
        let mut out = String::from("Keyboard and pointer bindings:\n");
        for shortcut in Self::all() {
            out.push_str(&format!("  {:20} {}\n", shortcut.format(), shortcut.description));
        }
        out
    }
}

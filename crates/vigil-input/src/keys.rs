//! Key model for shortcut interdiction.
//!
//! OS key events are normalized into a small alphabet: left/right modifier
//! variants collapse to one logical modifier, letters fold to lowercase, and
//! keys the blocked-combination table never mentions map to `None`.

use rdev::Key;

/// Normalized key identity used in held-key tracking and combo matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotKey {
    Ctrl,
    Alt,
    Shift,
    Meta,
    Tab,
    F4,
    Char(char),
}

/// Map a raw key event to its normalized identity, or `None` when the key
/// cannot participate in any blocked combination.
pub fn normalize(key: Key) -> Option<HotKey> {
    match key {
        Key::ControlLeft | Key::ControlRight => Some(HotKey::Ctrl),
        Key::Alt | Key::AltGr => Some(HotKey::Alt),
        Key::ShiftLeft | Key::ShiftRight => Some(HotKey::Shift),
        Key::MetaLeft | Key::MetaRight => Some(HotKey::Meta),
        Key::Tab => Some(HotKey::Tab),
        Key::F4 => Some(HotKey::F4),
        Key::KeyA => Some(HotKey::Char('a')),
        Key::KeyC => Some(HotKey::Char('c')),
        Key::KeyV => Some(HotKey::Char('v')),
        Key::KeyX => Some(HotKey::Char('x')),
        _ => None,
    }
}

/// A shortcut the session refuses to let through to the examinee's desktop.
#[derive(Debug, Clone, Copy)]
pub struct BlockedCombo {
    pub keys: &'static [HotKey],
    pub label: &'static str,
}

/// Shortcuts suppressed while interdiction is enabled.
pub const BLOCKED_COMBOS: &[BlockedCombo] = &[
    BlockedCombo { keys: &[HotKey::Ctrl, HotKey::Char('c')], label: "Ctrl+C" },
    BlockedCombo { keys: &[HotKey::Ctrl, HotKey::Char('v')], label: "Ctrl+V" },
    BlockedCombo { keys: &[HotKey::Ctrl, HotKey::Char('x')], label: "Ctrl+X" },
    BlockedCombo { keys: &[HotKey::Ctrl, HotKey::Char('a')], label: "Ctrl+A" },
    BlockedCombo { keys: &[HotKey::Alt, HotKey::Tab], label: "Alt+Tab" },
    BlockedCombo { keys: &[HotKey::Alt, HotKey::F4], label: "Alt+F4" },
];

#![forbid(unsafe_code)]

//! Input the render loop understands.
//!
//! A backend turns whatever its terminal library reports into an [`Event`]:
//! keys, size changes and window focus. Keys arrive as [`KeyEvent`]s that
//! are routed to the focused control, then to global key handlers, then to
//! Tab traversal.
//!
//! Backends fold Shift+Tab into [`KeyCode::BackTab`]. Terminals that cannot
//! tell presses from repeats report [`KeyEventKind::Press`]. Releases are
//! carried through but never reach a control.

use bitflags::bitflags;

/// One unit of terminal input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Key(KeyEvent),

    /// The terminal now has this many columns and rows.
    Resize { width: u16, height: u16 },

    /// The terminal window gained (`true`) or lost focus.
    Focus(bool),
}

/// A key with its modifiers and press/release phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// A plain press of `code`.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Whether this is the character `c`, whatever the modifiers.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }

    #[must_use]
    pub const fn alt(&self) -> bool {
        self.modifiers.contains(Modifiers::ALT)
    }

    #[must_use]
    pub const fn shift(&self) -> bool {
        self.modifiers.contains(Modifiers::SHIFT)
    }

    /// Release events are never routed to controls.
    #[must_use]
    pub const fn is_release(&self) -> bool {
        matches!(self.kind, KeyEventKind::Release)
    }
}

impl From<KeyCode> for KeyEvent {
    fn from(code: KeyCode) -> Self {
        Self::new(code)
    }
}

/// Keys a control can react to. Anything else is dropped by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    /// Shift+Tab.
    BackTab,
    Delete,
    Insert,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    /// `F(1)` through `F(24)`.
    F(u8),
}

/// Phase of a key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    #[default]
    Press,
    /// Auto-repeat while held.
    Repeat,
    Release,
}

bitflags! {
    /// Held modifier keys.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const NONE  = 0b0000;
        const SHIFT = 0b0001;
        /// Alt, or Option on macOS.
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        /// Super, Meta or Command.
        const SUPER = 0b1000;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_event_defaults_to_press_without_modifiers() {
        let event = KeyEvent::new(KeyCode::Char('a'));
        assert_eq!(event.kind, KeyEventKind::Press);
        assert_eq!(event.modifiers, Modifiers::NONE);
        assert!(event.is_char('a'));
        assert!(!event.is_char('b'));
    }

    #[test]
    fn modifier_queries() {
        let event = KeyEvent::new(KeyCode::Char('c')).with_modifiers(Modifiers::CTRL | Modifiers::SHIFT);
        assert!(event.ctrl());
        assert!(event.shift());
        assert!(!event.alt());
    }

    #[test]
    fn release_detection() {
        let event = KeyEvent::new(KeyCode::Enter).with_kind(KeyEventKind::Release);
        assert!(event.is_release());
        assert!(!KeyEvent::new(KeyCode::Enter).is_release());
    }

    #[test]
    fn from_key_code() {
        let event: KeyEvent = KeyCode::Tab.into();
        assert_eq!(event.code, KeyCode::Tab);
    }
}

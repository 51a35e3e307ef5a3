//! Input event types wrapping crossterm for decoupling.
//!
//! Defines [`InputEvent`], [`KeyEvent`], [`MouseEvent`] and supporting types.
//! Crossterm events are converted with [`from_crossterm`] so the rest of the
//! toolkit never depends on crossterm directly.

use std::fmt;

use bitflags::bitflags;

use crate::geometry::Offset;

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// Keyboard key, decoupled from crossterm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Escape,
    Tab,
    BackTab,
    Backspace,
    Delete,
    Insert,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    PageUp,
    PageDown,
    F(u8),
}

const KEY_NAMES: &[(&str, Key)] = &[
    ("Return", Key::Enter),
    ("Escape", Key::Escape),
    ("Tab", Key::Tab),
    ("ISO_Left_Tab", Key::BackTab),
    ("BackSpace", Key::Backspace),
    ("Delete", Key::Delete),
    ("Insert", Key::Insert),
    ("Left", Key::Left),
    ("Right", Key::Right),
    ("Up", Key::Up),
    ("Down", Key::Down),
    ("Home", Key::Home),
    ("End", Key::End),
    ("Page_Up", Key::PageUp),
    ("Page_Down", Key::PageDown),
    ("space", Key::Char(' ')),
    ("less", Key::Char('<')),
    ("greater", Key::Char('>')),
];

impl Key {
    /// Resolve a key name as written in accelerator strings: a single
    /// character, `F1`..`F24`, or a named key (`Return`, `Escape`,
    /// `Page_Up`, ...). Named keys are case-insensitive; `Enter` and `Esc`
    /// are accepted as aliases.
    pub fn from_name(name: &str) -> Option<Key> {
        let mut chars = name.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Some(Key::Char(c));
        }
        if let Some(n) = name.strip_prefix(['F', 'f']).and_then(|n| n.parse::<u8>().ok()) {
            return (1..=24).contains(&n).then_some(Key::F(n));
        }
        match name.to_ascii_lowercase().as_str() {
            "enter" => return Some(Key::Enter),
            "esc" => return Some(Key::Escape),
            _ => {}
        }
        KEY_NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, k)| *k)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Named first, so `<`, `>` and space never appear bare.
        if let Some((name, _)) = KEY_NAMES.iter().find(|(_, k)| k == self) {
            return f.write_str(name);
        }
        match self {
            Key::Char(c) => write!(f, "{c}"),
            Key::F(n) => write!(f, "F{n}"),
            _ => f.write_str("Escape"),
        }
    }
}

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

bitflags! {
    /// Modifier key bitmask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
    }
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers::empty();
}

// ---------------------------------------------------------------------------
// KeyEvent
// ---------------------------------------------------------------------------

/// A keyboard event with key and modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(code: Key, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    /// Modifiers that matter for matching: Shift is dropped for printable
    /// characters, since it is already reflected in the character itself.
    pub fn significant_modifiers(&self) -> Modifiers {
        match self.code {
            Key::Char(_) => self.modifiers - Modifiers::SHIFT,
            _ => self.modifiers,
        }
    }
}

// ---------------------------------------------------------------------------
// MouseBtn / MouseAction / MouseEvent
// ---------------------------------------------------------------------------

/// Mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseBtn {
    Left,
    Right,
    Middle,
}

/// Mouse action kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseAction {
    Down(MouseBtn),
    Up(MouseBtn),
    Drag(MouseBtn),
    Moved,
    ScrollUp,
    ScrollDown,
}

/// A mouse event with action, position, and modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MouseEvent {
    pub kind: MouseAction,
    pub x: u16,
    pub y: u16,
    pub modifiers: Modifiers,
}

impl MouseEvent {
    pub fn new(kind: MouseAction, x: u16, y: u16) -> Self {
        Self {
            kind,
            x,
            y,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn position(&self) -> Offset {
        Offset::new(i32::from(self.x), i32::from(self.y))
    }
}

// ---------------------------------------------------------------------------
// InputEvent
// ---------------------------------------------------------------------------

/// Top-level input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize { width: u16, height: u16 },
    FocusGained,
    FocusLost,
    Paste(String),
}

impl InputEvent {
    /// Shorthand for a key event.
    pub fn key(code: Key, modifiers: Modifiers) -> Self {
        InputEvent::Key(KeyEvent::new(code, modifiers))
    }

    /// Shorthand for an unmodified mouse event.
    pub fn mouse(kind: MouseAction, x: u16, y: u16) -> Self {
        InputEvent::Mouse(MouseEvent::new(kind, x, y))
    }

    pub fn as_key(&self) -> Option<&KeyEvent> {
        match self {
            InputEvent::Key(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_mouse(&self) -> Option<&MouseEvent> {
        match self {
            InputEvent::Mouse(m) => Some(m),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// crossterm conversions
// ---------------------------------------------------------------------------

fn convert_modifiers(m: crossterm::event::KeyModifiers) -> Modifiers {
    use crossterm::event::KeyModifiers;

    let mut out = Modifiers::NONE;
    out.set(Modifiers::SHIFT, m.contains(KeyModifiers::SHIFT));
    out.set(Modifiers::CTRL, m.contains(KeyModifiers::CONTROL));
    out.set(Modifiers::ALT, m.contains(KeyModifiers::ALT));
    out
}

fn convert_key_code(code: crossterm::event::KeyCode) -> Option<Key> {
    use crossterm::event::KeyCode;

    let key = match code {
        KeyCode::Char(c) => Key::Char(c),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Tab => Key::Tab,
        KeyCode::BackTab => Key::BackTab,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Insert => Key::Insert,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::PageUp => Key::PageUp,
        KeyCode::PageDown => Key::PageDown,
        KeyCode::F(n) => Key::F(n),
        _ => return None,
    };
    Some(key)
}

fn convert_mouse_button(b: crossterm::event::MouseButton) -> MouseBtn {
    use crossterm::event::MouseButton;

    match b {
        MouseButton::Left => MouseBtn::Left,
        MouseButton::Right => MouseBtn::Right,
        MouseButton::Middle => MouseBtn::Middle,
    }
}

/// Convert a crossterm `Event` into an [`InputEvent`].
///
/// Returns `None` for key releases and repeats, unsupported key codes and
/// horizontal scrolling.
pub fn from_crossterm(event: crossterm::event::Event) -> Option<InputEvent> {
    use crossterm::event::{Event, KeyEventKind, MouseEventKind};

    let converted = match event {
        Event::Key(ke) => {
            if ke.kind != KeyEventKind::Press {
                return None;
            }
            InputEvent::Key(KeyEvent::new(convert_key_code(ke.code)?, convert_modifiers(ke.modifiers)))
        }
        Event::Mouse(me) => {
            let kind = match me.kind {
                MouseEventKind::Down(b) => MouseAction::Down(convert_mouse_button(b)),
                MouseEventKind::Up(b) => MouseAction::Up(convert_mouse_button(b)),
                MouseEventKind::Drag(b) => MouseAction::Drag(convert_mouse_button(b)),
                MouseEventKind::Moved => MouseAction::Moved,
                MouseEventKind::ScrollUp => MouseAction::ScrollUp,
                MouseEventKind::ScrollDown => MouseAction::ScrollDown,
                _ => return None,
            };
            InputEvent::Mouse(MouseEvent {
                kind,
                x: me.column,
                y: me.row,
                modifiers: convert_modifiers(me.modifiers),
            })
        }
        Event::Resize(width, height) => InputEvent::Resize { width, height },
        Event::FocusGained => InputEvent::FocusGained,
        Event::FocusLost => InputEvent::FocusLost,
        Event::Paste(s) => InputEvent::Paste(s),
    };
    Some(converted)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{
        Event, KeyCode, KeyEventKind, KeyEventState, KeyModifiers, MouseButton, MouseEventKind,
    };

    fn ct_key(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(crossterm::event::KeyEvent::new(code, modifiers))
    }

    // ── Modifiers ────────────────────────────────────────────────────

    #[test]
    fn modifiers_combine() {
        let mods = Modifiers::CTRL | Modifiers::ALT;
        assert!(mods.contains(Modifiers::CTRL));
        assert!(!mods.contains(Modifiers::SHIFT));
        assert!(Modifiers::NONE.is_empty());
    }

    #[test]
    fn shift_is_insignificant_for_chars() {
        let upper = KeyEvent::new(Key::Char('A'), Modifiers::SHIFT | Modifiers::CTRL);
        assert_eq!(upper.significant_modifiers(), Modifiers::CTRL);
        let tab = KeyEvent::new(Key::Tab, Modifiers::SHIFT);
        assert_eq!(tab.significant_modifiers(), Modifiers::SHIFT);
    }

    // ── Key names ────────────────────────────────────────────────────

    #[test]
    fn key_names_resolve() {
        assert_eq!(Key::from_name("q"), Some(Key::Char('q')));
        assert_eq!(Key::from_name("F5"), Some(Key::F(5)));
        assert_eq!(Key::from_name("return"), Some(Key::Enter));
        assert_eq!(Key::from_name("Esc"), Some(Key::Escape));
        assert_eq!(Key::from_name("Page_Down"), Some(Key::PageDown));
        assert_eq!(Key::from_name("F99"), None);
        assert_eq!(Key::from_name("Hyper"), None);
    }

    #[test]
    fn key_display_round_trips() {
        for key in [Key::Char('x'), Key::F(12), Key::Enter, Key::PageUp, Key::Char(' ')] {
            assert_eq!(Key::from_name(&key.to_string()), Some(key));
        }
        assert_eq!(Key::Char('<').to_string(), "less");
        assert_eq!(Key::Char('>').to_string(), "greater");
        assert_eq!(Key::from_name("greater"), Some(Key::Char('>')));
    }

    // ── crossterm ────────────────────────────────────────────────────

    #[test]
    fn converts_key_with_modifiers() {
        let event = from_crossterm(ct_key(KeyCode::Char('c'), KeyModifiers::CONTROL)).unwrap();
        assert_eq!(event, InputEvent::key(Key::Char('c'), Modifiers::CTRL));

        let event = from_crossterm(ct_key(KeyCode::BackTab, KeyModifiers::SHIFT)).unwrap();
        assert_eq!(event, InputEvent::key(Key::BackTab, Modifiers::SHIFT));
    }

    #[test]
    fn drops_releases_and_unknown_keys() {
        let release = crossterm::event::KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert_eq!(from_crossterm(Event::Key(release)), None);
        assert_eq!(from_crossterm(ct_key(KeyCode::CapsLock, KeyModifiers::NONE)), None);
    }

    #[test]
    fn converts_mouse() {
        let me = crossterm::event::MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 4,
            row: 2,
            modifiers: KeyModifiers::NONE,
        };
        let event = from_crossterm(Event::Mouse(me)).unwrap();
        assert_eq!(event, InputEvent::mouse(MouseAction::Down(MouseBtn::Left), 4, 2));
        assert_eq!(event.as_mouse().unwrap().position(), Offset::new(4, 2));
    }

    #[test]
    fn converts_resize_and_paste() {
        assert_eq!(
            from_crossterm(Event::Resize(80, 24)),
            Some(InputEvent::Resize { width: 80, height: 24 })
        );
        assert_eq!(
            from_crossterm(Event::Paste("hi".into())),
            Some(InputEvent::Paste("hi".into()))
        );
    }
}

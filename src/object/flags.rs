//! Widget flag and state bitsets.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

bitflags! {
    /// Structural and behavioral attributes of a widget.
    ///
    /// `VISIBLE` and `SENSITIVE` are local; the effective values also depend
    /// on every ancestor (see `WidgetTree::is_visible` / `is_sensitive`).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct WidgetFlags: u32 {
        const TOPLEVEL = 1 << 0;
        const VISIBLE = 1 << 1;
        const SENSITIVE = 1 << 2;
        const CAN_FOCUS = 1 << 3;
        const HAS_FOCUS = 1 << 4;
        const CAN_DEFAULT = 1 << 5;
        const HAS_DEFAULT = 1 << 6;
        const HAS_GRAB = 1 << 7;
        const APP_PAINTABLE = 1 << 8;
        const RECEIVES_DEFAULT = 1 << 9;
        const NO_WINDOW = 1 << 10;
    }
}

bitflags! {
    /// Transient interaction state, driven by the router.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StateFlags: u8 {
        /// Pressed and not yet released.
        const ACTIVE = 1 << 0;
        /// Under the pointer.
        const PRELIGHT = 1 << 1;
        /// Holds keyboard focus.
        const SELECTED = 1 << 2;
        const INSENSITIVE = 1 << 3;
    }
}

/// The style state a widget is drawn in, and the `:state` of a selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum StyleState {
    #[default]
    Normal,
    Active,
    Prelight,
    Selected,
    Insensitive,
}

impl StyleState {
    pub const ALL: [StyleState; 5] = [
        StyleState::Normal,
        StyleState::Active,
        StyleState::Prelight,
        StyleState::Selected,
        StyleState::Insensitive,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StyleState::Normal => "normal",
            StyleState::Active => "active",
            StyleState::Prelight => "prelight",
            StyleState::Selected => "selected",
            StyleState::Insensitive => "insensitive",
        }
    }

    /// The dominant state of a flag set. Insensitive beats active, active
    /// beats selected, selected beats prelight.
    pub fn from_flags(flags: StateFlags) -> StyleState {
        if flags.contains(StateFlags::INSENSITIVE) {
            StyleState::Insensitive
        } else if flags.contains(StateFlags::ACTIVE) {
            StyleState::Active
        } else if flags.contains(StateFlags::SELECTED) {
            StyleState::Selected
        } else if flags.contains(StateFlags::PRELIGHT) {
            StyleState::Prelight
        } else {
            StyleState::Normal
        }
    }
}

/// Unknown `:state` name in a selector.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown state '{0}'")]
pub struct UnknownState(pub String);

impl FromStr for StyleState {
    type Err = UnknownState;

    /// Accepts the canonical names plus the web-style aliases `hover`,
    /// `focus` and `disabled`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(StyleState::Normal),
            "active" | "pressed" => Ok(StyleState::Active),
            "prelight" | "hover" => Ok(StyleState::Prelight),
            "selected" | "focus" => Ok(StyleState::Selected),
            "insensitive" | "disabled" => Ok(StyleState::Insensitive),
            _ => Err(UnknownState(s.to_owned())),
        }
    }
}

impl fmt::Display for StyleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

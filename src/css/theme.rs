//! Per-state visual theme built from a widget's style properties.
//!
//! Style properties are installed as `key:state` slots. A state whose slot
//! was never set inherits the normal state's value, so a sheet only has to
//! spell out what changes on hover or press.

use crate::dom::{WidgetId, WidgetTree};
use crate::object::{Color, PropertyStore, StyleState};
use crate::render::cell::CellStyle;

/// Color-valued style keys.
pub const COLOR_KEYS: [&str; 3] = ["color", "background-color", "border-color"];

/// Bool-valued style keys.
pub const FLAG_KEYS: [&str; 6] = ["bold", "dim", "italic", "underline", "reverse", "border"];

/// The resolved look of one widget in one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateTheme {
    pub text: CellStyle,
    pub border_color: Option<Color>,
    pub border: bool,
}

/// The look of one widget in every state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Theme {
    states: [StateTheme; 5],
}

impl Theme {
    /// Read the `key:state` properties of `store`.
    pub fn from_properties(store: &PropertyStore) -> Theme {
        let mut theme = Theme::default();
        for (i, state) in StyleState::ALL.iter().enumerate() {
            let color = |key: &str| -> Option<Color> {
                lookup(store, key, *state)
                    .and_then(|v| v.as_color())
                    .filter(|c| !c.is_default())
            };
            let flag = |key: &str| -> bool {
                lookup(store, key, *state)
                    .and_then(|v| v.as_bool())
                    .unwrap_or(false)
            };
            theme.states[i] = StateTheme {
                text: CellStyle {
                    fg: color("color"),
                    bg: color("background-color"),
                    bold: flag("bold"),
                    dim: flag("dim"),
                    italic: flag("italic"),
                    underline: flag("underline"),
                    reverse: flag("reverse"),
                },
                border_color: color("border-color"),
                border: flag("border"),
            };
        }
        theme
    }

    pub fn get(&self, state: StyleState) -> &StateTheme {
        &self.states[state as usize]
    }
}

/// The state's own value when set, otherwise the normal state's.
fn lookup(store: &PropertyStore, key: &str, state: StyleState) -> Option<crate::object::PropertyValue> {
    let own = format!("{key}:{state}");
    if state != StyleState::Normal && store.is_set(&own) {
        return store.get(&own).ok();
    }
    store.get(&format!("{key}:normal")).ok()
}

impl WidgetTree {
    /// The widget's theme for the state it is currently drawn in.
    pub fn current_theme(&self, id: WidgetId) -> StateTheme {
        let Some(node) = self.get(id) else {
            return StateTheme::default();
        };
        *Theme::from_properties(&node.properties).get(self.style_state(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{PropertyFlags, PropertyType, PropertyValue};

    fn styled_store() -> PropertyStore {
        let store = PropertyStore::new();
        for state in StyleState::ALL {
            for key in COLOR_KEYS {
                store
                    .install(&format!("{key}:{state}"), PropertyType::Color, PropertyFlags::DEFAULT, Color::Default.into())
                    .unwrap();
            }
            for key in FLAG_KEYS {
                store
                    .install(&format!("{key}:{state}"), PropertyType::Bool, PropertyFlags::DEFAULT, false.into())
                    .unwrap();
            }
        }
        store
    }

    #[test]
    fn unset_states_inherit_normal() {
        let store = styled_store();
        store.set("color:normal", Color::Red.into()).unwrap();
        store.set("bold:normal", true.into()).unwrap();
        store.set("color:active", Color::Blue.into()).unwrap();

        let theme = Theme::from_properties(&store);
        assert_eq!(theme.get(StyleState::Normal).text.fg, Some(Color::Red));
        assert_eq!(theme.get(StyleState::Active).text.fg, Some(Color::Blue));
        assert_eq!(theme.get(StyleState::Prelight).text.fg, Some(Color::Red));
        assert!(theme.get(StyleState::Insensitive).text.bold);
    }

    #[test]
    fn explicit_false_overrides_normal_true() {
        let store = styled_store();
        store.set("reverse:normal", true.into()).unwrap();
        store.set("reverse:selected", PropertyValue::Bool(false)).unwrap();
        let theme = Theme::from_properties(&store);
        assert!(theme.get(StyleState::Normal).text.reverse);
        assert!(!theme.get(StyleState::Selected).text.reverse);
    }

    #[test]
    fn empty_store_is_plain() {
        let theme = Theme::from_properties(&PropertyStore::new());
        assert_eq!(*theme.get(StyleState::Active), StateTheme::default());
    }
}

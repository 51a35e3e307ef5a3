//! Per-window routing state.

use super::node::WidgetId;
use crate::event::input::Modifiers;

/// A registered mnemonic: a letter that activates `target` when pressed
/// together with the window's mnemonic modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mnemonic {
    pub key: char,
    pub target: WidgetId,
}

/// Focus, pointer-capture and hover tracking for one toplevel.
///
/// Keyboard focus and the event-focus grab are independent slots; each
/// holds at most one widget.
#[derive(Debug, Clone)]
pub struct WindowState {
    pub focus: Option<WidgetId>,
    pub event_focus: Option<WidgetId>,
    pub hover: Option<WidgetId>,
    pub default_widget: Option<WidgetId>,
    pub mnemonics: Vec<Mnemonic>,
    pub mnemonic_modifier: Modifiers,
}

impl WindowState {
    pub fn new(mnemonic_modifier: Modifiers) -> Self {
        Self {
            focus: None,
            event_focus: None,
            hover: None,
            default_widget: None,
            mnemonics: Vec::new(),
            mnemonic_modifier,
        }
    }

    /// Register a mnemonic. Keys are case-insensitive; a second mnemonic on
    /// the same key for the same target is ignored.
    pub fn add_mnemonic(&mut self, key: char, target: WidgetId) {
        let key = key.to_ascii_lowercase();
        if !self.mnemonics.iter().any(|m| m.key == key && m.target == target) {
            self.mnemonics.push(Mnemonic { key, target });
        }
    }

    pub fn remove_mnemonics_for(&mut self, target: WidgetId) {
        self.mnemonics.retain(|m| m.target != target);
    }

    /// Targets bound to `key`, in registration order.
    pub fn mnemonic_targets(&self, key: char) -> impl Iterator<Item = WidgetId> + '_ {
        let key = key.to_ascii_lowercase();
        self.mnemonics
            .iter()
            .filter(move |m| m.key == key)
            .map(|m| m.target)
    }

    /// Drop every reference to `id`.
    pub(crate) fn forget(&mut self, id: WidgetId) {
        for slot in [
            &mut self.focus,
            &mut self.event_focus,
            &mut self.hover,
            &mut self.default_widget,
        ] {
            if *slot == Some(id) {
                *slot = None;
            }
        }
        self.remove_mnemonics_for(id);
    }
}

impl Default for WindowState {
    fn default() -> Self {
        Self::new(Modifiers::ALT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<WidgetId> {
        let mut map: SlotMap<WidgetId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn mnemonics_are_case_insensitive() {
        let ids = ids(2);
        let mut w = WindowState::default();
        w.add_mnemonic('O', ids[0]);
        w.add_mnemonic('o', ids[0]);
        w.add_mnemonic('c', ids[1]);
        assert_eq!(w.mnemonics.len(), 2);
        assert_eq!(w.mnemonic_targets('o').collect::<Vec<_>>(), vec![ids[0]]);
        assert_eq!(w.mnemonic_targets('C').collect::<Vec<_>>(), vec![ids[1]]);
    }

    #[test]
    fn forget_clears_every_slot() {
        let ids = ids(2);
        let mut w = WindowState::default();
        w.focus = Some(ids[0]);
        w.event_focus = Some(ids[0]);
        w.hover = Some(ids[1]);
        w.add_mnemonic('x', ids[0]);
        w.forget(ids[0]);
        assert_eq!(w.focus, None);
        assert_eq!(w.event_focus, None);
        assert_eq!(w.hover, Some(ids[1]));
        assert!(w.mnemonics.is_empty());
    }

    #[test]
    fn default_modifier_is_alt() {
        assert_eq!(WindowState::default().mnemonic_modifier, Modifiers::ALT);
    }
}

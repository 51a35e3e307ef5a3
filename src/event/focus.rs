//! Keyboard focus, focus chains, event-focus grabs and default widgets.
//!
//! Each window holds at most one focused widget and, independently, at
//! most one event-focus (pointer capture) holder. Every transfer emits its
//! signal first and only proceeds when the emission passes. Failed
//! preconditions are reported to the caller and leave state unchanged.

use crate::dom::{TreeError, WidgetId, WidgetTree};
use crate::error::Result;
use crate::logging::targets;
use crate::object::{Propagation, SignalKind, StateFlags, WidgetFlags};

impl WidgetTree {
    // ── Focus chains ─────────────────────────────────────────────────

    /// The ordered focusable widgets inside `container`.
    ///
    /// An explicit chain set with [`set_focus_chain`](Self::set_focus_chain)
    /// wins; entries that left the container are skipped. Otherwise children
    /// are walked in insertion order: a focusable child is listed, and a
    /// child container contributes its own chain. Hidden and insensitive
    /// widgets are left out.
    pub fn focus_chain(&self, container: WidgetId) -> Vec<WidgetId> {
        if let Some(explicit) = self.focus_chains.get(container) {
            return explicit
                .iter()
                .copied()
                .filter(|&w| self.is_ancestor(container, w) && self.is_focusable_now(w))
                .collect();
        }
        let mut chain = Vec::new();
        for &child in self.children(container) {
            if !self.is_visible(child) {
                continue;
            }
            if self.is_focusable_now(child) {
                chain.push(child);
            }
            let is_container = self
                .get(child)
                .is_some_and(|n| n.widget.as_container().is_some());
            if is_container {
                chain.extend(self.focus_chain(child));
            }
        }
        chain
    }

    /// Replace the computed chain of `container` with `chain`.
    pub fn set_focus_chain(&mut self, container: WidgetId, chain: Vec<WidgetId>) -> Result<()> {
        self.node(container)?;
        tracing::trace!(target: targets::FOCUS, ?container, len = chain.len(), "explicit focus chain");
        self.focus_chains.insert(container, chain);
        Ok(())
    }

    /// Go back to the computed chain. No-op without an explicit one.
    pub fn unset_focus_chain(&mut self, container: WidgetId) {
        self.focus_chains.remove(container);
    }

    pub fn has_focus_chain(&self, container: WidgetId) -> bool {
        self.focus_chains.contains_key(container)
    }

    fn is_focusable_now(&self, id: WidgetId) -> bool {
        self.can_focus(id) && self.is_visible(id) && self.is_sensitive(id)
    }

    // ── Keyboard focus ───────────────────────────────────────────────

    /// The widget holding keyboard focus in `window`.
    pub fn focused(&self, window: WidgetId) -> Option<WidgetId> {
        self.window_state(window).and_then(|w| w.focus)
    }

    /// Move keyboard focus in `id`'s window to `id`.
    ///
    /// Fails when `id` cannot take focus right now (not focusable, hidden
    /// or insensitive) or is not inside a window. Emits `grab-focus` on
    /// `id`; on pass the previous holder gets `lost-focus` and `id` gets
    /// `gained-focus`.
    pub fn grab_focus(&mut self, id: WidgetId) -> Result<Propagation> {
        self.node(id)?;
        let reason = if !self.can_focus(id) {
            Some("widget cannot focus")
        } else if !self.is_visible(id) {
            Some("widget is hidden")
        } else if !self.is_sensitive(id) {
            Some("widget is insensitive")
        } else {
            None
        };
        if let Some(reason) = reason {
            tracing::warn!(target: targets::FOCUS, ?id, reason, "grab-focus refused");
            return Err(TreeError::PreconditionFailed { id, reason }.into());
        }
        let window = self.toplevel(id).ok_or(TreeError::NoWindow(id))?;

        if self.emit(id, SignalKind::GrabFocus, &[]).is_stop() {
            tracing::trace!(target: targets::FOCUS, ?id, "grab-focus vetoed");
            return Ok(Propagation::Stop);
        }
        let previous = self.focused(window);
        if previous == Some(id) {
            return Ok(Propagation::Pass);
        }
        if let Some(old) = previous {
            self.drop_focus(window, old);
        }
        if let Some(state) = self.window_state_mut(window) {
            state.focus = Some(id);
        }
        self.node_mut(id)?.flags.insert(WidgetFlags::HAS_FOCUS);
        self.set_state(id, StateFlags::SELECTED, true);
        self.emit(id, SignalKind::GainedFocus, &[]);
        tracing::debug!(target: targets::FOCUS, ?window, ?id, ?previous, "focus moved");
        Ok(Propagation::Pass)
    }

    /// Leave `window` with no focused widget.
    pub fn clear_focus(&mut self, window: WidgetId) {
        if let Some(old) = self.focused(window) {
            self.drop_focus(window, old);
        }
    }

    fn drop_focus(&mut self, window: WidgetId, old: WidgetId) {
        if let Some(state) = self.window_state_mut(window) {
            state.focus = None;
        }
        if let Some(node) = self.get_mut(old) {
            node.flags.remove(WidgetFlags::HAS_FOCUS);
        }
        self.set_state(old, StateFlags::SELECTED, false);
        self.emit(old, SignalKind::LostFocus, &[]);
    }

    /// Focus the entry after the current one in `window`'s chain, wrapping
    /// to the start. Starts at the first entry when nothing is focused.
    pub fn focus_next(&mut self, window: WidgetId) -> Propagation {
        self.step_focus(window, true)
    }

    /// Focus the entry before the current one, wrapping to the end.
    pub fn focus_previous(&mut self, window: WidgetId) -> Propagation {
        self.step_focus(window, false)
    }

    fn step_focus(&mut self, window: WidgetId, forward: bool) -> Propagation {
        let chain = self.focus_chain(window);
        if chain.is_empty() {
            tracing::warn!(target: targets::FOCUS, ?window, "focus chain is empty");
            return Propagation::Pass;
        }
        let current = self
            .focused(window)
            .and_then(|f| chain.iter().position(|&w| w == f));
        let last = chain.len() - 1;
        let index = match (current, forward) {
            (None, true) => 0,
            (None, false) => last,
            (Some(i), true) if i == last => 0,
            (Some(i), true) => i + 1,
            (Some(0), false) => last,
            (Some(i), false) => i - 1,
        };
        match self.grab_focus(chain[index]) {
            Ok(result) => result,
            Err(err) => {
                tracing::warn!(target: targets::FOCUS, ?window, %err, "focus step failed");
                Propagation::Pass
            }
        }
    }

    // ── Event focus ──────────────────────────────────────────────────

    /// The widget capturing pointer events in `window`.
    pub fn event_focus(&self, window: WidgetId) -> Option<WidgetId> {
        self.window_state(window).and_then(|w| w.event_focus)
    }

    /// Make `id` the pointer capture of its window after a vetoable
    /// `grab-event-focus` emission. A previous holder gets
    /// `lost-event-focus`.
    pub fn grab_event_focus(&mut self, id: WidgetId) -> Result<Propagation> {
        self.node(id)?;
        let window = self.toplevel(id).ok_or(TreeError::NoWindow(id))?;
        if self.emit(id, SignalKind::GrabEventFocus, &[]).is_stop() {
            return Ok(Propagation::Stop);
        }
        let previous = self.event_focus(window);
        if previous == Some(id) {
            return Ok(Propagation::Pass);
        }
        if let Some(old) = previous {
            self.drop_event_focus(window, old);
        }
        if let Some(state) = self.window_state_mut(window) {
            state.event_focus = Some(id);
        }
        self.node_mut(id)?.flags.insert(WidgetFlags::HAS_GRAB);
        tracing::trace!(target: targets::FOCUS, ?window, ?id, "event focus grabbed");
        Ok(Propagation::Pass)
    }

    /// Release the capture if, and only if, `id` holds it. Returns whether
    /// anything was released.
    pub fn release_event_focus(&mut self, id: WidgetId) -> bool {
        let Some(window) = self.toplevel(id) else {
            return false;
        };
        if self.event_focus(window) != Some(id) {
            return false;
        }
        self.drop_event_focus(window, id);
        tracing::trace!(target: targets::FOCUS, ?window, ?id, "event focus released");
        true
    }

    fn drop_event_focus(&mut self, window: WidgetId, old: WidgetId) {
        if let Some(state) = self.window_state_mut(window) {
            state.event_focus = None;
        }
        if let Some(node) = self.get_mut(old) {
            node.flags.remove(WidgetFlags::HAS_GRAB);
        }
        self.emit(old, SignalKind::LostEventFocus, &[]);
    }

    // ── Default widget ───────────────────────────────────────────────

    /// The widget activated by Enter when the focused widget ignores it.
    pub fn default_widget(&self, window: WidgetId) -> Option<WidgetId> {
        self.window_state(window).and_then(|w| w.default_widget)
    }

    /// Make `id` its window's default widget. Requires `CAN_DEFAULT`.
    pub fn grab_default(&mut self, id: WidgetId) -> Result<()> {
        if !self.flags(id).contains(WidgetFlags::CAN_DEFAULT) {
            return Err(TreeError::PreconditionFailed { id, reason: "widget cannot be default" }.into());
        }
        let window = self.toplevel(id).ok_or(TreeError::NoWindow(id))?;
        if let Some(old) = self.default_widget(window) {
            if let Some(node) = self.get_mut(old) {
                node.flags.remove(WidgetFlags::HAS_DEFAULT);
            }
            self.invalidate(old);
        }
        if let Some(state) = self.window_state_mut(window) {
            state.default_widget = Some(id);
        }
        self.node_mut(id)?.flags.insert(WidgetFlags::HAS_DEFAULT);
        self.invalidate(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::widgets::{Button, Container, Label, Window};

    /// window > [a, box > [b, label, c]]
    fn chain_tree() -> (WidgetTree, WidgetId, [WidgetId; 3]) {
        let mut tree = WidgetTree::default();
        let window = tree.create_widget(Rc::new(Window::new("w")), None).unwrap();
        let a = tree.create_widget(Rc::new(Button::new("a")), Some(window)).unwrap();
        let column = tree.create_widget(Rc::new(Container::vertical()), Some(window)).unwrap();
        let b = tree.create_widget(Rc::new(Button::new("b")), Some(column)).unwrap();
        tree.create_widget(Rc::new(Label::new("not focusable")), Some(column)).unwrap();
        let c = tree.create_widget(Rc::new(Button::new("c")), Some(column)).unwrap();
        (tree, window, [a, b, c])
    }

    fn record(tree: &mut WidgetTree, id: WidgetId, signal: SignalKind, log: &Rc<RefCell<Vec<String>>>) {
        let sink = Rc::clone(log);
        let label = format!("{signal}");
        tree.connect(id, signal, "record", move |tree, inv| {
            let name = tree.property(inv.source, "label").map(|v| v.to_string()).unwrap_or_default();
            sink.borrow_mut().push(format!("{label} {name}"));
            Propagation::Pass
        })
        .unwrap();
    }

    // ── Chains ───────────────────────────────────────────────────────

    #[test]
    fn computed_chain_recurses_into_containers() {
        let (tree, window, [a, b, c]) = chain_tree();
        assert_eq!(tree.focus_chain(window), vec![a, b, c]);
    }

    #[test]
    fn chain_skips_hidden_and_insensitive() {
        let (mut tree, window, [a, b, c]) = chain_tree();
        tree.hide(b).unwrap();
        tree.set_sensitive(c, false).unwrap();
        assert_eq!(tree.focus_chain(window), vec![a]);
    }

    #[test]
    fn explicit_chain_overrides_until_unset() {
        let (mut tree, window, [a, b, c]) = chain_tree();
        tree.set_focus_chain(window, vec![c, a]).unwrap();
        assert_eq!(tree.focus_chain(window), vec![c, a]);
        tree.unset_focus_chain(window);
        assert_eq!(tree.focus_chain(window), vec![a, b, c]);
    }

    #[test]
    fn explicit_chain_drops_departed_widgets() {
        let (mut tree, window, [a, b, c]) = chain_tree();
        tree.set_focus_chain(window, vec![b, a, c]).unwrap();
        let other = tree.create_widget(Rc::new(Window::new("other")), None).unwrap();
        tree.move_widget(a, other).unwrap();
        assert_eq!(tree.focus_chain(window), vec![b, c]);
        tree.destroy(b);
        assert_eq!(tree.focus_chain(window), vec![c]);
    }

    // ── Grab focus ───────────────────────────────────────────────────

    #[test]
    fn grab_focus_notifies_old_and_new() {
        let (mut tree, window, [a, b, _]) = chain_tree();
        let log = Rc::new(RefCell::new(Vec::new()));
        for id in [a, b] {
            record(&mut tree, id, SignalKind::LostFocus, &log);
            record(&mut tree, id, SignalKind::GainedFocus, &log);
        }
        tree.grab_focus(a).unwrap();
        tree.grab_focus(b).unwrap();
        assert_eq!(*log.borrow(), vec!["gained-focus a", "lost-focus a", "gained-focus b"]);
        assert_eq!(tree.focused(window), Some(b));
        assert!(tree.has_focus(b));
        assert!(!tree.has_focus(a));
        assert!(tree.state(b).contains(StateFlags::SELECTED));
        assert!(!tree.state(a).contains(StateFlags::SELECTED));
    }

    #[test]
    fn grab_focus_preconditions() {
        let mut tree = WidgetTree::default();
        let window = tree.create_widget(Rc::new(Window::new("w")), None).unwrap();
        let label = tree.create_widget(Rc::new(Label::new("x")), Some(window)).unwrap();
        let button = tree.create_widget(Rc::new(Button::new("b")), Some(window)).unwrap();
        tree.set_sensitive(button, false).unwrap();

        for id in [label, button] {
            let err = tree.grab_focus(id).unwrap_err();
            assert!(matches!(err, crate::Error::Tree(TreeError::PreconditionFailed { .. })));
        }
        assert_eq!(tree.focused(window), None);
    }

    #[test]
    fn grab_focus_outside_window_fails() {
        let mut tree = WidgetTree::default();
        let column = tree.create_widget(Rc::new(Container::vertical()), None).unwrap();
        let button = tree.create_widget(Rc::new(Button::new("b")), Some(column)).unwrap();
        assert!(matches!(
            tree.grab_focus(button),
            Err(crate::Error::Tree(TreeError::NoWindow(_)))
        ));
    }

    #[test]
    fn grab_focus_veto_keeps_previous() {
        let (mut tree, window, [a, b, _]) = chain_tree();
        tree.grab_focus(a).unwrap();
        tree.connect(b, SignalKind::GrabFocus, "no", |_, _| Propagation::Stop).unwrap();
        assert_eq!(tree.grab_focus(b).unwrap(), Propagation::Stop);
        assert_eq!(tree.focused(window), Some(a));
    }

    // ── Next / previous ──────────────────────────────────────────────

    #[test]
    fn focus_next_wraps_around() {
        let (mut tree, window, [a, b, c]) = chain_tree();
        tree.grab_focus(b).unwrap();
        tree.focus_next(window);
        assert_eq!(tree.focused(window), Some(c));
        tree.focus_next(window);
        assert_eq!(tree.focused(window), Some(a));
    }

    #[test]
    fn focus_previous_wraps_around() {
        let (mut tree, window, [a, _, c]) = chain_tree();
        tree.focus_previous(window);
        assert_eq!(tree.focused(window), Some(c));
        tree.grab_focus(a).unwrap();
        tree.focus_previous(window);
        assert_eq!(tree.focused(window), Some(c));
    }

    #[test]
    fn focus_next_on_empty_chain_is_noop() {
        let mut tree = WidgetTree::default();
        let window = tree.create_widget(Rc::new(Window::new("w")), None).unwrap();
        assert_eq!(tree.focus_next(window), Propagation::Pass);
        assert_eq!(tree.focused(window), None);
    }

    // ── Event focus ──────────────────────────────────────────────────

    #[test]
    fn only_the_holder_releases() {
        let (mut tree, window, [a, b, _]) = chain_tree();
        tree.grab_event_focus(a).unwrap();
        assert!(!tree.release_event_focus(b));
        assert_eq!(tree.event_focus(window), Some(a));
        assert!(tree.release_event_focus(a));
        assert_eq!(tree.event_focus(window), None);
        assert!(!tree.release_event_focus(a));
    }

    #[test]
    fn grab_event_focus_replaces_holder() {
        let (mut tree, window, [a, b, _]) = chain_tree();
        let log = Rc::new(RefCell::new(Vec::new()));
        record(&mut tree, a, SignalKind::LostEventFocus, &log);
        tree.grab_event_focus(a).unwrap();
        tree.grab_event_focus(b).unwrap();
        assert_eq!(tree.event_focus(window), Some(b));
        assert!(!tree.flags(a).contains(WidgetFlags::HAS_GRAB));
        assert_eq!(*log.borrow(), vec!["lost-event-focus a"]);
    }

    #[test]
    fn grab_event_focus_can_be_vetoed() {
        let (mut tree, window, [a, ..]) = chain_tree();
        tree.connect(a, SignalKind::GrabEventFocus, "no", |_, _| Propagation::Stop).unwrap();
        assert_eq!(tree.grab_event_focus(a).unwrap(), Propagation::Stop);
        assert_eq!(tree.event_focus(window), None);
    }

    #[test]
    fn moving_to_another_window_leaves_old_slots() {
        let (mut tree, window, [a, _, _]) = chain_tree();
        tree.set_flags(a, WidgetFlags::CAN_DEFAULT).unwrap();
        tree.grab_focus(a).unwrap();
        tree.grab_event_focus(a).unwrap();
        tree.grab_default(a).unwrap();
        let other = tree.create_widget(Rc::new(Window::new("other")), None).unwrap();

        tree.move_widget(a, other).unwrap();
        assert_eq!(tree.focused(window), None);
        assert_eq!(tree.event_focus(window), None);
        assert_eq!(tree.default_widget(window), None);
        assert!(!tree.flags(a).contains(WidgetFlags::HAS_DEFAULT));

        tree.grab_focus(a).unwrap();
        assert_eq!(tree.focused(window), None);
        assert_eq!(tree.focused(other), Some(a));
    }

    // ── Default ──────────────────────────────────────────────────────

    #[test]
    fn grab_default_requires_can_default() {
        let (mut tree, window, [a, b, _]) = chain_tree();
        assert!(tree.grab_default(a).is_err());
        tree.set_flags(a, WidgetFlags::CAN_DEFAULT).unwrap();
        tree.set_flags(b, WidgetFlags::CAN_DEFAULT).unwrap();
        tree.grab_default(a).unwrap();
        tree.grab_default(b).unwrap();
        assert_eq!(tree.default_widget(window), Some(b));
        assert!(!tree.flags(a).contains(WidgetFlags::HAS_DEFAULT));
    }
}

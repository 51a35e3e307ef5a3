//! Routing input from a window to the widget that should handle it.
//!
//! Pointer events go to the event-focus holder when there is one, and to
//! the widget under the pointer otherwise; hover changes emit `leave` and
//! `enter` along the way. Key events try the window's mnemonics first, then
//! the focused widget and its ancestors, then Tab navigation and finally the
//! window's default widget.

use crate::dom::{WidgetId, WidgetNode, WidgetTree};
use crate::geometry::Offset;
use crate::logging::targets;
use crate::object::{Propagation, SignalKind, StateFlags, WidgetFlags};

use super::input::{InputEvent, Key, KeyEvent, Modifiers, MouseEvent};

impl WidgetTree {
    /// Route `event` within `window`. Returns `Stop` when some widget
    /// consumed it.
    pub fn dispatch(&mut self, window: WidgetId, event: &InputEvent) -> Propagation {
        if self.window_state(window).is_none() {
            tracing::error!(target: targets::EVENT, ?window, "dispatch to a widget without window state");
            return Propagation::Pass;
        }
        let result = match event {
            InputEvent::Key(key) => self.route_key(window, key, event),
            InputEvent::Mouse(mouse) => self.route_mouse(window, mouse, event),
            InputEvent::Resize { width, height } => self.emit(
                window,
                SignalKind::Resize,
                &[i64::from(*width).into(), i64::from(*height).into()],
            ),
            InputEvent::FocusLost => {
                self.cancel_grab(window);
                Propagation::Pass
            }
            InputEvent::FocusGained | InputEvent::Paste(_) => match self.focused(window) {
                Some(target) => self.deliver(target, event),
                None => Propagation::Pass,
            },
        };
        tracing::trace!(target: targets::EVENT, ?window, ?event, ?result, "dispatched");
        result
    }

    /// Offer `event` to one widget: the `process-event` signal first, then
    /// the widget's own handler.
    pub fn deliver(&mut self, id: WidgetId, event: &InputEvent) -> Propagation {
        let Some(widget) = self.get(id).map(WidgetNode::widget) else {
            return Propagation::Pass;
        };
        if !self.is_sensitive(id) {
            return Propagation::Pass;
        }
        if self.emit_event(id, SignalKind::ProcessEvent, event).is_stop() {
            return Propagation::Stop;
        }
        match widget.as_event_handler() {
            Some(handler) => handler.process_event(self, id, event),
            None => Propagation::Pass,
        }
    }

    // ── Pointer ──────────────────────────────────────────────────────

    /// The widget under `point` inside `root`. Children are tried in
    /// insertion order before their parent; hidden subtrees are skipped.
    pub fn hit_test(&self, root: WidgetId, point: Offset) -> Option<WidgetId> {
        let node = self.get(root)?;
        if !node.flags.contains(WidgetFlags::VISIBLE) {
            return None;
        }
        for &child in self.children(root) {
            if let Some(hit) = self.hit_test(child, point) {
                return Some(hit);
            }
        }
        node.region().contains_point(point).then_some(root)
    }

    fn route_mouse(&mut self, window: WidgetId, mouse: &MouseEvent, event: &InputEvent) -> Propagation {
        let hit = self.hit_test(window, mouse.position());
        self.update_hover(window, hit);

        let target = match self.event_focus(window) {
            Some(holder) => Some(holder),
            None => hit,
        };
        match target {
            Some(id) => self.deliver(id, event),
            None => Propagation::Pass,
        }
    }

    fn update_hover(&mut self, window: WidgetId, hit: Option<WidgetId>) {
        let previous = self.window_state(window).and_then(|w| w.hover);
        if previous == hit {
            return;
        }
        if let Some(old) = previous {
            if self.emit(old, SignalKind::Leave, &[]).is_pass() {
                self.set_state(old, StateFlags::PRELIGHT, false);
            }
        }
        if let Some(new) = hit {
            if self.emit(new, SignalKind::Enter, &[]).is_pass() && self.is_sensitive(new) {
                self.set_state(new, StateFlags::PRELIGHT, true);
            }
        }
        if let Some(state) = self.window_state_mut(window) {
            state.hover = hit;
        }
    }

    /// Abort the gesture of whoever holds `window`'s event focus.
    fn cancel_grab(&mut self, window: WidgetId) {
        if let Some(holder) = self.event_focus(window) {
            self.cancel_event(holder);
            self.release_event_focus(holder);
        }
    }

    // ── Keyboard ─────────────────────────────────────────────────────

    fn route_key(&mut self, window: WidgetId, key: &KeyEvent, event: &InputEvent) -> Propagation {
        if self.activate_mnemonic(window, key).is_stop() {
            return Propagation::Stop;
        }

        if let Some(focus) = self.focused(window) {
            let mut path = vec![focus];
            path.extend(self.ancestors(focus).into_iter().filter(|&w| w != window));
            for id in path {
                if self.deliver(id, event).is_stop() {
                    return Propagation::Stop;
                }
            }
        }

        match (key.code, key.modifiers) {
            (Key::Tab, m) if m.contains(Modifiers::SHIFT) => {
                self.focus_previous(window);
                Propagation::Stop
            }
            (Key::Tab, _) => {
                self.focus_next(window);
                Propagation::Stop
            }
            (Key::BackTab, _) => {
                self.focus_previous(window);
                Propagation::Stop
            }
            (Key::Enter, m) if m.is_empty() => match self.default_widget(window) {
                Some(default) => self.activate(default),
                None => Propagation::Pass,
            },
            _ => Propagation::Pass,
        }
    }

    /// Activate the first live target of a mnemonic matching `key`.
    fn activate_mnemonic(&mut self, window: WidgetId, key: &KeyEvent) -> Propagation {
        let Some(state) = self.window_state(window) else {
            return Propagation::Pass;
        };
        let modifier = state.mnemonic_modifier;
        let Key::Char(ch) = key.code else {
            return Propagation::Pass;
        };
        if key.significant_modifiers() != modifier {
            return Propagation::Pass;
        }
        let target = state
            .mnemonic_targets(ch)
            .find(|&t| self.is_visible(t) && self.is_sensitive(t));
        let Some(target) = target else {
            return Propagation::Pass;
        };

        tracing::debug!(target: targets::EVENT, ?window, widget = ?target, key = %ch, "mnemonic");
        if self.emit(target, SignalKind::MnemonicActivate, &[]).is_stop() {
            return Propagation::Stop;
        }
        if self.can_focus(target) {
            if let Err(err) = self.grab_focus(target) {
                tracing::warn!(target: targets::EVENT, widget = ?target, %err, "mnemonic focus failed");
            }
        }
        self.activate(target);
        Propagation::Stop
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::event::input::{MouseAction, MouseBtn};
    use crate::geometry::Size;
    use crate::widgets::{Button, Container, Label, Window};

    fn place(tree: &mut WidgetTree, id: WidgetId, x: i32, y: i32, w: i32, h: i32) {
        let node = tree.get_mut(id).unwrap();
        node.origin = Offset::new(x, y);
        node.allocation = Size::new(w, h);
    }

    /// window 20x5 > row (0,0 20x1) > [ok (0,0 5x1), cancel (6,0 8x1)], label (0,2 20x1)
    fn routed_tree() -> (WidgetTree, WidgetId, WidgetId, WidgetId, WidgetId) {
        let mut tree = WidgetTree::default();
        let window = tree.create_widget(Rc::new(Window::new("w")), None).unwrap();
        let row = tree.create_widget(Rc::new(Container::horizontal()), Some(window)).unwrap();
        let ok = tree.create_widget(Rc::new(Button::new("_OK")), Some(row)).unwrap();
        let cancel = tree.create_widget(Rc::new(Button::new("_Cancel")), Some(row)).unwrap();
        let label = tree.create_widget(Rc::new(Label::new("status")), Some(window)).unwrap();
        place(&mut tree, window, 0, 0, 20, 5);
        place(&mut tree, row, 0, 0, 20, 1);
        place(&mut tree, ok, 0, 0, 5, 1);
        place(&mut tree, cancel, 6, 0, 8, 1);
        place(&mut tree, label, 0, 2, 20, 1);
        (tree, window, ok, cancel, label)
    }

    fn counter(tree: &mut WidgetTree, id: WidgetId, signal: SignalKind) -> Rc<RefCell<usize>> {
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        tree.connect(id, signal, "count", move |_, _| {
            *sink.borrow_mut() += 1;
            Propagation::Pass
        })
        .unwrap();
        count
    }

    fn press(x: u16, y: u16) -> InputEvent {
        InputEvent::mouse(MouseAction::Down(MouseBtn::Left), x, y)
    }

    fn release(x: u16, y: u16) -> InputEvent {
        InputEvent::mouse(MouseAction::Up(MouseBtn::Left), x, y)
    }

    // ── Hit testing ──────────────────────────────────────────────────

    #[test]
    fn hit_test_prefers_deepest_child() {
        let (mut tree, window, ok, cancel, label) = routed_tree();
        assert_eq!(tree.hit_test(window, Offset::new(1, 0)), Some(ok));
        assert_eq!(tree.hit_test(window, Offset::new(7, 0)), Some(cancel));
        assert_eq!(tree.hit_test(window, Offset::new(3, 2)), Some(label));
        assert_eq!(tree.hit_test(window, Offset::new(3, 4)), Some(window));
        assert_eq!(tree.hit_test(window, Offset::new(30, 4)), None);

        tree.hide(ok).unwrap();
        assert_ne!(tree.hit_test(window, Offset::new(1, 0)), Some(ok));
    }

    // ── Hover ────────────────────────────────────────────────────────

    #[test]
    fn hover_emits_leave_then_enter() {
        let (mut tree, window, ok, cancel, _) = routed_tree();
        let ok_leave = counter(&mut tree, ok, SignalKind::Leave);
        let cancel_enter = counter(&mut tree, cancel, SignalKind::Enter);

        tree.dispatch(window, &InputEvent::mouse(MouseAction::Moved, 1, 0));
        assert!(tree.state(ok).contains(StateFlags::PRELIGHT));
        tree.dispatch(window, &InputEvent::mouse(MouseAction::Moved, 7, 0));
        assert!(!tree.state(ok).contains(StateFlags::PRELIGHT));
        assert!(tree.state(cancel).contains(StateFlags::PRELIGHT));
        assert_eq!(*ok_leave.borrow(), 1);
        assert_eq!(*cancel_enter.borrow(), 1);

        tree.dispatch(window, &InputEvent::mouse(MouseAction::Moved, 8, 0));
        assert_eq!(*cancel_enter.borrow(), 1);
        assert_eq!(tree.window_state(window).unwrap().hover, Some(cancel));
    }

    #[test]
    fn vetoed_enter_skips_prelight() {
        let (mut tree, window, ok, ..) = routed_tree();
        tree.connect(ok, SignalKind::Enter, "no", |_, _| Propagation::Stop).unwrap();
        tree.dispatch(window, &InputEvent::mouse(MouseAction::Moved, 1, 0));
        assert!(!tree.state(ok).contains(StateFlags::PRELIGHT));
        assert_eq!(tree.window_state(window).unwrap().hover, Some(ok));
    }

    // ── Clicks ───────────────────────────────────────────────────────

    #[test]
    fn press_release_inside_clicks_once() {
        let (mut tree, window, ok, ..) = routed_tree();
        let clicked = counter(&mut tree, ok, SignalKind::Clicked);
        let activated = counter(&mut tree, ok, SignalKind::Activate);

        assert_eq!(tree.dispatch(window, &press(2, 0)), Propagation::Stop);
        assert_eq!(tree.property(ok, "pressed").unwrap(), true.into());
        assert_eq!(tree.event_focus(window), Some(ok));
        tree.dispatch(window, &release(2, 0));

        assert_eq!(*clicked.borrow(), 1);
        assert_eq!(*activated.borrow(), 1);
        assert_eq!(tree.property(ok, "pressed").unwrap(), false.into());
        assert_eq!(tree.event_focus(window), None);
    }

    #[test]
    fn drag_out_cancels_press() {
        let (mut tree, window, ok, ..) = routed_tree();
        let clicked = counter(&mut tree, ok, SignalKind::Clicked);

        tree.dispatch(window, &press(2, 0));
        tree.dispatch(window, &InputEvent::mouse(MouseAction::Drag(MouseBtn::Left), 10, 3));
        assert_eq!(tree.property(ok, "pressed").unwrap(), false.into());
        assert_eq!(tree.event_focus(window), None);
        tree.dispatch(window, &release(2, 0));
        assert_eq!(*clicked.borrow(), 0);
    }

    #[test]
    fn release_elsewhere_does_not_click() {
        let (mut tree, window, ok, cancel, _) = routed_tree();
        let ok_clicked = counter(&mut tree, ok, SignalKind::Clicked);
        let cancel_clicked = counter(&mut tree, cancel, SignalKind::Clicked);

        tree.dispatch(window, &press(2, 0));
        tree.dispatch(window, &release(7, 0));
        assert_eq!(*ok_clicked.borrow(), 0);
        assert_eq!(*cancel_clicked.borrow(), 0);
        assert_eq!(tree.property(ok, "pressed").unwrap(), false.into());
    }

    #[test]
    fn process_event_veto_blocks_widget() {
        let (mut tree, window, ok, ..) = routed_tree();
        let clicked = counter(&mut tree, ok, SignalKind::Clicked);
        tree.connect(ok, SignalKind::ProcessEvent, "swallow", |_, _| Propagation::Stop).unwrap();
        tree.dispatch(window, &press(2, 0));
        tree.dispatch(window, &release(2, 0));
        assert_eq!(*clicked.borrow(), 0);
        assert_eq!(tree.property(ok, "pressed").unwrap(), false.into());
    }

    #[test]
    fn insensitive_button_ignores_clicks() {
        let (mut tree, window, ok, ..) = routed_tree();
        let clicked = counter(&mut tree, ok, SignalKind::Clicked);
        tree.set_sensitive(ok, false).unwrap();
        tree.dispatch(window, &press(2, 0));
        tree.dispatch(window, &release(2, 0));
        assert_eq!(*clicked.borrow(), 0);
    }

    // ── Keys ─────────────────────────────────────────────────────────

    #[test]
    fn tab_cycles_focus() {
        let (mut tree, window, ok, cancel, _) = routed_tree();
        let tab = InputEvent::key(Key::Tab, Modifiers::NONE);
        tree.dispatch(window, &tab);
        assert_eq!(tree.focused(window), Some(ok));
        tree.dispatch(window, &tab);
        assert_eq!(tree.focused(window), Some(cancel));
        tree.dispatch(window, &InputEvent::key(Key::BackTab, Modifiers::SHIFT));
        assert_eq!(tree.focused(window), Some(ok));
    }

    #[test]
    fn enter_activates_focused_button() {
        let (mut tree, window, ok, ..) = routed_tree();
        let clicked = counter(&mut tree, ok, SignalKind::Clicked);
        tree.grab_focus(ok).unwrap();
        let result = tree.dispatch(window, &InputEvent::key(Key::Enter, Modifiers::NONE));
        assert_eq!(result, Propagation::Stop);
        assert_eq!(*clicked.borrow(), 1);
    }

    #[test]
    fn mnemonic_focuses_and_activates() {
        let (mut tree, window, _, cancel, _) = routed_tree();
        let clicked = counter(&mut tree, cancel, SignalKind::Clicked);
        let result = tree.dispatch(window, &InputEvent::key(Key::Char('c'), Modifiers::ALT));
        assert_eq!(result, Propagation::Stop);
        assert_eq!(*clicked.borrow(), 1);
        assert_eq!(tree.focused(window), Some(cancel));

        let plain = tree.dispatch(window, &InputEvent::key(Key::Char('c'), Modifiers::NONE));
        assert_eq!(plain, Propagation::Pass);
        assert_eq!(*clicked.borrow(), 1);
    }

    #[test]
    fn unconsumed_keys_bubble_to_ancestors() {
        let (mut tree, window, ok, ..) = routed_tree();
        let row = tree.parent(ok).unwrap();
        let seen = counter(&mut tree, row, SignalKind::ProcessEvent);
        tree.grab_focus(ok).unwrap();
        tree.dispatch(window, &InputEvent::key(Key::Char('x'), Modifiers::NONE));
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn enter_falls_back_to_default_widget() {
        let (mut tree, window, _, cancel, _) = routed_tree();
        let clicked = counter(&mut tree, cancel, SignalKind::Clicked);
        tree.set_flags(cancel, WidgetFlags::CAN_DEFAULT).unwrap();
        tree.grab_default(cancel).unwrap();
        tree.dispatch(window, &InputEvent::key(Key::Enter, Modifiers::NONE));
        assert_eq!(*clicked.borrow(), 1);
    }

    #[test]
    fn focus_lost_cancels_grab() {
        let (mut tree, window, ok, ..) = routed_tree();
        tree.dispatch(window, &press(2, 0));
        tree.dispatch(window, &InputEvent::FocusLost);
        assert_eq!(tree.event_focus(window), None);
        assert_eq!(tree.property(ok, "pressed").unwrap(), false.into());
    }

    #[test]
    fn dispatch_to_non_window_is_noop() {
        let (mut tree, _, ok, ..) = routed_tree();
        assert_eq!(tree.dispatch(ok, &press(2, 0)), Propagation::Pass);
    }
}

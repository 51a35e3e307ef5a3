//! Operations every widget supports: creation, idempotent init, signal
//! emission, flags, properties, visibility.
//!
//! Every mutation here emits its signal first and applies only when the
//! emission passes.

use std::rc::Rc;

use super::traits::Widget;
use crate::css::theme::{COLOR_KEYS, FLAG_KEYS};
use crate::dom::{TreeError, WidgetId, WidgetNode, WidgetTree};
use crate::error::Result;
use crate::event::input::InputEvent;
use crate::logging::targets;
use crate::object::signal::run_handlers;
use crate::object::{
    Color, Invocation, Propagation, PropertyFlags, PropertyType, PropertyValue, SignalKind,
    StateFlags, StyleState, WidgetFlags,
};

/// Init tag of the base initializer.
pub const BASE_INIT: &str = "widget";

/// Internal handler that aborts gestures when a widget is hidden.
const RESET_ON_HIDE: &str = "widget:reset-on-hide";

impl WidgetTree {
    // ── Construction ─────────────────────────────────────────────────

    /// Insert `widget` under `parent` (or as a new root) and initialize it.
    /// The parent must be a container.
    pub fn create_widget(&mut self, widget: Rc<dyn Widget>, parent: Option<WidgetId>) -> Result<WidgetId> {
        let node = WidgetNode::new(Rc::clone(&widget));
        let id = match parent {
            Some(p) => {
                if self.node(p)?.widget.as_container().is_none() {
                    return Err(TreeError::NotAContainer(p).into());
                }
                self.insert_child(p, node)?
            }
            None => self.insert(node),
        };
        if let Err(err) = widget.init(self, id) {
            tracing::warn!(target: targets::TREE, widget = widget.type_name(), %err, "init failed");
            self.remove(id);
            return Err(err);
        }
        widget.hierarchy_changed(self, id);
        tracing::trace!(target: targets::TREE, ?id, widget = widget.type_name(), "created widget");
        Ok(id)
    }

    /// Create a widget by registered type name.
    pub fn create_by_type(&mut self, type_name: &str, parent: Option<WidgetId>) -> Result<WidgetId> {
        let widget = self
            .context()
            .registry()
            .create(type_name)
            .ok_or_else(|| TreeError::UnknownType(type_name.to_owned()))?;
        self.create_widget(widget, parent)
    }

    /// Move `id` under `new_parent`, which must be a container.
    pub fn move_widget(&mut self, id: WidgetId, new_parent: WidgetId) -> Result<()> {
        if self.node(new_parent)?.widget.as_container().is_none() {
            return Err(TreeError::NotAContainer(new_parent).into());
        }
        self.cancel_event(id);
        let old_window = self.toplevel(id);
        if old_window.is_some() && old_window != self.toplevel(new_parent) {
            self.leave_window(id);
        }
        self.reparent(id, new_parent)?;
        for w in self.walk_depth_first(id) {
            if let Some(widget) = self.get(w).map(WidgetNode::widget) {
                widget.hierarchy_changed(self, w);
            }
        }
        self.invalidate(new_parent);
        Ok(())
    }

    /// Abort gestures in the subtree and remove it.
    pub fn destroy(&mut self, id: WidgetId) -> Option<WidgetNode> {
        for w in self.walk_depth_first(id) {
            self.cancel_event(w);
        }
        if let Some(parent) = self.parent(id) {
            self.invalidate(parent);
        }
        self.remove(id)
    }

    /// Run `init` once per `(widget, tag)`. Later calls are no-ops.
    pub fn ensure_init<F>(&mut self, id: WidgetId, tag: &'static str, init: F) -> Result<()>
    where
        F: FnOnce(&mut WidgetTree) -> Result<()>,
    {
        if self.node(id)?.is_initialized(tag) {
            return Ok(());
        }
        init(self)?;
        self.node_mut(id)?.init_tags.insert(tag);
        Ok(())
    }

    /// Base initialization shared by every widget type.
    pub fn init_base(&mut self, id: WidgetId) -> Result<()> {
        self.ensure_init(id, BASE_INIT, |tree| {
            let node = tree.node_mut(id)?;
            node.flags.insert(WidgetFlags::VISIBLE | WidgetFlags::SENSITIVE);
            let props = node.properties.clone();

            props.install("width-request", PropertyType::Int, PropertyFlags::DEFAULT, PropertyValue::Int(-1))?;
            props.install("height-request", PropertyType::Int, PropertyFlags::DEFAULT, PropertyValue::Int(-1))?;
            props.install("expand", PropertyType::Bool, PropertyFlags::DEFAULT, false.into())?;
            for state in StyleState::ALL {
                for key in COLOR_KEYS {
                    props.install(&format!("{key}:{state}"), PropertyType::Color, PropertyFlags::DEFAULT, Color::Default.into())?;
                }
                for key in FLAG_KEYS {
                    props.install(&format!("{key}:{state}"), PropertyType::Bool, PropertyFlags::DEFAULT, false.into())?;
                }
            }

            tree.connect(id, SignalKind::Hide, RESET_ON_HIDE, |tree, inv| {
                tree.cancel_event(inv.source);
                Propagation::Pass
            })
        })
    }

    // ── Signals ──────────────────────────────────────────────────────

    /// Connect a handler to one of `id`'s signals.
    pub fn connect<F>(&mut self, id: WidgetId, signal: SignalKind, handler: &str, f: F) -> Result<()>
    where
        F: Fn(&mut WidgetTree, &Invocation<'_>) -> Propagation + 'static,
    {
        self.node_mut(id)?.signals.connect(signal, handler, f)?;
        Ok(())
    }

    /// Connect with extra data handed back on each invocation.
    pub fn connect_with_data<F>(
        &mut self,
        id: WidgetId,
        signal: SignalKind,
        handler: &str,
        data: Vec<PropertyValue>,
        f: F,
    ) -> Result<()>
    where
        F: Fn(&mut WidgetTree, &Invocation<'_>) -> Propagation + 'static,
    {
        self.node_mut(id)?.signals.connect_with_data(signal, handler, data, f)?;
        Ok(())
    }

    pub fn disconnect(&mut self, id: WidgetId, signal: &SignalKind, handler: &str) -> Result<()> {
        self.node_mut(id)?.signals.disconnect(signal, handler)?;
        Ok(())
    }

    /// Emit `signal` on `id`. Handlers run against a snapshot of the
    /// connection list and may freely mutate the tree.
    pub fn emit(&mut self, id: WidgetId, signal: SignalKind, args: &[PropertyValue]) -> Propagation {
        self.emit_with(id, &signal, args, None)
    }

    /// Emit `signal` carrying an input event.
    pub fn emit_event(&mut self, id: WidgetId, signal: SignalKind, event: &InputEvent) -> Propagation {
        self.emit_with(id, &signal, &[], Some(event))
    }

    fn emit_with(
        &mut self,
        id: WidgetId,
        signal: &SignalKind,
        args: &[PropertyValue],
        event: Option<&InputEvent>,
    ) -> Propagation {
        let Some(node) = self.get(id) else {
            tracing::debug!(target: targets::SIGNAL, ?id, %signal, "emit on removed widget");
            return Propagation::Pass;
        };
        let handlers = node.signals.snapshot(signal);
        if handlers.is_empty() {
            return Propagation::Pass;
        }
        let mut inv = Invocation::new(id, signal, args);
        inv.event = event;
        let result = run_handlers(&handlers, self, &inv);
        tracing::trace!(target: targets::SIGNAL, ?id, %signal, ?result, "emitted");
        result
    }

    // ── Flags ────────────────────────────────────────────────────────

    /// Local flags. Empty for removed widgets.
    pub fn flags(&self, id: WidgetId) -> WidgetFlags {
        self.get(id).map(|n| n.flags).unwrap_or_default()
    }

    /// Set `flags` after a vetoable `set-flags` emission.
    pub fn set_flags(&mut self, id: WidgetId, flags: WidgetFlags) -> Result<Propagation> {
        self.change_flags(id, flags, true)
    }

    /// Clear `flags` after a vetoable `unset-flags` emission.
    pub fn unset_flags(&mut self, id: WidgetId, flags: WidgetFlags) -> Result<Propagation> {
        self.change_flags(id, flags, false)
    }

    fn change_flags(&mut self, id: WidgetId, flags: WidgetFlags, on: bool) -> Result<Propagation> {
        self.node(id)?;
        let signal = if on { SignalKind::SetFlags } else { SignalKind::UnsetFlags };
        if self.emit(id, signal, &[PropertyValue::Int(i64::from(flags.bits()))]).is_stop() {
            return Ok(Propagation::Stop);
        }
        self.node_mut(id)?.flags.set(flags, on);
        self.invalidate(id);
        Ok(Propagation::Pass)
    }

    /// Visible itself and through every ancestor.
    pub fn is_visible(&self, id: WidgetId) -> bool {
        self.effective(id, WidgetFlags::VISIBLE)
    }

    /// Sensitive itself and through every ancestor.
    pub fn is_sensitive(&self, id: WidgetId) -> bool {
        self.effective(id, WidgetFlags::SENSITIVE)
    }

    fn effective(&self, id: WidgetId, flag: WidgetFlags) -> bool {
        self.contains(id)
            && std::iter::once(id)
                .chain(self.ancestors(id))
                .all(|w| self.flags(w).contains(flag))
    }

    pub fn can_focus(&self, id: WidgetId) -> bool {
        self.flags(id).contains(WidgetFlags::CAN_FOCUS)
    }

    pub fn has_focus(&self, id: WidgetId) -> bool {
        self.flags(id).contains(WidgetFlags::HAS_FOCUS)
    }

    pub fn set_sensitive(&mut self, id: WidgetId, sensitive: bool) -> Result<Propagation> {
        if sensitive {
            self.set_flags(id, WidgetFlags::SENSITIVE)
        } else {
            let result = self.unset_flags(id, WidgetFlags::SENSITIVE)?;
            if result.is_pass() {
                for w in self.walk_depth_first(id) {
                    self.cancel_event(w);
                }
            }
            Ok(result)
        }
    }

    // ── State ────────────────────────────────────────────────────────

    /// Current interaction state bits.
    pub fn state(&self, id: WidgetId) -> StateFlags {
        self.get(id).map(|n| n.state).unwrap_or_default()
    }

    /// Turn state bits on or off, invalidating when they change.
    pub(crate) fn set_state(&mut self, id: WidgetId, state: StateFlags, on: bool) {
        let Some(node) = self.get_mut(id) else {
            return;
        };
        let before = node.state;
        node.state.set(state, on);
        if node.state != before {
            self.invalidate(id);
        }
    }

    /// The state the widget is drawn in. Insensitive whenever the widget or
    /// any ancestor is insensitive.
    pub fn style_state(&self, id: WidgetId) -> StyleState {
        if !self.is_sensitive(id) {
            return StyleState::Insensitive;
        }
        StyleState::from_flags(self.state(id))
    }

    // ── Properties ───────────────────────────────────────────────────

    pub fn property(&self, id: WidgetId, name: &str) -> Result<PropertyValue> {
        Ok(self.node(id)?.properties.get(name)?)
    }

    /// Set a property after a vetoable `set-property` emission carrying
    /// `[name, value]`. Emits `property-changed` and invalidates on success.
    pub fn set_property(&mut self, id: WidgetId, name: &str, value: PropertyValue) -> Result<Propagation> {
        let store = self.node(id)?.properties.clone();
        store.check(name, &value)?;
        let args = [PropertyValue::Str(name.to_owned()), value.clone()];
        if self.emit(id, SignalKind::SetProperty, &args).is_stop() {
            tracing::trace!(target: targets::PROPERTY, ?id, name, "set vetoed");
            return Ok(Propagation::Stop);
        }
        store.set(name, value)?;
        self.property_changed(id, name);
        Ok(Propagation::Pass)
    }

    /// Parse `text` by the property's declared type, then
    /// [`set_property`](Self::set_property).
    pub fn set_property_from_string(&mut self, id: WidgetId, name: &str, text: &str) -> Result<Propagation> {
        let value = self.node(id)?.properties.parse_value(name, text)?;
        self.set_property(id, name, value)
    }

    /// Owner-side write that bypasses the writable flag and the veto.
    pub(crate) fn set_property_internal(&mut self, id: WidgetId, name: &str, value: PropertyValue) -> Result<()> {
        let store = self.node(id)?.properties.clone();
        if store.get(name)? == value {
            return Ok(());
        }
        store.set_internal(name, value)?;
        self.property_changed(id, name);
        Ok(())
    }

    fn property_changed(&mut self, id: WidgetId, name: &str) {
        let Ok(value) = self.property(id, name) else {
            return;
        };
        self.emit(id, SignalKind::PropertyChanged, &[PropertyValue::Str(name.to_owned()), value]);
        self.invalidate(id);
    }

    // ── Visibility and damage ────────────────────────────────────────

    pub fn show(&mut self, id: WidgetId) -> Result<Propagation> {
        self.node(id)?;
        if self.emit(id, SignalKind::Show, &[]).is_stop() {
            return Ok(Propagation::Stop);
        }
        self.set_flags(id, WidgetFlags::VISIBLE)
    }

    /// Hide `id`. Keyboard focus and pointer capture held inside the hidden
    /// subtree are dropped.
    pub fn hide(&mut self, id: WidgetId) -> Result<Propagation> {
        self.node(id)?;
        if self.emit(id, SignalKind::Hide, &[]).is_stop() {
            return Ok(Propagation::Stop);
        }
        let result = self.unset_flags(id, WidgetFlags::VISIBLE)?;
        if result.is_pass() {
            self.drop_window_slots_inside(id);
        }
        Ok(result)
    }

    /// Drop every routing slot and mnemonic the subtree holds in its window.
    fn leave_window(&mut self, id: WidgetId) {
        self.drop_window_slots_inside(id);
        let Some(window) = self.toplevel(id) else {
            return;
        };
        let subtree = self.walk_depth_first(id);
        if let Some(default) = self.default_widget(window).filter(|d| subtree.contains(d)) {
            if let Some(node) = self.get_mut(default) {
                node.flags.remove(WidgetFlags::HAS_DEFAULT);
            }
        }
        if let Some(state) = self.window_state_mut(window) {
            for &w in &subtree {
                state.forget(w);
            }
        }
    }

    fn drop_window_slots_inside(&mut self, id: WidgetId) {
        let Some(window) = self.toplevel(id) else {
            return;
        };
        let inside = |tree: &WidgetTree, slot: Option<WidgetId>| {
            slot.filter(|&w| w == id || tree.is_ancestor(id, w))
        };
        let (focus, grab, hover) = match self.window_state(window) {
            Some(w) => (
                inside(self, w.focus),
                inside(self, w.event_focus),
                inside(self, w.hover),
            ),
            None => return,
        };
        if focus.is_some() {
            self.clear_focus(window);
        }
        if let Some(holder) = grab {
            self.release_event_focus(holder);
        }
        if let Some(hovered) = hover {
            self.set_state(hovered, StateFlags::PRELIGHT, false);
            if let Some(w) = self.window_state_mut(window) {
                w.hover = None;
            }
        }
    }

    /// Emit `invalidate`; on pass, queue the widget for redraw.
    pub fn invalidate(&mut self, id: WidgetId) -> Propagation {
        if !self.contains(id) {
            return Propagation::Stop;
        }
        let result = self.emit(id, SignalKind::Invalidate, &[]);
        if result.is_pass() {
            self.mark_dirty(id);
        }
        result
    }

    // ── Activation ───────────────────────────────────────────────────

    /// Emit `activate`; on pass, run the widget's default action.
    pub fn activate(&mut self, id: WidgetId) -> Propagation {
        let Some(widget) = self.get(id).map(WidgetNode::widget) else {
            return Propagation::Stop;
        };
        if !self.is_sensitive(id) {
            return Propagation::Stop;
        }
        if self.emit(id, SignalKind::Activate, &[]).is_stop() {
            return Propagation::Stop;
        }
        if let Some(activatable) = widget.as_activatable() {
            activatable.on_activate(self, id);
        }
        Propagation::Pass
    }

    /// Abort any gesture `id` has in progress. Idempotent.
    pub fn cancel_event(&mut self, id: WidgetId) {
        if let Some(widget) = self.get(id).map(WidgetNode::widget) {
            if let Some(handler) = widget.as_event_handler() {
                handler.cancel_event(self, id);
            }
        }
    }
}

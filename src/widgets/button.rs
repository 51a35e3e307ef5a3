//! Button widget: a focusable, clickable label.
//!
//! A press inside the button grabs the window's event focus so the release
//! is delivered here even when the pointer moved. Releasing inside activates
//! the button; dragging outside or losing the grab cancels the press.
//! Enter and Space activate a focused button.
//!
//! An underscore in the label marks the following letter as the button's
//! mnemonic (`_Save` is activated by the window's mnemonic modifier plus
//! `s`). A doubled underscore is a literal one.

use std::any::Any;

use crate::dom::{WidgetId, WidgetTree};
use crate::error::Result;
use crate::event::input::{InputEvent, Key, MouseAction, MouseBtn, MouseEvent};
use crate::geometry::Size;
use crate::logging::targets;
use crate::object::{
    Propagation, PropertyFlags, PropertyType, PropertyValue, SignalKind, StateFlags, WidgetFlags,
};
use crate::render::surface::Painter;
use crate::widget::traits::{Activatable, Drawable, EventHandler, Widget};
use crate::widgets::label::label_text;

const BUTTON_INIT: &str = "button";
const SYNC_MNEMONIC: &str = "button:sync-mnemonic";
const CANCEL_ON_LOST_GRAB: &str = "button:cancel-on-lost-grab";

// ---------------------------------------------------------------------------
// Mnemonic parsing
// ---------------------------------------------------------------------------

/// A label split into the text to display and its mnemonic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLabel {
    pub text: String,
    /// The mnemonic letter, lowercased.
    pub mnemonic: Option<char>,
    /// Char index of the mnemonic in `text`.
    pub mnemonic_index: Option<usize>,
}

/// Strip mnemonic markers from `label`. Only the first `_x` counts; a
/// trailing lone underscore is kept as text.
pub fn parse_mnemonic(label: &str) -> ParsedLabel {
    let mut text = String::with_capacity(label.len());
    let mut mnemonic = None;
    let mut mnemonic_index = None;
    let mut chars = label.chars().peekable();
    let mut len = 0;
    while let Some(ch) = chars.next() {
        if ch == '_' {
            match chars.next() {
                Some('_') => text.push('_'),
                Some(next) => {
                    if mnemonic.is_none() {
                        mnemonic = Some(next.to_ascii_lowercase());
                        mnemonic_index = Some(len);
                    }
                    text.push(next);
                }
                None => text.push('_'),
            }
        } else {
            text.push(ch);
        }
        len += 1;
    }
    ParsedLabel {
        text,
        mnemonic,
        mnemonic_index,
    }
}

fn parsed_label(tree: &WidgetTree, id: WidgetId) -> ParsedLabel {
    let label = label_text(tree, id);
    let use_underline = tree
        .property(id, "use-underline")
        .ok()
        .and_then(|v| v.as_bool())
        .unwrap_or(true);
    if use_underline {
        parse_mnemonic(&label)
    } else {
        ParsedLabel {
            text: label,
            mnemonic: None,
            mnemonic_index: None,
        }
    }
}

/// Re-register `id`'s mnemonic with its current window.
fn sync_mnemonic(tree: &mut WidgetTree, id: WidgetId) {
    for (_, state) in tree.windows.iter_mut() {
        state.remove_mnemonics_for(id);
    }
    let Some(key) = parsed_label(tree, id).mnemonic else {
        return;
    };
    let Some(window) = tree.toplevel(id) else {
        return;
    };
    if let Some(state) = tree.window_state_mut(window) {
        state.add_mnemonic(key, id);
        tracing::trace!(target: targets::EVENT, ?window, ?id, %key, "mnemonic registered");
    }
}

// ---------------------------------------------------------------------------
// Button
// ---------------------------------------------------------------------------

/// A push button. Emits `clicked` when activated.
#[derive(Debug, Clone, Default)]
pub struct Button {
    label: String,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }

    fn press(&self, tree: &mut WidgetTree, id: WidgetId, mouse: &MouseEvent) -> Propagation {
        let Some(node) = tree.get_mut(id) else {
            return Propagation::Pass;
        };
        if !node.region().contains_point(mouse.position()) {
            return Propagation::Pass;
        }
        node.press_origin = Some(mouse.position());
        tree.set_state(id, StateFlags::ACTIVE, true);
        if let Err(err) = tree.set_property_internal(id, "pressed", true.into()) {
            tracing::warn!(target: targets::EVENT, ?id, %err, "cannot mark pressed");
        }
        if let Err(err) = tree.grab_event_focus(id) {
            tracing::warn!(target: targets::EVENT, ?id, %err, "press without pointer grab");
        }
        if tree.can_focus(id) {
            if let Err(err) = tree.grab_focus(id) {
                tracing::debug!(target: targets::EVENT, ?id, %err, "press did not move focus");
            }
        }
        tree.emit(id, SignalKind::ButtonPress, &[]);
        Propagation::Stop
    }

    fn release(&self, tree: &mut WidgetTree, id: WidgetId, mouse: &MouseEvent) -> Propagation {
        let Some(node) = tree.get(id) else {
            return Propagation::Pass;
        };
        if node.press_origin.is_none() {
            return Propagation::Pass;
        }
        let inside = node.region().contains_point(mouse.position());
        tree.emit(id, SignalKind::ButtonRelease, &[]);
        self.cancel_event(tree, id);
        if inside {
            tree.activate(id);
        }
        Propagation::Stop
    }

    fn drag(&self, tree: &mut WidgetTree, id: WidgetId, mouse: &MouseEvent) -> Propagation {
        let Some(node) = tree.get(id) else {
            return Propagation::Pass;
        };
        if node.press_origin.is_none() {
            return Propagation::Pass;
        }
        if !node.region().contains_point(mouse.position()) {
            tracing::trace!(target: targets::EVENT, ?id, "drag left button, press cancelled");
            self.cancel_event(tree, id);
        }
        Propagation::Stop
    }
}

impl Widget for Button {
    fn type_name(&self) -> &'static str {
        "button"
    }

    fn init(&self, tree: &mut WidgetTree, id: WidgetId) -> Result<()> {
        tree.init_base(id)?;
        tree.ensure_init(id, BUTTON_INIT, |tree| {
            let node = tree.node_mut(id)?;
            node.flags.insert(WidgetFlags::CAN_FOCUS);
            let props = node.properties.clone();
            props.install("label", PropertyType::Str, PropertyFlags::DEFAULT, PropertyValue::Str(self.label.clone()))?;
            props.install("pressed", PropertyType::Bool, PropertyFlags::empty(), false.into())?;
            props.install("use-underline", PropertyType::Bool, PropertyFlags::DEFAULT, true.into())?;

            tree.connect(id, SignalKind::PropertyChanged, SYNC_MNEMONIC, |tree, inv| {
                let name = inv.arg(0).and_then(PropertyValue::as_str);
                if matches!(name, Some("label" | "use-underline")) {
                    sync_mnemonic(tree, inv.source);
                }
                Propagation::Pass
            })?;
            tree.connect(id, SignalKind::LostEventFocus, CANCEL_ON_LOST_GRAB, |tree, inv| {
                tree.cancel_event(inv.source);
                Propagation::Pass
            })
        })
    }

    fn natural_size(&self, tree: &WidgetTree, id: WidgetId) -> Size {
        let width = parsed_label(tree, id).text.chars().count() as i32 + 4;
        Size::new(width, 1)
    }

    fn hierarchy_changed(&self, tree: &mut WidgetTree, id: WidgetId) {
        sync_mnemonic(tree, id);
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        Some(self)
    }

    fn as_event_handler(&self) -> Option<&dyn EventHandler> {
        Some(self)
    }

    fn as_activatable(&self) -> Option<&dyn Activatable> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl EventHandler for Button {
    fn process_event(&self, tree: &mut WidgetTree, id: WidgetId, event: &InputEvent) -> Propagation {
        match event {
            InputEvent::Mouse(mouse) => match mouse.kind {
                MouseAction::Down(MouseBtn::Left) => self.press(tree, id, mouse),
                MouseAction::Up(MouseBtn::Left) => self.release(tree, id, mouse),
                MouseAction::Drag(MouseBtn::Left) => self.drag(tree, id, mouse),
                _ => Propagation::Pass,
            },
            InputEvent::Key(key)
                if key.modifiers.is_empty() && matches!(key.code, Key::Enter | Key::Char(' ')) =>
            {
                tree.activate(id);
                Propagation::Stop
            }
            _ => Propagation::Pass,
        }
    }

    fn cancel_event(&self, tree: &mut WidgetTree, id: WidgetId) {
        let Some(node) = tree.get_mut(id) else {
            return;
        };
        node.press_origin = None;
        tree.set_state(id, StateFlags::ACTIVE, false);
        if let Err(err) = tree.set_property_internal(id, "pressed", false.into()) {
            tracing::warn!(target: targets::EVENT, ?id, %err, "cannot clear pressed");
        }
        tree.release_event_focus(id);
    }
}

impl Activatable for Button {
    fn on_activate(&self, tree: &mut WidgetTree, id: WidgetId) {
        tracing::debug!(target: targets::EVENT, ?id, "clicked");
        tree.emit(id, SignalKind::Clicked, &[]);
    }
}

impl Drawable for Button {
    fn draw(&self, tree: &WidgetTree, id: WidgetId, painter: &mut Painter<'_>) {
        let theme = tree.current_theme(id);
        let parsed = parsed_label(tree, id);
        let text = format!("[ {} ]", parsed.text);
        let len = text.chars().count() as i32;
        let width = painter.size().width;
        let y = (painter.size().height - 1) / 2;
        let x = ((width - len) / 2).max(0);
        painter.put_str(x, y, &text, theme.text);
        if let Some(index) = parsed.mnemonic_index {
            if let Some(ch) = parsed.text.chars().nth(index) {
                let mut underlined = theme.text;
                underlined.underline = true;
                painter.put_char(x + 2 + index as i32, y, ch, underlined);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::render::surface::Canvas;
    use crate::widgets::Window;

    // ── Mnemonics ────────────────────────────────────────────────────

    #[test]
    fn parse_mnemonic_marks_first_letter() {
        let parsed = parse_mnemonic("_Save as");
        assert_eq!(parsed.text, "Save as");
        assert_eq!(parsed.mnemonic, Some('s'));
        assert_eq!(parsed.mnemonic_index, Some(0));

        let parsed = parse_mnemonic("Save _As");
        assert_eq!(parsed.mnemonic, Some('a'));
        assert_eq!(parsed.mnemonic_index, Some(5));
    }

    #[test]
    fn parse_mnemonic_handles_literals() {
        assert_eq!(parse_mnemonic("snake__case").text, "snake_case");
        assert_eq!(parse_mnemonic("snake__case").mnemonic, None);
        assert_eq!(parse_mnemonic("end_").text, "end_");
        assert_eq!(parse_mnemonic("plain").mnemonic, None);
    }

    #[test]
    fn label_change_moves_mnemonic() {
        let mut tree = WidgetTree::default();
        let window = tree.create_widget(Rc::new(Window::new("w")), None).unwrap();
        let button = tree.create_widget(Rc::new(Button::new("_Open")), Some(window)).unwrap();
        let targets = |tree: &WidgetTree, key| tree.window_state(window).unwrap().mnemonic_targets(key).collect::<Vec<_>>();
        assert_eq!(targets(&tree, 'o'), vec![button]);

        tree.set_property(button, "label", "_Close".into()).unwrap();
        assert!(targets(&tree, 'o').is_empty());
        assert_eq!(targets(&tree, 'c'), vec![button]);

        tree.set_property(button, "use-underline", false.into()).unwrap();
        assert!(targets(&tree, 'c').is_empty());
    }

    #[test]
    fn moving_between_windows_moves_mnemonic() {
        let mut tree = WidgetTree::default();
        let first = tree.create_widget(Rc::new(Window::new("a")), None).unwrap();
        let second = tree.create_widget(Rc::new(Window::new("b")), None).unwrap();
        let button = tree.create_widget(Rc::new(Button::new("_Go")), Some(first)).unwrap();
        tree.move_widget(button, second).unwrap();
        assert!(tree.window_state(first).unwrap().mnemonics.is_empty());
        assert_eq!(tree.window_state(second).unwrap().mnemonic_targets('g').count(), 1);
    }

    // ── Behavior ─────────────────────────────────────────────────────

    #[test]
    fn pressed_is_read_only() {
        let mut tree = WidgetTree::default();
        let button = tree.create_widget(Rc::new(Button::new("b")), None).unwrap();
        assert!(tree.set_property(button, "pressed", true.into()).is_err());
        assert!(tree.can_focus(button));
    }

    #[test]
    fn space_activates() {
        let mut tree = WidgetTree::default();
        let window = tree.create_widget(Rc::new(Window::new("w")), None).unwrap();
        let button = tree.create_widget(Rc::new(Button::new("b")), Some(window)).unwrap();
        let clicks = Rc::new(std::cell::Cell::new(0));
        let sink = Rc::clone(&clicks);
        tree.connect(button, SignalKind::Clicked, "count", move |_, _| {
            sink.set(sink.get() + 1);
            Propagation::Pass
        })
        .unwrap();
        let space = InputEvent::key(Key::Char(' '), crate::event::Modifiers::NONE);
        assert_eq!(tree.deliver(button, &space), Propagation::Stop);
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn draws_bracketed_label() {
        let mut tree = WidgetTree::default();
        let button = tree.create_widget(Rc::new(Button::new("_OK")), None).unwrap();
        let mut canvas = Canvas::new(Size::new(10, 1));
        Button::default().draw(&tree, button, &mut Painter::new(&mut canvas));
        assert_eq!(canvas.row_text(0), "  [ OK ]  ");
        assert!(canvas.get(4, 0).unwrap().style.underline);
        let widget = tree.get(button).unwrap().widget();
        assert_eq!(widget.natural_size(&tree, button), Size::new(6, 1));
    }
}

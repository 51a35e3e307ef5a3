//! Dialog: a window with a content area, an action row, and a single-shot
//! response.
//!
//! [`WidgetTree::run_dialog`] shows the dialog and hands back a
//! `oneshot::Receiver` right away; the event loop keeps running and the
//! receiver resolves when a response is given, either by an action button
//! or by [`WidgetTree::respond`]. Each `run` resolves at most once.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use tokio::sync::oneshot;

use crate::dom::{TreeError, WidgetId, WidgetTree};
use crate::error::Result;
use crate::logging::targets;
use crate::object::{Propagation, PropertyValue, SignalKind, ValueParseError};
use crate::render::surface::Painter;
use crate::widget::traits::{Container as ContainerCapability, Drawable, Widget};
use crate::widgets::container::{is_horizontal, spacing};
use crate::widgets::window::{draw_frame, init_window, is_decorated};
use crate::widgets::{Button, Container};

const DIALOG_INIT: &str = "dialog";
const RESPOND_ON_CLICK: &str = "dialog:respond";

// ---------------------------------------------------------------------------
// ResponseType
// ---------------------------------------------------------------------------

/// Why a dialog was dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseType {
    None,
    Reject,
    Accept,
    /// The dialog was closed without choosing an action.
    DeleteEvent,
    Ok,
    Cancel,
    Close,
    Yes,
    No,
    Apply,
    Help,
}

impl ResponseType {
    pub const ALL: [ResponseType; 11] = [
        ResponseType::None,
        ResponseType::Reject,
        ResponseType::Accept,
        ResponseType::DeleteEvent,
        ResponseType::Ok,
        ResponseType::Cancel,
        ResponseType::Close,
        ResponseType::Yes,
        ResponseType::No,
        ResponseType::Apply,
        ResponseType::Help,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::None => "none",
            ResponseType::Reject => "reject",
            ResponseType::Accept => "accept",
            ResponseType::DeleteEvent => "delete-event",
            ResponseType::Ok => "ok",
            ResponseType::Cancel => "cancel",
            ResponseType::Close => "close",
            ResponseType::Yes => "yes",
            ResponseType::No => "no",
            ResponseType::Apply => "apply",
            ResponseType::Help => "help",
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseType {
    type Err = ValueParseError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        ResponseType::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValueParseError::UnknownVariant {
                type_name: "response",
                value: s.to_owned(),
            })
    }
}

// ---------------------------------------------------------------------------
// Dialog
// ---------------------------------------------------------------------------

/// A modal window: content on top, action buttons in a row below.
#[derive(Debug, Default)]
pub struct Dialog {
    title: String,
    sender: RefCell<Option<oneshot::Sender<ResponseType>>>,
    content_area: Cell<Option<WidgetId>>,
    action_area: Cell<Option<WidgetId>>,
}

impl Dialog {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// The column to put the dialog's content in.
    pub fn content_area(&self) -> Option<WidgetId> {
        self.content_area.get()
    }

    /// The row holding the action buttons.
    pub fn action_area(&self) -> Option<WidgetId> {
        self.action_area.get()
    }

    /// Whether a `run` is waiting for its response.
    pub fn is_running(&self) -> bool {
        self.sender.borrow().as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Show the dialog and start a new response request. A request still
    /// pending from an earlier `run` is dropped, closing its receiver.
    pub fn run(&self, tree: &mut WidgetTree, id: WidgetId) -> Result<oneshot::Receiver<ResponseType>> {
        let (tx, rx) = oneshot::channel();
        if self.sender.replace(Some(tx)).is_some() {
            tracing::debug!(target: targets::APP, ?id, "dialog re-run, previous request dropped");
        }
        tree.show(id)?;
        if tree.focused(id).is_none() {
            tree.focus_next(id);
        }
        tracing::debug!(target: targets::APP, ?id, "dialog running");
        Ok(rx)
    }

    /// Emit `response` carrying the response name; on pass, resolve the
    /// pending request, if any.
    pub fn respond(&self, tree: &mut WidgetTree, id: WidgetId, response: ResponseType) -> Propagation {
        let args = [PropertyValue::Str(response.as_str().to_owned())];
        if tree.emit(id, SignalKind::Response, &args).is_stop() {
            tracing::trace!(target: targets::APP, ?id, %response, "response vetoed");
            return Propagation::Stop;
        }
        match self.sender.borrow_mut().take() {
            Some(tx) => {
                if tx.send(response).is_err() {
                    tracing::debug!(target: targets::APP, ?id, %response, "response receiver dropped");
                }
            }
            None => tracing::debug!(target: targets::APP, ?id, %response, "response with no run pending"),
        }
        Propagation::Pass
    }

    /// Add a button to the action row that responds with `response` when
    /// clicked.
    pub fn add_button(
        &self,
        tree: &mut WidgetTree,
        id: WidgetId,
        label: &str,
        response: ResponseType,
    ) -> Result<WidgetId> {
        let row = self.action_area().unwrap_or(id);
        let button = tree.create_widget(Rc::new(Button::new(label)), Some(row))?;
        tree.connect(button, SignalKind::Clicked, RESPOND_ON_CLICK, move |tree, _| {
            if let Err(err) = tree.respond(id, response) {
                tracing::warn!(target: targets::APP, dialog = ?id, %err, "action button lost its dialog");
            }
            Propagation::Pass
        })?;
        Ok(button)
    }
}

impl Widget for Dialog {
    fn type_name(&self) -> &'static str {
        "dialog"
    }

    fn init(&self, tree: &mut WidgetTree, id: WidgetId) -> Result<()> {
        init_window(tree, id, &self.title)?;
        tree.ensure_init(id, DIALOG_INIT, |tree| {
            tree.node(id)?.properties.set_internal("modal", true.into())?;

            let content = tree.create_widget(Rc::new(Container::vertical()), Some(id))?;
            tree.node_mut(content)?.add_class("content-area");
            tree.set_property(content, "expand", true.into())?;
            let actions = tree.create_widget(Rc::new(Container::horizontal().with_spacing(1)), Some(id))?;
            tree.node_mut(actions)?.add_class("action-area");

            self.content_area.set(Some(content));
            self.action_area.set(Some(actions));
            Ok(())
        })
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        Some(self)
    }

    fn as_container(&self) -> Option<&dyn ContainerCapability> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ContainerCapability for Dialog {
    fn is_horizontal(&self, tree: &WidgetTree, id: WidgetId) -> bool {
        is_horizontal(tree, id)
    }

    fn spacing(&self, tree: &WidgetTree, id: WidgetId) -> i32 {
        spacing(tree, id)
    }

    fn padding(&self, tree: &WidgetTree, id: WidgetId) -> i32 {
        i32::from(is_decorated(tree, id))
    }
}

impl Drawable for Dialog {
    fn draw(&self, tree: &WidgetTree, id: WidgetId, painter: &mut Painter<'_>) {
        draw_frame(tree, id, painter);
    }
}

// ---------------------------------------------------------------------------
// Tree helpers
// ---------------------------------------------------------------------------

impl WidgetTree {
    fn with_dialog<T>(&mut self, id: WidgetId, f: impl FnOnce(&Dialog, &mut WidgetTree) -> T) -> Result<T> {
        let widget = self.node(id)?.widget();
        let dialog = widget
            .as_any()
            .downcast_ref::<Dialog>()
            .ok_or(TreeError::PreconditionFailed { id, reason: "not a dialog" })?;
        Ok(f(dialog, self))
    }

    /// [`Dialog::run`] on the dialog at `id`.
    pub fn run_dialog(&mut self, id: WidgetId) -> Result<oneshot::Receiver<ResponseType>> {
        self.with_dialog(id, |dialog, tree| dialog.run(tree, id))?
    }

    /// [`Dialog::respond`] on the dialog at `id`.
    pub fn respond(&mut self, id: WidgetId, response: ResponseType) -> Result<Propagation> {
        self.with_dialog(id, |dialog, tree| dialog.respond(tree, id, response))
    }

    /// [`Dialog::add_button`] on the dialog at `id`.
    pub fn add_dialog_button(&mut self, id: WidgetId, label: &str, response: ResponseType) -> Result<WidgetId> {
        self.with_dialog(id, |dialog, tree| dialog.add_button(tree, id, label, response))?
    }

    /// The content column of the dialog at `id`.
    pub fn dialog_content_area(&mut self, id: WidgetId) -> Result<Option<WidgetId>> {
        self.with_dialog(id, |dialog, _| dialog.content_area())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::input::{InputEvent, Key, Modifiers};
    use crate::widgets::Window;

    fn dialog_tree() -> (WidgetTree, WidgetId) {
        let mut tree = WidgetTree::default();
        let dialog = tree.create_widget(Rc::new(Dialog::new("Save?")), None).unwrap();
        (tree, dialog)
    }

    // ── ResponseType ─────────────────────────────────────────────────

    #[test]
    fn response_names_round_trip() {
        for response in ResponseType::ALL {
            assert_eq!(response.as_str().parse::<ResponseType>().unwrap(), response);
        }
        assert_eq!("Delete-Event".parse::<ResponseType>().unwrap(), ResponseType::DeleteEvent);
        assert!("maybe".parse::<ResponseType>().is_err());
    }

    // ── Structure ────────────────────────────────────────────────────

    #[test]
    fn init_builds_areas() {
        let (tree, dialog) = dialog_tree();
        let children = tree.children(dialog);
        assert_eq!(children.len(), 2);
        assert!(tree.get(children[0]).unwrap().has_class("content-area"));
        assert!(tree.get(children[1]).unwrap().has_class("action-area"));
        assert_eq!(tree.property(dialog, "modal").unwrap(), true.into());
        assert!(tree.window_state(dialog).is_some());
    }

    #[test]
    fn helpers_reject_other_widgets() {
        let mut tree = WidgetTree::default();
        let window = tree.create_widget(Rc::new(Window::new("w")), None).unwrap();
        assert!(matches!(
            tree.run_dialog(window),
            Err(crate::Error::Tree(TreeError::PreconditionFailed { reason: "not a dialog", .. }))
        ));
    }

    // ── Responses ────────────────────────────────────────────────────

    #[test]
    fn respond_resolves_once() {
        let (mut tree, dialog) = dialog_tree();
        let mut rx = tree.run_dialog(dialog).unwrap();
        assert!(rx.try_recv().is_err());
        tree.respond(dialog, ResponseType::Apply).unwrap();
        tree.respond(dialog, ResponseType::Cancel).unwrap();
        assert_eq!(rx.try_recv().unwrap(), ResponseType::Apply);
    }

    #[test]
    fn response_veto_keeps_request_pending() {
        let (mut tree, dialog) = dialog_tree();
        let mut rx = tree.run_dialog(dialog).unwrap();
        tree.connect(dialog, SignalKind::Response, "block", |_, inv| {
            if inv.arg(0).and_then(PropertyValue::as_str) == Some("close") {
                Propagation::Stop
            } else {
                Propagation::Pass
            }
        })
        .unwrap();
        assert_eq!(tree.respond(dialog, ResponseType::Close).unwrap(), Propagation::Stop);
        assert!(rx.try_recv().is_err());
        tree.respond(dialog, ResponseType::Ok).unwrap();
        assert_eq!(rx.try_recv().unwrap(), ResponseType::Ok);
    }

    #[test]
    fn rerun_closes_previous_receiver() {
        let (mut tree, dialog) = dialog_tree();
        let mut first = tree.run_dialog(dialog).unwrap();
        let mut second = tree.run_dialog(dialog).unwrap();
        assert_eq!(first.try_recv(), Err(oneshot::error::TryRecvError::Closed));
        tree.respond(dialog, ResponseType::Yes).unwrap();
        assert_eq!(second.try_recv().unwrap(), ResponseType::Yes);
    }

    #[test]
    fn action_button_responds_on_activate() {
        let (mut tree, dialog) = dialog_tree();
        tree.add_dialog_button(dialog, "_No", ResponseType::No).unwrap();
        let yes = tree.add_dialog_button(dialog, "_Yes", ResponseType::Yes).unwrap();
        let mut rx = tree.run_dialog(dialog).unwrap();

        tree.grab_focus(yes).unwrap();
        tree.dispatch(dialog, &InputEvent::key(Key::Enter, Modifiers::NONE));
        assert_eq!(rx.try_recv().unwrap(), ResponseType::Yes);
    }

    #[test]
    fn run_focuses_first_action() {
        let (mut tree, dialog) = dialog_tree();
        let no = tree.add_dialog_button(dialog, "No", ResponseType::No).unwrap();
        let _rx = tree.run_dialog(dialog).unwrap();
        assert_eq!(tree.focused(dialog), Some(no));
    }
}

//! Node types: WidgetId, WidgetNode.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use slotmap::new_key_type;

use super::tree::WidgetTree;
use crate::geometry::{Offset, Region, Size};
use crate::object::{PropertyStore, SignalBus, StateFlags, StyleState, WidgetFlags};
use crate::widget::Widget;

new_key_type! {
    /// Handle to a widget in the tree arena. Copy, lightweight, and stale
    /// handles are detected rather than dangling.
    pub struct WidgetId;
}

/// Everything the tree stores for one widget.
pub struct WidgetNode {
    /// Style type name (`window`, `box`, `button`, ...).
    pub type_name: &'static str,
    /// Optional name, matched by `#name` selectors.
    pub name: Option<String>,
    /// Style classes, matched by `.class` selectors.
    pub classes: Vec<String>,
    pub flags: WidgetFlags,
    pub state: StateFlags,
    pub properties: PropertyStore,
    pub signals: SignalBus<WidgetTree>,
    /// Absolute position of the top-left cell.
    pub origin: Offset,
    pub allocation: Size,
    /// Where the pointer went down, while a press is in progress.
    pub(crate) press_origin: Option<Offset>,
    /// Which initializers have completed for this instance.
    pub(crate) init_tags: BTreeSet<&'static str>,
    pub(crate) widget: Rc<dyn Widget>,
}

impl WidgetNode {
    /// A fresh node for `widget`, not yet initialized.
    pub fn new(widget: Rc<dyn Widget>) -> Self {
        Self {
            type_name: widget.type_name(),
            name: None,
            classes: Vec::new(),
            flags: WidgetFlags::empty(),
            state: StateFlags::empty(),
            properties: PropertyStore::new(),
            signals: SignalBus::new(),
            origin: Offset::default(),
            allocation: Size::ZERO,
            press_origin: None,
            init_tags: BTreeSet::new(),
            widget,
        }
    }

    /// Set the name (builder).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Add a class (builder).
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.add_class(&class.into());
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add a class. No-op if already present.
    pub fn add_class(&mut self, class: &str) {
        if !self.has_class(class) {
            self.classes.push(class.to_owned());
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        self.classes.retain(|c| c != class);
    }

    /// Absolute screen region.
    pub fn region(&self) -> Region {
        Region::from_parts(self.origin, self.allocation)
    }

    /// The widget behavior object.
    pub fn widget(&self) -> Rc<dyn Widget> {
        Rc::clone(&self.widget)
    }

    /// The dominant local state. Ancestor sensitivity is not considered;
    /// see `WidgetTree::style_state` for that.
    pub fn local_style_state(&self) -> StyleState {
        StyleState::from_flags(self.state)
    }

    /// Whether the initializer named `tag` has completed.
    pub fn is_initialized(&self, tag: &str) -> bool {
        self.init_tags.contains(tag)
    }
}

impl fmt::Debug for WidgetNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WidgetNode")
            .field("type_name", &self.type_name)
            .field("name", &self.name)
            .field("classes", &self.classes)
            .field("flags", &self.flags)
            .field("state", &self.state)
            .field("origin", &self.origin)
            .field("allocation", &self.allocation)
            .finish_non_exhaustive()
    }
}

//! Toplevel window: the root of a routed widget tree.

use std::any::Any;

use crate::dom::{WidgetId, WidgetTree};
use crate::error::Result;
use crate::logging::targets;
use crate::object::{PropertyFlags, PropertyType, PropertyValue, WidgetFlags};
use crate::render::cell::CellStyle;
use crate::render::surface::Painter;
use crate::widget::traits::{Container as ContainerCapability, Drawable, Widget};
use crate::widgets::container::{install_box_properties, is_horizontal, spacing};

const WINDOW_INIT: &str = "window";

/// A toplevel. Owns the focus, event-focus, hover, default-widget and
/// mnemonic state its descendants are routed through, and lays its
/// children out like a vertical box.
#[derive(Debug, Clone, Default)]
pub struct Window {
    title: String,
}

impl Window {
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into() }
    }
}

pub(crate) fn is_decorated(tree: &WidgetTree, id: WidgetId) -> bool {
    tree.property(id, "decorated")
        .ok()
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Shared window initialization, also run by dialogs.
pub(crate) fn init_window(tree: &mut WidgetTree, id: WidgetId, title: &str) -> Result<()> {
    tree.init_base(id)?;
    tree.ensure_init(id, WINDOW_INIT, |tree| {
        if tree.parent(id).is_some() {
            tracing::warn!(target: targets::TREE, ?id, "window created with a parent; routing uses the root");
        }
        tree.register_window(id);
        let node = tree.node_mut(id)?;
        node.flags.insert(WidgetFlags::TOPLEVEL);
        let props = node.properties.clone();
        props.install("title", PropertyType::Str, PropertyFlags::DEFAULT, PropertyValue::Str(title.to_owned()))?;
        props.install("decorated", PropertyType::Bool, PropertyFlags::DEFAULT, true.into())?;
        props.install("modal", PropertyType::Bool, PropertyFlags::DEFAULT, false.into())?;
        install_box_properties(tree, id, false, 0)
    })
}

impl Widget for Window {
    fn type_name(&self) -> &'static str {
        "window"
    }

    fn init(&self, tree: &mut WidgetTree, id: WidgetId) -> Result<()> {
        init_window(tree, id, &self.title)
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

impl ContainerCapability for Window {
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

/// Frame and title of a decorated window.
pub(crate) fn draw_frame(tree: &WidgetTree, id: WidgetId, painter: &mut Painter<'_>) {
    if !is_decorated(tree, id) {
        return;
    }
    let theme = tree.current_theme(id);
    if !theme.border {
        let frame = CellStyle {
            fg: theme.border_color.or(theme.text.fg),
            ..theme.text
        };
        painter.draw_border(frame);
    }
    let title = tree
        .property(id, "title")
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default();
    if !title.is_empty() {
        let mut style = theme.text;
        style.bold = true;
        painter.put_centered(0, &format!(" {title} "), style);
    }
}

impl Drawable for Window {
    fn draw(&self, tree: &WidgetTree, id: WidgetId, painter: &mut Painter<'_>) {
        draw_frame(tree, id, painter);
    }
}

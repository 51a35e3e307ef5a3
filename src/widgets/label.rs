//! Label widget: read-only text, one or more lines.

use std::any::Any;

use crate::dom::{WidgetId, WidgetTree};
use crate::error::Result;
use crate::geometry::Size;
use crate::object::{PropertyFlags, PropertyType, PropertyValue};
use crate::render::surface::Painter;
use crate::widget::traits::{Drawable, Widget};

const LABEL_INIT: &str = "label";

/// Static text. The text lives in the `label` property; the value given to
/// [`Label::new`] is only its initial content.
#[derive(Debug, Clone, Default)]
pub struct Label {
    text: String,
}

impl Label {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// The text of a widget's `label` property, empty when unset.
pub(crate) fn label_text(tree: &WidgetTree, id: WidgetId) -> String {
    tree.property(id, "label")
        .ok()
        .and_then(|v| v.as_str().map(str::to_owned))
        .unwrap_or_default()
}

impl Widget for Label {
    fn type_name(&self) -> &'static str {
        "label"
    }

    fn init(&self, tree: &mut WidgetTree, id: WidgetId) -> Result<()> {
        tree.init_base(id)?;
        tree.ensure_init(id, LABEL_INIT, |tree| {
            let props = tree.node(id)?.properties.clone();
            props.install(
                "label",
                PropertyType::Str,
                PropertyFlags::DEFAULT,
                PropertyValue::Str(self.text.clone()),
            )?;
            Ok(())
        })
    }

    fn natural_size(&self, tree: &WidgetTree, id: WidgetId) -> Size {
        let text = label_text(tree, id);
        let width = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        let height = text.lines().count().max(1);
        Size::new(width as i32, height as i32)
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drawable for Label {
    fn draw(&self, tree: &WidgetTree, id: WidgetId, painter: &mut Painter<'_>) {
        let style = tree.current_theme(id).text;
        for (y, line) in label_text(tree, id).lines().enumerate() {
            painter.put_str(0, y as i32, line, style);
        }
    }
}

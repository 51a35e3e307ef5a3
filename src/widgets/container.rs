//! Box container: lays its children out in a row or a column.

use std::any::Any;

use crate::dom::{WidgetId, WidgetTree};
use crate::error::Result;
use crate::object::{PropertyFlags, PropertyType, PropertyValue, ORIENTATION};
use crate::widget::traits::{Container as ContainerCapability, Widget};

const BOX_INIT: &str = "box";

/// A row or column of children. `orientation` and `spacing` are properties,
/// so stylesheets can change them; the constructor only picks the initial
/// values.
#[derive(Debug, Clone, Copy)]
pub struct Container {
    horizontal: bool,
    spacing: i64,
}

impl Container {
    pub fn horizontal() -> Self {
        Self {
            horizontal: true,
            spacing: 0,
        }
    }

    pub fn vertical() -> Self {
        Self {
            horizontal: false,
            spacing: 0,
        }
    }

    /// Initial cells between children.
    pub fn with_spacing(mut self, spacing: i64) -> Self {
        self.spacing = spacing;
        self
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::vertical()
    }
}

/// Read an `orientation` property. Unknown or missing values mean vertical.
pub(crate) fn is_horizontal(tree: &WidgetTree, id: WidgetId) -> bool {
    tree.property(id, "orientation")
        .ok()
        .and_then(|v| v.as_variant())
        == Some("horizontal")
}

/// Read a `spacing` property, clamped to zero.
pub(crate) fn spacing(tree: &WidgetTree, id: WidgetId) -> i32 {
    tree.property(id, "spacing")
        .ok()
        .and_then(|v| v.as_int())
        .map_or(0, |s| s.clamp(0, i64::from(i32::MAX)) as i32)
}

/// Install the box layout properties on `id`.
pub(crate) fn install_box_properties(tree: &WidgetTree, id: WidgetId, horizontal: bool, spacing: i64) -> Result<()> {
    let props = tree.node(id)?.properties.clone();
    let index = if horizontal { 0 } else { 1 };
    props.install(
        "orientation",
        PropertyType::Enum(&ORIENTATION),
        PropertyFlags::DEFAULT,
        PropertyValue::Enum {
            ty: &ORIENTATION,
            index,
        },
    )?;
    props.install("spacing", PropertyType::Int, PropertyFlags::DEFAULT, PropertyValue::Int(spacing))?;
    Ok(())
}

impl Widget for Container {
    fn type_name(&self) -> &'static str {
        "box"
    }

    fn init(&self, tree: &mut WidgetTree, id: WidgetId) -> Result<()> {
        tree.init_base(id)?;
        tree.ensure_init(id, BOX_INIT, |tree| {
            install_box_properties(tree, id, self.horizontal, self.spacing)
        })
    }

    fn as_container(&self) -> Option<&dyn ContainerCapability> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl ContainerCapability for Container {
    fn is_horizontal(&self, tree: &WidgetTree, id: WidgetId) -> bool {
        is_horizontal(tree, id)
    }

    fn spacing(&self, tree: &WidgetTree, id: WidgetId) -> i32 {
        spacing(tree, id)
    }
}

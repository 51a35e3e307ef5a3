//! Widget trait and capability traits.
//!
//! The `Widget` trait is the core abstraction for every widget type. It only
//! knows a type name and how to initialize an instance in the tree. What a
//! widget can *do* is expressed by narrow capability traits that a type
//! implements as needed and exposes through the `as_*` accessors:
//!
//! - [`Drawable`]: paints into its surface
//! - [`EventHandler`]: reacts to routed input
//! - [`Activatable`]: has a default action (Enter, mnemonic, click)
//! - [`Container`]: lays its children out along an axis

use std::any::Any;

use crate::dom::{WidgetId, WidgetTree};
use crate::error::Result;
use crate::event::input::InputEvent;
use crate::geometry::Size;
use crate::object::Propagation;
use crate::render::surface::Painter;

// ---------------------------------------------------------------------------
// Widget
// ---------------------------------------------------------------------------

/// Behavior shared by every instance of one widget type.
///
/// One value lives behind an `Rc` in each node, so implementors may keep
/// per-instance state in `Cell`/`RefCell` fields. All per-widget data that
/// should be visible to styles, markup or other widgets belongs in the
/// node's property store instead.
pub trait Widget: Any {
    /// The style type name (`button`, `box`, ...), matched by type selectors.
    fn type_name(&self) -> &'static str;

    /// Install properties, flags and internal handlers. Must be idempotent;
    /// implementations wrap their body in [`WidgetTree::ensure_init`].
    fn init(&self, tree: &mut WidgetTree, id: WidgetId) -> Result<()>;

    /// Size wanted when no size request is set.
    fn natural_size(&self, _tree: &WidgetTree, _id: WidgetId) -> Size {
        Size::ZERO
    }

    /// Called after the widget is attached or moved in the tree.
    fn hierarchy_changed(&self, _tree: &mut WidgetTree, _id: WidgetId) {}

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        None
    }

    fn as_event_handler(&self) -> Option<&dyn EventHandler> {
        None
    }

    fn as_activatable(&self) -> Option<&dyn Activatable> {
        None
    }

    fn as_container(&self) -> Option<&dyn Container> {
        None
    }

    /// Downcast to `&dyn Any` for runtime type inspection.
    fn as_any(&self) -> &dyn Any;
}

// ---------------------------------------------------------------------------
// Capabilities
// ---------------------------------------------------------------------------

/// Paints the widget into its own surface. The painter is already clipped
/// to the allocation and uses widget-local coordinates.
pub trait Drawable {
    fn draw(&self, tree: &WidgetTree, id: WidgetId, painter: &mut Painter<'_>);
}

/// Class handler for routed input, run after the `process-event` signal
/// passes.
pub trait EventHandler {
    fn process_event(&self, tree: &mut WidgetTree, id: WidgetId, event: &InputEvent) -> Propagation;

    /// Abort any gesture in progress. Idempotent.
    fn cancel_event(&self, _tree: &mut WidgetTree, _id: WidgetId) {}
}

/// Default action run after the `activate` signal passes.
pub trait Activatable {
    fn on_activate(&self, tree: &mut WidgetTree, id: WidgetId);
}

/// Lays its children out in a row or column.
pub trait Container {
    fn is_horizontal(&self, tree: &WidgetTree, id: WidgetId) -> bool;

    /// Cells between adjacent children.
    fn spacing(&self, tree: &WidgetTree, id: WidgetId) -> i32;

    /// Cells reserved on every edge before children are placed.
    fn padding(&self, _tree: &WidgetTree, _id: WidgetId) -> i32 {
        0
    }
}

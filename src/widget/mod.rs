//! Widget system: the widget and capability traits, shared base behavior,
//! and the type registry.

pub mod base;
pub mod registry;
pub mod traits;

pub use base::BASE_INIT;
pub use registry::{TypeRegistry, WidgetFactory};
pub use traits::{Activatable, Container, Drawable, EventHandler, Widget};

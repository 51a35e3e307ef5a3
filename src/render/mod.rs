//! Rendering pipeline: cell styles, per-widget surfaces, compositor, terminal driver.

pub mod cell;
pub mod compositor;
pub mod driver;
pub mod surface;

pub use cell::{CellStyle, StyledCell};
pub use compositor::{CellUpdate, Compositor};
pub use driver::Driver;
pub use surface::{paint_stack, paint_subtree, Canvas, Painter, Surface};

//! Event system: input events, accelerators, focus, routing.

pub mod accel;
pub mod focus;
pub mod input;
pub mod router;

pub use accel::{AccelError, AccelMap, Accelerator};
pub use input::{from_crossterm, InputEvent, Key, KeyEvent, Modifiers, MouseAction, MouseBtn, MouseEvent};

//! Built-in widgets: Window, Dialog, Container (box), Button, Label.

pub mod button;
pub mod container;
pub mod dialog;
pub mod label;
pub mod window;

pub use button::{parse_mnemonic, Button, ParsedLabel};
pub use container::Container;
pub use dialog::{Dialog, ResponseType};
pub use label::Label;
pub use window::Window;

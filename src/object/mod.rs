//! Object model: typed properties, vetoable signals, widget flags.
//!
//! - **[`value`]**: the closed set of property value kinds and their parsers
//! - **[`property`]**: per-object property store
//! - **[`signal`]**: per-object signal bus with pass/stop propagation
//! - **[`flags`]**: widget flags, interaction state, style states

pub mod flags;
pub mod property;
pub mod signal;
pub mod value;

pub use flags::{StateFlags, StyleState, WidgetFlags};
pub use property::{PropertyError, PropertyFlags, PropertyStore};
pub use signal::{Invocation, Propagation, SignalBus, SignalError, SignalKind};
pub use value::{Color, EnumType, PropertyType, PropertyValue, ValueParseError, ORIENTATION};

//! Layout engine: taffy-backed flex allocation for widget trees.

pub mod engine;

pub use engine::LayoutEngine;

//! # tessel
//!
//! A retained-mode terminal widget toolkit. Widgets live in one arena-backed
//! tree and share a small object model: typed properties, vetoable signals,
//! state flags, and a CSS-like cascade that writes resolved values back into
//! properties. Input is routed per window through mnemonics, keyboard focus,
//! pointer grabs and an application-wide accelerator map.
//!
//! ## Core Systems
//!
//! - **[`object`]**: property values and stores, the signal bus, widget flags
//! - **[`dom`]**: slotmap-backed widget tree, per-window routing state, queries
//! - **[`css`]**: tokenizer, parser, media conditions, cascade, state themes
//! - **[`widget`]**: the `Widget` trait, capability traits, base operations
//! - **[`widgets`]**: Window, Dialog, Box container, Button, Label
//! - **[`event`]**: input events, accelerators, focus, routing
//! - **[`layout`]**: taffy-powered flex allocation
//! - **[`render`]**: per-widget canvases, compositor, crossterm driver
//! - **[`app`]**: application struct tying everything together
//! - **[`testing`]**: headless pilot and snapshot helpers
//! - **[`geometry`]**: Offset, Size, Region primitives

// Foundation
pub mod error;
pub mod geometry;
pub mod logging;
pub mod object;

// Core systems
pub mod context;
pub mod css;
pub mod dom;
pub mod layout;

// Widget system
pub mod widget;
pub mod widgets;

// Events
pub mod event;

// Rendering
pub mod render;

// Application
pub mod app;
pub mod testing;

pub use error::{Error, Result};

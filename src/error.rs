//! Crate-wide error type.

use crate::css::StyleError;
use crate::dom::TreeError;
use crate::event::AccelError;
use crate::object::{PropertyError, SignalError};

/// Any failure reported by a tessel operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Property(#[from] PropertyError),
    #[error(transparent)]
    Signal(#[from] SignalError),
    #[error(transparent)]
    Style(#[from] StyleError),
    #[error(transparent)]
    Accel(#[from] AccelError),
    #[error("layout failed: {0}")]
    Layout(#[from] taffy::TaffyError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

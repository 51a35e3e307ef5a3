//! Style cascade: tokenizer, AST, parser, media conditions, matching,
//! and per-state themes.

pub mod cascade;
pub mod media;
pub mod model;
pub mod parser;
pub mod theme;
pub mod tokenizer;

pub use cascade::{selector_matches, ResolvedStyle};
pub use media::{MediaContext, MediaQuery};
pub use model::{CompoundSelector, Declaration, Rule, Selector, StyleItem, StyleSheet};
pub use parser::{parse_selector, parse_selector_list, StyleError};
pub use theme::{StateTheme, Theme};

//! Stylesheet AST: CompoundSelector, Selector, Declaration, Rule, StyleSheet.

use std::fmt;

use super::media::MediaQuery;
use crate::dom::WidgetNode;
use crate::object::StyleState;

/// One `type#name.class:state` step of a selector.
///
/// Every component is optional. An absent type is the universal selector.
/// `state` names the style bucket the rule's declarations are filed under;
/// it does not take part in matching.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompoundSelector {
    pub type_name: Option<String>,
    pub name: Option<String>,
    pub classes: Vec<String>,
    pub state: StyleState,
}

impl CompoundSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn of_type(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_state(mut self, state: StyleState) -> Self {
        self.state = state;
        self
    }

    /// `true` for `*` (or a bare `:state`).
    pub fn is_universal(&self) -> bool {
        self.type_name.is_none() && self.name.is_none() && self.classes.is_empty()
    }

    /// Whether every component present here is also present on `node`.
    /// Type names compare ASCII case-insensitively.
    pub fn matches(&self, node: &WidgetNode) -> bool {
        if let Some(t) = &self.type_name {
            if !t.eq_ignore_ascii_case(node.type_name) {
                return false;
            }
        }
        if let Some(n) = &self.name {
            if node.name.as_deref() != Some(n.as_str()) {
                return false;
            }
        }
        self.classes.iter().all(|c| node.has_class(c))
    }
}

impl fmt::Display for CompoundSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.type_name {
            Some(t) => f.write_str(t)?,
            None if self.name.is_none() && self.classes.is_empty() => f.write_str("*")?,
            None => {}
        }
        if let Some(n) = &self.name {
            write!(f, "#{n}")?;
        }
        for c in &self.classes {
            write!(f, ".{c}")?;
        }
        if self.state != StyleState::Normal {
            write!(f, ":{}", self.state)?;
        }
        Ok(())
    }
}

/// An ancestor path of compound selectors, outermost first. The last
/// segment matches the styled widget itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Selector {
    pub segments: Vec<CompoundSelector>,
}

impl Selector {
    pub fn new(segments: Vec<CompoundSelector>) -> Self {
        Self { segments }
    }

    /// The segment that matches the widget itself.
    pub fn subject(&self) -> Option<&CompoundSelector> {
        self.segments.last()
    }

    /// The state bucket this selector's declarations go to.
    pub fn state(&self) -> StyleState {
        self.subject().map(|s| s.state).unwrap_or_default()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(">")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

/// A single `key: value` pair. `value` is kept as raw text; it is parsed
/// against the target property's type when applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub key: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(key: impl Into<String>, value: impl Into<String>, important: bool) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            important,
        }
    }
}

/// Comma-separated selector groups paired with their declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub selectors: Vec<Selector>,
    pub declarations: Vec<Declaration>,
}

/// A top-level stylesheet entry.
#[derive(Debug, Clone, PartialEq)]
pub enum StyleItem {
    Rule(Rule),
    /// Items that only apply while `query` holds.
    Media {
        query: MediaQuery,
        items: Vec<StyleItem>,
    },
}

/// A parsed stylesheet. Items keep source order, which is also cascade order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleSheet {
    pub items: Vec<StyleItem>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append every item of `other` after this sheet's items, so `other`
    /// wins ties.
    pub fn extend(&mut self, other: StyleSheet) {
        self.items.extend(other.items);
    }

    /// Total rule count, counting rules inside media blocks.
    pub fn rule_count(&self) -> usize {
        fn count(items: &[StyleItem]) -> usize {
            items
                .iter()
                .map(|item| match item {
                    StyleItem::Rule(_) => 1,
                    StyleItem::Media { items, .. } => count(items),
                })
                .sum()
        }
        count(&self.items)
    }
}

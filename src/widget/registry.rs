//! Widget type registry: create widgets from their style type name.

use std::collections::BTreeMap;
use std::rc::Rc;

use super::traits::Widget;
use crate::widgets::{Button, Container, Dialog, Label, Window};

/// Builds a fresh, uninitialized widget.
pub type WidgetFactory = fn() -> Rc<dyn Widget>;

/// Maps type names (`button`, `box`, ...) to factories. Lookup is
/// case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    factories: BTreeMap<String, WidgetFactory>,
}

impl TypeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry knowing the built-in widgets.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("window", || Rc::new(Window::new("")));
        registry.register("dialog", || Rc::new(Dialog::new("")));
        registry.register("box", || Rc::new(Container::default()));
        registry.register("button", || Rc::new(Button::new("")));
        registry.register("label", || Rc::new(Label::default()));
        registry
    }

    /// Register `factory` under `type_name`, returning the factory it
    /// replaced.
    pub fn register(&mut self, type_name: &str, factory: WidgetFactory) -> Option<WidgetFactory> {
        self.factories.insert(type_name.to_ascii_lowercase(), factory)
    }

    pub fn create(&self, type_name: &str) -> Option<Rc<dyn Widget>> {
        self.factories
            .get(&type_name.to_ascii_lowercase())
            .map(|factory| factory())
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(&type_name.to_ascii_lowercase())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_builtin_widgets() {
        let registry = TypeRegistry::with_defaults();
        assert_eq!(registry.names(), vec!["box", "button", "dialog", "label", "window"]);
        assert_eq!(registry.create("Button").unwrap().type_name(), "button");
        assert!(registry.create("slider").is_none());
    }

    #[test]
    fn register_replaces() {
        let mut registry = TypeRegistry::new();
        assert!(registry.register("status", || Rc::new(Label::new("ok"))).is_none());
        assert!(registry.register("STATUS", || Rc::new(Label::new("ok"))).is_some());
        assert!(registry.contains("status"));
        assert_eq!(registry.create("status").unwrap().type_name(), "label");
    }
}

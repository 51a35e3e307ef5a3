//! Tree queries: selector paths, lookup by name, class, type or selector.

use std::fmt;

use super::node::{WidgetId, WidgetNode};
use super::tree::WidgetTree;
use crate::css::{parse_selector_list, selector_matches, StyleError};

/// One `type#name.class` step of a widget's path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub type_name: &'static str,
    pub name: Option<String>,
    pub classes: Vec<String>,
}

impl PathSegment {
    fn of(node: &WidgetNode) -> Self {
        Self {
            type_name: node.type_name,
            name: node.name.clone(),
            classes: node.classes.clone(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)?;
        if let Some(name) = &self.name {
            write!(f, "#{name}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        Ok(())
    }
}

/// A widget's full path from its root, e.g. `window>box>button#ok`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectorPath {
    pub segments: Vec<PathSegment>,
}

impl fmt::Display for SelectorPath {
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

impl WidgetTree {
    /// The root-first path of `id`. Empty for stale ids.
    pub fn selector_path(&self, id: WidgetId) -> SelectorPath {
        let mut chain = self.ancestors(id);
        chain.reverse();
        chain.push(id);
        SelectorPath {
            segments: chain
                .into_iter()
                .filter_map(|w| self.get(w).map(PathSegment::of))
                .collect(),
        }
    }

    /// Every widget in tree order: roots in insertion order, each walked
    /// depth-first.
    pub fn tree_order(&self) -> Vec<WidgetId> {
        self.roots()
            .iter()
            .flat_map(|&root| self.walk_depth_first(root))
            .collect()
    }

    /// First widget in tree order named `name`.
    pub fn find_by_name(&self, name: &str) -> Option<WidgetId> {
        self.tree_order()
            .into_iter()
            .find(|&id| self.get(id).is_some_and(|n| n.name.as_deref() == Some(name)))
    }

    /// Widgets carrying `class`, in tree order.
    pub fn query_by_class(&self, class: &str) -> Vec<WidgetId> {
        self.query_all(|node| node.has_class(class))
    }

    /// Widgets of style type `type_name`, in tree order.
    pub fn query_by_type(&self, type_name: &str) -> Vec<WidgetId> {
        self.query_all(|node| node.type_name.eq_ignore_ascii_case(type_name))
    }

    /// Widgets matching an arbitrary predicate, in tree order.
    pub fn query_all(&self, predicate: impl Fn(&WidgetNode) -> bool) -> Vec<WidgetId> {
        self.tree_order()
            .into_iter()
            .filter(|&id| self.get(id).is_some_and(&predicate))
            .collect()
    }

    /// Widgets matched by any group of a selector list, in tree order.
    pub fn query(&self, selector: &str) -> Result<Vec<WidgetId>, StyleError> {
        let selectors = parse_selector_list(selector)?;
        Ok(self
            .tree_order()
            .into_iter()
            .filter(|&id| selectors.iter().any(|s| selector_matches(self, s, id)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::widgets::{Button, Container, Label, Window};

    /// ```text
    ///        window #main
    ///       /            \
    ///   box .toolbar     label .status
    ///   /        \
    /// button #save  button #cancel
    /// .primary      .danger
    /// ```
    fn build_query_tree() -> (WidgetTree, [WidgetId; 5]) {
        let mut tree = WidgetTree::default();
        let window = tree.create_widget(Rc::new(Window::new("Editor")), None).unwrap();
        let toolbar = tree.create_widget(Rc::new(Container::horizontal()), Some(window)).unwrap();
        let save = tree.create_widget(Rc::new(Button::new("Save")), Some(toolbar)).unwrap();
        let cancel = tree.create_widget(Rc::new(Button::new("Cancel")), Some(toolbar)).unwrap();
        let status = tree.create_widget(Rc::new(Label::new("ready")), Some(window)).unwrap();

        let named = [(window, "main"), (save, "save"), (cancel, "cancel")];
        for (id, name) in named {
            tree.get_mut(id).unwrap().name = Some(name.into());
        }
        tree.get_mut(toolbar).unwrap().add_class("toolbar");
        tree.get_mut(save).unwrap().add_class("primary");
        tree.get_mut(cancel).unwrap().add_class("danger");
        tree.get_mut(status).unwrap().add_class("status");
        (tree, [window, toolbar, save, cancel, status])
    }

    #[test]
    fn selector_path_display() {
        let (tree, [window, _, save, _, status]) = build_query_tree();
        assert_eq!(tree.selector_path(save).to_string(), "window#main>box.toolbar>button#save.primary");
        assert_eq!(tree.selector_path(status).to_string(), "window#main>label.status");
        assert_eq!(tree.selector_path(window).segments.len(), 1);
    }

    #[test]
    fn find_by_name_found_and_missing() {
        let (tree, [_, _, save, ..]) = build_query_tree();
        assert_eq!(tree.find_by_name("save"), Some(save));
        assert_eq!(tree.find_by_name("nonexistent"), None);
    }

    #[test]
    fn query_by_class_and_type() {
        let (tree, [_, _, save, cancel, _]) = build_query_tree();
        assert_eq!(tree.query_by_class("danger"), vec![cancel]);
        assert_eq!(tree.query_by_type("button"), vec![save, cancel]);
        assert_eq!(tree.query_by_type("Button"), vec![save, cancel]);
        assert!(tree.query_by_type("slider").is_empty());
    }

    #[test]
    fn query_by_selector() {
        let (tree, [window, toolbar, save, cancel, status]) = build_query_tree();
        assert_eq!(tree.query("window>box>button").unwrap(), vec![save, cancel]);
        assert_eq!(tree.query("#save, label").unwrap(), vec![save, status]);
        assert_eq!(tree.query(".toolbar").unwrap(), vec![toolbar]);
        assert_eq!(tree.query("*").unwrap().len(), 5);
        assert_eq!(tree.query("window").unwrap(), vec![window]);
        assert!(tree.query("button {").is_err());
    }

    #[test]
    fn query_all_focusable() {
        let (tree, [_, _, save, cancel, _]) = build_query_tree();
        let focusable = tree.query_all(|n| n.flags.contains(crate::object::WidgetFlags::CAN_FOCUS));
        assert_eq!(focusable, vec![save, cancel]);
    }

    #[test]
    fn query_on_empty_tree() {
        let tree = WidgetTree::default();
        assert!(tree.find_by_name("x").is_none());
        assert!(tree.query_by_class("x").is_empty());
        assert!(tree.query("x").unwrap().is_empty());
    }
}

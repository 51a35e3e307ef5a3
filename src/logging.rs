//! Logging setup and tree debugging.
//!
//! Every module logs through `tracing` with one of the [`targets`] below, so
//! a filter such as `tessel::focus=trace,tessel=warn` can isolate a single
//! subsystem. The terminal owns stdout while an app runs, so [`init`] sends
//! output to a file (or nowhere) instead.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::dom::{WidgetId, WidgetTree};
use crate::error::Result;

/// Log targets, one per subsystem.
pub mod targets {
    pub const TREE: &str = "tessel::tree";
    pub const SIGNAL: &str = "tessel::signal";
    pub const PROPERTY: &str = "tessel::property";
    pub const STYLE: &str = "tessel::style";
    pub const FOCUS: &str = "tessel::focus";
    pub const EVENT: &str = "tessel::event";
    pub const ACCEL: &str = "tessel::accel";
    pub const LAYOUT: &str = "tessel::layout";
    pub const APP: &str = "tessel::app";
}

/// Where log output goes and how much of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// An `EnvFilter` directive, e.g. `warn` or `tessel::event=trace`.
    /// `RUST_LOG` overrides it when set.
    pub filter: String,
    /// Log file, appended to. Without one, output is discarded.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_owned(),
            file: None,
        }
    }
}

impl LogConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.filter))
            .unwrap_or_else(|_| EnvFilter::new("warn"))
    }
}

/// Install the global subscriber. Returns `false` when one was already
/// installed, which is not an error.
pub fn init(config: &LogConfig) -> Result<bool> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_ansi(false);
    let installed = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder.with_writer(Mutex::new(file)).try_init().is_ok()
        }
        None => builder.with_writer(std::io::sink).try_init().is_ok(),
    };
    if installed {
        tracing::debug!(target: targets::APP, filter = %config.filter, file = ?config.file, "logging initialized");
    }
    Ok(installed)
}

/// An indented outline of the subtree at `root`: selector-style label,
/// allocation and non-default flags per widget.
pub fn format_tree(tree: &WidgetTree, root: WidgetId) -> String {
    let mut out = String::new();
    format_node(tree, root, "", true, true, &mut out);
    out
}

fn format_node(tree: &WidgetTree, id: WidgetId, prefix: &str, last: bool, top: bool, out: &mut String) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let branch = match (top, last) {
        (true, _) => "",
        (false, true) => "└── ",
        (false, false) => "├── ",
    };
    let _ = write!(out, "{prefix}{branch}{}", node.type_name);
    if let Some(name) = &node.name {
        let _ = write!(out, "#{name}");
    }
    for class in &node.classes {
        let _ = write!(out, ".{class}");
    }
    let _ = write!(out, " {} at ({}, {})", node.allocation, node.origin.x, node.origin.y);
    if !tree.is_visible(id) {
        out.push_str(" hidden");
    }
    if tree.has_focus(id) {
        out.push_str(" focused");
    }
    out.push('\n');

    let child_prefix = match (top, last) {
        (true, _) => prefix.to_owned(),
        (false, true) => format!("{prefix}    "),
        (false, false) => format!("{prefix}│   "),
    };
    let children = tree.children(id);
    for (i, &child) in children.iter().enumerate() {
        format_node(tree, child, &child_prefix, i + 1 == children.len(), false, out);
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::widgets::{Button, Container, Label, Window};

    #[test]
    fn format_tree_outlines_structure() {
        let mut tree = WidgetTree::default();
        let window = tree.create_widget(Rc::new(Window::new("w")), None).unwrap();
        let row = tree.create_widget(Rc::new(Container::horizontal()), Some(window)).unwrap();
        let ok = tree.create_widget(Rc::new(Button::new("OK")), Some(row)).unwrap();
        tree.create_widget(Rc::new(Label::new("hi")), Some(window)).unwrap();
        tree.get_mut(ok).unwrap().name = Some("ok".into());
        tree.get_mut(row).unwrap().add_class("actions");
        tree.grab_focus(ok).unwrap();

        let text = format_tree(&tree, window);
        let expected = "\
window 0x0 at (0, 0)
├── box.actions 0x0 at (0, 0)
│   └── button#ok 0x0 at (0, 0) focused
└── label 0x0 at (0, 0)
";
        pretty_assertions::assert_eq!(text, expected);
    }

    #[test]
    fn default_config_discards_output() {
        let config = LogConfig::default();
        assert_eq!(config.filter, "warn");
        assert!(config.file.is_none());
        let config = config.with_filter("tessel=trace").with_file("/tmp/tessel.log");
        assert_eq!(config.file.as_deref(), Some(std::path::Path::new("/tmp/tessel.log")));
    }
}

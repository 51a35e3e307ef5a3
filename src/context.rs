//! Shared resources every widget tree draws on.
//!
//! A [`Context`] is the composition root: it owns the accelerator map, the
//! built-in stylesheet, the widget type registry and the mnemonic modifier.
//! Trees built from clones of one context share the accelerator map.

use std::sync::Arc;

use crate::css::StyleSheet;
use crate::event::{AccelMap, Modifiers};
use crate::widget::TypeRegistry;

/// Built-in look: focus and press feedback for buttons, dimmed insensitive
/// widgets. Application stylesheets are applied after it and win ties.
pub const DEFAULT_CSS: &str = "\
button:prelight { bold: true; }
button:selected { reverse: true; }
button:active { reverse: true; bold: true; }
button:insensitive, label:insensitive { dim: true; }
";

#[derive(Debug, Clone)]
pub struct Context {
    accel_map: Arc<AccelMap>,
    stylesheet: Arc<StyleSheet>,
    registry: TypeRegistry,
    mnemonic_modifier: Modifiers,
}

impl Context {
    /// A context with the built-in widgets and look, and an empty
    /// accelerator map.
    pub fn new() -> Self {
        Self {
            accel_map: Arc::new(AccelMap::new()),
            stylesheet: Arc::new(StyleSheet::parse_lenient(DEFAULT_CSS)),
            registry: TypeRegistry::with_defaults(),
            mnemonic_modifier: Modifiers::ALT,
        }
    }

    /// Share an existing accelerator map.
    pub fn with_accel_map(mut self, map: Arc<AccelMap>) -> Self {
        self.accel_map = map;
        self
    }

    /// Replace the built-in stylesheet.
    pub fn with_stylesheet(mut self, sheet: StyleSheet) -> Self {
        self.stylesheet = Arc::new(sheet);
        self
    }

    /// Modifier that, pressed with a letter, fires that letter's mnemonic.
    /// Applies to windows created afterwards.
    pub fn with_mnemonic_modifier(mut self, modifiers: Modifiers) -> Self {
        self.mnemonic_modifier = modifiers;
        self
    }

    pub fn with_registry(mut self, registry: TypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn accel_map(&self) -> &Arc<AccelMap> {
        &self.accel_map
    }

    pub fn stylesheet(&self) -> &StyleSheet {
        &self.stylesheet
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    pub fn mnemonic_modifier(&self) -> Modifiers {
        self.mnemonic_modifier
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Accelerator, Key};

    #[test]
    fn default_stylesheet_parses() {
        let ctx = Context::default();
        assert_eq!(ctx.stylesheet().rule_count(), 4);
        assert_eq!(ctx.mnemonic_modifier(), Modifiers::ALT);
        assert!(ctx.registry().contains("dialog"));
    }

    #[test]
    fn clones_share_accel_map() {
        let ctx = Context::default();
        let other = ctx.clone();
        ctx.accel_map()
            .add_entry("<App>/quit", Accelerator::new(Key::Char('q'), Modifiers::CTRL))
            .unwrap();
        assert_eq!(other.accel_map().len(), 1);
    }

    #[test]
    fn mnemonic_modifier_reaches_new_windows() {
        use std::rc::Rc;

        use crate::dom::WidgetTree;
        use crate::widgets::Window;

        let ctx = Context::new().with_mnemonic_modifier(Modifiers::CTRL);
        let mut tree = WidgetTree::new(ctx);
        let window = tree.create_widget(Rc::new(Window::new("w")), None).unwrap();
        assert_eq!(tree.window_state(window).unwrap().mnemonic_modifier, Modifiers::CTRL);
    }
}

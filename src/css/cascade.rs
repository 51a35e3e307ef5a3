//! Selector matching and declaration resolution.
//!
//! A rule applies to a widget when the last segment of one of its selectors
//! matches the widget and the remaining segments match its ancestors, in
//! order, nearest last. Matching declarations are merged per
//! `(state, key)` in stylesheet order: a later declaration replaces an
//! earlier one unless the earlier one is `!important` and the later is not.

use std::collections::BTreeMap;

use super::media::MediaContext;
use super::model::{Rule, Selector, StyleItem, StyleSheet};
use crate::dom::{WidgetId, WidgetTree};
use crate::logging::targets;
use crate::object::StyleState;

/// One resolved declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedValue {
    pub value: String,
    pub important: bool,
}

/// Every declaration that applies to one widget, keyed by state and key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedStyle {
    entries: BTreeMap<(StyleState, String), ResolvedValue>,
}

impl ResolvedStyle {
    pub fn get(&self, state: StyleState, key: &str) -> Option<&str> {
        self.entries
            .get(&(state, key.to_owned()))
            .map(|v| v.value.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StyleState, &str, &str)> {
        self.entries
            .iter()
            .map(|((state, key), v)| (*state, key.as_str(), v.value.as_str()))
    }

    fn merge(&mut self, state: StyleState, key: &str, value: &str, important: bool) {
        let slot = (state, key.to_owned());
        if let Some(existing) = self.entries.get(&slot) {
            if existing.important && !important {
                return;
            }
        }
        self.entries.insert(
            slot,
            ResolvedValue {
                value: value.to_owned(),
                important,
            },
        );
    }
}

/// Whether `selector` matches widget `id` in `tree`.
pub fn selector_matches(tree: &WidgetTree, selector: &Selector, id: WidgetId) -> bool {
    let Some((subject, rest)) = selector.segments.split_last() else {
        return false;
    };
    let Some(node) = tree.get(id) else {
        return false;
    };
    if !subject.matches(node) {
        return false;
    }

    let mut ancestors = tree.ancestors(id).into_iter();
    rest.iter().rev().all(|segment| {
        ancestors.any(|a| tree.get(a).is_some_and(|n| segment.matches(n)))
    })
}

impl StyleSheet {
    /// Resolve every declaration that applies to `id` under `media`.
    pub fn resolve(&self, tree: &WidgetTree, id: WidgetId, media: &MediaContext) -> ResolvedStyle {
        let mut style = ResolvedStyle::default();
        resolve_items(&self.items, tree, id, media, &mut style);
        style
    }
}

fn resolve_items(
    items: &[StyleItem],
    tree: &WidgetTree,
    id: WidgetId,
    media: &MediaContext,
    style: &mut ResolvedStyle,
) {
    for item in items {
        match item {
            StyleItem::Rule(rule) => resolve_rule(rule, tree, id, style),
            StyleItem::Media { query, items } => {
                if query.matches(media) {
                    resolve_items(items, tree, id, media, style);
                }
            }
        }
    }
}

fn resolve_rule(rule: &Rule, tree: &WidgetTree, id: WidgetId, style: &mut ResolvedStyle) {
    for selector in &rule.selectors {
        if !selector_matches(tree, selector, id) {
            continue;
        }
        let state = selector.state();
        for decl in &rule.declarations {
            style.merge(state, &decl.key, &decl.value, decl.important);
        }
    }
}

impl WidgetTree {
    /// Resolve `sheet` for `id` and push each value through the widget's
    /// string property setter as `key:state`. A normal-state key with no
    /// per-state slot falls back to a plain property named `key`.
    ///
    /// Values that cannot be applied are logged and skipped. Returns how
    /// many were applied.
    pub fn apply_styles_to(&mut self, id: WidgetId, sheet: &StyleSheet, media: &MediaContext) -> usize {
        let resolved = sheet.resolve(self, id, media);
        let mut applied = 0;
        for (state, key, value) in resolved.iter() {
            let Some(node) = self.get(id) else {
                return applied;
            };
            let state_key = format!("{key}:{state}");
            let target = if node.properties.contains(&state_key) {
                state_key
            } else if state == StyleState::Normal && node.properties.contains(key) {
                key.to_owned()
            } else {
                tracing::warn!(
                    target: targets::STYLE,
                    widget = node.type_name,
                    key,
                    %state,
                    "no property for style key"
                );
                continue;
            };

            match self.set_property_from_string(id, &target, value) {
                Ok(_) => applied += 1,
                Err(err) => {
                    tracing::warn!(target: targets::STYLE, property = %target, value, %err, "style value rejected");
                }
            }
        }
        tracing::trace!(target: targets::STYLE, ?id, applied, "styles applied");
        applied
    }

    /// [`apply_styles_to`](Self::apply_styles_to) for `root` and every descendant.
    pub fn apply_styles_recursive(&mut self, root: WidgetId, sheet: &StyleSheet, media: &MediaContext) -> usize {
        self.walk_depth_first(root)
            .into_iter()
            .map(|id| self.apply_styles_to(id, sheet, media))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::object::{Color, PropertyValue};
    use crate::widgets::{Button, Container, Label, Window};

    struct Fixture {
        tree: WidgetTree,
        window: WidgetId,
        ok: WidgetId,
        cancel: WidgetId,
        title: WidgetId,
    }

    fn fixture() -> Fixture {
        let mut tree = WidgetTree::default();
        let window = tree.create_widget(Rc::new(Window::new("main")), None).unwrap();
        let row = tree.create_widget(Rc::new(Container::horizontal()), Some(window)).unwrap();
        let ok = tree.create_widget(Rc::new(Button::new("OK")), Some(row)).unwrap();
        let cancel = tree.create_widget(Rc::new(Button::new("Cancel")), Some(row)).unwrap();
        let title = tree.create_widget(Rc::new(Label::new("Title")), Some(window)).unwrap();
        tree.get_mut(ok).unwrap().name = Some("ok".into());
        tree.get_mut(title).unwrap().add_class("heading");
        Fixture {
            tree,
            window,
            ok,
            cancel,
            title,
        }
    }

    fn sheet(src: &str) -> StyleSheet {
        StyleSheet::parse(src).unwrap()
    }

    fn media() -> MediaContext {
        MediaContext::default()
    }

    // ── Matching ─────────────────────────────────────────────────────

    #[test]
    fn path_selectors_match_ancestors() {
        let f = fixture();
        let s = |text: &str| crate::css::parser::parse_selector(text).unwrap();
        assert!(selector_matches(&f.tree, &s("button"), f.ok));
        assert!(selector_matches(&f.tree, &s("window>box>button#ok"), f.ok));
        assert!(selector_matches(&f.tree, &s("window button"), f.ok));
        assert!(!selector_matches(&f.tree, &s("window>box>button#ok"), f.cancel));
        assert!(!selector_matches(&f.tree, &s("box>label"), f.title));
        assert!(selector_matches(&f.tree, &s("window>.heading"), f.title));
        assert!(!selector_matches(&f.tree, &s("button>window"), f.window));
    }

    #[test]
    fn ancestor_order_is_respected() {
        let f = fixture();
        let s = crate::css::parser::parse_selector("box>window>button").unwrap();
        assert!(!selector_matches(&f.tree, &s, f.ok));
    }

    // ── Resolution ───────────────────────────────────────────────────

    #[test]
    fn state_rules_resolve_independently() {
        let f = fixture();
        let style = sheet("button { color: red; } button:active { color: blue; }")
            .resolve(&f.tree, f.ok, &media());
        assert_eq!(style.get(StyleState::Normal, "color"), Some("red"));
        assert_eq!(style.get(StyleState::Active, "color"), Some("blue"));
    }

    #[test]
    fn later_rule_wins() {
        let f = fixture();
        let style = sheet("button#ok { color: red; } button { color: green; }")
            .resolve(&f.tree, f.ok, &media());
        assert_eq!(style.get(StyleState::Normal, "color"), Some("green"));
    }

    #[test]
    fn important_beats_later_plain() {
        let f = fixture();
        let style = sheet("button { color: red !important; } button { color: green; } button { color: blue !important; }")
            .resolve(&f.tree, f.ok, &media());
        assert_eq!(style.get(StyleState::Normal, "color"), Some("blue"));

        let style = sheet("button { color: red !important; } button { color: green; }")
            .resolve(&f.tree, f.ok, &media());
        assert_eq!(style.get(StyleState::Normal, "color"), Some("red"));
    }

    #[test]
    fn selector_groups_merge() {
        let f = fixture();
        let s = sheet("label, button#ok { bold: true; }");
        assert_eq!(s.resolve(&f.tree, f.ok, &media()).get(StyleState::Normal, "bold"), Some("true"));
        assert_eq!(s.resolve(&f.tree, f.title, &media()).get(StyleState::Normal, "bold"), Some("true"));
        assert!(s.resolve(&f.tree, f.cancel, &media()).is_empty());
    }

    #[test]
    fn media_blocks_follow_context() {
        let f = fixture();
        let s = sheet("button { color: red; } @media (min-width: 100) { button { color: blue; } }");
        let narrow = MediaContext::new(crate::geometry::Size::new(80, 24));
        let wide = MediaContext::new(crate::geometry::Size::new(120, 40));
        assert_eq!(s.resolve(&f.tree, f.ok, &narrow).get(StyleState::Normal, "color"), Some("red"));
        assert_eq!(s.resolve(&f.tree, f.ok, &wide).get(StyleState::Normal, "color"), Some("blue"));
    }

    // ── Application ──────────────────────────────────────────────────

    #[test]
    fn apply_sets_state_suffixed_properties() {
        let mut f = fixture();
        let s = sheet("button { color: red; } button:active { color: #0000ff; bold: true; }");
        let applied = f.tree.apply_styles_to(f.ok, &s, &media());
        assert_eq!(applied, 3);
        assert_eq!(
            f.tree.property(f.ok, "color:normal").unwrap(),
            PropertyValue::Color(Color::Red)
        );
        assert_eq!(
            f.tree.property(f.ok, "color:active").unwrap(),
            PropertyValue::Color(Color::Rgb(0, 0, 255))
        );
        assert_eq!(f.tree.property(f.ok, "bold:active").unwrap(), PropertyValue::Bool(true));
        assert!(!f.tree.get(f.ok).unwrap().properties.is_set("bold:normal"));
    }

    #[test]
    fn apply_falls_back_to_plain_property() {
        let mut f = fixture();
        let s = sheet("box { spacing: 2; }");
        let row = f.tree.parent(f.ok).unwrap();
        assert_eq!(f.tree.apply_styles_to(row, &s, &media()), 1);
        assert_eq!(f.tree.property(row, "spacing").unwrap(), PropertyValue::Int(2));
    }

    #[test]
    fn apply_skips_unknown_and_bad_values() {
        let mut f = fixture();
        let s = sheet("button { sparkle: lots; color: not-a-colour; bold: true; }");
        assert_eq!(f.tree.apply_styles_to(f.ok, &s, &media()), 1);
        assert_eq!(f.tree.property(f.ok, "color:normal").unwrap(), PropertyValue::Color(Color::Default));
    }

    #[test]
    fn apply_recursive_covers_subtree() {
        let mut f = fixture();
        let s = sheet("* { dim: true; }");
        let applied = f.tree.apply_styles_recursive(f.window, &s, &media());
        assert_eq!(applied, f.tree.walk_depth_first(f.window).len());
    }
}

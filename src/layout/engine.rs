//! TaffyTree wrapper for layout computation.
//!
//! [`LayoutEngine`] mirrors one window's widget tree into a taffy flex tree,
//! runs layout for the window's size, and writes each widget's absolute
//! origin and allocation back into the tree.

use std::collections::{HashMap, HashSet};

use taffy::prelude::*;

use crate::dom::{WidgetId, WidgetTree};
use crate::error::Result;
use crate::geometry::{Offset, Region, Size as CellSize};
use crate::logging::targets;
use crate::object::WidgetFlags;

/// Wraps a [`TaffyTree`] and maintains a mapping from [`WidgetId`]s to taffy
/// node ids. Nodes are reused between syncs.
pub struct LayoutEngine {
    tree: TaffyTree<WidgetId>,
    node_map: HashMap<WidgetId, NodeId>,
    /// The widget the last sync started from.
    root: Option<WidgetId>,
}

/// Read an integer request property; negative means unset.
fn request(widgets: &WidgetTree, id: WidgetId, name: &str) -> Option<f32> {
    widgets
        .property(id, name)
        .ok()
        .and_then(|v| v.as_int())
        .filter(|v| *v >= 0)
        .map(|v| v as f32)
}

/// The flex style for one widget.
///
/// Boxes become flex rows or columns with `spacing` as the gap and the
/// container's padding on every side. Leaves are sized to their size
/// requests, falling back to their natural size. `expand` lets a widget
/// grow along its parent's axis.
fn widget_style(widgets: &WidgetTree, id: WidgetId) -> Style {
    let Some(node) = widgets.get(id) else {
        return Style::DEFAULT;
    };
    if !node.flags.contains(WidgetFlags::VISIBLE) {
        return Style {
            display: Display::None,
            ..Style::DEFAULT
        };
    }
    let widget = node.widget();
    let expand = widgets
        .property(id, "expand")
        .ok()
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    let width = request(widgets, id, "width-request");
    let height = request(widgets, id, "height-request");

    let mut style = Style {
        display: Display::Flex,
        flex_grow: if expand { 1.0 } else { 0.0 },
        flex_shrink: 0.0,
        ..Style::DEFAULT
    };

    match widget.as_container() {
        Some(container) => {
            let horizontal = container.is_horizontal(widgets, id);
            let spacing = container.spacing(widgets, id) as f32;
            let padding = LengthPercentage::from_length(container.padding(widgets, id) as f32);
            style.flex_direction = if horizontal { FlexDirection::Row } else { FlexDirection::Column };
            style.gap = Size {
                width: LengthPercentage::from_length(spacing),
                height: LengthPercentage::from_length(spacing),
            };
            style.padding = Rect {
                left: padding,
                right: padding,
                top: padding,
                bottom: padding,
            };
            style.size = Size {
                width: width.map_or(Dimension::AUTO, Dimension::from_length),
                height: height.map_or(Dimension::AUTO, Dimension::from_length),
            };
        }
        None => {
            let natural = widget.natural_size(widgets, id);
            let w = width.unwrap_or(natural.width as f32);
            let h = height.unwrap_or(natural.height as f32);
            style.min_size = Size {
                width: Dimension::from_length(w),
                height: Dimension::from_length(h),
            };
            if !expand {
                style.size = style.min_size;
            }
        }
    }
    style
}

impl LayoutEngine {
    /// Create a new, empty layout engine.
    pub fn new() -> Self {
        Self {
            tree: TaffyTree::new(),
            node_map: HashMap::new(),
            root: None,
        }
    }

    /// Synchronize the taffy tree with the subtree at `root`.
    ///
    /// Stale taffy nodes are removed, styles are refreshed for every live
    /// widget and child lists are rebuilt in tree order.
    pub fn sync_tree(&mut self, widgets: &WidgetTree, root: WidgetId) -> Result<()> {
        let live_nodes = widgets.walk_depth_first(root);
        let live_set: HashSet<WidgetId> = live_nodes.iter().copied().collect();

        let stale_keys: Vec<WidgetId> = self
            .node_map
            .keys()
            .filter(|k| !live_set.contains(k))
            .copied()
            .collect();
        for key in stale_keys {
            if let Some(taffy_id) = self.node_map.remove(&key) {
                self.tree.remove(taffy_id)?;
            }
        }

        for &id in &live_nodes {
            let style = widget_style(widgets, id);
            match self.node_map.get(&id) {
                Some(&taffy_id) => self.tree.set_style(taffy_id, style)?,
                None => {
                    let taffy_id = self.tree.new_leaf_with_context(style, id)?;
                    self.node_map.insert(id, taffy_id);
                }
            }
        }

        for &id in &live_nodes {
            let children: Vec<NodeId> = widgets
                .children(id)
                .iter()
                .filter_map(|child| self.node_map.get(child).copied())
                .collect();
            if let Some(&taffy_id) = self.node_map.get(&id) {
                self.tree.set_children(taffy_id, &children)?;
            }
        }

        self.root = Some(root);
        tracing::trace!(target: targets::LAYOUT, ?root, nodes = live_nodes.len(), "layout tree synced");
        Ok(())
    }

    /// Lay the synced tree out into `available` cells. The root is forced to
    /// exactly that size.
    pub fn compute(&mut self, available: CellSize) -> Result<()> {
        let Some(root) = self.root.and_then(|r| self.node_map.get(&r).copied()) else {
            return Ok(());
        };
        let mut style = self.tree.style(root)?.clone();
        style.size = Size {
            width: Dimension::from_length(available.width as f32),
            height: Dimension::from_length(available.height as f32),
        };
        self.tree.set_style(root, style)?;
        self.tree.compute_layout(
            root,
            Size {
                width: AvailableSpace::Definite(available.width as f32),
                height: AvailableSpace::Definite(available.height as f32),
            },
        )?;
        Ok(())
    }

    /// The computed region of `id`, relative to its parent.
    ///
    /// Taffy's f32 coordinates are rounded to the nearest integer cell.
    pub fn get_layout(&self, id: WidgetId) -> Option<Region> {
        let taffy_id = self.node_map.get(&id)?;
        let layout = self.tree.layout(*taffy_id).ok()?;
        Some(Region::new(
            layout.location.x.round() as i32,
            layout.location.y.round() as i32,
            layout.size.width.round() as i32,
            layout.size.height.round() as i32,
        ))
    }

    /// Write absolute origins and allocations back to the widget tree, with
    /// the root placed at `origin`. Widgets whose region changed are
    /// invalidated. Returns how many changed.
    pub fn apply(&self, widgets: &mut WidgetTree, origin: Offset) -> usize {
        let Some(root) = self.root else {
            return 0;
        };
        let mut changed = 0;
        let mut stack = vec![(root, origin)];
        while let Some((id, parent_origin)) = stack.pop() {
            let Some(local) = self.get_layout(id) else {
                continue;
            };
            let origin = Offset::new(parent_origin.x + local.x, parent_origin.y + local.y);
            let allocation = local.size();
            let moved = match widgets.get_mut(id) {
                Some(node) if node.origin != origin || node.allocation != allocation => {
                    node.origin = origin;
                    node.allocation = allocation;
                    true
                }
                _ => false,
            };
            if moved {
                changed += 1;
                widgets.invalidate(id);
            }
            for &child in widgets.children(id).iter().rev() {
                stack.push((child, origin));
            }
        }
        tracing::trace!(target: targets::LAYOUT, ?root, changed, "layout applied");
        changed
    }

    /// Sync, compute and apply in one step, filling `area` with `root`.
    pub fn layout(&mut self, widgets: &mut WidgetTree, root: WidgetId, area: Region) -> Result<usize> {
        self.sync_tree(widgets, root)?;
        self.compute(area.size())?;
        Ok(self.apply(widgets, area.origin()))
    }

    /// Number of mirrored widgets.
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::widgets::{Button, Container, Label, Window};

    /// window 20x6 > [row(spacing 1) > [ok, cancel], label]
    fn window_tree() -> (WidgetTree, WidgetId, WidgetId, WidgetId, WidgetId, WidgetId) {
        let mut widgets = WidgetTree::default();
        let window = widgets.create_widget(Rc::new(Window::new("w")), None).unwrap();
        let row = widgets
            .create_widget(Rc::new(Container::horizontal().with_spacing(1)), Some(window))
            .unwrap();
        let ok = widgets.create_widget(Rc::new(Button::new("OK")), Some(row)).unwrap();
        let cancel = widgets.create_widget(Rc::new(Button::new("Cancel")), Some(row)).unwrap();
        let label = widgets.create_widget(Rc::new(Label::new("status")), Some(window)).unwrap();
        (widgets, window, row, ok, cancel, label)
    }

    fn region(widgets: &WidgetTree, id: WidgetId) -> Region {
        widgets.get(id).unwrap().region()
    }

    #[test]
    fn new_engine_is_empty() {
        let engine = LayoutEngine::default();
        assert!(engine.is_empty());
        assert!(engine.get_layout(WidgetId::default()).is_none());
    }

    #[test]
    fn rows_and_columns_with_padding() {
        let (mut widgets, window, row, ok, cancel, label) = window_tree();
        let mut engine = LayoutEngine::new();
        engine.layout(&mut widgets, window, Region::new(0, 0, 20, 6)).unwrap();

        assert_eq!(engine.len(), 5);
        assert_eq!(region(&widgets, window), Region::new(0, 0, 20, 6));
        assert_eq!(region(&widgets, row), Region::new(1, 1, 18, 1));
        assert_eq!(region(&widgets, ok), Region::new(1, 1, 6, 1));
        assert_eq!(region(&widgets, cancel), Region::new(8, 1, 10, 1));
        assert_eq!(region(&widgets, label), Region::new(1, 2, 6, 1));
    }

    #[test]
    fn expand_takes_remaining_space() {
        let (mut widgets, window, _, _, _, label) = window_tree();
        widgets.set_property(label, "expand", true.into()).unwrap();
        let mut engine = LayoutEngine::new();
        engine.layout(&mut widgets, window, Region::new(0, 0, 20, 6)).unwrap();
        assert_eq!(region(&widgets, label), Region::new(1, 2, 18, 3));
    }

    #[test]
    fn size_requests_override_natural_size() {
        let (mut widgets, window, _, ok, cancel, _) = window_tree();
        widgets.set_property(ok, "width-request", crate::object::PropertyValue::Int(3)).unwrap();
        let mut engine = LayoutEngine::new();
        engine.layout(&mut widgets, window, Region::new(0, 0, 20, 6)).unwrap();
        assert_eq!(region(&widgets, ok).width, 3);
        assert_eq!(region(&widgets, cancel).x, 5);
    }

    #[test]
    fn hidden_widgets_take_no_space() {
        let (mut widgets, window, _, ok, cancel, _) = window_tree();
        widgets.hide(ok).unwrap();
        let mut engine = LayoutEngine::new();
        engine.layout(&mut widgets, window, Region::new(0, 0, 20, 6)).unwrap();
        assert_eq!(region(&widgets, cancel).x, 1);
    }

    #[test]
    fn area_origin_offsets_everything() {
        let (mut widgets, window, _, ok, _, _) = window_tree();
        let mut engine = LayoutEngine::new();
        engine.layout(&mut widgets, window, Region::new(5, 2, 20, 6)).unwrap();
        assert_eq!(region(&widgets, window), Region::new(5, 2, 20, 6));
        assert_eq!(region(&widgets, ok), Region::new(6, 3, 6, 1));
    }

    #[test]
    fn resync_drops_destroyed_widgets() {
        let (mut widgets, window, _, ok, _, _) = window_tree();
        let mut engine = LayoutEngine::new();
        engine.layout(&mut widgets, window, Region::new(0, 0, 20, 6)).unwrap();
        widgets.destroy(ok);
        engine.layout(&mut widgets, window, Region::new(0, 0, 20, 6)).unwrap();
        assert_eq!(engine.len(), 4);
        assert!(engine.get_layout(ok).is_none());
    }

    #[test]
    fn apply_reports_changes_once() {
        let (mut widgets, window, ..) = window_tree();
        let mut engine = LayoutEngine::new();
        assert_eq!(engine.layout(&mut widgets, window, Region::new(0, 0, 20, 6)).unwrap(), 5);
        assert_eq!(engine.layout(&mut widgets, window, Region::new(0, 0, 20, 6)).unwrap(), 0);
        assert!(engine.layout(&mut widgets, window, Region::new(0, 0, 30, 6)).unwrap() > 0);
    }
}

//! The widget tree arena: insert, remove, reparent, walk.

use slotmap::{SecondaryMap, SlotMap};

use super::node::{WidgetId, WidgetNode};
use super::window::WindowState;
use crate::context::Context;
use crate::logging::targets;

/// Empty slice constant for returning when a widget has no children.
const EMPTY_CHILDREN: &[WidgetId] = &[];

/// Structural errors and failed preconditions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("widget {0:?} does not exist")]
    NoSuchWidget(WidgetId),
    #[error("widget {0:?} cannot hold children")]
    NotAContainer(WidgetId),
    #[error("widget {0:?} is not inside a window")]
    NoWindow(WidgetId),
    #[error("moving {node:?} under {parent:?} would create a cycle")]
    WouldCycle { node: WidgetId, parent: WidgetId },
    #[error("precondition failed for {id:?}: {reason}")]
    PreconditionFailed { id: WidgetId, reason: &'static str },
    #[error("no widget type named '{0}'")]
    UnknownType(String),
}

/// All widgets of an application, owned by index.
///
/// Parent and child links live in secondary maps, so there are no reference
/// cycles and removing a subtree is O(subtree size). Per-window routing
/// state and explicit focus chains are keyed the same way and are pruned
/// when the widgets they mention go away.
pub struct WidgetTree {
    nodes: SlotMap<WidgetId, WidgetNode>,
    children: SecondaryMap<WidgetId, Vec<WidgetId>>,
    parent: SecondaryMap<WidgetId, WidgetId>,
    roots: Vec<WidgetId>,
    pub(crate) windows: SecondaryMap<WidgetId, WindowState>,
    pub(crate) focus_chains: SecondaryMap<WidgetId, Vec<WidgetId>>,
    dirty: Vec<WidgetId>,
    context: Context,
}

impl WidgetTree {
    /// An empty tree using `context` for shared resources.
    pub fn new(context: Context) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            roots: Vec::new(),
            windows: SecondaryMap::new(),
            focus_chains: SecondaryMap::new(),
            dirty: Vec::new(),
            context,
        }
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    // -----------------------------------------------------------------------
    // Structure
    // -----------------------------------------------------------------------

    /// Insert a parentless widget.
    pub fn insert(&mut self, node: WidgetNode) -> WidgetId {
        let id = self.nodes.insert(node);
        self.children.insert(id, Vec::new());
        self.roots.push(id);
        id
    }

    /// Insert a widget as the last child of `parent`.
    pub fn insert_child(&mut self, parent: WidgetId, node: WidgetNode) -> Result<WidgetId, TreeError> {
        if !self.nodes.contains_key(parent) {
            return Err(TreeError::NoSuchWidget(parent));
        }
        let id = self.nodes.insert(node);
        self.children.insert(id, Vec::new());
        self.parent.insert(id, parent);
        if let Some(siblings) = self.children.get_mut(parent) {
            siblings.push(id);
        }
        Ok(id)
    }

    /// Remove a widget and its whole subtree.
    ///
    /// Every window slot, mnemonic and explicit focus chain that mentions a
    /// removed widget forgets it. Returns the removed node, or `None` if it
    /// did not exist.
    pub fn remove(&mut self, id: WidgetId) -> Option<WidgetNode> {
        if !self.nodes.contains_key(id) {
            return None;
        }

        if let Some(parent_id) = self.parent.remove(id) {
            if let Some(siblings) = self.children.get_mut(parent_id) {
                siblings.retain(|&child| child != id);
            }
        }
        self.roots.retain(|&r| r != id);

        let doomed = self.walk_depth_first(id);
        let mut removed_root = None;
        for &current in &doomed {
            self.children.remove(current);
            self.parent.remove(current);
            self.windows.remove(current);
            self.focus_chains.remove(current);
            let node = self.nodes.remove(current);
            if current == id {
                removed_root = node;
            }
        }

        for (_, window) in self.windows.iter_mut() {
            for &gone in &doomed {
                window.forget(gone);
            }
        }
        for (_, chain) in self.focus_chains.iter_mut() {
            chain.retain(|w| !doomed.contains(w));
        }
        self.dirty.retain(|w| !doomed.contains(w));

        tracing::trace!(target: targets::TREE, ?id, count = doomed.len(), "removed subtree");
        removed_root
    }

    /// Move `node` (with its subtree) to the end of `new_parent`'s children.
    pub fn reparent(&mut self, node: WidgetId, new_parent: WidgetId) -> Result<(), TreeError> {
        for id in [node, new_parent] {
            if !self.nodes.contains_key(id) {
                return Err(TreeError::NoSuchWidget(id));
            }
        }
        if node == new_parent || self.is_ancestor(node, new_parent) {
            return Err(TreeError::WouldCycle {
                node,
                parent: new_parent,
            });
        }

        match self.parent.remove(node) {
            Some(old_parent) => {
                if let Some(siblings) = self.children.get_mut(old_parent) {
                    siblings.retain(|&child| child != node);
                }
            }
            None => self.roots.retain(|&r| r != node),
        }

        self.parent.insert(node, new_parent);
        if let Some(siblings) = self.children.get_mut(new_parent) {
            siblings.push(node);
        }
        Ok(())
    }

    pub fn parent(&self, id: WidgetId) -> Option<WidgetId> {
        self.parent.get(id).copied()
    }

    /// Children in insertion order. Empty for leaves and stale ids.
    pub fn children(&self, id: WidgetId) -> &[WidgetId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Ancestors from the immediate parent up to the root, excluding `id`.
    pub fn ancestors(&self, id: WidgetId) -> Vec<WidgetId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            if p == id {
                break;
            }
            result.push(p);
            current = p;
        }
        result
    }

    /// Whether `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: WidgetId, id: WidgetId) -> bool {
        self.ancestors(id).contains(&ancestor)
    }

    /// The root of `id`'s tree, if that root is a toplevel window.
    pub fn toplevel(&self, id: WidgetId) -> Option<WidgetId> {
        let root = self.ancestors(id).last().copied().unwrap_or(id);
        self.windows.contains_key(root).then_some(root)
    }

    /// Parentless widgets in insertion order.
    pub fn roots(&self) -> &[WidgetId] {
        &self.roots
    }

    pub fn get(&self, id: WidgetId) -> Option<&WidgetNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: WidgetId) -> Option<&mut WidgetNode> {
        self.nodes.get_mut(id)
    }

    /// Like [`get`](Self::get) but reports a stale id as an error.
    pub fn node(&self, id: WidgetId) -> Result<&WidgetNode, TreeError> {
        self.nodes.get(id).ok_or(TreeError::NoSuchWidget(id))
    }

    pub fn node_mut(&mut self, id: WidgetId) -> Result<&mut WidgetNode, TreeError> {
        self.nodes.get_mut(id).ok_or(TreeError::NoSuchWidget(id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: WidgetId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Every `(id, node)` pair in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (WidgetId, &WidgetNode)> {
        self.nodes.iter()
    }

    /// Pre-order depth-first traversal starting at `start`.
    pub fn walk_depth_first(&self, start: WidgetId) -> Vec<WidgetId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    // -----------------------------------------------------------------------
    // Windows
    // -----------------------------------------------------------------------

    /// Give `id` its own routing state, making it a toplevel.
    pub(crate) fn register_window(&mut self, id: WidgetId) {
        if !self.windows.contains_key(id) {
            let state = WindowState::new(self.context.mnemonic_modifier());
            self.windows.insert(id, state);
        }
    }

    pub fn window_state(&self, window: WidgetId) -> Option<&WindowState> {
        self.windows.get(window)
    }

    pub fn window_state_mut(&mut self, window: WidgetId) -> Option<&mut WindowState> {
        self.windows.get_mut(window)
    }

    /// All toplevels, in insertion order.
    pub fn windows(&self) -> Vec<WidgetId> {
        self.roots
            .iter()
            .copied()
            .filter(|r| self.windows.contains_key(*r))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Damage
    // -----------------------------------------------------------------------

    pub(crate) fn mark_dirty(&mut self, id: WidgetId) {
        if !self.dirty.contains(&id) {
            self.dirty.push(id);
        }
    }

    /// Whether anything was invalidated since the last [`take_dirty`](Self::take_dirty).
    pub fn is_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    /// Drain the invalidated widgets.
    pub fn take_dirty(&mut self) -> Vec<WidgetId> {
        std::mem::take(&mut self.dirty)
    }
}

impl Default for WidgetTree {
    fn default() -> Self {
        Self::new(Context::default())
    }
}

//! Row Tree
//!
//! The row tree owns every row node in an arena. Grouping, filtering and the
//! pivot bucketing are done by the stages that surround aggregation; this
//! type only offers the structural operations they need.
//!
//! # Layout
//!
//! - Node ids are arena indices and stay valid for the life of the tree.
//! - Removing a child detaches it from its parent but keeps its slot, so ids
//!   held elsewhere (changed paths, pivot buckets) never dangle.
//! - Footer siblings live in the arena but are not children of anyone.

use serde_json::Value;

use super::mapped::ChildrenMapped;
use super::node::{AggData, RowNode, RowNodeId};

/// Arena of row nodes rooted at a synthetic level -1 node.
#[derive(Debug, Clone)]
pub struct RowTree {
    nodes: Vec<RowNode>,
    root: RowNodeId,
}

impl RowTree {
    /// Create a tree holding only the root node.
    pub fn new() -> Self {
        let root = RowNodeId::from(0);
        Self {
            nodes: vec![RowNode::new(root, -1, None)],
            root,
        }
    }

    pub fn root(&self) -> RowNodeId {
        self.root
    }

    /// Get a reference to a node.
    pub fn get(&self, id: RowNodeId) -> Option<&RowNode> {
        self.nodes.get(id.raw())
    }

    fn get_mut(&mut self, id: RowNodeId) -> Option<&mut RowNode> {
        self.nodes.get_mut(id.raw())
    }

    fn push_node(&mut self, level: i32, parent: Option<RowNodeId>) -> RowNodeId {
        let id = RowNodeId::from(self.nodes.len());
        self.nodes.push(RowNode::new(id, level, parent));
        id
    }

    fn child_level(&self, parent: RowNodeId) -> i32 {
        self.get(parent).map(|p| p.level() + 1).unwrap_or(0)
    }

    /// Add a group under `parent` with the given key.
    pub fn add_group(&mut self, parent: RowNodeId, key: impl Into<String>) -> RowNodeId {
        let level = self.child_level(parent);
        let id = self.push_node(level, Some(parent));
        if let Some(node) = self.get_mut(id) {
            node.set_key(key.into());
        }
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.push_child(id);
        }
        id
    }

    /// Add a leaf record under `parent`. The parent becomes a leaf group.
    pub fn add_leaf(&mut self, parent: RowNodeId, data: Value) -> RowNodeId {
        let level = self.child_level(parent);
        let id = self.push_node(level, Some(parent));
        if let Some(node) = self.get_mut(id) {
            node.set_data(data);
        }
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.push_child(id);
            parent_node.set_leaf_group(true);
        }
        id
    }

    /// Create a footer row paired with `group`.
    ///
    /// The footer shares the group's level and receives the same aggregate
    /// on every pass.
    pub fn add_footer(&mut self, group: RowNodeId) -> RowNodeId {
        let level = self.get(group).map(RowNode::level).unwrap_or(0);
        let parent = self.get(group).and_then(RowNode::parent);
        let id = self.push_node(level, parent);
        if let Some(footer) = self.get_mut(id) {
            footer.mark_footer();
            footer.set_sibling(group);
        }
        if let Some(group_node) = self.get_mut(group) {
            group_node.set_sibling(id);
        }
        id
    }

    /// Detach `child` from `parent`.
    ///
    /// When the last leaf goes, the parent stops being a leaf group.
    pub fn remove_child(&mut self, parent: RowNodeId, child: RowNodeId) {
        if let Some(parent_node) = self.get_mut(parent) {
            parent_node.remove_child(child);
            if !parent_node.has_children() {
                parent_node.set_leaf_group(false);
                parent_node.set_children_mapped(None);
            }
        }
    }

    /// Replace the post-filter children of `parent`.
    ///
    /// Ids that are not structural children of `parent` are dropped.
    pub fn set_children_after_filter(&mut self, parent: RowNodeId, children: Vec<RowNodeId>) {
        if let Some(parent_node) = self.get_mut(parent) {
            let kept = children
                .into_iter()
                .filter(|c| parent_node.children_after_group().contains(c))
                .collect();
            parent_node.set_children_after_filter(kept);
        }
    }

    /// Install or clear the pivot buckets of a node.
    pub fn set_children_mapped(&mut self, id: RowNodeId, mapped: Option<ChildrenMapped>) {
        if let Some(node) = self.get_mut(id) {
            node.set_children_mapped(mapped);
        }
    }

    pub(crate) fn set_agg_data(&mut self, id: RowNodeId, agg_data: Option<AggData>) {
        if let Some(node) = self.get_mut(id) {
            node.set_agg_data(agg_data);
        }
    }

    /// Resolve a list of ids into node references, skipping unknown ids.
    pub fn nodes_of<'a>(&'a self, ids: &'a [RowNodeId]) -> impl Iterator<Item = &'a RowNode> + 'a {
        ids.iter().filter_map(move |id| self.get(*id))
    }

    /// Iterate over every node in the arena, detached ones included.
    pub fn iter(&self) -> impl Iterator<Item = &RowNode> {
        self.nodes.iter()
    }

    /// Get the total number of nodes in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

impl Default for RowTree {
    fn default() -> Self {
        Self::new()
    }
}

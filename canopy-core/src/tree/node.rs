//! Row Nodes
//!
//! This module defines the entries stored in the row tree arena. A row node
//! is either a leaf record (it carries `data`) or a group (it has children).
//! Relations between nodes are plain [`RowNodeId`] indices into the arena.

use indexmap::IndexMap;
use serde_json::Value;

use super::mapped::ChildrenMapped;

/// Aggregated values of a group, keyed by column id in column order.
pub type AggData = IndexMap<String, Value>;

/// Stable identifier for a node in the row tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowNodeId(usize);

impl RowNodeId {
    /// Get the raw arena index.
    pub fn raw(&self) -> usize {
        self.0
    }
}

impl From<usize> for RowNodeId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// A node in the row tree.
#[derive(Debug, Clone)]
pub struct RowNode {
    id: RowNodeId,

    /// Group key for groups, `None` for leaves and the root.
    key: Option<String>,

    /// Depth in the tree. The synthetic root sits at -1.
    level: i32,

    parent: Option<RowNodeId>,

    /// Raw record. Only leaves carry data.
    data: Option<Value>,

    /// Structural children produced by grouping.
    children_after_group: Vec<RowNodeId>,

    /// Children that survived filtering, in display order.
    children_after_filter: Vec<RowNodeId>,

    /// Pivot buckets of the filtered children. Leaf groups only.
    children_mapped: Option<ChildrenMapped>,

    agg_data: Option<AggData>,

    /// Footer row mirroring this group's aggregate.
    sibling: Option<RowNodeId>,

    /// True when the children are raw records rather than sub-groups.
    leaf_group: bool,

    footer: bool,
}

impl RowNode {
    pub(crate) fn new(id: RowNodeId, level: i32, parent: Option<RowNodeId>) -> Self {
        Self {
            id,
            key: None,
            level,
            parent,
            data: None,
            children_after_group: Vec::new(),
            children_after_filter: Vec::new(),
            children_mapped: None,
            agg_data: None,
            sibling: None,
            leaf_group: false,
            footer: false,
        }
    }

    pub fn id(&self) -> RowNodeId {
        self.id
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    /// Check if this is the synthetic root of the tree.
    pub fn is_root(&self) -> bool {
        self.level == -1
    }

    pub fn parent(&self) -> Option<RowNodeId> {
        self.parent
    }

    pub fn data(&self) -> Option<&Value> {
        self.data.as_ref()
    }

    pub fn children_after_group(&self) -> &[RowNodeId] {
        &self.children_after_group
    }

    pub fn children_after_filter(&self) -> &[RowNodeId] {
        &self.children_after_filter
    }

    pub fn children_mapped(&self) -> Option<&ChildrenMapped> {
        self.children_mapped.as_ref()
    }

    /// Check if the node has any structural children.
    pub fn has_children(&self) -> bool {
        !self.children_after_group.is_empty()
    }

    /// Groups are nodes with children. The root always counts as a group.
    pub fn is_group(&self) -> bool {
        self.is_root() || self.has_children()
    }

    pub fn agg_data(&self) -> Option<&AggData> {
        self.agg_data.as_ref()
    }

    pub fn sibling(&self) -> Option<RowNodeId> {
        self.sibling
    }

    pub fn is_leaf_group(&self) -> bool {
        self.leaf_group
    }

    pub fn is_footer(&self) -> bool {
        self.footer
    }

    pub(crate) fn set_key(&mut self, key: String) {
        self.key = Some(key);
    }

    pub(crate) fn set_data(&mut self, data: Value) {
        self.data = Some(data);
    }

    pub(crate) fn set_leaf_group(&mut self, leaf_group: bool) {
        self.leaf_group = leaf_group;
    }

    pub(crate) fn set_sibling(&mut self, sibling: RowNodeId) {
        self.sibling = Some(sibling);
    }

    pub(crate) fn mark_footer(&mut self) {
        self.footer = true;
    }

    pub(crate) fn push_child(&mut self, child: RowNodeId) {
        self.children_after_group.push(child);
        self.children_after_filter.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: RowNodeId) {
        self.children_after_group.retain(|c| *c != child);
        self.children_after_filter.retain(|c| *c != child);
    }

    pub(crate) fn set_children_after_filter(&mut self, children: Vec<RowNodeId>) {
        self.children_after_filter = children;
    }

    pub(crate) fn set_children_mapped(&mut self, mapped: Option<ChildrenMapped>) {
        self.children_mapped = mapped;
    }

    pub(crate) fn set_agg_data(&mut self, agg_data: Option<AggData>) {
        self.agg_data = agg_data;
    }
}

//! Changed Path
//!
//! A changed path records which branches of the row tree changed since the
//! last pass, so stages can revisit only those branches.
//!
//! # Algorithm
//!
//! 1. When a row changes, its parent group is added with
//!    [`ChangedPath::add_parent_node`], which marks that group and every
//!    ancestor up to the root.
//! 2. Each marked node remembers which value columns changed beneath it,
//!    unless the path is keeping all columns.
//! 3. Traversal walks the tree post-order and prunes every branch whose top
//!    node is not marked, so children always come before their parents.
//!
//! An inactive path prunes nothing: the whole tree is walked and every
//! column counts as changed.

use std::collections::{HashMap, HashSet};

use crate::columns::Column;

use super::node::RowNodeId;
use super::row_tree::RowTree;

/// Tracks the changed branches of a row tree.
#[derive(Debug, Clone)]
pub struct ChangedPath {
    active: bool,

    /// When true every column is treated as changed for marked nodes.
    keeping_columns: bool,

    root: RowNodeId,

    /// Marked nodes and the value column ids that changed beneath them.
    path: HashMap<RowNodeId, HashSet<String>>,
}

impl ChangedPath {
    /// Create an active path with only the root marked.
    pub fn new(keeping_columns: bool, root: RowNodeId) -> Self {
        let mut path = HashMap::new();
        path.insert(root, HashSet::new());
        Self {
            active: true,
            keeping_columns,
            root,
            path,
        }
    }

    /// Create a path that covers the whole tree.
    pub fn inactive(root: RowNodeId) -> Self {
        let mut changed_path = Self::new(true, root);
        changed_path.set_inactive();
        changed_path
    }

    pub fn set_inactive(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn root(&self) -> RowNodeId {
        self.root
    }

    /// Mark `node` and all of its ancestors as changed.
    ///
    /// `columns` lists the value columns whose values changed; they are
    /// recorded on every node along the way.
    pub fn add_parent_node(&mut self, tree: &RowTree, node: RowNodeId, columns: Option<&[Column]>) {
        let mut current = Some(node);
        while let Some(id) = current {
            let entry = self.path.entry(id).or_default();
            if let Some(columns) = columns {
                entry.extend(columns.iter().map(|c| c.id().to_string()));
            }
            if id == self.root {
                break;
            }
            current = tree.get(id).and_then(|n| n.parent());
        }
    }

    /// Check if the branch under `node` can be skipped this pass.
    pub fn can_skip(&self, node: RowNodeId) -> bool {
        self.active && !self.path.contains_key(&node)
    }

    /// Value columns to recompute for `node`.
    pub fn get_value_columns_for_node<'c>(&self, node: RowNodeId, value_columns: &'c [Column]) -> Vec<&'c Column> {
        if !self.active || self.keeping_columns {
            return value_columns.iter().collect();
        }
        match self.path.get(&node) {
            Some(changed) => value_columns
                .iter()
                .filter(|c| changed.contains(c.id()))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Value columns whose previous aggregate can be reused for `node`.
    ///
    /// Returns `None` when nothing is reused.
    pub fn get_not_value_columns_for_node<'c>(
        &self,
        node: RowNodeId,
        value_columns: &'c [Column],
    ) -> Option<Vec<&'c Column>> {
        if !self.active || self.keeping_columns {
            return None;
        }
        let changed = self.path.get(&node);
        Some(
            value_columns
                .iter()
                .filter(|c| !changed.is_some_and(|set| set.contains(c.id())))
                .collect(),
        )
    }

    /// Collect the nodes to visit, children before parents.
    pub fn changed_nodes_depth_first(&self, tree: &RowTree, traverse_leaf_nodes: bool) -> Vec<RowNodeId> {
        let mut order = Vec::new();
        if self.active {
            self.search_changed(tree, self.root, &mut order);
        } else {
            Self::search_everything(tree, self.root, traverse_leaf_nodes, &mut order);
        }
        order
    }

    /// Run `callback` on every node to visit, children before parents.
    ///
    /// The visiting order is fixed before the first callback, so callbacks
    /// may freely update node state.
    pub fn for_each_changed_node_depth_first<F>(&self, tree: &mut RowTree, mut callback: F, traverse_leaf_nodes: bool)
    where
        F: FnMut(&mut RowTree, RowNodeId),
    {
        for id in self.changed_nodes_depth_first(tree, traverse_leaf_nodes) {
            callback(tree, id);
        }
    }

    fn search_changed(&self, tree: &RowTree, id: RowNodeId, order: &mut Vec<RowNodeId>) {
        if !self.path.contains_key(&id) {
            return;
        }
        let Some(node) = tree.get(id) else {
            return;
        };
        for &child in node.children_after_group() {
            self.search_changed(tree, child, order);
        }
        order.push(id);
    }

    fn search_everything(tree: &RowTree, id: RowNodeId, traverse_leaf_nodes: bool, order: &mut Vec<RowNodeId>) {
        let Some(node) = tree.get(id) else {
            return;
        };
        if node.is_group() {
            for &child in node.children_after_group() {
                Self::search_everything(tree, child, traverse_leaf_nodes, order);
            }
            order.push(id);
        } else if traverse_leaf_nodes {
            order.push(id);
        }
    }
}

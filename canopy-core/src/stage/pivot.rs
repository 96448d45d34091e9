//! Pivot Stage
//!
//! Runs ahead of aggregation when pivoting. For every leaf group it buckets
//! the filtered children by the values of the pivot columns, then derives
//! one output column per (pivot key path, value column) plus the configured
//! total columns.
//!
//! # Column ids
//!
//! - value column: `pivot_<key1>_..._<keyN>_<valueColId>`
//! - column group total: `pivot-total_<key1>_..._<keyK>_<valueColId>`
//! - row total: `pivot-row-total_<valueColId>`
//!
//! Every segment has `\` and `_` escaped with a backslash, so distinct key
//! paths never share an id, even when keys themselves contain underscores.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;
use smallvec::SmallVec;
use tracing::{debug, debug_span};

use crate::columns::Column;
use crate::options::GridOptions;
use crate::tree::{ChangedPath, ChildrenMapped, RowNodeId, RowTree};

use super::{RowNodeStage, StageContext, StageExecuteParams};

/// Pivot key path of a value column, one segment per pivot column.
pub type PivotKeys = SmallVec<[String; 4]>;

/// A column produced by pivoting.
#[derive(Debug, Clone)]
pub enum PivotColumnDef {
    /// One cell of the pivot cross-product.
    Value {
        col_id: String,
        pivot_keys: PivotKeys,
        value_column: Column,
    },
    /// Reduces the results of other value pivot columns.
    Total {
        col_id: String,
        value_column: Column,
        total_column_ids: Vec<String>,
    },
}

impl PivotColumnDef {
    pub fn col_id(&self) -> &str {
        match self {
            PivotColumnDef::Value { col_id, .. } | PivotColumnDef::Total { col_id, .. } => col_id,
        }
    }

    /// The source column whose aggregation function is applied.
    pub fn value_column(&self) -> &Column {
        match self {
            PivotColumnDef::Value { value_column, .. } | PivotColumnDef::Total { value_column, .. } => value_column,
        }
    }

    pub fn is_total(&self) -> bool {
        matches!(self, PivotColumnDef::Total { .. })
    }
}

/// Supplies the pivot column definitions of the current pass.
pub trait PivotColumnDefSource: Send + Sync {
    fn pivot_column_defs(&self) -> Arc<Vec<PivotColumnDef>>;
}

impl PivotColumnDefSource for Vec<PivotColumnDef> {
    fn pivot_column_defs(&self) -> Arc<Vec<PivotColumnDef>> {
        Arc::new(self.clone())
    }
}

/// Sorted tree of the pivot key paths seen across all leaf groups.
#[derive(Debug, Default)]
struct UniqueKeys(BTreeMap<String, UniqueKeys>);

impl UniqueKeys {
    fn insert(&mut self, path: &[String]) {
        let mut pointer = self;
        for key in path {
            pointer = pointer.0.entry(key.clone()).or_default();
        }
    }
}

/// String form of a pivot value used as a trie segment.
fn pivot_key(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Join `kind`, the key path and the value column id into a column id.
fn pivot_col_id(kind: &str, keys: &[String], value_col_id: &str) -> String {
    let mut id = String::from(kind);
    for segment in keys.iter().map(String::as_str).chain(std::iter::once(value_col_id)) {
        id.push('_');
        for ch in segment.chars() {
            if ch == '\\' || ch == '_' {
                id.push('\\');
            }
            id.push(ch);
        }
    }
    id
}

pub struct PivotStage {
    ctx: StageContext,
    defs: RwLock<Arc<Vec<PivotColumnDef>>>,
}

impl PivotStage {
    pub fn new(ctx: StageContext) -> Self {
        Self {
            ctx,
            defs: RwLock::new(Arc::new(Vec::new())),
        }
    }

    fn execute_without_pivot(&self, tree: &mut RowTree) {
        for index in 0..tree.node_count() {
            tree.set_children_mapped(RowNodeId::from(index), None);
        }
        *self.defs.write() = Arc::new(Vec::new());
    }

    fn bucket_leaf_groups(&self, tree: &mut RowTree, changed_path: &ChangedPath, pivot_columns: &[Column]) {
        let resolver = &self.ctx.value_service;
        let depth = pivot_columns.len();

        changed_path.for_each_changed_node_depth_first(
            tree,
            |tree, id| {
                let rows = match tree.get(id) {
                    Some(node) if node.is_leaf_group() => node.children_after_filter().to_vec(),
                    _ => return,
                };
                let mapped = ChildrenMapped::bucket(&rows, depth, &mut |row, level| {
                    tree.get(row)
                        .map(|node| pivot_key(&resolver.get_value(&pivot_columns[level], node)))
                        .unwrap_or_default()
                });
                tree.set_children_mapped(id, Some(mapped));
            },
            false,
        );
    }

    fn collect_unique_keys(tree: &RowTree) -> UniqueKeys {
        let mut unique = UniqueKeys::default();
        let everything = ChangedPath::inactive(tree.root());
        for id in everything.changed_nodes_depth_first(tree, false) {
            if let Some(mapped) = tree.get(id).and_then(|n| n.children_mapped()) {
                mapped.for_each_path(|path| unique.insert(path));
            }
        }
        unique
    }

    /// Build the definitions for the given key tree.
    fn create_pivot_column_defs(
        unique: &UniqueKeys,
        depth: usize,
        value_columns: &[Column],
        options: &GridOptions,
    ) -> Vec<PivotColumnDef> {
        let mut defs = Vec::new();
        let mut prefix = PivotKeys::new();
        let ids_per_column = Self::add_defs_for_level(unique, depth, value_columns, options, &mut prefix, &mut defs);

        if options.pivot_row_totals {
            for (value_column, ids) in value_columns.iter().zip(ids_per_column) {
                defs.push(PivotColumnDef::Total {
                    col_id: pivot_col_id("pivot-row-total", &[], value_column.id()),
                    value_column: value_column.clone(),
                    total_column_ids: ids,
                });
            }
        }
        defs
    }

    /// Returns, per value column, the ids of the value definitions created
    /// beneath `prefix`.
    fn add_defs_for_level(
        level: &UniqueKeys,
        depth: usize,
        value_columns: &[Column],
        options: &GridOptions,
        prefix: &mut PivotKeys,
        defs: &mut Vec<PivotColumnDef>,
    ) -> Vec<Vec<String>> {
        let mut ids_per_column = vec![Vec::new(); value_columns.len()];

        if prefix.len() == depth {
            for (index, value_column) in value_columns.iter().enumerate() {
                let col_id = pivot_col_id("pivot", prefix.as_slice(), value_column.id());
                ids_per_column[index].push(col_id.clone());
                defs.push(PivotColumnDef::Value {
                    col_id,
                    pivot_keys: prefix.clone(),
                    value_column: value_column.clone(),
                });
            }
            return ids_per_column;
        }

        for (key, child) in &level.0 {
            prefix.push(key.clone());
            let child_ids = Self::add_defs_for_level(child, depth, value_columns, options, prefix, defs);
            prefix.pop();
            for (ids, child) in ids_per_column.iter_mut().zip(child_ids) {
                ids.extend(child);
            }
        }

        if options.pivot_column_group_totals && !prefix.is_empty() {
            for (value_column, ids) in value_columns.iter().zip(&ids_per_column) {
                defs.push(PivotColumnDef::Total {
                    col_id: pivot_col_id("pivot-total", prefix.as_slice(), value_column.id()),
                    value_column: value_column.clone(),
                    total_column_ids: ids.clone(),
                });
            }
        }

        ids_per_column
    }
}

impl PivotColumnDefSource for PivotStage {
    fn pivot_column_defs(&self) -> Arc<Vec<PivotColumnDef>> {
        self.defs.read().clone()
    }
}

impl RowNodeStage for PivotStage {
    fn execute(&self, params: &mut StageExecuteParams<'_>) {
        let column_model = self.ctx.column_model.read().clone();
        if !column_model.is_pivot_active() {
            debug!("pivot inactive, clearing pivot buckets");
            self.execute_without_pivot(params.row_tree);
            return;
        }

        let pivot_columns = column_model.pivot_columns();
        let _span = debug_span!("pivot_stage", pivot_columns = pivot_columns.len()).entered();

        self.bucket_leaf_groups(params.row_tree, params.changed_path, pivot_columns);

        let unique = Self::collect_unique_keys(params.row_tree);
        let defs = Self::create_pivot_column_defs(
            &unique,
            pivot_columns.len(),
            column_model.value_columns(),
            &self.ctx.options,
        );
        debug!(columns = defs.len(), "pivot column definitions created");
        *self.defs.write() = Arc::new(defs);
    }
}

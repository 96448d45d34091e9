//! Aggregation Stage
//!
//! Computes the aggregate of every group in the row tree and writes it onto
//! the group (and its footer, if it has one).
//!
//! # Algorithm
//!
//! 1. Snapshot the value columns, the pivot columns and the pivot column
//!    definitions for the pass.
//! 2. Walk the changed branches post-order, so every child is final before
//!    its parent reads it.
//! 3. Per node, pick one of:
//!    - the user's whole-row override,
//!    - an empty aggregate when there are no value columns,
//!    - values only: reduce each value column over the filtered children,
//!      reusing previous results for columns the change path reports as
//!      unchanged,
//!    - values and pivot: reduce each pivot cell, from raw rows for leaf
//!      groups or from the children's aggregates otherwise, then reduce the
//!      total columns over the cells just computed.
//!
//! A bad aggregation function only nulls its own column; the pass always
//! completes.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, debug_span, error};

use crate::agg::{AggFuncParams, AggFuncRef};
use crate::columns::{Column, ColumnModel};
use crate::tree::{AggData, ChangedPath, ChildrenMapped, RowNode, RowNodeId, RowTree};

use super::pivot::{PivotColumnDef, PivotColumnDefSource};
use super::{RowNodeStage, StageContext, StageExecuteParams};

struct AggregationDetails<'a> {
    changed_path: &'a ChangedPath,
    column_model: &'a ColumnModel,
    value_columns: &'a [Column],
    /// Empty unless pivoting is active.
    pivot_columns: &'a [Column],
    pivot_column_defs: Arc<Vec<PivotColumnDef>>,
}

pub struct AggregationStage {
    ctx: StageContext,
    pivot_stage: Arc<dyn PivotColumnDefSource>,
}

impl AggregationStage {
    pub fn new(ctx: StageContext, pivot_stage: Arc<dyn PivotColumnDefSource>) -> Self {
        Self { ctx, pivot_stage }
    }

    fn create_agg_details<'a>(
        &self,
        changed_path: &'a ChangedPath,
        column_model: &'a ColumnModel,
    ) -> AggregationDetails<'a> {
        let pivot_active = column_model.is_pivot_active();
        AggregationDetails {
            changed_path,
            column_model,
            value_columns: column_model.value_columns(),
            pivot_columns: if pivot_active { column_model.pivot_columns() } else { &[] },
            pivot_column_defs: if pivot_active {
                self.pivot_stage.pivot_column_defs()
            } else {
                Arc::new(Vec::new())
            },
        }
    }

    fn recursively_create_agg_data(&self, tree: &mut RowTree, details: &AggregationDetails<'_>) {
        let suppress_root = self.ctx.options.suppress_agg_at_root_level && !details.column_model.is_pivot_mode();

        details.changed_path.for_each_changed_node_depth_first(
            tree,
            |tree, id| {
                let Some(node) = tree.get(id) else {
                    return;
                };

                if !node.has_children() {
                    // the node may have been a group on an earlier pass
                    if node.agg_data().is_some() {
                        tree.set_agg_data(id, None);
                    }
                    return;
                }

                if node.is_root() && suppress_root {
                    return;
                }

                self.aggregate_row_node(tree, id, details);
            },
            true,
        );
    }

    fn aggregate_row_node(&self, tree: &mut RowTree, id: RowNodeId, details: &AggregationDetails<'_>) {
        let Some(node) = tree.get(id) else {
            return;
        };

        let agg_result = if let Some(user_func) = &self.ctx.options.group_row_agg_nodes {
            let children: Vec<&RowNode> = tree.nodes_of(node.children_after_filter()).collect();
            user_func(&children)
        } else if details.value_columns.is_empty() {
            Some(AggData::new())
        } else if details.pivot_columns.is_empty() {
            Some(self.aggregate_row_node_using_values_only(tree, node, details))
        } else {
            Some(self.aggregate_row_node_using_values_and_pivot(tree, node, details))
        };

        let sibling = node.sibling();
        if let Some(sibling) = sibling {
            tree.set_agg_data(sibling, agg_result.clone());
        }
        tree.set_agg_data(id, agg_result);
    }

    fn aggregate_row_node_using_values_and_pivot(
        &self,
        tree: &RowTree,
        node: &RowNode,
        details: &AggregationDetails<'_>,
    ) -> AggData {
        let mut result = AggData::new();
        let api = Some(details.column_model);

        for def in details.pivot_column_defs.iter() {
            let PivotColumnDef::Value { col_id, pivot_keys, value_column } = def else {
                continue;
            };

            let values = if node.is_leaf_group() {
                self.get_values_from_mapped_set(tree, node.children_mapped(), pivot_keys, value_column)
            } else {
                Self::get_values_pivot_non_leaf(tree, node, col_id)
            };

            let value = self.aggregate(values, value_column.agg_func(), Some(value_column), Some(node), api);
            result.insert(col_id.clone(), value);
        }

        // totals read the cells computed above
        for def in details.pivot_column_defs.iter() {
            let PivotColumnDef::Total { col_id, value_column, total_column_ids } = def else {
                continue;
            };
            if total_column_ids.is_empty() {
                continue;
            }

            let agg_results = total_column_ids
                .iter()
                .map(|id| result.get(id).cloned().unwrap_or(Value::Null))
                .collect();

            let value = self.aggregate(agg_results, value_column.agg_func(), Some(value_column), Some(node), api);
            result.insert(col_id.clone(), value);
        }

        result
    }

    fn aggregate_row_node_using_values_only(
        &self,
        tree: &RowTree,
        node: &RowNode,
        details: &AggregationDetails<'_>,
    ) -> AggData {
        let changed_path = details.changed_path;
        let changed_value_columns = changed_path.get_value_columns_for_node(node.id(), details.value_columns);
        let not_changed_value_columns = changed_path.get_not_value_columns_for_node(node.id(), details.value_columns);

        let values_2d = self.get_values_normal(tree, node, &changed_value_columns);

        let mut computed: HashMap<&str, Value> = HashMap::with_capacity(changed_value_columns.len());
        for (column, values) in changed_value_columns.iter().copied().zip(values_2d) {
            let value = self.aggregate(values, column.agg_func(), Some(column), Some(node), Some(details.column_model));
            computed.insert(column.id(), value);
        }

        let old_values = node.agg_data();
        let reused = |column: &Column| -> Option<Value> {
            let not_changed = not_changed_value_columns.as_ref()?;
            if !not_changed.iter().any(|c| c.id() == column.id()) {
                return None;
            }
            old_values?.get(column.id()).cloned()
        };

        // keep the value column order regardless of what changed
        let mut result = AggData::new();
        for column in details.value_columns {
            if let Some(value) = computed.remove(column.id()) {
                result.insert(column.id().to_string(), value);
            } else if let Some(value) = reused(column) {
                result.insert(column.id().to_string(), value);
            }
        }
        result
    }

    fn get_values_pivot_non_leaf(tree: &RowTree, node: &RowNode, col_id: &str) -> Vec<Value> {
        tree.nodes_of(node.children_after_filter())
            .map(|child| {
                child
                    .agg_data()
                    .and_then(|agg| agg.get(col_id))
                    .cloned()
                    .unwrap_or(Value::Null)
            })
            .collect()
    }

    fn get_values_from_mapped_set(
        &self,
        tree: &RowTree,
        mapped_set: Option<&ChildrenMapped>,
        keys: &[String],
        value_column: &Column,
    ) -> Vec<Value> {
        let Some(rows) = mapped_set.and_then(|mapped| mapped.rows_at(keys)) else {
            return Vec::new();
        };
        tree.nodes_of(rows)
            .map(|row| self.ctx.value_service.get_value(value_column, row))
            .collect()
    }

    /// One vector of child values per column.
    fn get_values_normal(&self, tree: &RowTree, node: &RowNode, value_columns: &[&Column]) -> Vec<Vec<Value>> {
        let row_count = node.children_after_filter().len();
        let mut values: Vec<Vec<Value>> = value_columns
            .iter()
            .map(|_| Vec::with_capacity(row_count))
            .collect();

        for child in tree.nodes_of(node.children_after_filter()) {
            for (column_values, column) in values.iter_mut().zip(value_columns) {
                // group children answer with their aggregate
                column_values.push(self.ctx.value_service.get_value(column, child));
            }
        }

        values
    }

    /// Reduce `values` through `agg_func` outside of a pass.
    ///
    /// Unknown or missing functions are logged and produce `null`.
    pub fn aggregate_values(
        &self,
        values: Vec<Value>,
        agg_func: Option<&AggFuncRef>,
        column: Option<&Column>,
        row_node: Option<&RowNode>,
    ) -> Value {
        let column_model = self.ctx.column_model.read().clone();
        self.aggregate(values, agg_func, column, row_node, Some(&column_model))
    }

    fn aggregate(
        &self,
        values: Vec<Value>,
        agg_func: Option<&AggFuncRef>,
        column: Option<&Column>,
        row_node: Option<&RowNode>,
        api: Option<&ColumnModel>,
    ) -> Value {
        let col_id = column.map(Column::id).unwrap_or_default();
        let func = match self.ctx.agg_funcs.resolve(agg_func, col_id) {
            Ok(func) => func,
            Err(err) => {
                let selector = agg_func.map(AggFuncRef::describe).unwrap_or("<none>");
                error!(column = col_id, agg_func = selector, "{}", err);
                return Value::Null;
            }
        };

        let mut params = AggFuncParams::new(values, &self.ctx.options.context);
        params.column = column;
        params.col_def = column.map(Column::col_def);
        params.row_node = row_node;
        params.data = row_node.and_then(RowNode::data);
        params.api = api;
        func(&mut params)
    }
}

impl RowNodeStage for AggregationStage {
    fn execute(&self, params: &mut StageExecuteParams<'_>) {
        // an incremental pass with nothing to aggregate has nothing stale to
        // clean up either, as value columns do not change between such passes
        let column_model = self.ctx.column_model.read().clone();
        let no_value_columns = column_model.value_columns().is_empty();
        let no_user_agg = self.ctx.options.group_row_agg_nodes.is_none();
        let changed_path_active = params.changed_path.is_active();
        if no_value_columns && no_user_agg && changed_path_active {
            debug!("no value columns on an incremental pass, skipping aggregation");
            return;
        }

        let details = self.create_agg_details(params.changed_path, &column_model);
        let _span = debug_span!(
            "aggregation_stage",
            value_columns = details.value_columns.len(),
            pivot_columns = details.pivot_columns.len(),
            incremental = changed_path_active,
        )
        .entered();

        self.recursively_create_agg_data(params.row_tree, &details);
    }
}

//! Row Node Stages
//!
//! Stages are the steps of the row pipeline that rewrite state on the row
//! tree in place. This crate ships two of them:
//!
//! - [`PivotStage`]: buckets leaf rows by pivot key and derives the pivot
//!   column definitions for the pass.
//! - [`AggregationStage`]: computes group and pivot aggregates bottom-up.
//!
//! # Execution
//!
//! Each pass hands a stage the row tree and the [`ChangedPath`] for the pass.
//! A stage runs to completion before returning; it never yields halfway
//! through the tree. Collaborators that outlive a pass (options, column
//! model, registries) are shared through a [`StageContext`].

mod aggregation;
mod pivot;

use std::sync::Arc;

use parking_lot::RwLock;

use crate::agg::AggFuncService;
use crate::columns::ColumnModel;
use crate::options::GridOptions;
use crate::tree::{ChangedPath, RowTree};
use crate::value::{ValueResolver, ValueService};

pub use aggregation::AggregationStage;
pub use pivot::{PivotColumnDef, PivotColumnDefSource, PivotKeys, PivotStage};

/// Per-pass input of a stage.
pub struct StageExecuteParams<'a> {
    pub row_tree: &'a mut RowTree,
    pub changed_path: &'a ChangedPath,
}

impl<'a> StageExecuteParams<'a> {
    pub fn new(row_tree: &'a mut RowTree, changed_path: &'a ChangedPath) -> Self {
        Self { row_tree, changed_path }
    }
}

/// A step of the row pipeline.
pub trait RowNodeStage {
    fn execute(&self, params: &mut StageExecuteParams<'_>);
}

/// Collaborators shared by the stages of one grid.
#[derive(Clone)]
pub struct StageContext {
    pub options: Arc<GridOptions>,
    pub column_model: Arc<RwLock<ColumnModel>>,
    pub agg_funcs: Arc<AggFuncService>,
    pub value_service: Arc<dyn ValueResolver>,
}

impl StageContext {
    /// Create a context with the built-in functions and the default resolver.
    pub fn new(options: GridOptions, column_model: ColumnModel) -> Self {
        Self {
            options: Arc::new(options),
            column_model: Arc::new(RwLock::new(column_model)),
            agg_funcs: Arc::new(AggFuncService::new()),
            value_service: Arc::new(ValueService::new()),
        }
    }

    pub fn with_value_service(mut self, value_service: Arc<dyn ValueResolver>) -> Self {
        self.value_service = value_service;
        self
    }

    pub fn with_agg_funcs(mut self, agg_funcs: Arc<AggFuncService>) -> Self {
        self.agg_funcs = agg_funcs;
        self
    }
}

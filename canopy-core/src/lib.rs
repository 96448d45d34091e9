//! Canopy Core
//!
//! This crate provides the row-grouping aggregation engine of a data grid.
//! It implements:
//!
//! - An arena row tree with groups, leaves and footer rows
//! - Change tracking for incremental recomputation
//! - Pluggable aggregation functions with a named registry
//! - Pivoting: key bucketing, pivot column definitions and totals
//! - The aggregation stage that writes group and pivot aggregates
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `tree`: row nodes, the arena, pivot buckets and the changed path
//! - `columns`: columns and the column model
//! - `agg`: aggregation function references, parameters and registry
//! - `value`: value resolution for leaves and groups
//! - `stage`: the pivot and aggregation stages
//! - `options`: grid options
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use canopy_core::columns::{Column, ColumnModel};
//! use canopy_core::options::GridOptions;
//! use canopy_core::stage::{AggregationStage, PivotStage, RowNodeStage, StageContext, StageExecuteParams};
//! use canopy_core::tree::{ChangedPath, RowTree};
//! use serde_json::json;
//!
//! let mut model = ColumnModel::new();
//! model.add_value_column(Column::new("gold"));
//!
//! let ctx = StageContext::new(GridOptions::default(), model);
//! let pivot = Arc::new(PivotStage::new(ctx.clone()));
//! let aggregation = AggregationStage::new(ctx, pivot);
//!
//! let mut tree = RowTree::new();
//! let swimming = tree.add_group(tree.root(), "swimming");
//! tree.add_leaf(swimming, json!({"gold": 2}));
//! tree.add_leaf(swimming, json!({"gold": 3}));
//!
//! let path = ChangedPath::inactive(tree.root());
//! aggregation.execute(&mut StageExecuteParams::new(&mut tree, &path));
//!
//! let agg = tree.get(swimming).unwrap().agg_data().unwrap();
//! assert_eq!(agg["gold"], json!(5));
//! ```

pub mod error;
pub mod options;
pub mod tree;
pub mod columns;
pub mod agg;
pub mod value;
pub mod stage;

pub use error::{CanopyError, Result};

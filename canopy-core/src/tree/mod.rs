//! Row Tree
//!
//! This module holds the hierarchical row model the stages operate on.
//!
//! # Overview
//!
//! - Row nodes live in an arena ([`RowTree`]) and refer to each other by
//!   [`RowNodeId`]. Parent, child and footer-sibling links are indices,
//!   never ownership.
//! - Leaf groups keep their filtered children bucketed by pivot key in a
//!   [`ChildrenMapped`] trie.
//! - A [`ChangedPath`] records which branches need to be revisited.

mod node;
mod mapped;
mod row_tree;
mod changed_path;

pub use node::{AggData, RowNode, RowNodeId};
pub use mapped::ChildrenMapped;
pub use row_tree::RowTree;
pub use changed_path::ChangedPath;

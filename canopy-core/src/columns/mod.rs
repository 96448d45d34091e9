//! Columns and the column model.

mod column;
mod model;

pub use column::{Column, ColumnDef};
pub use model::ColumnModel;

//! Column Model
//!
//! Holds the ordered value columns, the ordered pivot columns and the
//! pivot-mode flag read by the stages at the start of each pass.

use crate::agg::{AggFuncRef, DEFAULT_AGG_FUNC};

use super::column::Column;

#[derive(Debug, Clone, Default)]
pub struct ColumnModel {
    value_columns: Vec<Column>,
    pivot_columns: Vec<Column>,
    pivot_mode: bool,
}

impl ColumnModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value_columns(&self) -> &[Column] {
        &self.value_columns
    }

    pub fn pivot_columns(&self) -> &[Column] {
        &self.pivot_columns
    }

    /// Add a value column. Columns without a function get the default one.
    pub fn add_value_column(&mut self, mut column: Column) {
        if column.agg_func().is_none() {
            column.set_agg_func(Some(AggFuncRef::Named(DEFAULT_AGG_FUNC.to_string())));
        }
        self.value_columns.retain(|c| c.id() != column.id());
        self.value_columns.push(column);
    }

    /// Remove a value column by id. Returns true if it was present.
    pub fn remove_value_column(&mut self, col_id: &str) -> bool {
        let before = self.value_columns.len();
        self.value_columns.retain(|c| c.id() != col_id);
        before != self.value_columns.len()
    }

    pub fn clear_value_columns(&mut self) {
        self.value_columns.clear();
    }

    pub fn add_pivot_column(&mut self, column: Column) {
        self.pivot_columns.retain(|c| c.id() != column.id());
        self.pivot_columns.push(column);
    }

    pub fn clear_pivot_columns(&mut self) {
        self.pivot_columns.clear();
    }

    pub fn set_pivot_mode(&mut self, pivot_mode: bool) {
        self.pivot_mode = pivot_mode;
    }

    pub fn is_pivot_mode(&self) -> bool {
        self.pivot_mode
    }

    /// Pivoting only takes effect in pivot mode with at least one pivot column.
    pub fn is_pivot_active(&self) -> bool {
        self.pivot_mode && !self.pivot_columns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_columns_default_to_sum() {
        let mut model = ColumnModel::new();
        model.add_value_column(Column::new("gold"));
        model.add_value_column(Column::new("silver").with_agg_func("max"));

        let funcs: Vec<_> = model
            .value_columns()
            .iter()
            .map(|c| c.col_def().agg_func.clone().unwrap())
            .collect();
        assert_eq!(funcs, vec!["sum", "max"]);
    }

    #[test]
    fn re_adding_a_column_replaces_it() {
        let mut model = ColumnModel::new();
        model.add_value_column(Column::new("gold"));
        model.add_value_column(Column::new("gold").with_agg_func("avg"));
        assert_eq!(model.value_columns().len(), 1);
        assert!(model.remove_value_column("gold"));
        assert!(!model.remove_value_column("gold"));
    }

    #[test]
    fn pivot_active_needs_mode_and_columns() {
        let mut model = ColumnModel::new();
        model.set_pivot_mode(true);
        assert!(model.is_pivot_mode());
        assert!(!model.is_pivot_active());

        model.add_pivot_column(Column::new("country"));
        assert!(model.is_pivot_active());

        model.set_pivot_mode(false);
        assert!(!model.is_pivot_active());
    }
}

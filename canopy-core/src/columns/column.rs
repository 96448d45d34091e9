//! Columns
//!
//! A column identifies a data field and optionally carries the aggregation
//! function used when it is a value column.

use serde::{Deserialize, Serialize};

use crate::agg::AggFuncRef;

/// Serializable column configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColumnDef {
    /// Explicit column id. Falls back to `field`.
    pub col_id: Option<String>,

    /// Dotted path into the row data, e.g. `"medals.gold"`.
    pub field: Option<String>,

    pub header_name: Option<String>,

    /// Name of the aggregation function, resolved through the registry.
    pub agg_func: Option<String>,
}

/// A column of the grid.
#[derive(Debug, Clone)]
pub struct Column {
    id: String,
    col_def: ColumnDef,
    agg_func: Option<AggFuncRef>,
}

impl Column {
    /// Create a column whose id doubles as its field.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            col_def: ColumnDef {
                col_id: Some(id.clone()),
                field: Some(id.clone()),
                ..ColumnDef::default()
            },
            id,
            agg_func: None,
        }
    }

    /// Create a column from its definition.
    ///
    /// The id is taken from `col_id`, then `field`, then `header_name`.
    pub fn from_def(col_def: ColumnDef) -> Self {
        let id = col_def
            .col_id
            .clone()
            .or_else(|| col_def.field.clone())
            .or_else(|| col_def.header_name.clone())
            .unwrap_or_default();
        let agg_func = col_def.agg_func.clone().map(AggFuncRef::Named);
        Self { id, col_def, agg_func }
    }

    /// Set the aggregation function, builder style.
    pub fn with_agg_func(mut self, agg_func: impl Into<AggFuncRef>) -> Self {
        self.set_agg_func(Some(agg_func.into()));
        self
    }

    /// Set the field, builder style.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.col_def.field = Some(field.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The field read from row data. Defaults to the column id.
    pub fn field(&self) -> &str {
        self.col_def.field.as_deref().unwrap_or(&self.id)
    }

    pub fn col_def(&self) -> &ColumnDef {
        &self.col_def
    }

    pub fn agg_func(&self) -> Option<&AggFuncRef> {
        self.agg_func.as_ref()
    }

    pub fn set_agg_func(&mut self, agg_func: Option<AggFuncRef>) {
        self.col_def.agg_func = match &agg_func {
            Some(AggFuncRef::Named(name)) => Some(name.clone()),
            _ => None,
        };
        self.agg_func = agg_func;
    }
}

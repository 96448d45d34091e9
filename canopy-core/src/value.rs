//! Value Resolution
//!
//! Stages never read row data directly; they ask a [`ValueResolver`] for the
//! value of a column on a row. Group rows only expose their aggregates, so
//! resolving a value column on a group yields its previously computed
//! aggregate.

use serde_json::Value;

use crate::columns::Column;
use crate::tree::RowNode;

/// Produces the value of a column for a row.
pub trait ValueResolver: Send + Sync {
    fn get_value(&self, column: &Column, node: &RowNode) -> Value;
}

/// Default resolver reading aggregates for groups and fields for leaves.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueService;

impl ValueService {
    pub fn new() -> Self {
        Self
    }

    /// Follow a dotted field path through nested objects.
    fn read_field(data: &Value, field: &str) -> Value {
        if let Some(direct) = data.get(field) {
            return direct.clone();
        }
        let mut pointer = data;
        for part in field.split('.') {
            match pointer.get(part) {
                Some(next) => pointer = next,
                None => return Value::Null,
            }
        }
        pointer.clone()
    }
}

impl ValueResolver for ValueService {
    fn get_value(&self, column: &Column, node: &RowNode) -> Value {
        if node.is_group() {
            if let Some(value) = node.agg_data().and_then(|agg| agg.get(column.id())) {
                return value.clone();
            }
        }
        match node.data() {
            Some(data) => Self::read_field(data, column.field()),
            None => Value::Null,
        }
    }
}

//! Grid Options
//!
//! Configuration read by the stages on every pass. Plain settings
//! deserialize from JSON; callbacks are attached in code.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::tree::{AggData, RowNode};

/// Whole-row aggregation override. Receives the group's filtered children
/// and returns its aggregate verbatim.
pub type GroupRowAggNodesFn = Arc<dyn Fn(&[&RowNode]) -> Option<AggData> + Send + Sync>;

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridOptions {
    /// Skip aggregating the root row unless pivoting.
    pub suppress_agg_at_root_level: bool,

    /// Add one grand total column per value column when pivoting.
    pub pivot_row_totals: bool,

    /// Add a total column per pivot column group and value column.
    pub pivot_column_group_totals: bool,

    /// Opaque user data handed to aggregation functions.
    pub context: Value,

    #[serde(skip)]
    pub group_row_agg_nodes: Option<GroupRowAggNodesFn>,
}

impl GridOptions {
    /// Parse options from a JSON document. Unknown keys are ignored.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Attach a whole-row aggregation override, builder style.
    pub fn with_group_row_agg_nodes<F>(mut self, f: F) -> Self
    where
        F: Fn(&[&RowNode]) -> Option<AggData> + Send + Sync + 'static,
    {
        self.group_row_agg_nodes = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for GridOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridOptions")
            .field("suppress_agg_at_root_level", &self.suppress_agg_at_root_level)
            .field("pivot_row_totals", &self.pivot_row_totals)
            .field("pivot_column_group_totals", &self.pivot_column_group_totals)
            .field("context", &self.context)
            .field("group_row_agg_nodes", &self.group_row_agg_nodes.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CanopyError;
    use serde_json::json;

    #[test]
    fn parse_options_from_json() {
        let options = GridOptions::from_json(
            r#"{"suppressAggAtRootLevel": true, "pivotRowTotals": true, "context": {"user": "ana"}}"#,
        )
        .unwrap();
        assert!(options.suppress_agg_at_root_level);
        assert!(options.pivot_row_totals);
        assert!(!options.pivot_column_group_totals);
        assert_eq!(options.context, json!({"user": "ana"}));
        assert!(options.group_row_agg_nodes.is_none());
    }

    #[test]
    fn empty_document_gives_defaults() {
        let options = GridOptions::from_json("{}").unwrap();
        assert!(!options.suppress_agg_at_root_level);
        assert_eq!(options.context, Value::Null);
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = GridOptions::from_json("{\"pivotRowTotals\": 1").unwrap_err();
        assert!(matches!(err, CanopyError::Config(_)));
    }
}

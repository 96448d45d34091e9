//! Aggregation Function Parameters
//!
//! Every reducer receives one [`AggFuncParams`]. Reducers written against the
//! older contract treated their argument as the values array itself; the
//! array-style methods below keep those working but report the use once per
//! process.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Once;

use serde_json::Value;
use tracing::warn;

use crate::columns::{Column, ColumnDef, ColumnModel};
use crate::tree::RowNode;

/// Emits the array-style deprecation warning at most once.
pub(crate) struct LegacyNotice {
    once: Once,
    warnings: AtomicUsize,
}

impl LegacyNotice {
    pub(crate) const fn new() -> Self {
        Self {
            once: Once::new(),
            warnings: AtomicUsize::new(0),
        }
    }

    fn report(&self) {
        self.once.call_once(|| {
            self.warnings.fetch_add(1, Ordering::Relaxed);
            warn!("custom aggregation functions take a params object, read params.values instead of treating it as an array");
        });
    }

    fn reported(&self) -> bool {
        self.once.is_completed()
    }

    #[cfg(test)]
    fn warnings(&self) -> usize {
        self.warnings.load(Ordering::Relaxed)
    }
}

static LEGACY_ACCESS: LegacyNotice = LegacyNotice::new();

/// Check if any reducer used the array-style access in this process.
pub fn legacy_access_reported() -> bool {
    LEGACY_ACCESS.reported()
}

/// Arguments passed to an aggregation function.
pub struct AggFuncParams<'a> {
    /// Values to reduce, one per contributing row.
    pub values: Vec<Value>,
    pub column: Option<&'a Column>,
    pub col_def: Option<&'a ColumnDef>,
    /// The group being aggregated.
    pub row_node: Option<&'a RowNode>,
    pub data: Option<&'a Value>,
    /// Column model of the grid running the pass.
    pub api: Option<&'a ColumnModel>,
    /// User context from the grid options.
    pub context: &'a Value,
    notice: &'a LegacyNotice,
}

impl<'a> AggFuncParams<'a> {
    pub fn new(values: Vec<Value>, context: &'a Value) -> Self {
        Self {
            values,
            column: None,
            col_def: None,
            row_node: None,
            data: None,
            api: None,
            context,
            notice: &LEGACY_ACCESS,
        }
    }

    #[cfg(test)]
    fn with_notice(mut self, notice: &'a LegacyNotice) -> Self {
        self.notice = notice;
        self
    }

    // Array-style access kept for reducers that predate the params object.

    pub fn len(&self) -> usize {
        self.notice.report();
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notice.report();
        self.values.is_empty()
    }

    /// Truncate or pad the values with nulls.
    pub fn set_len(&mut self, len: usize) {
        self.notice.report();
        self.values.resize(len, Value::Null);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.notice.report();
        self.values.iter()
    }

    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&Value, usize),
    {
        self.notice.report();
        for (index, value) in self.values.iter().enumerate() {
            f(value, index);
        }
    }
}

impl<'p> IntoIterator for &'p AggFuncParams<'_> {
    type Item = &'p Value;
    type IntoIter = std::slice::Iter<'p, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

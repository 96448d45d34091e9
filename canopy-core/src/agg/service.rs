//! Aggregation Function Registry
//!
//! Maps function names to reducers. The registry is shared between stages
//! and may be extended while the grid is running, so it sits behind a lock.

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::error::{CanopyError, Result};

use super::builtins;
use super::func::{reducer, AggFn, AggFuncRef};

/// Function assigned to value columns that do not name one.
pub const DEFAULT_AGG_FUNC: &str = "sum";

pub struct AggFuncService {
    funcs: RwLock<IndexMap<String, AggFn>>,
}

impl AggFuncService {
    /// Create a registry holding the built-in functions.
    pub fn new() -> Self {
        let service = Self::empty();
        service.add_agg_funcs([
            ("sum", reducer(builtins::sum)),
            ("first", reducer(builtins::first)),
            ("last", reducer(builtins::last)),
            ("min", reducer(builtins::min)),
            ("max", reducer(builtins::max)),
            ("count", reducer(builtins::count)),
            ("avg", reducer(builtins::avg)),
        ]);
        service
    }

    /// Create a registry with no functions at all.
    pub fn empty() -> Self {
        Self {
            funcs: RwLock::new(IndexMap::new()),
        }
    }

    /// Register `func` under `name`, replacing any previous entry.
    pub fn add_agg_func(&self, name: impl Into<String>, func: AggFn) {
        self.funcs.write().insert(name.into(), func);
    }

    pub fn add_agg_funcs<I, S>(&self, funcs: I)
    where
        I: IntoIterator<Item = (S, AggFn)>,
        S: Into<String>,
    {
        let mut map = self.funcs.write();
        for (name, func) in funcs {
            map.insert(name.into(), func);
        }
    }

    pub fn clear(&self) {
        self.funcs.write().clear();
    }

    pub fn get_agg_func(&self, name: &str) -> Option<AggFn> {
        self.funcs.read().get(name).cloned()
    }

    /// Registered names in registration order.
    pub fn func_names(&self) -> Vec<String> {
        self.funcs.read().keys().cloned().collect()
    }

    /// Name to use for a new value column: `sum` when available, otherwise
    /// the first registered function.
    pub fn default_agg_func(&self) -> Option<String> {
        let funcs = self.funcs.read();
        if funcs.contains_key(DEFAULT_AGG_FUNC) {
            return Some(DEFAULT_AGG_FUNC.to_string());
        }
        funcs.keys().next().cloned()
    }

    /// Turn a column's function selector into a callable.
    ///
    /// `col_id` only labels the error when no selector is given.
    pub fn resolve(&self, agg_func: Option<&AggFuncRef>, col_id: &str) -> Result<AggFn> {
        match agg_func {
            Some(AggFuncRef::Direct(func)) => Ok(func.clone()),
            Some(AggFuncRef::Named(name)) => self
                .get_agg_func(name)
                .ok_or_else(|| CanopyError::UnknownAggFunc(name.clone())),
            None => Err(CanopyError::MissingAggFunc(col_id.to_string())),
        }
    }
}

impl Default for AggFuncService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agg::AggFuncParams;
    use serde_json::{json, Value};

    #[test]
    fn builtins_are_registered() {
        let service = AggFuncService::new();
        assert_eq!(
            service.func_names(),
            vec!["sum", "first", "last", "min", "max", "count", "avg"]
        );
        assert_eq!(service.default_agg_func().as_deref(), Some("sum"));
    }

    #[test]
    fn custom_functions_can_be_added_and_cleared() {
        let service = AggFuncService::empty();
        assert_eq!(service.default_agg_func(), None);

        service.add_agg_func("range", reducer(|values| {
            let nums: Vec<f64> = values.iter().filter_map(Value::as_f64).collect();
            let lo = nums.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = nums.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            Value::from(hi - lo)
        }));
        assert_eq!(service.default_agg_func().as_deref(), Some("range"));

        let func = service.resolve(Some(&AggFuncRef::from("range")), "x").unwrap();
        let context = Value::Null;
        let mut params = AggFuncParams::new(vec![json!(2), json!(9)], &context);
        assert_eq!(func(&mut params), json!(7.0));

        service.clear();
        assert!(service.get_agg_func("range").is_none());
    }

    #[test]
    fn resolve_reports_unknown_and_missing() {
        let service = AggFuncService::new();
        let unknown = service.resolve(Some(&AggFuncRef::from("median")), "gold");
        assert!(matches!(unknown, Err(CanopyError::UnknownAggFunc(name)) if name == "median"));

        let missing = service.resolve(None, "gold");
        assert!(matches!(missing, Err(CanopyError::MissingAggFunc(id)) if id == "gold"));
    }
}

//! Aggregation function references.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::params::AggFuncParams;

/// A reducer invoked once per aggregated cell.
pub type AggFn = Arc<dyn Fn(&mut AggFuncParams<'_>) -> Value + Send + Sync>;

/// Wrap a plain `values -> result` reducer as an [`AggFn`].
pub fn reducer<F>(f: F) -> AggFn
where
    F: Fn(&[Value]) -> Value + Send + Sync + 'static,
{
    Arc::new(move |params: &mut AggFuncParams<'_>| f(&params.values))
}

/// How a column selects its aggregation function.
#[derive(Clone)]
pub enum AggFuncRef {
    /// Looked up by name in the registry on every call.
    Named(String),
    /// Supplied directly by the caller.
    Direct(AggFn),
}

impl AggFuncRef {
    /// Build a direct reference from a closure over the full parameters.
    pub fn direct<F>(f: F) -> Self
    where
        F: Fn(&mut AggFuncParams<'_>) -> Value + Send + Sync + 'static,
    {
        AggFuncRef::Direct(Arc::new(f))
    }

    /// Label used in diagnostics.
    pub fn describe(&self) -> &str {
        match self {
            AggFuncRef::Named(name) => name,
            AggFuncRef::Direct(_) => "<custom function>",
        }
    }
}

impl fmt::Debug for AggFuncRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggFuncRef::Named(name) => f.debug_tuple("Named").field(name).finish(),
            AggFuncRef::Direct(_) => f.write_str("Direct(..)"),
        }
    }
}

impl From<&str> for AggFuncRef {
    fn from(name: &str) -> Self {
        AggFuncRef::Named(name.to_string())
    }
}

impl From<String> for AggFuncRef {
    fn from(name: String) -> Self {
        AggFuncRef::Named(name)
    }
}

impl From<AggFn> for AggFuncRef {
    fn from(f: AggFn) -> Self {
        AggFuncRef::Direct(f)
    }
}

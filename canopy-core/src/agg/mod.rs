//! Aggregation Functions
//!
//! Reducers turn the values of a group's children into one aggregate.
//!
//! A column selects its reducer either by name, resolved through the
//! [`AggFuncService`] registry, or by handing over a callable directly
//! ([`AggFuncRef`]). Either way the reducer is called with an
//! [`AggFuncParams`] describing the cell being aggregated.

mod func;
mod params;
mod service;
pub mod builtins;

pub use func::{reducer, AggFn, AggFuncRef};
pub use params::{legacy_access_reported, AggFuncParams};
pub use service::{AggFuncService, DEFAULT_AGG_FUNC};

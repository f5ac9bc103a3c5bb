//! Route modules for the API server
//!
//! - transactions: global and per-box history projections
//! - source: health and reload

pub mod source;
pub mod transactions;

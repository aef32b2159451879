//! Application layer: the facade callers construct and query.

pub mod facade;

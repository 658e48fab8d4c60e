//! Database access outside the quoting engine

pub mod queries;

pub use queries::*;

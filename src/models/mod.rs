//! Database models outside the quoting engine

pub mod activity;

pub use activity::*;

//! Command implementations.

pub mod start;

pub use start::{run_check, run_start};

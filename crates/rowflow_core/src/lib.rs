//! Row transformation engine.
//!
//! Rows flow through mapping sets. Each mapping reads columns from an input
//! row and writes columns of an output row, with functions from the builtin
//! catalog doing the per-value work.
pub mod config;
pub mod functions;
pub mod mapping;
pub mod runtime;
pub mod values;

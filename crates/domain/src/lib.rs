//! Shared domain types for NodeGate: the error taxonomy, configuration
//! and structured trace events used by every other crate.

pub mod config;
pub mod error;
pub mod trace;

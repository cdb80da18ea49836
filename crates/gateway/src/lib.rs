//! NodeGate server: session table, RPC router and command-line front end.

pub mod api;
pub mod bootstrap;
pub mod cli;
pub mod client;
pub mod runtime;
pub mod state;

//! The bridge between a content repository session and the wire protocol.
//!
//! Opening a [`SessionGateway`] logs in, makes sure the type registry and
//! the sentinel node exist, and then serves type lookups, schema text and
//! node-state snapshots from that one session.

pub mod gateway;
pub mod schema;
pub mod sentinel;
pub mod snapshot;

mod store_error;

pub use gateway::{GatewaySettings, SessionGateway};
pub use schema::{ensure_schema, SchemaOutcome, SchemaSource};
pub use sentinel::{ensure_sentinel, SentinelOutcome};
pub use snapshot::{addressable_children, property_kind, snapshot};

//! Content repository contract and the in-memory engine behind it.
//!
//! A [`Repository`] hands out [`Session`]s per workspace. Sessions walk a tree
//! of typed nodes, edit it transiently until `save`, version
//! `mix:versionable` nodes, and share one node type and namespace registry.

pub mod error;
pub mod memory;
pub mod session;

pub use error::{StoreError, StoreResult};
pub use memory::{MemoryRepository, MemorySession};
pub use ng_cnd::PropertyType;
pub use session::{Credentials, NodeHandle, PropertyInfo, Repository, Session};

//! Wire protocol: node-state records and the JSON call envelope.
//!
//! A client opens a session, then asks for snapshots of nodes by
//! identifier. Every snapshot is self-contained: it names the node's parent
//! and children by identifier so the client can rebuild the graph without
//! further calls.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use ng_domain::error::{Error, ErrorKind};

/// Stable node identifier as carried on the wire.
pub type NodeId = String;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Node state records
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Flat view of one node at the moment it was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    pub name: String,
    /// Absent for the root and for parents without an identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NodeId>,
    /// Only children that carry an identifier, in document order.
    pub children: Vec<ChildRef>,
    pub properties: Vec<PropertyRecord>,
    /// Always empty; kept for wire compatibility.
    #[serde(default)]
    pub reserved: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildRef {
    pub name: String,
    pub id: NodeId,
    pub primary_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub name: String,
    /// Canonical text of each value; exactly one for single-valued
    /// properties.
    pub values: Vec<String>,
    pub kind: PropertyKind,
    pub multi_valued: bool,
}

/// Value type of a property as clients understand it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    String,
    Binary,
    Long,
    Double,
    Boolean,
    Date,
    Name,
    Path,
    Reference,
    /// Any store type outside the kinds above.
    Unknown,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Call envelope
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Client → server call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum RpcRequest {
    /// Open a session; the server's default workspace when `None`.
    Open {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        workspace: Option<String>,
    },
    SchemaText {
        session: String,
    },
    TypeOf {
        session: String,
        id: NodeId,
    },
    Snapshot {
        session: String,
        ids: Vec<NodeId>,
    },
    Close {
        session: String,
    },
}

impl RpcRequest {
    pub fn method(&self) -> &'static str {
        match self {
            RpcRequest::Open { .. } => "open",
            RpcRequest::SchemaText { .. } => "schema_text",
            RpcRequest::TypeOf { .. } => "type_of",
            RpcRequest::Snapshot { .. } => "snapshot",
            RpcRequest::Close { .. } => "close",
        }
    }

    /// Session token the call targets, if any.
    pub fn session(&self) -> Option<&str> {
        match self {
            RpcRequest::Open { .. } => None,
            RpcRequest::SchemaText { session }
            | RpcRequest::TypeOf { session, .. }
            | RpcRequest::Snapshot { session, .. }
            | RpcRequest::Close { session } => Some(session.as_str()),
        }
    }
}

/// Server → client reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RpcResponse {
    Opened {
        session: String,
        root_id: NodeId,
    },
    SchemaText {
        text: String,
    },
    TypeOf {
        primary_type: String,
    },
    Snapshot {
        states: BTreeMap<NodeId, NodeSnapshot>,
    },
    Closed,
    Error {
        kind: ErrorKind,
        message: String,
    },
}

impl From<&Error> for RpcResponse {
    fn from(err: &Error) -> Self {
        RpcResponse::Error {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

use std::collections::BTreeMap;
use std::fmt;

use ng_cnd::{NodeTypeDef, PropertyType};

use crate::error::StoreResult;

/// Username/password pair presented at login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session-local handle to a node.
///
/// Handles are only meaningful to the session that produced them. A handle
/// to a node created in unsaved changes dangles once those changes are
/// discarded, and every operation on it then fails with `ItemNotFound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub(crate) u64);

/// Name, declared type and multiplicity of one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyInfo {
    pub name: String,
    pub property_type: PropertyType,
    pub multiple: bool,
}

/// A content repository: a set of named workspaces sharing one type and
/// namespace registry.
pub trait Repository: Send + Sync {
    fn login(&self, credentials: &Credentials, workspace: &str) -> StoreResult<Box<dyn Session>>;

    fn workspace_names(&self) -> Vec<String>;
}

/// An authenticated connection to one workspace.
///
/// Node edits are transient until [`Session::save`]. Registry changes and
/// versioning operations take effect immediately.
pub trait Session: Send {
    fn workspace(&self) -> &str;

    // ── Traversal ─────────────────────────────────────────────────────

    fn root(&self) -> NodeHandle;

    /// Resolve a stable identifier. Fails with `ItemNotFound` when no
    /// referenceable node carries it.
    fn node_by_identifier(&self, id: &str) -> StoreResult<NodeHandle>;

    fn name(&self, node: NodeHandle) -> StoreResult<String>;

    /// The node's stable identifier. Fails with `NotReferenceable` when the
    /// node has none.
    fn identifier(&self, node: NodeHandle) -> StoreResult<String>;

    /// `None` for the root.
    fn parent(&self, node: NodeHandle) -> StoreResult<Option<NodeHandle>>;

    /// Children in document order.
    fn children(&self, node: NodeHandle) -> StoreResult<Vec<NodeHandle>>;

    fn child(&self, node: NodeHandle, name: &str) -> StoreResult<Option<NodeHandle>>;

    fn primary_type(&self, node: NodeHandle) -> StoreResult<String>;

    fn mixin_types(&self, node: NodeHandle) -> StoreResult<Vec<String>>;

    /// Whether the node's primary type or any mixin is, or inherits from,
    /// `type_name`.
    fn is_node_type(&self, node: NodeHandle, type_name: &str) -> StoreResult<bool>;

    /// Every property including the `jcr:` system properties.
    fn properties(&self, node: NodeHandle) -> StoreResult<Vec<PropertyInfo>>;

    fn property(&self, node: NodeHandle, name: &str) -> StoreResult<Option<PropertyInfo>>;

    /// Value of a single-valued property. Fails with `ValueFormat` on a
    /// multi-valued one.
    fn property_value(&self, node: NodeHandle, name: &str) -> StoreResult<String>;

    /// Values of a multi-valued property. Fails with `ValueFormat` on a
    /// single-valued one.
    fn property_values(&self, node: NodeHandle, name: &str) -> StoreResult<Vec<String>>;

    // ── Transient writes ──────────────────────────────────────────────

    fn add_node(
        &mut self,
        parent: NodeHandle,
        name: &str,
        primary_type: &str,
    ) -> StoreResult<NodeHandle>;

    fn add_mixin(&mut self, node: NodeHandle, mixin: &str) -> StoreResult<()>;

    /// Set a single-valued property. The value is validated against
    /// `property_type` and stored in canonical form.
    fn set_property(
        &mut self,
        node: NodeHandle,
        name: &str,
        value: &str,
        property_type: PropertyType,
    ) -> StoreResult<()>;

    fn set_multi_property(
        &mut self,
        node: NodeHandle,
        name: &str,
        values: &[String],
        property_type: PropertyType,
    ) -> StoreResult<()>;

    /// Publish pending edits to the workspace.
    fn save(&mut self) -> StoreResult<()>;

    /// Re-read the workspace. With `discard` pending edits are dropped;
    /// without it they are kept and the call only has an effect when there
    /// are none.
    fn refresh(&mut self, discard: bool);

    fn has_pending_changes(&self) -> bool;

    // ── Versioning ────────────────────────────────────────────────────

    /// Record a new version of a checked-out `mix:versionable` node and
    /// return its name. The session must have no pending changes.
    fn checkin(&mut self, node: NodeHandle) -> StoreResult<String>;

    fn checkout(&mut self, node: NodeHandle) -> StoreResult<()>;

    fn is_checked_out(&self, node: NodeHandle) -> StoreResult<bool>;

    /// Version names, oldest first.
    fn version_history(&self, node: NodeHandle) -> StoreResult<Vec<String>>;

    // ── Registries ────────────────────────────────────────────────────

    fn node_type_exists(&self, name: &str) -> bool;

    /// Every registered node type in registration order.
    fn node_type_defs(&self) -> Vec<NodeTypeDef>;

    /// Register a batch of definitions. Either all are registered or none.
    fn register_node_types(&mut self, defs: &[NodeTypeDef]) -> StoreResult<()>;

    fn register_namespace(&mut self, prefix: &str, uri: &str) -> StoreResult<()>;

    /// Prefix → URI, including the built-in mappings and the empty prefix.
    fn namespaces(&self) -> BTreeMap<String, String>;
}

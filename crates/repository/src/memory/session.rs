use std::collections::BTreeMap;
use std::sync::Arc;

use ng_cnd::{NodeTypeDef, PropertyType};
use parking_lot::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::memory::registry::{Registry, REFERENCEABLE, VERSIONABLE};
use crate::memory::tree::{NodeData, PropertyData, Tree};
use crate::memory::values::{canonicalize, ValueContext};
use crate::memory::Workspace;
use crate::session::{NodeHandle, PropertyInfo, Session};

const PRIMARY_TYPE: &str = "jcr:primaryType";
const MIXIN_TYPES: &str = "jcr:mixinTypes";
const UUID: &str = "jcr:uuid";
const IS_CHECKED_OUT: &str = "jcr:isCheckedOut";
const SYSTEM_PROPERTIES: &[&str] = &[PRIMARY_TYPE, MIXIN_TYPES, UUID, IS_CHECKED_OUT];

/// Session on a [`MemoryRepository`](crate::MemoryRepository) workspace.
pub struct MemorySession {
    workspace: Arc<Workspace>,
    registry: Arc<RwLock<Registry>>,
    /// Private working copy, present once the session has written.
    pending: Option<Arc<Tree>>,
    /// Workspace generation the working copy was taken from.
    base: u64,
}

struct Lookups<'a> {
    registry: &'a Registry,
    tree: &'a Tree,
}

impl ValueContext for Lookups<'_> {
    fn check_name(&self, name: &str) -> StoreResult<()> {
        self.registry.check_name(name)
    }

    fn is_referenceable_id(&self, id: &str) -> bool {
        self.tree.by_uuid(id).is_some()
    }
}

impl MemorySession {
    pub(crate) fn new(workspace: Arc<Workspace>, registry: Arc<RwLock<Registry>>) -> Self {
        Self {
            workspace,
            registry,
            pending: None,
            base: 0,
        }
    }

    /// The tree this session currently sees.
    fn view(&self) -> Arc<Tree> {
        match &self.pending {
            Some(tree) => Arc::clone(tree),
            None => Arc::clone(&self.workspace.committed.read().tree),
        }
    }

    /// The working copy, created from the committed tree on first use.
    fn edit(&mut self) -> &mut Tree {
        let workspace = &self.workspace;
        let base = &mut self.base;
        let pending = self.pending.get_or_insert_with(|| {
            let committed = workspace.committed.read();
            *base = committed.generation;
            Arc::clone(&committed.tree)
        });
        Arc::make_mut(pending)
    }

    /// Apply a versioning operation straight to the committed tree.
    ///
    /// A working copy taken from the generation just replaced stays current;
    /// callers apply the same change to it.
    fn commit_direct<T>(
        &mut self,
        f: impl FnOnce(&mut Tree) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut committed = self.workspace.committed.write();
        let value = f(Arc::make_mut(&mut committed.tree))?;
        if self.pending.is_some() && self.base == committed.generation {
            self.base += 1;
        }
        committed.generation += 1;
        Ok(value)
    }

    fn is_type(&self, data: &NodeData, type_name: &str) -> bool {
        let registry = self.registry.read();
        registry.is_subtype(&data.primary_type, type_name)
            || data.mixins.iter().any(|m| registry.is_subtype(m, type_name))
    }

    fn ensure_writable(&self, tree: &Tree, node: NodeHandle) -> StoreResult<()> {
        let data = tree.get(node)?;
        if self.is_type(data, VERSIONABLE) && !data.checked_out {
            return Err(StoreError::Version(format!(
                "{} is checked in",
                tree.path(node)
            )));
        }
        Ok(())
    }

    fn require_versionable(&self, tree: &Tree, node: NodeHandle) -> StoreResult<()> {
        let data = tree.get(node)?;
        if !self.is_type(data, VERSIONABLE) {
            return Err(StoreError::Version(format!(
                "{} is not versionable",
                tree.path(node)
            )));
        }
        Ok(())
    }

    /// Stored or synthesized property data.
    fn read_property(&self, data: &NodeData, name: &str) -> Option<PropertyData> {
        let single = |property_type, value: String| PropertyData {
            property_type,
            values: vec![value],
            multiple: false,
        };
        match name {
            PRIMARY_TYPE => Some(single(PropertyType::Name, data.primary_type.clone())),
            MIXIN_TYPES if !data.mixins.is_empty() => Some(PropertyData {
                property_type: PropertyType::Name,
                values: data.mixins.clone(),
                multiple: true,
            }),
            UUID => data
                .uuid
                .clone()
                .map(|uuid| single(PropertyType::String, uuid)),
            IS_CHECKED_OUT if self.is_type(data, VERSIONABLE) => {
                Some(single(PropertyType::Boolean, data.checked_out.to_string()))
            }
            _ => data.properties.get(name).cloned(),
        }
    }

    fn missing_property(tree: &Tree, node: NodeHandle, name: &str) -> StoreError {
        let path = tree.path(node);
        let sep = if path.ends_with('/') { "" } else { "/" };
        StoreError::ItemNotFound(format!("property {path}{sep}{name}"))
    }

    fn check_property_name(&self, name: &str) -> StoreResult<()> {
        if name.is_empty() || name.contains('/') {
            return Err(StoreError::Constraint(format!(
                "invalid property name '{name}'"
            )));
        }
        if SYSTEM_PROPERTIES.contains(&name) {
            return Err(StoreError::Constraint(format!("'{name}' is protected")));
        }
        self.registry.read().check_name(name)
    }

    fn canonical_values(
        &self,
        tree: &Tree,
        raw: &[&str],
        property_type: PropertyType,
    ) -> StoreResult<Vec<String>> {
        let registry = self.registry.read();
        let ctx = Lookups {
            registry: &registry,
            tree,
        };
        raw.iter()
            .map(|v| canonicalize(v, property_type, &ctx))
            .collect()
    }

    fn store_property(
        &mut self,
        node: NodeHandle,
        name: &str,
        raw: &[&str],
        property_type: PropertyType,
        multiple: bool,
    ) -> StoreResult<()> {
        self.check_property_name(name)?;
        let tree = self.view();
        self.ensure_writable(&tree, node)?;
        let values = self.canonical_values(&tree, raw, property_type)?;
        drop(tree);

        let data = self.edit().get_mut(node)?;
        data.properties.insert(
            name.to_string(),
            PropertyData {
                property_type,
                values,
                multiple,
            },
        );
        Ok(())
    }
}

impl Session for MemorySession {
    fn workspace(&self) -> &str {
        &self.workspace.name
    }

    // ── Traversal ─────────────────────────────────────────────────────

    fn root(&self) -> NodeHandle {
        self.view().root()
    }

    fn node_by_identifier(&self, id: &str) -> StoreResult<NodeHandle> {
        self.view()
            .by_uuid(id)
            .ok_or_else(|| StoreError::ItemNotFound(format!("no node with identifier '{id}'")))
    }

    fn name(&self, node: NodeHandle) -> StoreResult<String> {
        Ok(self.view().get(node)?.name.clone())
    }

    fn identifier(&self, node: NodeHandle) -> StoreResult<String> {
        let tree = self.view();
        tree.get(node)?
            .uuid
            .clone()
            .ok_or_else(|| StoreError::NotReferenceable(tree.path(node)))
    }

    fn parent(&self, node: NodeHandle) -> StoreResult<Option<NodeHandle>> {
        Ok(self.view().get(node)?.parent)
    }

    fn children(&self, node: NodeHandle) -> StoreResult<Vec<NodeHandle>> {
        Ok(self.view().get(node)?.children.clone())
    }

    fn child(&self, node: NodeHandle, name: &str) -> StoreResult<Option<NodeHandle>> {
        let tree = self.view();
        let data = tree.get(node)?;
        for &child in &data.children {
            if tree.get(child)?.name == name {
                return Ok(Some(child));
            }
        }
        Ok(None)
    }

    fn primary_type(&self, node: NodeHandle) -> StoreResult<String> {
        Ok(self.view().get(node)?.primary_type.clone())
    }

    fn mixin_types(&self, node: NodeHandle) -> StoreResult<Vec<String>> {
        Ok(self.view().get(node)?.mixins.clone())
    }

    fn is_node_type(&self, node: NodeHandle, type_name: &str) -> StoreResult<bool> {
        let tree = self.view();
        Ok(self.is_type(tree.get(node)?, type_name))
    }

    fn properties(&self, node: NodeHandle) -> StoreResult<Vec<PropertyInfo>> {
        let tree = self.view();
        let data = tree.get(node)?;
        let system = SYSTEM_PROPERTIES.iter().copied();
        let stored = data.properties.keys().map(String::as_str);
        Ok(system
            .chain(stored)
            .filter_map(|name| {
                self.read_property(data, name).map(|p| PropertyInfo {
                    name: name.to_string(),
                    property_type: p.property_type,
                    multiple: p.multiple,
                })
            })
            .collect())
    }

    fn property(&self, node: NodeHandle, name: &str) -> StoreResult<Option<PropertyInfo>> {
        let tree = self.view();
        let data = tree.get(node)?;
        Ok(self.read_property(data, name).map(|p| PropertyInfo {
            name: name.to_string(),
            property_type: p.property_type,
            multiple: p.multiple,
        }))
    }

    fn property_value(&self, node: NodeHandle, name: &str) -> StoreResult<String> {
        let tree = self.view();
        let prop = self
            .read_property(tree.get(node)?, name)
            .ok_or_else(|| Self::missing_property(&tree, node, name))?;
        if prop.multiple {
            return Err(StoreError::ValueFormat(format!(
                "property '{name}' is multi-valued"
            )));
        }
        prop.values
            .into_iter()
            .next()
            .ok_or_else(|| Self::missing_property(&tree, node, name))
    }

    fn property_values(&self, node: NodeHandle, name: &str) -> StoreResult<Vec<String>> {
        let tree = self.view();
        let prop = self
            .read_property(tree.get(node)?, name)
            .ok_or_else(|| Self::missing_property(&tree, node, name))?;
        if !prop.multiple {
            return Err(StoreError::ValueFormat(format!(
                "property '{name}' is single-valued"
            )));
        }
        Ok(prop.values)
    }

    // ── Transient writes ──────────────────────────────────────────────

    fn add_node(
        &mut self,
        parent: NodeHandle,
        name: &str,
        primary_type: &str,
    ) -> StoreResult<NodeHandle> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '[', ']', '*'])
        {
            return Err(StoreError::Constraint(format!("invalid node name '{name}'")));
        }
        let referenceable = {
            let registry = self.registry.read();
            registry.check_name(name)?;
            let def = registry.require(primary_type)?;
            if def.mixin || def.is_abstract {
                return Err(StoreError::Constraint(format!(
                    "'{primary_type}' cannot be used as a primary type"
                )));
            }
            registry.is_subtype(primary_type, REFERENCEABLE)
        };
        let tree = self.view();
        self.ensure_writable(&tree, parent)?;
        if self.child(parent, name)?.is_some() {
            return Err(StoreError::Constraint(format!(
                "{} already has a child named '{name}'",
                tree.path(parent)
            )));
        }
        drop(tree);

        let tree = self.edit();
        let node = tree.insert_child(parent, NodeData::new(name, Some(parent), primary_type))?;
        if referenceable {
            tree.assign_uuid(node, uuid::Uuid::new_v4().to_string())?;
        }
        tracing::trace!(workspace = %self.workspace.name, name, primary_type, "node added");
        Ok(node)
    }

    fn add_mixin(&mut self, node: NodeHandle, mixin: &str) -> StoreResult<()> {
        let (referenceable, versionable) = {
            let registry = self.registry.read();
            let def = registry.require(mixin)?;
            if !def.mixin {
                return Err(StoreError::Constraint(format!("'{mixin}' is not a mixin type")));
            }
            (
                registry.is_subtype(mixin, REFERENCEABLE),
                registry.is_subtype(mixin, VERSIONABLE),
            )
        };

        let tree = self.view();
        self.ensure_writable(&tree, node)?;
        let data = tree.get(node)?;
        if self.is_type(data, mixin) {
            return Ok(());
        }
        let needs_uuid = referenceable && data.uuid.is_none();
        drop(tree);

        let tree = self.edit();
        let data = tree.get_mut(node)?;
        data.mixins.push(mixin.to_string());
        if versionable {
            data.checked_out = true;
        }
        if needs_uuid {
            tree.assign_uuid(node, uuid::Uuid::new_v4().to_string())?;
        }
        Ok(())
    }

    fn set_property(
        &mut self,
        node: NodeHandle,
        name: &str,
        value: &str,
        property_type: PropertyType,
    ) -> StoreResult<()> {
        self.store_property(node, name, &[value], property_type, false)
    }

    fn set_multi_property(
        &mut self,
        node: NodeHandle,
        name: &str,
        values: &[String],
        property_type: PropertyType,
    ) -> StoreResult<()> {
        let raw: Vec<&str> = values.iter().map(String::as_str).collect();
        self.store_property(node, name, &raw, property_type, true)
    }

    fn save(&mut self) -> StoreResult<()> {
        let Some(tree) = self.pending.take() else {
            return Ok(());
        };
        let mut committed = self.workspace.committed.write();
        if committed.generation != self.base {
            self.pending = Some(tree);
            tracing::debug!(
                workspace = %self.workspace.name,
                base = self.base,
                current = committed.generation,
                "save conflict"
            );
            return Err(StoreError::InvalidState(format!(
                "workspace '{}' changed since this session's first unsaved edit; refresh and retry",
                self.workspace.name
            )));
        }
        committed.tree = tree;
        committed.generation += 1;
        tracing::debug!(workspace = %self.workspace.name, "session saved");
        Ok(())
    }

    fn refresh(&mut self, discard: bool) {
        if discard {
            self.pending = None;
        }
    }

    fn has_pending_changes(&self) -> bool {
        self.pending.is_some()
    }

    // ── Versioning ────────────────────────────────────────────────────

    fn checkin(&mut self, node: NodeHandle) -> StoreResult<String> {
        if self.has_pending_changes() {
            return Err(StoreError::InvalidState(
                "cannot check in with unsaved changes".into(),
            ));
        }
        let tree = self.view();
        self.require_versionable(&tree, node)?;
        if !tree.get(node)?.checked_out {
            return Err(StoreError::Version(format!(
                "{} is already checked in",
                tree.path(node)
            )));
        }
        drop(tree);

        let version = self.commit_direct(|tree| {
            let path = tree.path(node);
            let data = tree.get_mut(node)?;
            if !data.checked_out {
                return Err(StoreError::Version(format!("{path} is already checked in")));
            }
            let version = format!("1.{}", data.versions.len());
            data.versions.push(version.clone());
            data.checked_out = false;
            Ok(version)
        })?;
        tracing::debug!(workspace = %self.workspace.name, version = %version, "checked in");
        Ok(version)
    }

    fn checkout(&mut self, node: NodeHandle) -> StoreResult<()> {
        let tree = self.view();
        self.require_versionable(&tree, node)?;
        if tree.get(node)?.checked_out {
            return Ok(());
        }
        drop(tree);

        self.commit_direct(|tree| {
            tree.get_mut(node)?.checked_out = true;
            Ok(())
        })?;
        // Keep an existing working copy consistent with the workspace.
        if let Some(pending) = self.pending.as_mut() {
            Arc::make_mut(pending).get_mut(node)?.checked_out = true;
        }
        tracing::debug!(workspace = %self.workspace.name, "checked out");
        Ok(())
    }

    fn is_checked_out(&self, node: NodeHandle) -> StoreResult<bool> {
        let tree = self.view();
        let data = tree.get(node)?;
        Ok(!self.is_type(data, VERSIONABLE) || data.checked_out)
    }

    fn version_history(&self, node: NodeHandle) -> StoreResult<Vec<String>> {
        let tree = self.view();
        self.require_versionable(&tree, node)?;
        Ok(tree.get(node)?.versions.clone())
    }

    // ── Registries ────────────────────────────────────────────────────

    fn node_type_exists(&self, name: &str) -> bool {
        self.registry.read().contains(name)
    }

    fn node_type_defs(&self) -> Vec<NodeTypeDef> {
        self.registry.read().defs()
    }

    fn register_node_types(&mut self, defs: &[NodeTypeDef]) -> StoreResult<()> {
        self.registry.write().register_node_types(defs)?;
        tracing::info!(count = defs.len(), "node types registered");
        Ok(())
    }

    fn register_namespace(&mut self, prefix: &str, uri: &str) -> StoreResult<()> {
        self.registry.write().register_namespace(prefix, uri)?;
        tracing::debug!(prefix, uri, "namespace registered");
        Ok(())
    }

    fn namespaces(&self) -> BTreeMap<String, String> {
        self.registry.read().namespaces()
    }
}

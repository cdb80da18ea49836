use std::collections::{BTreeMap, HashMap};

use ng_cnd::PropertyType;

use crate::error::{StoreError, StoreResult};
use crate::memory::registry::{REFERENCEABLE, ROOT_TYPE};
use crate::session::NodeHandle;

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PropertyData {
    pub property_type: PropertyType,
    pub values: Vec<String>,
    pub multiple: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub name: String,
    pub parent: Option<NodeHandle>,
    pub children: Vec<NodeHandle>,
    pub primary_type: String,
    pub mixins: Vec<String>,
    pub uuid: Option<String>,
    /// Only meaningful once the node is versionable.
    pub checked_out: bool,
    pub properties: BTreeMap<String, PropertyData>,
    /// Version names, oldest first.
    pub versions: Vec<String>,
}

impl NodeData {
    pub fn new(name: &str, parent: Option<NodeHandle>, primary_type: &str) -> Self {
        Self {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            primary_type: primary_type.to_string(),
            mixins: Vec::new(),
            uuid: None,
            checked_out: true,
            properties: BTreeMap::new(),
            versions: Vec::new(),
        }
    }
}

/// The node graph of one workspace.
///
/// A committed tree is shared behind an `Arc`; sessions clone it on their
/// first write and publish the clone on save.
#[derive(Debug, Clone)]
pub(crate) struct Tree {
    nodes: HashMap<NodeHandle, NodeData>,
    by_uuid: HashMap<String, NodeHandle>,
    root: NodeHandle,
    next_key: u64,
}

impl Tree {
    /// A tree holding only the root, which is referenceable from the start.
    pub fn new() -> Self {
        let root = NodeHandle(0);
        let uuid = uuid::Uuid::new_v4().to_string();
        let mut data = NodeData::new("", None, ROOT_TYPE);
        data.mixins.push(REFERENCEABLE.to_string());
        data.uuid = Some(uuid.clone());
        Self {
            nodes: HashMap::from([(root, data)]),
            by_uuid: HashMap::from([(uuid, root)]),
            root,
            next_key: 1,
        }
    }

    pub fn root(&self) -> NodeHandle {
        self.root
    }

    pub fn get(&self, node: NodeHandle) -> StoreResult<&NodeData> {
        self.nodes
            .get(&node)
            .ok_or_else(|| StoreError::ItemNotFound(format!("node #{}", node.0)))
    }

    pub fn get_mut(&mut self, node: NodeHandle) -> StoreResult<&mut NodeData> {
        self.nodes
            .get_mut(&node)
            .ok_or_else(|| StoreError::ItemNotFound(format!("node #{}", node.0)))
    }

    pub fn by_uuid(&self, uuid: &str) -> Option<NodeHandle> {
        self.by_uuid.get(uuid).copied()
    }

    pub fn insert_child(&mut self, parent: NodeHandle, data: NodeData) -> StoreResult<NodeHandle> {
        let handle = NodeHandle(self.next_key);
        self.get_mut(parent)?.children.push(handle);
        self.next_key += 1;
        self.nodes.insert(handle, data);
        Ok(handle)
    }

    pub fn assign_uuid(&mut self, node: NodeHandle, uuid: String) -> StoreResult<()> {
        self.get_mut(node)?.uuid = Some(uuid.clone());
        self.by_uuid.insert(uuid, node);
        Ok(())
    }

    /// Slash-separated location, for messages.
    pub fn path(&self, node: NodeHandle) -> String {
        let mut segments = Vec::new();
        let mut current = Some(node);
        while let Some(handle) = current {
            match self.nodes.get(&handle) {
                Some(data) if data.parent.is_some() => {
                    segments.push(data.name.clone());
                    current = data.parent;
                }
                _ => break,
            }
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }
}

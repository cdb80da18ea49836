//! In-memory repository engine.
//!
//! Every workspace keeps one committed [`tree::Tree`] behind an `Arc`.
//! Sessions read the committed tree until their first write, then work on a
//! private copy that replaces the committed one on `save`. Every change to
//! the committed tree bumps the workspace generation; a save whose working
//! copy was taken from an older generation fails with `InvalidState`
//! instead of overwriting the newer tree. The type and namespace registry
//! is shared by all workspaces and changes take effect immediately.

mod registry;
mod session;
mod tree;
mod values;

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::session::{Credentials, Repository, Session};

pub use session::MemorySession;

use registry::Registry;
use tree::Tree;

pub(crate) struct Workspace {
    name: String,
    committed: RwLock<Committed>,
}

struct Committed {
    tree: Arc<Tree>,
    generation: u64,
}

/// A repository that lives only as long as the process.
pub struct MemoryRepository {
    registry: Arc<RwLock<Registry>>,
    workspaces: BTreeMap<String, Arc<Workspace>>,
    users: Vec<Credentials>,
}

impl MemoryRepository {
    /// Create a repository with the given workspaces, each holding only a
    /// root node. Without any [`with_user`](Self::with_user) call every
    /// login is accepted.
    pub fn new<I, S>(workspaces: I) -> StoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let registry = Registry::builtin()?;
        let workspaces: BTreeMap<String, Arc<Workspace>> = workspaces
            .into_iter()
            .map(|name| {
                let name = name.into();
                let ws = Workspace {
                    name: name.clone(),
                    committed: RwLock::new(Committed {
                        tree: Arc::new(Tree::new()),
                        generation: 0,
                    }),
                };
                (name, Arc::new(ws))
            })
            .collect();

        tracing::debug!(
            workspaces = workspaces.len(),
            node_types = registry.defs().len(),
            "memory repository created"
        );

        Ok(Self {
            registry: Arc::new(RwLock::new(registry)),
            workspaces,
            users: Vec::new(),
        })
    }

    /// Accept `credentials` at login. Once any user is configured, unknown
    /// credentials are rejected.
    pub fn with_user(mut self, credentials: Credentials) -> Self {
        self.users.push(credentials);
        self
    }
}

impl Repository for MemoryRepository {
    fn login(&self, credentials: &Credentials, workspace: &str) -> StoreResult<Box<dyn Session>> {
        if !self.users.is_empty() && !self.users.iter().any(|u| u == credentials) {
            tracing::warn!(user = %credentials.username, "login rejected");
            return Err(StoreError::LoginFailed(credentials.username.clone()));
        }
        let ws = self
            .workspaces
            .get(workspace)
            .ok_or_else(|| StoreError::NoSuchWorkspace(workspace.to_string()))?;

        tracing::debug!(user = %credentials.username, workspace, "login");
        Ok(Box::new(MemorySession::new(
            Arc::clone(ws),
            Arc::clone(&self.registry),
        )))
    }

    fn workspace_names(&self) -> Vec<String> {
        self.workspaces.keys().cloned().collect()
    }
}

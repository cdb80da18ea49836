use std::collections::BTreeMap;

use ng_cnd::write_cnd;
use ng_domain::config::{Config, SentinelConfig};
use ng_domain::error::{Error, Result};
use ng_protocol::{NodeId, NodeSnapshot};
use ng_repository::{Credentials, Repository, Session, StoreError};

use crate::schema::{ensure_schema, SchemaSource};
use crate::sentinel::ensure_sentinel;
use crate::snapshot;
use crate::store_error;

const PRIMARY_TYPE: &str = "jcr:primaryType";

/// Everything a gateway needs besides the repository and schema text.
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Fixed service identity used for every login.
    pub credentials: Credentials,
    pub root_document_type: String,
    pub sentinel: SentinelConfig,
}

impl GatewaySettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            credentials: Credentials::new(
                config.repository.username.clone(),
                config.repository.password(),
            ),
            root_document_type: config.schema.root_document_type.clone(),
            sentinel: config.sentinel.clone(),
        }
    }
}

/// One authenticated, bootstrapped repository session.
pub struct SessionGateway {
    session: Box<dyn Session>,
    workspace: String,
    root_id: NodeId,
}

impl SessionGateway {
    /// Log in, then make sure the schema and sentinel exist. No gateway is
    /// returned unless every step succeeds.
    pub fn open(
        repo: &dyn Repository,
        settings: &GatewaySettings,
        source: &SchemaSource,
        workspace: &str,
    ) -> Result<Self> {
        let mut session = repo
            .login(&settings.credentials, workspace)
            .map_err(store_error::login)?;

        let schema = ensure_schema(session.as_mut(), source, &settings.root_document_type)?;
        let sentinel = ensure_sentinel(session.as_mut(), &settings.sentinel)?;

        let root = session.root();
        let root_id = session.identifier(root).map_err(store_error::repository)?;

        tracing::info!(
            workspace,
            root_id = %root_id,
            schema = ?schema,
            sentinel = ?sentinel,
            "session gateway opened"
        );

        Ok(Self {
            session,
            workspace: workspace.to_string(),
            root_id,
        })
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn root_id(&self) -> &str {
        &self.root_id
    }

    /// Primary node type of the node with identifier `id`.
    pub fn type_of(&self, id: &str) -> Result<String> {
        let node = self
            .session
            .node_by_identifier(id)
            .map_err(store_error::lookup)?;
        self.session
            .property_value(node, PRIMARY_TYPE)
            .map_err(|e| match e {
                StoreError::ItemNotFound(_) => {
                    Error::NotFound(format!("node {id} has no {PRIMARY_TYPE}"))
                }
                other => store_error::repository(other),
            })
    }

    /// Every registered node type and namespace in compact notation.
    pub fn schema_text(&self) -> Result<String> {
        let namespaces = self.session.namespaces();
        let defs = self.session.node_type_defs();
        if defs.is_empty() {
            return Err(Error::Repository("type registry is empty".into()));
        }
        Ok(write_cnd(&namespaces, &defs))
    }

    pub fn snapshot(&self, ids: &[NodeId]) -> Result<BTreeMap<NodeId, NodeSnapshot>> {
        snapshot::snapshot(self.session.as_ref(), ids)
    }

    pub fn session_mut(&mut self) -> &mut dyn Session {
        self.session.as_mut()
    }
}

impl std::fmt::Debug for SessionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGateway")
            .field("workspace", &self.workspace)
            .field("root_id", &self.root_id)
            .finish_non_exhaustive()
    }
}

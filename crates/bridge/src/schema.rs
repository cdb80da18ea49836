use std::path::Path;

use ng_cnd::parse_cnd;
use ng_domain::error::{Error, Result};
use ng_domain::trace::TraceEvent;
use ng_repository::{Session, StoreError};

use crate::store_error;

/// Compact type definitions read once at startup.
#[derive(Debug, Clone)]
pub struct SchemaSource {
    /// Where the text came from, for messages.
    pub origin: String,
    pub text: String,
}

impl SchemaSource {
    pub fn new(origin: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            text: text.into(),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Schema(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(Self::new(path.display().to_string(), text))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOutcome {
    /// The root document type was already registered; nothing was written.
    AlreadyPresent,
    Registered { namespaces: usize, node_types: usize },
}

/// Make sure the store knows `root_type`, registering `source` if not.
///
/// Prefixes that are already mapped are skipped. When the batch
/// registration loses a race against another bootstrap (the batch is
/// rejected as a duplicate but `root_type` now exists) the outcome is
/// [`SchemaOutcome::AlreadyPresent`].
pub fn ensure_schema(
    session: &mut dyn Session,
    source: &SchemaSource,
    root_type: &str,
) -> Result<SchemaOutcome> {
    if session.node_type_exists(root_type) {
        tracing::debug!(root_type, "schema already present");
        return Ok(SchemaOutcome::AlreadyPresent);
    }

    let doc = parse_cnd(&source.text)
        .map_err(|e| Error::Schema(format!("{}: {e}", source.origin)))?;
    if doc.node_type(root_type).is_none() {
        return Err(Error::Schema(format!(
            "{} does not define [{root_type}]",
            source.origin
        )));
    }

    let mut namespaces = 0;
    for (prefix, uri) in &doc.namespaces {
        match session.register_namespace(prefix, uri) {
            Ok(()) => namespaces += 1,
            Err(StoreError::NamespaceExists(_)) => {
                tracing::debug!(prefix = %prefix, uri = %uri, "namespace already registered");
                TraceEvent::NamespaceSkipped {
                    prefix: prefix.clone(),
                    uri: uri.clone(),
                    reason: "already registered".into(),
                }
                .emit();
            }
            Err(e) => return Err(store_error::schema(e)),
        }
    }

    match session.register_node_types(&doc.node_types) {
        Ok(()) => {}
        Err(StoreError::NodeTypeExists(name)) if session.node_type_exists(root_type) => {
            tracing::info!(
                root_type,
                conflicting = %name,
                "schema registered concurrently by another session"
            );
            return Ok(SchemaOutcome::AlreadyPresent);
        }
        Err(e) => return Err(store_error::schema(e)),
    }

    TraceEvent::SchemaBootstrapped {
        workspace: session.workspace().to_string(),
        source: source.origin.clone(),
        namespaces,
        node_types: doc.node_types.len(),
    }
    .emit();

    Ok(SchemaOutcome::Registered {
        namespaces,
        node_types: doc.node_types.len(),
    })
}

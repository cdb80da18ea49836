/// Failures reported by a content repository engine.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("login failed for user '{0}'")]
    LoginFailed(String),

    #[error("no such workspace '{0}'")]
    NoSuchWorkspace(String),

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("node is not referenceable: {0}")]
    NotReferenceable(String),

    #[error("no such node type '{0}'")]
    NoSuchNodeType(String),

    #[error("node type '{0}' is already registered")]
    NodeTypeExists(String),

    #[error("namespace prefix '{0}' is already registered")]
    NamespaceExists(String),

    #[error("namespace error: {0}")]
    Namespace(String),

    #[error("value format error: {0}")]
    ValueFormat(String),

    #[error("version error: {0}")]
    Version(String),

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("invalid item state: {0}")]
    InvalidState(String),

    #[error("invalid node type definition: {0}")]
    InvalidDefinition(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

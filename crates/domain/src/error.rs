use serde::{Deserialize, Serialize};

/// Wire-visible classification of an [`Error`].
///
/// Clients that only read the error message keep working; the kind is an
/// additional hint for callers that want to branch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Auth,
    Schema,
    NotFound,
    Repository,
    InvalidSession,
    BadRequest,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::Auth => "auth",
            ErrorKind::Schema => "schema",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Repository => "repository",
            ErrorKind::InvalidSession => "invalid_session",
            ErrorKind::BadRequest => "bad_request",
        };
        f.write_str(s)
    }
}

/// Shared error type used across all NodeGate crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Login or workspace selection failed.
    #[error("auth: {0}")]
    Auth(String),

    /// Type-definition parse failure, or a registry write other than
    /// "already exists".
    #[error("schema: {0}")]
    Schema(String),

    /// An identifier did not resolve, or the node lacks a standard property.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other store-layer failure.
    #[error("repository: {0}")]
    Repository(String),

    #[error("invalid session: {0}")]
    InvalidSession(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("config: {0}")]
    Config(String),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Auth(_) => ErrorKind::Auth,
            Error::Schema(_) => ErrorKind::Schema,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::InvalidSession(_) => ErrorKind::InvalidSession,
            Error::BadRequest(_) => ErrorKind::BadRequest,
            Error::Repository(_) | Error::Config(_) | Error::Io(_) | Error::Json(_) => {
                ErrorKind::Repository
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

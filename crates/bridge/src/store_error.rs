//! How store failures surface at each public operation.

use ng_domain::error::Error;
use ng_repository::StoreError;

/// Login: credential and workspace failures are authentication errors.
pub(crate) fn login(err: StoreError) -> Error {
    match err {
        StoreError::LoginFailed(_) | StoreError::NoSuchWorkspace(_) => Error::Auth(err.to_string()),
        other => Error::Repository(other.to_string()),
    }
}

/// Bootstrap: every failure is a schema error.
pub(crate) fn schema(err: StoreError) -> Error {
    Error::Schema(err.to_string())
}

/// Identifier resolution: unresolvable ids are not-found errors.
pub(crate) fn lookup(err: StoreError) -> Error {
    match err {
        StoreError::ItemNotFound(_) | StoreError::NotReferenceable(_) => {
            Error::NotFound(err.to_string())
        }
        other => Error::Repository(other.to_string()),
    }
}

pub(crate) fn repository(err: StoreError) -> Error {
    Error::Repository(err.to_string())
}

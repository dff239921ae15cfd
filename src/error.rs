//! Application-level error taxonomy.
//!
//! Core operations return a typed success value or fail with one of these
//! variants; the web layer maps each variant to an HTTP status. Denial of
//! access is always a distinguishable failure, never an empty result.

use crate::photos::PhotoError;
use crate::storage::StorageError;

#[derive(Debug)]
pub enum AppError {
    /// Malformed input caught at the boundary (unknown category, bad draft).
    Validation(String),
    /// Duplicate friendship request, duplicate registration, already joined.
    Conflict(String),
    /// Target does not exist — or exists but belongs to someone else, for
    /// mutations. Existence and ownership failures are deliberately merged
    /// so a non-owner cannot probe for another user's private resources.
    NotFound(String),
    /// The viewer lacks visibility or mutation rights on a known resource.
    Authorization(String),
    /// A stored value is outside its recognized enumeration (e.g. an event
    /// privacy string no variant matches). Access is denied, never defaulted
    /// to public.
    Configuration(String),
    Storage(StorageError),
    Photo(PhotoError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Validation(msg) => write!(f, "invalid input: {msg}"),
            AppError::Conflict(msg) => write!(f, "conflict: {msg}"),
            AppError::NotFound(msg) => write!(f, "not found: {msg}"),
            AppError::Authorization(msg) => write!(f, "access denied: {msg}"),
            AppError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            AppError::Storage(e) => write!(f, "storage error: {e}"),
            AppError::Photo(e) => write!(f, "photo error: {e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Storage(e) => Some(e),
            AppError::Photo(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        // Storage-level "not found" and "already exists" carry the same
        // meaning at the application level; keep the message.
        match e {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::AlreadyExists(msg) => AppError::Conflict(msg),
            other => AppError::Storage(other),
        }
    }
}

impl From<PhotoError> for AppError {
    fn from(e: PhotoError) -> Self {
        match e {
            PhotoError::InvalidPayload(msg) => AppError::Validation(msg),
            other => AppError::Photo(other),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

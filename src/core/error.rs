use thiserror::Error;

use crate::core::record::UserId;

/// Errors produced by store operations. None are fatal; the store stays
/// usable after any single failed operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A mutating operation received an empty field mapping. Carries the
    /// name of the rejected action ("append" or "edit").
    #[error("no data provided for {0}")]
    EmptyBody(&'static str),
    /// An insert would duplicate an email already on the roster.
    #[error("email already exists: {0}")]
    DuplicateEmail(String),
    /// No record carries the requested id.
    #[error("no user exists with id {0}")]
    UnknownId(UserId),
    /// The backing file could not be rewritten. The in-memory mutation
    /// stays applied, so memory runs ahead of the file until the next
    /// successful persist.
    #[error("failed to persist user data")]
    Persistence(#[source] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

//! Resolver error types.

use contact_store::StoreError;
use thiserror::Error;

/// Errors that can occur during identity resolution.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// Neither an email nor a phone number was supplied.
    #[error("at least one of email or phone number is required")]
    InvalidInput,

    /// Classification fell through without resolving an identity.
    ///
    /// Every branch of the identify operation resolves a primary, so this is
    /// defensive only.
    #[error("no identity resolved for the given input")]
    NotFound,

    /// Stored contact data violates the chain invariants. Fatal; never
    /// retried.
    #[error("contact data integrity violated: {0}")]
    DataIntegrity(String),

    /// Store failure, propagated unchanged.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

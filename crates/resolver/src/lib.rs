//! Identity resolution core.
//!
//! This crate decides how an incoming contact observation (an email and/or a
//! phone number) relates to the contact chains already on record, performs
//! the minimal writes, and assembles the unified identity view.
//!
//! An observation lands in exactly one of five situations:
//!
//! - nothing matches: start a new chain with a fresh primary
//! - one field matches and the other carries a new value: attach a secondary
//! - both fields match different chains: merge them under the older primary
//! - both fields match the same chain: read-only
//! - one field matches and nothing new was supplied: read-only
//!
//! # Example
//!
//! ```rust,ignore
//! use contact_store::ContactStore;
//! use resolver::{IdentifyRequest, Resolver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = ContactStore::connect("sqlite:identity.db?mode=rwc").await?;
//!     store.migrate().await?;
//!     let resolver = Resolver::new(store);
//!
//!     let request = IdentifyRequest::new(Some("bob@example.com"), Some("111222"));
//!     let identity = resolver.identify(request).await?;
//!     println!("primary contact: {}", identity.primary_contact_id);
//!     Ok(())
//! }
//! ```

mod chain;
mod error;
mod resolver;
mod types;

// Public exports
pub use chain::{merge_chains, Chain};
pub use error::ResolverError;
pub use resolver::Resolver;
pub use types::{IdentifyRequest, IdentifyResponse};

// Re-export commonly used types from the store
pub use contact_store::{Contact, ContactStore, LinkPrecedence};

//! SQLite persistence layer for the identity service.
//!
//! This crate stores contact observations and the primary/secondary links
//! between them using SQLx with SQLite. The resolver crate sits on top and
//! never touches SQL directly.
//!
//! # Example
//!
//! ```no_run
//! use contact_store::{contact, ContactStore, NewContact};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let store = ContactStore::connect("sqlite:identity.db?mode=rwc").await?;
//!     store.migrate().await?;
//!
//!     // Record a first observation
//!     let new = NewContact::primary(Some("bob@example.com"), Some("111222"));
//!     let contact = contact::create_contact(store.pool(), &new).await?;
//!     println!("stored contact {}", contact.id);
//!
//!     Ok(())
//! }
//! ```

pub mod contact;
pub mod error;
pub mod models;

pub use error::{Result, StoreError};
pub use models::{Contact, LinkPrecedence, NewContact};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Contact store connection wrapper.
#[derive(Debug, Clone)]
pub struct ContactStore {
    pool: SqlitePool,
}

impl ContactStore {
    /// Default pool size for store connections.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist, or
    /// `sqlite::memory:` for an in-memory database in tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!("Connected to contact store: {} (pool size: {})", url, pool_size);

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running contact store migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> ContactStore {
        let store = ContactStore::connect("sqlite::memory:").await.unwrap();
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_contact_roundtrip() {
        let store = test_store().await;
        let pool = store.pool();

        let created =
            contact::create_contact(pool, &NewContact::primary(Some("a@x.com"), Some("111")))
                .await
                .unwrap();
        assert_eq!(created.email.as_deref(), Some("a@x.com"));
        assert_eq!(created.link_precedence, LinkPrecedence::Primary);
        assert_eq!(created.linked_id, None);
        assert!(created.deleted_at.is_none());

        let by_email = contact::find_by_email(pool, "a@x.com").await.unwrap();
        assert_eq!(by_email.len(), 1);
        assert_eq!(by_email[0].id, created.id);

        let by_phone = contact::find_by_phone(pool, "111").await.unwrap();
        assert_eq!(by_phone.len(), 1);

        let fetched = contact::get_contact(pool, created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn test_ids_are_monotonic() {
        let store = test_store().await;
        let pool = store.pool();

        let first = contact::create_contact(pool, &NewContact::primary(Some("a@x.com"), None))
            .await
            .unwrap();
        let second = contact::create_contact(pool, &NewContact::primary(Some("b@x.com"), None))
            .await
            .unwrap();
        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_find_by_primary_id_lists_secondaries_only() {
        let store = test_store().await;
        let pool = store.pool();

        let primary = contact::create_contact(pool, &NewContact::primary(Some("a@x.com"), None))
            .await
            .unwrap();
        let secondary = contact::create_contact(
            pool,
            &NewContact::secondary(Some("a@x.com"), Some("222"), primary.id),
        )
        .await
        .unwrap();

        let linked = contact::find_by_primary_id(pool, primary.id).await.unwrap();
        assert_eq!(linked.len(), 1);
        assert_eq!(linked[0].id, secondary.id);
        assert_eq!(linked[0].linked_id, Some(primary.id));
    }

    #[tokio::test]
    async fn test_save_batch_relinks_rows() {
        let store = test_store().await;
        let pool = store.pool();

        let keeper = contact::create_contact(pool, &NewContact::primary(Some("a@x.com"), None))
            .await
            .unwrap();
        let other = contact::create_contact(pool, &NewContact::primary(None, Some("222")))
            .await
            .unwrap();

        let mut demoted = other.clone();
        demoted.link_precedence = LinkPrecedence::Secondary;
        demoted.linked_id = Some(keeper.id);
        contact::save_batch(pool, &[demoted]).await.unwrap();

        let fetched = contact::get_contact(pool, other.id).await.unwrap();
        assert_eq!(fetched.link_precedence, LinkPrecedence::Secondary);
        assert_eq!(fetched.linked_id, Some(keeper.id));
        // id and creation time never change on relink
        assert_eq!(fetched.id, other.id);
        assert_eq!(fetched.created_at, other.created_at);
    }

    #[tokio::test]
    async fn test_soft_delete_hides_row_from_lookups() {
        let store = test_store().await;
        let pool = store.pool();

        let created =
            contact::create_contact(pool, &NewContact::primary(Some("a@x.com"), Some("111")))
                .await
                .unwrap();
        contact::soft_delete_contact(pool, created.id).await.unwrap();

        assert!(contact::find_by_email(pool, "a@x.com").await.unwrap().is_empty());
        assert!(contact::find_by_phone(pool, "111").await.unwrap().is_empty());
        let result = contact::get_contact(pool, created.id).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert_eq!(contact::count_contacts(pool).await.unwrap(), 0);

        // deleting twice reports NotFound
        let again = contact::soft_delete_contact(pool, created.id).await;
        assert!(matches!(again, Err(StoreError::NotFound { .. })));
    }
}

//! Contact row operations.
//!
//! Every lookup filters `deleted_at IS NULL`; soft-deleted rows never reach
//! the resolver.

use sqlx::SqlitePool;

use crate::error::{Result, StoreError};
use crate::models::{Contact, NewContact};

/// Find all non-deleted contacts with the given email, oldest first.
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Vec<Contact>> {
    let contacts = sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, email, phone, link_precedence, linked_id, created_at, updated_at, deleted_at
        FROM contacts
        WHERE email = ? AND deleted_at IS NULL
        ORDER BY created_at, id
        "#,
    )
    .bind(email)
    .fetch_all(pool)
    .await?;

    Ok(contacts)
}

/// Find all non-deleted contacts with the given phone number, oldest first.
pub async fn find_by_phone(pool: &SqlitePool, phone: &str) -> Result<Vec<Contact>> {
    let contacts = sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, email, phone, link_precedence, linked_id, created_at, updated_at, deleted_at
        FROM contacts
        WHERE phone = ? AND deleted_at IS NULL
        ORDER BY created_at, id
        "#,
    )
    .bind(phone)
    .fetch_all(pool)
    .await?;

    Ok(contacts)
}

/// Find all non-deleted secondaries linked to the given primary, oldest first.
pub async fn find_by_primary_id(pool: &SqlitePool, primary_id: i64) -> Result<Vec<Contact>> {
    let contacts = sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, email, phone, link_precedence, linked_id, created_at, updated_at, deleted_at
        FROM contacts
        WHERE linked_id = ? AND link_precedence = 'secondary' AND deleted_at IS NULL
        ORDER BY created_at, id
        "#,
    )
    .bind(primary_id)
    .fetch_all(pool)
    .await?;

    Ok(contacts)
}

/// Get a non-deleted contact by id.
pub async fn get_contact(pool: &SqlitePool, id: i64) -> Result<Contact> {
    sqlx::query_as::<_, Contact>(
        r#"
        SELECT id, email, phone, link_precedence, linked_id, created_at, updated_at, deleted_at
        FROM contacts
        WHERE id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| StoreError::NotFound {
        entity: "Contact",
        id: id.to_string(),
    })
}

/// Insert a new contact and return the stored row with its assigned id.
pub async fn create_contact(pool: &SqlitePool, new: &NewContact) -> Result<Contact> {
    let result = sqlx::query(
        r#"
        INSERT INTO contacts (email, phone, link_precedence, linked_id)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(new.email.as_deref())
    .bind(new.phone.as_deref())
    .bind(new.link_precedence)
    .bind(new.linked_id)
    .execute(pool)
    .await?;

    get_contact(pool, result.last_insert_rowid()).await
}

/// Update the link fields of several contacts in one transaction.
///
/// Either every row updates or none do; a merge must never leave a chain
/// split across two primaries.
pub async fn save_batch(pool: &SqlitePool, contacts: &[Contact]) -> Result<()> {
    let mut tx = pool.begin().await?;

    for contact in contacts {
        sqlx::query(
            r#"
            UPDATE contacts
            SET email = ?, phone = ?, link_precedence = ?, linked_id = ?,
                updated_at = datetime('now')
            WHERE id = ?
            "#,
        )
        .bind(contact.email.as_deref())
        .bind(contact.phone.as_deref())
        .bind(contact.link_precedence)
        .bind(contact.linked_id)
        .bind(contact.id)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}

/// Soft-delete a contact by stamping `deleted_at`.
pub async fn soft_delete_contact(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE contacts
        SET deleted_at = datetime('now'), updated_at = datetime('now')
        WHERE id = ? AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound {
            entity: "Contact",
            id: id.to_string(),
        });
    }

    Ok(())
}

/// Count all non-deleted contacts.
pub async fn count_contacts(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM contacts WHERE deleted_at IS NULL
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}

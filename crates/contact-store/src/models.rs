//! Store models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Role of a contact row within its chain.
///
/// A chain has exactly one `Primary` (the canonical, oldest record for an
/// identity) and any number of `Secondary` rows pointing at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LinkPrecedence {
    Primary,
    Secondary,
}

/// A single contact observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Contact {
    /// Auto-incrementing ID; creation order is id order.
    pub id: i64,
    /// Email address, if observed.
    pub email: Option<String>,
    /// Phone number, if observed.
    pub phone: Option<String>,
    /// Primary or secondary role within the chain.
    pub link_precedence: LinkPrecedence,
    /// Id of the chain's primary; set only on secondary rows.
    pub linked_id: Option<i64>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last mutation timestamp.
    pub updated_at: String,
    /// Soft-delete marker; deleted rows are invisible to every lookup.
    pub deleted_at: Option<String>,
}

impl Contact {
    /// Whether this row is the primary of its chain.
    pub fn is_primary(&self) -> bool {
        self.link_precedence == LinkPrecedence::Primary
    }
}

/// Field values for a contact that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
    /// Email address, if observed.
    pub email: Option<String>,
    /// Phone number, if observed.
    pub phone: Option<String>,
    /// Primary or secondary role within the chain.
    pub link_precedence: LinkPrecedence,
    /// Id of the chain's primary; required for secondary rows.
    pub linked_id: Option<i64>,
}

impl NewContact {
    /// A fresh primary contact starting a new chain.
    pub fn primary(email: Option<&str>, phone: Option<&str>) -> Self {
        Self {
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            link_precedence: LinkPrecedence::Primary,
            linked_id: None,
        }
    }

    /// A secondary contact attached to an existing primary.
    pub fn secondary(email: Option<&str>, phone: Option<&str>, primary_id: i64) -> Self {
        Self {
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            link_precedence: LinkPrecedence::Secondary,
            linked_id: Some(primary_id),
        }
    }
}

//! Request and response types for the identify operation.

use serde::{Deserialize, Serialize};

/// An incoming contact observation: an email and/or a phone number.
///
/// Values are matched verbatim against stored contacts; no normalization or
/// format validation happens here. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentifyRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default, rename = "phoneNumber", alias = "phone")]
    phone: Option<String>,
}

impl IdentifyRequest {
    pub fn new(email: Option<&str>, phone: Option<&str>) -> Self {
        Self {
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
        }
    }

    /// The email to match on, if one was supplied.
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|value| !value.is_empty())
    }

    /// The phone number to match on, if one was supplied.
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().filter(|value| !value.is_empty())
    }
}

/// The unified view of one resolved identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyResponse {
    /// Id of the chain's primary contact.
    pub primary_contact_id: i64,
    /// Distinct emails across the chain; the primary's email leads.
    pub emails: Vec<String>,
    /// Distinct phone numbers across the chain; the primary's number leads.
    pub phone_numbers: Vec<String>,
    /// Ids of all secondary contacts, creation order ascending.
    pub secondary_contact_ids: Vec<i64>,
}

//! Chain representation, the pure merge computation, and response ordering.

use contact_store::{Contact, LinkPrecedence};

use crate::types::IdentifyResponse;

/// One resolved identity: a primary contact plus all secondaries linked to it.
#[derive(Debug, Clone)]
pub struct Chain {
    /// The canonical contact for this identity.
    pub primary: Contact,
    /// Secondaries linked to `primary`, creation order ascending.
    pub secondaries: Vec<Contact>,
}

impl Chain {
    /// Whether any member of the chain carries the given email.
    pub fn contains_email(&self, email: &str) -> bool {
        self.members().any(|c| c.email.as_deref() == Some(email))
    }

    /// Whether any member of the chain carries the given phone number.
    pub fn contains_phone(&self, phone: &str) -> bool {
        self.members().any(|c| c.phone.as_deref() == Some(phone))
    }

    /// Chain members: the primary first, then secondaries in creation order.
    pub fn members(&self) -> impl Iterator<Item = &Contact> {
        std::iter::once(&self.primary).chain(self.secondaries.iter())
    }

    /// Assemble the unified identity view for this chain.
    ///
    /// The primary's own email and phone lead their lists; the remaining
    /// distinct values follow in the creation order of the rows carrying
    /// them. Nulls are skipped, duplicates collapse to their first
    /// appearance.
    pub fn to_response(&self) -> IdentifyResponse {
        let mut emails = Vec::new();
        let mut phone_numbers = Vec::new();
        for member in self.members() {
            push_unique(&mut emails, member.email.as_deref());
            push_unique(&mut phone_numbers, member.phone.as_deref());
        }

        IdentifyResponse {
            primary_contact_id: self.primary.id,
            emails,
            phone_numbers,
            secondary_contact_ids: self.secondaries.iter().map(|c| c.id).collect(),
        }
    }
}

/// Chronological precedence: creation time first, lower id breaks ties.
fn created_key(contact: &Contact) -> (&str, i64) {
    (contact.created_at.as_str(), contact.id)
}

/// Compute the merge of two chains discovered to belong to one person.
///
/// The chain whose primary was created earlier survives. Returns the
/// surviving primary together with every row that must be rewritten: the
/// losing primary demoted to secondary, plus its former secondaries
/// re-pointed at the surviving primary. The caller applies the rows in a
/// single atomic batch.
pub fn merge_chains(a: &Chain, b: &Chain) -> (Contact, Vec<Contact>) {
    let (kept, absorbed) = if created_key(&a.primary) <= created_key(&b.primary) {
        (a, b)
    } else {
        (b, a)
    };

    let mut updates = Vec::with_capacity(absorbed.secondaries.len() + 1);

    let mut demoted = absorbed.primary.clone();
    demoted.link_precedence = LinkPrecedence::Secondary;
    demoted.linked_id = Some(kept.primary.id);
    updates.push(demoted);

    for secondary in &absorbed.secondaries {
        let mut relinked = secondary.clone();
        relinked.linked_id = Some(kept.primary.id);
        updates.push(relinked);
    }

    (kept.primary.clone(), updates)
}

fn push_unique(values: &mut Vec<String>, value: Option<&str>) {
    let Some(value) = value else { return };
    if !values.iter().any(|existing| existing == value) {
        values.push(value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn primary(id: i64, email: Option<&str>, phone: Option<&str>, created_at: &str) -> Contact {
        Contact {
            id,
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
            link_precedence: LinkPrecedence::Primary,
            linked_id: None,
            created_at: created_at.to_string(),
            updated_at: created_at.to_string(),
            deleted_at: None,
        }
    }

    fn secondary(
        id: i64,
        email: Option<&str>,
        phone: Option<&str>,
        created_at: &str,
        primary_id: i64,
    ) -> Contact {
        Contact {
            link_precedence: LinkPrecedence::Secondary,
            linked_id: Some(primary_id),
            ..primary(id, email, phone, created_at)
        }
    }

    fn chain(primary: Contact, secondaries: Vec<Contact>) -> Chain {
        Chain { primary, secondaries }
    }

    #[test]
    fn test_merge_keeps_earlier_primary() {
        let a = chain(primary(1, Some("a@x.com"), None, "2024-01-01 10:00:00"), vec![]);
        let b = chain(primary(2, None, Some("111"), "2024-01-02 10:00:00"), vec![]);

        let (surviving, updates) = merge_chains(&a, &b);
        assert_eq!(surviving.id, 1);
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].id, 2);
        assert_eq!(updates[0].link_precedence, LinkPrecedence::Secondary);
        assert_eq!(updates[0].linked_id, Some(1));
    }

    #[test]
    fn test_merge_breaks_timestamp_ties_by_lower_id() {
        let a = chain(primary(7, Some("a@x.com"), None, "2024-01-01 10:00:00"), vec![]);
        let b = chain(primary(3, None, Some("111"), "2024-01-01 10:00:00"), vec![]);

        let (surviving, updates) = merge_chains(&a, &b);
        assert_eq!(surviving.id, 3);
        assert_eq!(updates[0].id, 7);
    }

    #[test]
    fn test_merge_relinks_absorbed_secondaries() {
        let a = chain(primary(1, Some("a@x.com"), None, "2024-01-01 10:00:00"), vec![]);
        let b = chain(
            primary(2, None, Some("111"), "2024-01-02 10:00:00"),
            vec![
                secondary(3, Some("b@x.com"), Some("111"), "2024-01-03 10:00:00", 2),
                secondary(4, None, Some("222"), "2024-01-04 10:00:00", 2),
            ],
        );

        let (surviving, updates) = merge_chains(&a, &b);
        assert_eq!(surviving.id, 1);
        assert_eq!(updates.len(), 3);
        assert!(updates.iter().all(|c| c.linked_id == Some(1)));
        assert!(updates.iter().all(|c| c.link_precedence == LinkPrecedence::Secondary));
        // the absorbed primary keeps its id and creation time
        assert_eq!(updates[0].id, 2);
        assert_eq!(updates[0].created_at, "2024-01-02 10:00:00");
    }

    #[test]
    fn test_merge_outcome_is_commutative() {
        let a = chain(
            primary(1, Some("a@x.com"), None, "2024-01-01 10:00:00"),
            vec![secondary(3, Some("c@x.com"), None, "2024-01-03 10:00:00", 1)],
        );
        let b = chain(
            primary(2, None, Some("111"), "2024-01-02 10:00:00"),
            vec![secondary(4, None, Some("222"), "2024-01-04 10:00:00", 2)],
        );

        let (surviving_ab, mut updates_ab) = merge_chains(&a, &b);
        let (surviving_ba, mut updates_ba) = merge_chains(&b, &a);
        assert_eq!(surviving_ab, surviving_ba);
        updates_ab.sort_by_key(|c| c.id);
        updates_ba.sort_by_key(|c| c.id);
        assert_eq!(updates_ab, updates_ba);
    }

    #[test]
    fn test_response_leads_with_primary_values() {
        let chain = chain(
            primary(1, Some("a@x.com"), Some("111"), "2024-01-01 10:00:00"),
            vec![
                secondary(2, Some("b@x.com"), Some("111"), "2024-01-02 10:00:00", 1),
                secondary(3, Some("a@x.com"), Some("222"), "2024-01-03 10:00:00", 1),
            ],
        );

        let response = chain.to_response();
        assert_eq!(response.primary_contact_id, 1);
        assert_eq!(response.emails, vec!["a@x.com", "b@x.com"]);
        assert_eq!(response.phone_numbers, vec!["111", "222"]);
        assert_eq!(response.secondary_contact_ids, vec![2, 3]);
    }

    #[test]
    fn test_response_skips_missing_values() {
        let chain = chain(
            primary(1, None, Some("111"), "2024-01-01 10:00:00"),
            vec![secondary(2, Some("b@x.com"), None, "2024-01-02 10:00:00", 1)],
        );

        let response = chain.to_response();
        assert_eq!(response.emails, vec!["b@x.com"]);
        assert_eq!(response.phone_numbers, vec!["111"]);
    }
}

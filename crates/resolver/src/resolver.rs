//! The identify operation: lookup, classification, merge, response assembly.

use contact_store::{contact, Contact, ContactStore, NewContact, StoreError};
use tokio::sync::Mutex;

use crate::chain::{merge_chains, Chain};
use crate::error::ResolverError;
use crate::types::{IdentifyRequest, IdentifyResponse};

/// Resolves contact observations into identity chains.
pub struct Resolver {
    store: ContactStore,
    /// Serializes lookup -> classify -> write. Two concurrent observations
    /// for the same person must not interleave into two chains, or into a
    /// half-applied merge.
    write_lock: Mutex<()>,
}

impl Resolver {
    pub fn new(store: ContactStore) -> Self {
        Self {
            store,
            write_lock: Mutex::new(()),
        }
    }

    /// The underlying contact store.
    pub fn store(&self) -> &ContactStore {
        &self.store
    }

    /// Resolve an observation to an identity, mutating the chain graph as
    /// needed.
    ///
    /// Exactly one of five things happens: a fresh primary is created, a
    /// secondary is attached, two chains merge under the older primary, or
    /// (for already-known combinations and no-new-information lookups)
    /// nothing is written at all. The response always reflects the stored
    /// chain as re-fetched after any writes.
    pub async fn identify(
        &self,
        request: IdentifyRequest,
    ) -> Result<IdentifyResponse, ResolverError> {
        let email = request.email();
        let phone = request.phone();
        if email.is_none() && phone.is_none() {
            return Err(ResolverError::InvalidInput);
        }

        let _guard = self.write_lock.lock().await;
        let pool = self.store.pool();

        let by_email = match email {
            Some(value) => contact::find_by_email(pool, value).await?,
            None => Vec::new(),
        };
        let by_phone = match phone {
            Some(value) => contact::find_by_phone(pool, value).await?,
            None => Vec::new(),
        };

        let primary = self.classify(email, phone, &by_email, &by_phone).await?;

        let chain = self.load_chain(primary).await?;
        Ok(chain.to_response())
    }

    /// Decide which of the five situations the observation lands in and
    /// perform its writes. Returns the resolved primary.
    async fn classify(
        &self,
        email: Option<&str>,
        phone: Option<&str>,
        by_email: &[Contact],
        by_phone: &[Contact],
    ) -> Result<Contact, ResolverError> {
        match (by_email.is_empty(), by_phone.is_empty()) {
            // Nothing matches: a new identity.
            (true, true) => {
                let new = NewContact::primary(email, phone);
                let created = contact::create_contact(self.store.pool(), &new).await?;
                tracing::info!(id = created.id, "created new primary contact");
                Ok(created)
            }
            // Both fields known: either one chain (nothing to do) or two
            // chains that this observation proves are the same person.
            (false, false) => {
                let primary_by_email = self.resolve_primary(by_email).await?;
                let primary_by_phone = self.resolve_primary(by_phone).await?;
                if primary_by_email.id == primary_by_phone.id {
                    Ok(primary_by_email)
                } else {
                    self.merge(primary_by_email, primary_by_phone).await
                }
            }
            // One field matches: extend the chain if the other field brings
            // a value it has not seen, otherwise read-only.
            _ => {
                let matched = if by_email.is_empty() { by_phone } else { by_email };
                let primary = self.resolve_primary(matched).await?;
                let chain = self.load_chain(primary).await?;

                let new_email = email.is_some_and(|value| !chain.contains_email(value));
                let new_phone = phone.is_some_and(|value| !chain.contains_phone(value));
                if new_email || new_phone {
                    let new = NewContact::secondary(email, phone, chain.primary.id);
                    let created = contact::create_contact(self.store.pool(), &new).await?;
                    tracing::info!(
                        id = created.id,
                        primary = chain.primary.id,
                        "created secondary contact"
                    );
                }

                Ok(chain.primary)
            }
        }
    }

    /// Resolve the primary of a non-empty lookup result set.
    ///
    /// A primary in the set wins directly. Otherwise every match is a
    /// secondary and all must agree on one `linked_id`, which is then
    /// dereferenced; anything else means the stored chains are corrupt.
    async fn resolve_primary(&self, matches: &[Contact]) -> Result<Contact, ResolverError> {
        if let Some(primary) = matches.iter().find(|c| c.is_primary()) {
            return Ok(primary.clone());
        }

        let mut primary_id = None;
        for contact in matches {
            match (contact.linked_id, primary_id) {
                (None, _) => {
                    return Err(integrity_error(format!(
                        "secondary contact {} has no linked primary",
                        contact.id
                    )));
                }
                (Some(id), None) => primary_id = Some(id),
                (Some(id), Some(seen)) if id != seen => {
                    return Err(integrity_error(format!(
                        "matched secondaries disagree on their primary: {seen} vs {id}"
                    )));
                }
                _ => {}
            }
        }
        let Some(primary_id) = primary_id else {
            return Err(ResolverError::NotFound);
        };

        let primary = match contact::get_contact(self.store.pool(), primary_id).await {
            Ok(primary) => primary,
            Err(StoreError::NotFound { .. }) => {
                return Err(integrity_error(format!(
                    "linked primary {primary_id} is missing or deleted"
                )));
            }
            Err(err) => return Err(err.into()),
        };
        if !primary.is_primary() {
            return Err(integrity_error(format!(
                "contact {} is linked as a primary but is itself secondary",
                primary.id
            )));
        }

        Ok(primary)
    }

    /// Merge the chains of two distinct primaries linked by one observation.
    ///
    /// The re-link is computed as one row set and written as one atomic
    /// batch; a failure leaves both chains untouched.
    async fn merge(&self, a: Contact, b: Contact) -> Result<Contact, ResolverError> {
        let chain_a = self.load_chain(a).await?;
        let chain_b = self.load_chain(b).await?;

        let (surviving, updates) = merge_chains(&chain_a, &chain_b);
        let absorbed = if surviving.id == chain_a.primary.id {
            chain_b.primary.id
        } else {
            chain_a.primary.id
        };
        tracing::info!(
            surviving = surviving.id,
            absorbed,
            rows = updates.len(),
            "merging contact chains"
        );
        contact::save_batch(self.store.pool(), &updates).await?;

        Ok(surviving)
    }

    async fn load_chain(&self, primary: Contact) -> Result<Chain, ResolverError> {
        let secondaries = contact::find_by_primary_id(self.store.pool(), primary.id).await?;
        Ok(Chain { primary, secondaries })
    }
}

fn integrity_error(message: String) -> ResolverError {
    tracing::error!("chain invariant violated: {message}");
    ResolverError::DataIntegrity(message)
}

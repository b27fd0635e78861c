//! Identity lookup against the relational member store
//!
//! The store maps upstream platform identities to chat identities and holds
//! the verification flag plus affiliation label used by `verify`. The lookup
//! fails closed: a broken store must never grant access or resolve a false
//! identity, so every storage error is treated exactly like a miss.

pub mod store;

pub use store::PgIdentityLookup;

use crate::types::{Eligibility, UserId};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Read-only lookups against the member store
///
/// The signatures encode the fail-closed contract: there is no error channel,
/// a failed query is a `None` / not-eligible result (logged by the
/// implementation).
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Resolve an upstream platform identity to a chat user
    async fn resolve_chat_user(&self, platform_id: &str) -> Option<UserId>;

    /// Check whether a chat user is verified, and fetch their affiliation
    async fn check_eligibility(&self, user: UserId) -> Eligibility;
}

/// In-memory implementation of `IdentityLookup` for tests and offline use
#[derive(Default)]
pub struct StaticIdentityLookup {
    by_platform: Mutex<HashMap<String, UserId>>,
    eligibility: Mutex<HashMap<UserId, Eligibility>>,
}

impl StaticIdentityLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a platform identity to chat user mapping
    pub fn insert_identity(&self, platform_id: &str, user: UserId) {
        self.by_platform
            .lock()
            .unwrap()
            .insert(platform_id.to_string(), user);
    }

    /// Register an eligibility record for a chat user
    pub fn insert_eligibility(&self, user: UserId, eligible: bool, affiliation: Option<&str>) {
        self.eligibility.lock().unwrap().insert(
            user,
            Eligibility {
                eligible,
                affiliation: affiliation.map(str::to_string),
            },
        );
    }
}

#[async_trait]
impl IdentityLookup for StaticIdentityLookup {
    async fn resolve_chat_user(&self, platform_id: &str) -> Option<UserId> {
        self.by_platform.lock().unwrap().get(platform_id).copied()
    }

    async fn check_eligibility(&self, user: UserId) -> Eligibility {
        self.eligibility
            .lock()
            .unwrap()
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_lookup_resolves_known_identities() {
        let lookup = StaticIdentityLookup::new();
        lookup.insert_identity("p1", UserId(100));

        assert_eq!(lookup.resolve_chat_user("p1").await, Some(UserId(100)));
        assert_eq!(lookup.resolve_chat_user("p2").await, None);
    }

    #[tokio::test]
    async fn unknown_users_are_not_eligible() {
        let lookup = StaticIdentityLookup::new();
        lookup.insert_eligibility(UserId(100), true, Some("Georgia Tech"));

        let known = lookup.check_eligibility(UserId(100)).await;
        assert!(known.eligible);
        assert_eq!(known.affiliation.as_deref(), Some("Georgia Tech"));

        let unknown = lookup.check_eligibility(UserId(200)).await;
        assert!(!unknown.eligible);
        assert!(unknown.affiliation.is_none());
    }
}

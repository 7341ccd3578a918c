//! Short-lived storage for verified checkout data.
//!
//! Order creation must consume exactly what verification returned, so the
//! confirmed lines are parked here between the two calls, keyed by user.
//! Entries expire after a TTL; an expired or missing entry forces the client
//! back through verification.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::services::catalog::AvailableCheckoutItem;

#[derive(Debug, Clone)]
struct StoredSession {
    items: Vec<AvailableCheckoutItem>,
    stored_at: DateTime<Utc>,
}

pub struct CheckoutSessionStore {
    sessions: DashMap<Uuid, StoredSession>,
    ttl: Duration,
}

impl CheckoutSessionStore {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl: Duration::minutes(ttl_minutes),
        }
    }

    /// Stores the verified lines for a user, replacing any previous session.
    pub fn put(&self, user_id: Uuid, items: Vec<AvailableCheckoutItem>) {
        self.sessions.insert(
            user_id,
            StoredSession {
                items,
                stored_at: Utc::now(),
            },
        );
    }

    /// Returns the user's stored lines if the session is still fresh.
    pub fn get(&self, user_id: Uuid) -> Option<Vec<AvailableCheckoutItem>> {
        let expired = match self.sessions.get(&user_id) {
            Some(entry) => Utc::now() - entry.stored_at > self.ttl,
            None => return None,
        };
        if expired {
            self.sessions.remove(&user_id);
            return None;
        }
        self.sessions.get(&user_id).map(|entry| entry.items.clone())
    }

    /// Removes and returns the user's stored lines if still fresh. The
    /// removal is atomic, so two concurrent order submissions cannot both
    /// spend the same session.
    pub fn take(&self, user_id: Uuid) -> Option<Vec<AvailableCheckoutItem>> {
        let (_, session) = self.sessions.remove(&user_id)?;
        if Utc::now() - session.stored_at > self.ttl {
            return None;
        }
        Some(session.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<AvailableCheckoutItem> {
        vec![AvailableCheckoutItem {
            id: Uuid::new_v4(),
            quantity: 2,
            preorder_id: None,
            price: 1500,
            title: "Test pressing".to_string(),
            credit_parts: None,
        }]
    }

    #[test]
    fn put_then_get_round_trips() {
        let store = CheckoutSessionStore::new(30);
        let user = Uuid::new_v4();

        store.put(user, items());

        let stored = store.get(user).unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].quantity, 2);
    }

    #[test]
    fn take_consumes_the_session() {
        let store = CheckoutSessionStore::new(30);
        let user = Uuid::new_v4();

        store.put(user, items());

        assert!(store.take(user).is_some());
        assert!(store.take(user).is_none());
        assert!(store.get(user).is_none());
    }

    #[test]
    fn take_drops_expired_sessions() {
        let store = CheckoutSessionStore::new(0);
        let user = Uuid::new_v4();

        store.put(user, items());

        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(store.take(user).is_none());
    }

    #[test]
    fn expired_sessions_are_dropped() {
        let store = CheckoutSessionStore::new(0);
        let user = Uuid::new_v4();

        store.put(user, items());

        // Zero TTL: anything older than "now" is stale.
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(store.get(user).is_none());
    }

    #[test]
    fn sessions_are_per_user() {
        let store = CheckoutSessionStore::new(30);
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        store.put(alice, items());

        assert!(store.get(alice).is_some());
        assert!(store.get(bob).is_none());
    }
}

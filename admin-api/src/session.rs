//! Sessions signed in and out through this service.
//!
//! Access tokens are verified locally, so a token stays cryptographically valid
//! until it expires even after its session signed out. The registry remembers
//! revoked session keys until their tokens expire and broadcasts every change
//! to subscribers (context store, navigation streams).

use chrono::Utc;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuthEvent {
    SignedIn { session_key: String, user_id: Uuid },
    TokenRefreshed { session_key: String },
    SignedOut { session_key: String },
}

impl AuthEvent {
    pub fn session_key(&self) -> &str {
        match self {
            AuthEvent::SignedIn { session_key, .. }
            | AuthEvent::TokenRefreshed { session_key }
            | AuthEvent::SignedOut { session_key } => session_key,
        }
    }
}

#[derive(Clone)]
pub struct SessionRegistry {
    /// session key -> token expiry (unix seconds)
    revoked: Arc<DashMap<String, i64>>,
    events: broadcast::Sender<AuthEvent>,
}

impl SessionRegistry {
    pub fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            revoked: Arc::new(DashMap::new()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    pub fn signed_in(&self, session_key: &str, user_id: Uuid) {
        self.revoked.remove(session_key);
        self.publish(AuthEvent::SignedIn {
            session_key: session_key.to_string(),
            user_id,
        });
    }

    pub fn refreshed(&self, session_key: &str) {
        self.publish(AuthEvent::TokenRefreshed {
            session_key: session_key.to_string(),
        });
    }

    pub fn sign_out(&self, session_key: &str, expires_at: i64) {
        self.revoked.insert(session_key.to_string(), expires_at);
        self.publish(AuthEvent::SignedOut {
            session_key: session_key.to_string(),
        });
    }

    pub fn is_revoked(&self, session_key: &str) -> bool {
        self.revoked.contains_key(session_key)
    }

    /// Forget revocations whose tokens have expired anyway.
    pub fn prune_expired(&self) -> usize {
        let now = Utc::now().timestamp();
        let before = self.revoked.len();
        self.revoked.retain(|_, expires_at| *expires_at > now);
        before - self.revoked.len()
    }

    fn publish(&self, event: AuthEvent) {
        // No receivers is fine: nobody is listening yet.
        let _ = self.events.send(event);
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sign_out_revokes_and_broadcasts() {
        let registry = SessionRegistry::default();
        let mut events = registry.subscribe();

        registry.sign_out("s1", Utc::now().timestamp() + 60);

        assert!(registry.is_revoked("s1"));
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::SignedOut {
                session_key: "s1".to_string()
            }
        );
    }

    #[test]
    fn test_prune_drops_only_expired_revocations() {
        let registry = SessionRegistry::default();
        let now = Utc::now().timestamp();
        registry.sign_out("old", now - 10);
        registry.sign_out("live", now + 600);

        assert_eq!(registry.prune_expired(), 1);
        assert!(!registry.is_revoked("old"));
        assert!(registry.is_revoked("live"));
    }
}

//! Per-session application state: selected property, backoffice mode and the
//! notification feed. Everything here lives only as long as the session.

mod backoffice;
mod notifications;
mod property;

pub use backoffice::BackofficeMode;
pub use notifications::{FeedItem, NotificationFeed};
pub use property::{PropertyContext, SelectedProperty};

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::middleware::CurrentSession;
use crate::pages::PageRegistry;
use crate::session::{AuthEvent, SessionRegistry};

#[derive(Debug)]
pub struct SessionContext {
    pub property: PropertyContext,
    pub backoffice: BackofficeMode,
    pub notifications: NotificationFeed,
    /// Latest token expiry seen for the session
    expires_at: i64,
}

impl SessionContext {
    fn new(feed_capacity: usize, expires_at: i64) -> Self {
        Self {
            property: PropertyContext::default(),
            backoffice: BackofficeMode::default(),
            notifications: NotificationFeed::new(feed_capacity),
            expires_at,
        }
    }

    /// Switch property; the feed belongs to the previous one and starts over.
    pub fn select_property(&mut self, property: SelectedProperty) {
        if self.property.current().map(|p| p.id) != Some(property.id) {
            self.notifications.reset();
        }
        self.property.select(property);
    }

    pub fn clear_property(&mut self) -> Option<SelectedProperty> {
        self.notifications.reset();
        self.property.clear()
    }

    pub fn is_expired(&self, now: i64) -> bool {
        self.expires_at <= now
    }
}

#[derive(Clone)]
pub struct ContextStore {
    sessions: Arc<DashMap<String, SessionContext>>,
    feed_capacity: usize,
}

impl ContextStore {
    pub fn new(feed_capacity: usize) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            feed_capacity,
        }
    }

    /// Mutate the session's context, creating it on first use.
    pub fn update<R>(&self, session: &CurrentSession, f: impl FnOnce(&mut SessionContext) -> R) -> R {
        let mut entry = self
            .sessions
            .entry(session.session_key.clone())
            .or_insert_with(|| SessionContext::new(self.feed_capacity, session.expires_at));
        let ctx = entry.value_mut();
        ctx.expires_at = ctx.expires_at.max(session.expires_at);
        f(ctx)
    }

    /// Mutate a context only if the session still has one.
    pub fn update_existing<R>(
        &self,
        session_key: &str,
        f: impl FnOnce(&mut SessionContext) -> R,
    ) -> Option<R> {
        self.sessions
            .get_mut(session_key)
            .map(|mut ctx| f(ctx.value_mut()))
    }

    pub fn read<R>(&self, session_key: &str, f: impl FnOnce(&SessionContext) -> R) -> Option<R> {
        self.sessions.get(session_key).map(|ctx| f(ctx.value()))
    }

    pub fn selected_property(&self, session_key: &str) -> Option<SelectedProperty> {
        self.read(session_key, |ctx| ctx.property.current().cloned())
            .flatten()
    }

    pub fn backoffice_enabled(&self, session_key: &str) -> bool {
        self.read(session_key, |ctx| ctx.backoffice.is_enabled())
            .unwrap_or(false)
    }

    pub fn contains(&self, session_key: &str) -> bool {
        self.sessions.contains_key(session_key)
    }

    pub fn drop_session(&self, session_key: &str) -> bool {
        self.sessions.remove(session_key).is_some()
    }

    /// Remove contexts whose token has expired; returns their session keys.
    pub fn evict_expired(&self, now: i64) -> Vec<String> {
        let expired: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().is_expired(now))
            .map(|entry| entry.key().clone())
            .collect();
        for key in &expired {
            self.sessions.remove_if(key, |_, ctx| ctx.is_expired(now));
        }
        expired
    }

    /// Sessions with a selected property, for the notification poller.
    pub fn selections(&self) -> Vec<(String, Uuid)> {
        self.sessions
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .property
                    .current()
                    .map(|p| (entry.key().clone(), p.id))
            })
            .collect()
    }

    /// Drop contexts and page state of every session that signs out.
    pub fn watch_sessions(&self, sessions: &SessionRegistry, pages: PageRegistry) -> JoinHandle<()> {
        let mut events = sessions.subscribe();
        let contexts = self.clone();

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(AuthEvent::SignedOut { session_key }) => {
                        contexts.drop_session(&session_key);
                        pages.drop_session(&session_key);
                        tracing::debug!(session = %session_key, "Dropped session context");
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Session listener lagged behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NotificationKind;
    use chrono::Utc;
    use std::time::Duration;

    fn selected() -> SelectedProperty {
        SelectedProperty {
            id: Uuid::new_v4(),
            name: "Kost Melati".into(),
        }
    }

    fn session(key: &str, expires_in: i64) -> CurrentSession {
        CurrentSession {
            user_id: Uuid::new_v4(),
            email: None,
            session_key: key.to_string(),
            access_token: String::new(),
            expires_at: Utc::now().timestamp() + expires_in,
        }
    }

    fn feed_item() -> FeedItem {
        FeedItem {
            id: Uuid::new_v4(),
            title: "Pembayaran".into(),
            message: "Kamar A1 jatuh tempo".into(),
            kind: NotificationKind::Payment,
            is_read: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_update_creates_context_lazily() {
        let store = ContextStore::new(10);
        assert!(store.selected_property("s1").is_none());
        assert!(!store.contains("s1"));

        let property = selected();
        store.update(&session("s1", 60), |ctx| ctx.select_property(property.clone()));

        assert_eq!(store.selected_property("s1"), Some(property.clone()));
        assert_eq!(store.selections(), vec![("s1".to_string(), property.id)]);
    }

    #[test]
    fn test_update_existing_never_creates() {
        let store = ContextStore::new(10);
        assert_eq!(store.update_existing("s1", |ctx| ctx.backoffice.toggle()), None);
        assert!(!store.contains("s1"));
    }

    #[test]
    fn test_switching_property_resets_feed() {
        let store = ContextStore::new(10);
        let s1 = session("s1", 60);
        let first = selected();
        store.update(&s1, |ctx| {
            ctx.select_property(first.clone());
            ctx.notifications.add(feed_item());
        });

        store.update(&s1, |ctx| ctx.select_property(first.clone()));
        assert_eq!(store.read("s1", |ctx| ctx.notifications.len()), Some(1));

        store.update(&s1, |ctx| ctx.select_property(selected()));
        assert_eq!(store.read("s1", |ctx| ctx.notifications.len()), Some(0));

        store.update(&s1, |ctx| ctx.notifications.add(feed_item()));
        store.update(&s1, |ctx| ctx.clear_property());
        assert_eq!(store.read("s1", |ctx| ctx.notifications.unread_count()), Some(0));
    }

    #[test]
    fn test_expired_contexts_are_evicted() {
        let store = ContextStore::new(10);
        store.update(&session("stale", -1), |ctx| ctx.select_property(selected()));
        store.update(&session("live", 600), |ctx| ctx.select_property(selected()));

        let evicted = store.evict_expired(Utc::now().timestamp());

        assert_eq!(evicted, vec!["stale".to_string()]);
        assert!(!store.contains("stale"));
        assert_eq!(store.selections().len(), 1);
    }

    #[test]
    fn test_refreshed_token_extends_context() {
        let store = ContextStore::new(10);
        store.update(&session("s1", -1), |ctx| ctx.backoffice.toggle());
        store.update(&session("s1", 600), |_| ());

        assert!(store.evict_expired(Utc::now().timestamp()).is_empty());
        assert!(store.backoffice_enabled("s1"));
    }

    #[tokio::test]
    async fn test_sign_out_drops_context() {
        let store = ContextStore::new(10);
        let sessions = SessionRegistry::default();
        let pages = PageRegistry::default();
        let _listener = store.watch_sessions(&sessions, pages);

        store.update(&session("s1", 60), |ctx| ctx.backoffice.toggle());
        store.update(&session("s2", 60), |ctx| ctx.backoffice.toggle());
        sessions.sign_out("s1", chrono::Utc::now().timestamp() + 60);

        tokio::time::timeout(Duration::from_secs(1), async {
            while store.contains("s1") {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
        assert!(store.backoffice_enabled("s2"));
    }
}

// Notification service - keeps each session's feed in step with the notifications table
use std::sync::Arc;
use std::time::Duration;
use supabase_client::{Filter, Query, Table};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use crate::context::{ContextStore, FeedItem};
use crate::error::Result;
use crate::models::Notification;
use crate::AppState;

#[derive(Clone)]
pub struct NotificationService {
    notifications: Table<Notification>,
    contexts: ContextStore,
    capacity: usize,
}

impl NotificationService {
    pub fn new(state: &AppState) -> Self {
        Self {
            notifications: Table::new(state.tables.clone(), "notifications"),
            contexts: state.contexts.clone(),
            capacity: state.config.notifications.feed_capacity,
        }
    }

    /// Latest rows for the property plus backoffice broadcasts, newest first.
    pub async fn latest(&self, property_id: Uuid) -> Result<Vec<Notification>> {
        let recent = |filter: Filter| {
            Query::new()
                .filter(filter)
                .order("created_at", false)
                .limit(self.capacity)
        };

        let own = recent(Filter::new().eq("property_id", property_id));
        let broadcast = recent(Filter::new().is_null("property_id"));
        let (own, broadcast) = tokio::try_join!(
            self.notifications.list(&own),
            self.notifications.list(&broadcast),
        )?;

        let mut rows: Vec<Notification> = own.into_iter().chain(broadcast).collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(self.capacity);
        Ok(rows)
    }

    /// Pull new rows into one session's feed; returns how many were added.
    /// Nothing is added when the session signed out or switched property
    /// while the rows were loading.
    pub async fn refresh(&self, session_key: &str, property_id: Uuid) -> Result<usize> {
        let rows = self.latest(property_id).await?;
        let items: Vec<FeedItem> = rows.into_iter().map(FeedItem::from).collect();

        let added = self.contexts.update_existing(session_key, |ctx| {
            match ctx.property.current() {
                Some(selected) if selected.id == property_id => ctx.notifications.sync(items),
                _ => 0,
            }
        });
        Ok(added.unwrap_or(0))
    }

    pub async fn refresh_all(&self) -> usize {
        let mut added = 0;
        for (session_key, property_id) in self.contexts.selections() {
            match self.refresh(&session_key, property_id).await {
                Ok(n) => added += n,
                Err(e) => tracing::warn!(
                    session = %session_key,
                    error = %e,
                    "Failed to refresh notification feed"
                ),
            }
        }
        added
    }

    /// Background poller refreshing every selected property's feed.
    pub fn spawn_poller(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                let added = self.refresh_all().await;
                if added > 0 {
                    tracing::debug!(added, "Notification feeds refreshed");
                }
            }
        })
    }
}

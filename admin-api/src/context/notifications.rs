use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use uuid::Uuid;

use crate::models::{Notification, NotificationKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedItem {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<Notification> for FeedItem {
    fn from(n: Notification) -> Self {
        Self {
            id: n.id,
            title: n.title,
            message: n.message,
            kind: n.kind,
            is_read: n.is_read,
            created_at: n.created_at,
        }
    }
}

/// Bounded, newest-first notification list for one session.
#[derive(Debug)]
pub struct NotificationFeed {
    items: VecDeque<FeedItem>,
    /// Ids the user dismissed; the poller must not bring them back.
    dismissed: HashSet<Uuid>,
    capacity: usize,
}

impl NotificationFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::new(),
            dismissed: HashSet::new(),
            capacity: capacity.max(1),
        }
    }

    /// Returns false when the item is already in the feed or was dismissed.
    pub fn add(&mut self, item: FeedItem) -> bool {
        if self.dismissed.contains(&item.id) || self.items.iter().any(|i| i.id == item.id) {
            return false;
        }

        let position = self
            .items
            .iter()
            .position(|i| i.created_at < item.created_at)
            .unwrap_or(self.items.len());
        self.items.insert(position, item);
        self.items.truncate(self.capacity);
        true
    }

    /// Merge the latest window of rows. Dismissals of ids that left the
    /// window can no longer come back, so they are forgotten.
    pub fn sync(&mut self, latest: Vec<FeedItem>) -> usize {
        let ids: HashSet<Uuid> = latest.iter().map(|i| i.id).collect();
        self.dismissed.retain(|id| ids.contains(id));
        let mut added = 0;
        for item in latest {
            if self.add(item) {
                added += 1;
            }
        }
        added
    }

    pub fn reset(&mut self) {
        self.items.clear();
        self.dismissed.clear();
    }

    pub fn dismiss(&mut self, id: Uuid) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        self.dismissed.insert(id);
        self.items.len() != before
    }

    pub fn dismiss_all(&mut self) -> usize {
        let count = self.items.len();
        self.dismissed.extend(self.items.drain(..).map(|i| i.id));
        count
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|i| !i.is_read).count()
    }

    pub fn items(&self) -> Vec<FeedItem> {
        self.items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

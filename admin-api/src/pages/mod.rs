//! Page state: one loading flag and error banner per page per session.
//!
//! Loads may overlap freely. A mutation only starts when nothing else is in
//! flight on that page, mirroring controls that are disabled while loading.

pub mod users;

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::CurrentSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageId {
    Dashboard,
    Tenants,
    Rooms,
    Payments,
    Maintenance,
    Reports,
    Notifications,
    Settings,
    Properties,
    BackofficeDashboard,
    BackofficeUsers,
    BackofficeProperties,
    BackofficeSubscriptions,
    BackofficeSubscriptionPlans,
    BackofficeNotifications,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageStatus {
    pub loading: bool,
    pub controls_enabled: bool,
    pub error: Option<String>,
}

/// Rows of a list page together with the page's state.
#[derive(Debug, Serialize)]
pub struct PageView<T> {
    pub rows: Vec<T>,
    pub page: PageStatus,
}

#[derive(Debug, Default)]
struct Inner {
    in_flight: usize,
    banner: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PageState {
    inner: Arc<Mutex<Inner>>,
}

/// Marks one outstanding call; released on drop.
#[must_use]
pub struct InFlight {
    inner: Arc<Mutex<Inner>>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut inner = self.inner.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
    }
}

impl PageState {
    fn track(&self, mut inner: MutexGuard<'_, Inner>) -> InFlight {
        inner.in_flight += 1;
        inner.banner = None;
        InFlight {
            inner: self.inner.clone(),
        }
    }

    pub fn begin_load(&self) -> InFlight {
        self.track(self.inner.lock())
    }

    pub fn begin_mutation(&self) -> Result<InFlight> {
        let inner = self.inner.lock();
        if inner.in_flight > 0 {
            return Err(AppError::Busy);
        }
        Ok(self.track(inner))
    }

    /// Run a read; backend failures become the page banner.
    pub async fn load<T, F>(&self, banner: &str, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _in_flight = self.begin_load();
        self.settle(banner, op.await)
    }

    /// Run a write. Refused with [`AppError::Busy`] before `op` is polled when
    /// anything else is outstanding.
    pub async fn mutate<T, F>(&self, banner: &str, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let _in_flight = self.begin_mutation()?;
        self.settle(banner, op.await)
    }

    fn settle<T>(&self, banner: &str, result: Result<T>) -> Result<T> {
        match result {
            Err(AppError::Backend(source)) => {
                self.inner.lock().banner = Some(banner.to_string());
                Err(AppError::Page {
                    banner: banner.to_string(),
                    source,
                })
            }
            Err(AppError::Page { banner, source }) => {
                self.inner.lock().banner = Some(banner.clone());
                Err(AppError::Page { banner, source })
            }
            other => other,
        }
    }

    pub fn status(&self) -> PageStatus {
        let inner = self.inner.lock();
        PageStatus {
            loading: inner.in_flight > 0,
            controls_enabled: inner.in_flight == 0,
            error: inner.banner.clone(),
        }
    }
}

struct Tracked {
    state: PageState,
    expires_at: i64,
}

#[derive(Clone, Default)]
pub struct PageRegistry {
    pages: Arc<DashMap<(String, PageId), Tracked>>,
}

impl PageRegistry {
    pub fn page(&self, session: &CurrentSession, page: PageId) -> PageState {
        let mut entry = self
            .pages
            .entry((session.session_key.clone(), page))
            .or_insert_with(|| Tracked {
                state: PageState::default(),
                expires_at: session.expires_at,
            });
        entry.expires_at = entry.expires_at.max(session.expires_at);
        entry.state.clone()
    }

    pub fn drop_session(&self, session_key: &str) {
        self.pages.retain(|(key, _), _| key != session_key);
    }

    /// Forget pages of sessions whose token has expired.
    pub fn evict_expired(&self, now: i64) -> usize {
        let before = self.pages.len();
        self.pages.retain(|_, tracked| tracked.expires_at > now);
        before - self.pages.len()
    }
}

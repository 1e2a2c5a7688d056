use axum::{
    extract::{Path, State},
    routing::{delete, get},
    Extension, Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use crate::api::resources::{self, Scope};
use crate::context::{FeedItem, SelectedProperty};
use crate::error::{AppError, Result};
use crate::middleware::CurrentSession;
use crate::models::Notification;
use crate::pages::PageId;
use crate::services::NotificationService;
use crate::AppState;

/// Notification rows of the selected property plus the in-session feed.
pub fn routes() -> Router<AppState> {
    resources::routes::<Notification>(PageId::Notifications, Scope::SelectedProperty)
        .route("/feed", get(feed).delete(dismiss_all))
        .route("/feed/:id", delete(dismiss))
}

#[derive(Debug, Serialize)]
pub struct FeedView {
    pub items: Vec<FeedItem>,
    pub unread: usize,
}

fn feed_view(state: &AppState, session_key: &str) -> FeedView {
    state
        .contexts
        .read(session_key, |ctx| FeedView {
            items: ctx.notifications.items(),
            unread: ctx.notifications.unread_count(),
        })
        .unwrap_or(FeedView {
            items: Vec::new(),
            unread: 0,
        })
}

/// Pull fresh rows into the feed, then return it.
async fn feed(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Extension(property): Extension<SelectedProperty>,
) -> Result<Json<FeedView>> {
    let service = NotificationService::new(&state);
    let added = state
        .pages
        .page(&session, PageId::Notifications)
        .load(
            "Failed to load notifications",
            service.refresh(&session.session_key, property.id),
        )
        .await?;
    if added > 0 {
        tracing::debug!(session = %session.session_key, added, "Notification feed refreshed");
    }

    Ok(Json(feed_view(&state, &session.session_key)))
}

async fn dismiss(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Path(id): Path<Uuid>,
) -> Result<Json<FeedView>> {
    let dismissed = state
        .contexts
        .update(&session, |ctx| ctx.notifications.dismiss(id));
    if !dismissed {
        return Err(AppError::NotFound(format!("Notification {} not in feed", id)));
    }

    Ok(Json(feed_view(&state, &session.session_key)))
}

async fn dismiss_all(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Json<FeedView> {
    state
        .contexts
        .update(&session, |ctx| ctx.notifications.dismiss_all());

    Json(feed_view(&state, &session.session_key))
}

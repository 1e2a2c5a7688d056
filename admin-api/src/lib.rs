pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod guard;
pub mod middleware;
pub mod models;
pub mod pages;
pub mod routes;
pub mod services;
pub mod session;

use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use supabase_client::{AuthApi, TableApi};
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::context::ContextStore;
use crate::pages::PageRegistry;
use crate::services::NotificationService;
use crate::session::SessionRegistry;

const PRUNE_INTERVAL: Duration = Duration::from_secs(300);

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub auth: Arc<dyn AuthApi>,
    pub tables: Arc<dyn TableApi>,
    pub sessions: SessionRegistry,
    pub contexts: ContextStore,
    pub pages: PageRegistry,
}

impl AppState {
    pub fn new(config: Config, auth: Arc<dyn AuthApi>, tables: Arc<dyn TableApi>) -> Self {
        let contexts = ContextStore::new(config.notifications.feed_capacity);
        Self {
            config: Arc::new(config),
            auth,
            tables,
            sessions: SessionRegistry::default(),
            contexts,
            pages: PageRegistry::default(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api::routes(state.clone()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

/// Drop revocations, contexts and page state of sessions whose token has
/// expired without a sign-out.
pub fn prune_expired_sessions(state: &AppState) {
    let now = chrono::Utc::now().timestamp();

    let revocations = state.sessions.prune_expired();
    let contexts = state.contexts.evict_expired(now);
    for session_key in &contexts {
        state.pages.drop_session(session_key);
    }
    let pages = state.pages.evict_expired(now);

    if revocations + contexts.len() + pages > 0 {
        tracing::debug!(
            revocations,
            contexts = contexts.len(),
            pages,
            "Pruned expired session state"
        );
    }
}

/// Session cleanup, the notification poller and expiry pruning.
pub fn start_background_tasks(state: &AppState) -> Vec<JoinHandle<()>> {
    let watcher = state
        .contexts
        .watch_sessions(&state.sessions, state.pages.clone());

    let poller = Arc::new(NotificationService::new(state)).spawn_poller(state.config.poll_interval());

    let pruned = state.clone();
    let pruner = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PRUNE_INTERVAL);
        loop {
            ticker.tick().await;
            prune_expired_sessions(&pruned);
        }
    });

    vec![watcher, poller, pruner]
}

async fn health_check() -> &'static str {
    "OK"
}

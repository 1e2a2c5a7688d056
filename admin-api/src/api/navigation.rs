use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{error::RecvError, Receiver};

use crate::guard::{evaluate, GuardDecision};
use crate::middleware::{bearer_token, resolve_session, session_status, CurrentSession};
use crate::routes::{AppRoute, Layout, NavItem};
use crate::session::AuthEvent;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct NavigationQuery {
    pub path: String,
    /// Event streams cannot send headers, so the token may come as a parameter
    #[serde(default)]
    pub access_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RouteInfo {
    pub route: AppRoute,
    pub path: &'static str,
    pub title: &'static str,
    pub layout: Layout,
    pub nav_items: &'static [NavItem],
    pub redirect: Option<&'static str>,
}

impl From<AppRoute> for RouteInfo {
    fn from(route: AppRoute) -> Self {
        Self {
            route,
            path: route.path(),
            title: route.title(),
            layout: route.layout(),
            nav_items: route.layout().nav_items(),
            redirect: route.redirect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Navigation {
    pub path: String,
    /// `None` for paths the dashboard does not know
    pub route: Option<RouteInfo>,
    pub decision: GuardDecision,
}

fn decide(state: &AppState, session: Option<&CurrentSession>, path: &str) -> GuardDecision {
    let property_selected = session
        .map(|s| state.contexts.selected_property(&s.session_key).is_some())
        .unwrap_or(false);
    evaluate(session_status(session), property_selected, path)
}

fn request_token(headers: &HeaderMap, query: &NavigationQuery) -> Option<String> {
    bearer_token(headers).or_else(|| query.access_token.clone())
}

pub async fn navigate(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NavigationQuery>,
) -> Json<Navigation> {
    let session = resolve_session(&state, request_token(&headers, &query).as_deref());
    let decision = decide(&state, session.as_ref(), &query.path);

    Json(Navigation {
        route: AppRoute::resolve(&query.path).map(RouteInfo::from),
        path: query.path,
        decision,
    })
}

struct Watch {
    state: AppState,
    events: Receiver<AuthEvent>,
    session_key: Option<String>,
    token: Option<String>,
    path: String,
}

/// Guard decisions for one page as server-sent events: `loading`, the
/// current decision, then a fresh decision whenever the session changes.
pub async fn stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<NavigationQuery>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    // Subscribe first so a sign-out racing this request is not missed.
    let events = state.sessions.subscribe();
    let token = request_token(&headers, &query);
    let session = resolve_session(&state, token.as_deref());
    let current = decide(&state, session.as_ref(), &query.path);

    let watch = Watch {
        session_key: session.map(|s| s.session_key),
        state,
        events,
        token,
        path: query.path,
    };

    let updates = stream::unfold(watch, |mut watch| async move {
        loop {
            let changed = match watch.events.recv().await {
                Ok(event) => Some(event.session_key()) == watch.session_key.as_deref(),
                // Missed events may include ours.
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Navigation stream lagged behind");
                    watch.session_key.is_some()
                }
                Err(RecvError::Closed) => return None,
            };

            if changed {
                let session = resolve_session(&watch.state, watch.token.as_deref());
                let decision = decide(&watch.state, session.as_ref(), &watch.path);
                return Some((decision, watch));
            }
        }
    });

    let decisions = stream::iter([GuardDecision::Loading, current])
        .chain(updates)
        .map(|decision| Event::default().event("guard").json_data(decision));

    Sse::new(decisions).keep_alive(KeepAlive::default())
}

mod auth;
mod backoffice;
mod context;
mod dashboard;
mod navigation;
mod notifications;
mod reports;
pub mod resources;
mod settings;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};

use self::resources::Scope;
use crate::middleware::{require_backoffice, require_property, require_session};
use crate::models::{MaintenanceRequest, Payment, Property, Room, Tenant};
use crate::pages::PageId;
use crate::AppState;

/// Route layers run outermost-last: the session guard is added after the
/// guards that depend on it.
pub fn routes(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh))
        .route("/navigation", get(navigation::navigate))
        .route("/navigation/stream", get(navigation::stream));

    let session = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/session", get(auth::session))
        .route("/context", get(context::get_context))
        .route(
            "/context/property",
            put(context::select_property).delete(context::clear_property),
        )
        .route("/context/backoffice-mode", put(context::set_backoffice_mode))
        .nest(
            "/properties",
            resources::routes::<Property>(PageId::Properties, Scope::Owner),
        )
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let property = Router::new()
        .nest("/tenants", resources::routes::<Tenant>(PageId::Tenants, Scope::SelectedProperty))
        .nest("/rooms", resources::routes::<Room>(PageId::Rooms, Scope::SelectedProperty))
        .nest("/payments", resources::routes::<Payment>(PageId::Payments, Scope::SelectedProperty))
        .nest(
            "/maintenance",
            resources::routes::<MaintenanceRequest>(PageId::Maintenance, Scope::SelectedProperty),
        )
        .nest("/notifications", notifications::routes())
        .route("/dashboard", get(dashboard::property_dashboard))
        .route("/reports", get(reports::monthly_report))
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .route_layer(from_fn_with_state(state.clone(), require_property))
        .route_layer(from_fn_with_state(state.clone(), require_session));

    let backoffice = Router::new()
        .nest("/backoffice", backoffice::routes())
        .route_layer(from_fn_with_state(state.clone(), require_backoffice))
        .route_layer(from_fn_with_state(state, require_session));

    Router::new()
        .merge(public)
        .merge(session)
        .merge(property)
        .merge(backoffice)
}

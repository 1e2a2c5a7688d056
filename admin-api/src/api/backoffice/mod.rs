//! Cross-tenant panel for operators with an active backoffice profile.

mod dashboard;
mod users;

use axum::{routing::get, Router};

use crate::api::resources::{self, Scope};
use crate::models::{Notification, Property, Subscription, SubscriptionPlan};
use crate::pages::PageId;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::backoffice_dashboard))
        .nest("/users", users::routes())
        .nest(
            "/properties",
            resources::routes::<Property>(PageId::BackofficeProperties, Scope::All),
        )
        .nest(
            "/subscriptions",
            resources::routes::<Subscription>(PageId::BackofficeSubscriptions, Scope::All),
        )
        .nest(
            "/subscription-plans",
            resources::routes::<SubscriptionPlan>(PageId::BackofficeSubscriptionPlans, Scope::All),
        )
        .nest(
            "/notifications",
            resources::routes::<Notification>(PageId::BackofficeNotifications, Scope::All),
        )
}

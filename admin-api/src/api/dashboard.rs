use axum::{extract::State, Extension, Json};

use crate::context::SelectedProperty;
use crate::error::Result;
use crate::middleware::CurrentSession;
use crate::pages::PageId;
use crate::services::{DashboardService, PropertyDashboard};
use crate::AppState;

pub async fn property_dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Extension(property): Extension<SelectedProperty>,
) -> Result<Json<PropertyDashboard>> {
    let service = DashboardService::new(&state);
    let stats = state
        .pages
        .page(&session, PageId::Dashboard)
        .load("Failed to load dashboard", service.property_stats(property.id))
        .await?;

    Ok(Json(stats))
}

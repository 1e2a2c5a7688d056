use axum::{extract::State, Extension, Json};

use crate::error::Result;
use crate::middleware::CurrentSession;
use crate::pages::PageId;
use crate::services::{BackofficeDashboard, DashboardService};
use crate::AppState;

pub async fn backoffice_dashboard(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<BackofficeDashboard>> {
    let service = DashboardService::new(&state);
    let stats = state
        .pages
        .page(&session, PageId::BackofficeDashboard)
        .load("Failed to load dashboard", service.backoffice_stats())
        .await?;

    Ok(Json(stats))
}

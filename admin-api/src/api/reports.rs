use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::context::SelectedProperty;
use crate::error::Result;
use crate::middleware::CurrentSession;
use crate::pages::PageId;
use crate::services::{FinancialReport, ReportMonth, ReportService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    /// `YYYY-MM`; the current month when omitted
    pub month: Option<String>,
}

pub async fn monthly_report(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Extension(property): Extension<SelectedProperty>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<FinancialReport>> {
    let month = match query.month.as_deref() {
        Some(month) => ReportMonth::parse(month)?,
        None => ReportMonth::current(),
    };

    let service = ReportService::new(&state);
    let report = state
        .pages
        .page(&session, PageId::Reports)
        .load("Failed to load report", service.monthly(property.id, month))
        .await?;

    Ok(Json(report))
}

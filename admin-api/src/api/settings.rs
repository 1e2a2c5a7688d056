use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::context::SelectedProperty;
use crate::error::Result;
use crate::middleware::CurrentSession;
use crate::models::{AuditAction, AuditEntry, PropertySettings, ResourceType, UpdateSettings};
use crate::pages::PageId;
use crate::services::{AuditService, SettingsService};
use crate::AppState;

pub async fn get_settings(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Extension(property): Extension<SelectedProperty>,
) -> Result<Json<PropertySettings>> {
    let service = SettingsService::new(&state);
    let settings = state
        .pages
        .page(&session, PageId::Settings)
        .load("Failed to load settings", service.get(property.id))
        .await?;

    Ok(Json(settings))
}

pub async fn update_settings(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Extension(property): Extension<SelectedProperty>,
    Json(payload): Json<UpdateSettings>,
) -> Result<Json<PropertySettings>> {
    payload.validate()?;

    let service = SettingsService::new(&state);
    let settings = state
        .pages
        .page(&session, PageId::Settings)
        .mutate("Failed to save settings", service.save(property.id, payload))
        .await?;

    AuditService::log(AuditEntry {
        actor_id: session.user_id,
        action: AuditAction::UpdateSettings,
        resource_type: ResourceType::PropertySettings,
        resource_id: Some(property.id.to_string()),
        details: Some(serde_json::json!({
            "currency": settings.currency,
            "payment_due_day": settings.payment_due_day,
            "late_fee": settings.late_fee,
        })),
    });

    Ok(Json(settings))
}

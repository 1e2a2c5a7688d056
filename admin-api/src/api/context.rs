use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::context::SelectedProperty;
use crate::error::{AppError, Result};
use crate::middleware::CurrentSession;
use crate::models::{AuditAction, AuditEntry, BackofficeUser, Property, ResourceType};
use crate::services::{AuditService, ResourceService, UserService};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ContextView {
    pub selected_property: Option<SelectedProperty>,
    pub backoffice_mode: bool,
    pub unread_notifications: usize,
}

fn view(state: &AppState, session_key: &str) -> ContextView {
    state
        .contexts
        .read(session_key, |ctx| ContextView {
            selected_property: ctx.property.current().cloned(),
            backoffice_mode: ctx.backoffice.is_enabled(),
            unread_notifications: ctx.notifications.unread_count(),
        })
        .unwrap_or(ContextView {
            selected_property: None,
            backoffice_mode: false,
            unread_notifications: 0,
        })
}

pub async fn get_context(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Json<ContextView> {
    Json(view(&state, &session.session_key))
}

#[derive(Debug, Deserialize)]
pub struct SelectPropertyRequest {
    pub property_id: Uuid,
}

pub async fn select_property(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(payload): Json<SelectPropertyRequest>,
) -> Result<Json<ContextView>> {
    // Foreign properties are indistinguishable from missing ones.
    let property = ResourceService::<Property>::owned_by(state.tables.clone(), session.user_id)
        .get(payload.property_id)
        .await?;

    let selected = SelectedProperty::from(&property);
    state
        .contexts
        .update(&session, |ctx| ctx.select_property(selected));

    AuditService::log(AuditEntry {
        actor_id: session.user_id,
        action: AuditAction::SelectProperty,
        resource_type: ResourceType::Property,
        resource_id: Some(property.id.to_string()),
        details: Some(serde_json::json!({ "name": property.name })),
    });

    Ok(Json(view(&state, &session.session_key)))
}

pub async fn clear_property(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Json<ContextView> {
    let cleared = state
        .contexts
        .update(&session, |ctx| ctx.clear_property());

    if let Some(property) = cleared {
        AuditService::log(AuditEntry {
            actor_id: session.user_id,
            action: AuditAction::ClearProperty,
            resource_type: ResourceType::Property,
            resource_id: Some(property.id.to_string()),
            details: None,
        });
    }

    Json(view(&state, &session.session_key))
}

#[derive(Debug, Deserialize)]
pub struct BackofficeModeRequest {
    /// Omitted toggles the current mode
    #[serde(default)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct BackofficeModeResponse {
    pub enabled: bool,
    pub redirect_to: &'static str,
}

pub async fn set_backoffice_mode(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Json(payload): Json<BackofficeModeRequest>,
) -> Result<Json<BackofficeModeResponse>> {
    let enabled = payload
        .enabled
        .unwrap_or_else(|| !state.contexts.backoffice_enabled(&session.session_key));

    if enabled {
        UserService::new(&state)
            .get(session.user_id)
            .await?
            .filter(BackofficeUser::is_active)
            .ok_or(AppError::Forbidden)?;
    }

    let redirect_to = state
        .contexts
        .update(&session, |ctx| ctx.backoffice.set(enabled));

    AuditService::log(AuditEntry {
        actor_id: session.user_id,
        action: AuditAction::SwitchMode,
        resource_type: ResourceType::Session,
        resource_id: Some(session.session_key.clone()),
        details: Some(serde_json::json!({ "backoffice": enabled })),
    });

    Ok(Json(BackofficeModeResponse { enabled, redirect_to }))
}

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, put},
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::resources::ConfirmQuery;
use crate::error::{AppError, Result};
use crate::middleware::{CurrentOperator, CurrentSession};
use crate::models::{
    AuditAction, AuditEntry, BackofficeRole, BackofficeStatus, BackofficeUser,
    CreateBackofficeUser, ResourceType, UpdateStatus,
};
use crate::pages::users::{UsersView, CREATE_FAILED, DELETE_FAILED, LOAD_FAILED, STATUS_FAILED};
use crate::pages::{PageId, PageState, PageStatus};
use crate::services::{AuditService, UserService};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/state", get(page_status))
        .route("/:id", delete(delete_user))
        .route("/:id/status", put(update_status))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    /// Matches name or email, case-insensitively
    #[serde(default)]
    pub q: Option<String>,
}

fn users_page(state: &AppState, session: &CurrentSession) -> PageState {
    state.pages.page(session, PageId::BackofficeUsers)
}

fn ensure_can_manage(operator: &CurrentOperator) -> Result<()> {
    if operator.role.can_manage_operators() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

/// Superadmin accounts cannot be changed from the panel.
fn ensure_mutable(target: &BackofficeUser) -> Result<()> {
    if target.role == BackofficeRole::Superadmin {
        tracing::warn!(operator_id = %target.id, "Refused to modify superadmin account");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

async fn reload(
    service: &UserService,
    page: &PageState,
    query: Option<String>,
) -> Result<Json<UsersView>> {
    let users = page.load(LOAD_FAILED, service.list()).await?;
    Ok(Json(UsersView::new(users, query, page.status())))
}

fn audit(operator: &CurrentOperator, action: AuditAction, target: Uuid, details: Option<serde_json::Value>) {
    AuditService::log(AuditEntry {
        actor_id: operator.id,
        action,
        resource_type: ResourceType::Operator,
        resource_id: Some(target.to_string()),
        details,
    });
}

async fn list_users(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<UsersView>> {
    let service = UserService::new(&state);
    reload(&service, &users_page(&state, &session), query.q).await
}

async fn create_user(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Extension(operator): Extension<CurrentOperator>,
    Json(payload): Json<CreateBackofficeUser>,
) -> Result<Json<UsersView>> {
    ensure_can_manage(&operator)?;
    payload.validate()?;

    let service = UserService::new(&state);
    let page = users_page(&state, &session);
    let created = page.mutate(CREATE_FAILED, service.create(payload)).await?;

    audit(
        &operator,
        AuditAction::CreateOperator,
        created.id,
        Some(serde_json::json!({ "email": created.email, "role": created.role })),
    );

    reload(&service, &page, None).await
}

async fn update_status(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Extension(operator): Extension<CurrentOperator>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatus>,
) -> Result<Json<UsersView>> {
    ensure_can_manage(&operator)?;
    if payload.status == BackofficeStatus::Inactive && !payload.confirm {
        return Err(AppError::ConfirmationRequired);
    }

    let service = UserService::new(&state);
    let page = users_page(&state, &session);
    let updated = page
        .mutate(STATUS_FAILED, async {
            let target = service.require(id).await?;
            ensure_mutable(&target)?;
            service.set_status(id, payload.status).await
        })
        .await?;

    let action = match updated.status {
        BackofficeStatus::Active => AuditAction::ActivateOperator,
        BackofficeStatus::Inactive => AuditAction::DeactivateOperator,
    };
    audit(&operator, action, id, None);

    reload(&service, &page, None).await
}

async fn delete_user(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Extension(operator): Extension<CurrentOperator>,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmQuery>,
) -> Result<Json<UsersView>> {
    ensure_can_manage(&operator)?;
    if !params.confirm {
        return Err(AppError::ConfirmationRequired);
    }
    if id == operator.id {
        return Err(AppError::BadRequest("You cannot delete your own account".to_string()));
    }

    let service = UserService::new(&state);
    let page = users_page(&state, &session);
    let deleted = page
        .mutate(DELETE_FAILED, async {
            let target = service.require(id).await?;
            ensure_mutable(&target)?;
            service.delete(id).await?;
            Ok::<_, AppError>(target)
        })
        .await?;

    audit(
        &operator,
        AuditAction::DeleteOperator,
        id,
        Some(serde_json::json!({ "email": deleted.email })),
    );

    reload(&service, &page, None).await
}

async fn page_status(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Json<PageStatus> {
    Json(users_page(&state, &session).status())
}

//! Generic list/create/update/delete pages over a [`Resource`] table.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::context::SelectedProperty;
use crate::error::{AppError, Result};
use crate::middleware::CurrentSession;
use crate::models::{AuditAction, AuditEntry, Resource};
use crate::pages::{PageId, PageState, PageStatus, PageView};
use crate::services::{AuditService, ResourceService};
use crate::AppState;

/// Which rows a resource page may see and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Rows of the session's selected property
    SelectedProperty,
    /// Rows whose `owner_id` is the signed-in user
    Owner,
    /// Every row, for backoffice pages
    All,
}

#[derive(Debug, Clone, Copy)]
pub struct ResourcePage {
    pub page: PageId,
    pub scope: Scope,
}

pub fn routes<R: Resource>(page: PageId, scope: Scope) -> Router<AppState> {
    Router::new()
        .route("/", get(list::<R>).post(create::<R>))
        .route("/state", get(page_status))
        .route(
            "/:id",
            get(get_one::<R>).patch(update::<R>).delete(delete::<R>),
        )
        .layer(Extension(ResourcePage { page, scope }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

fn noun<R: Resource>() -> String {
    R::RESOURCE_TYPE.as_str().replace('_', " ")
}

/// Everything a resource handler needs, resolved from the request.
struct ResourceContext<R: Resource> {
    session: CurrentSession,
    page: PageState,
    service: ResourceService<R>,
}

impl<R: Resource> ResourceContext<R> {
    fn new(
        state: &AppState,
        session: CurrentSession,
        page: ResourcePage,
        selected: Option<Extension<SelectedProperty>>,
    ) -> Result<Self> {
        let tables = state.tables.clone();
        let service = match (page.scope, selected) {
            (Scope::SelectedProperty, Some(Extension(property))) => {
                ResourceService::new(tables, Some(property.id))
            }
            (Scope::SelectedProperty, None) => {
                return Err(AppError::BadRequest("No property selected".to_string()))
            }
            (Scope::Owner, _) => ResourceService::owned_by(tables, session.user_id),
            (Scope::All, _) => ResourceService::new(tables, None),
        };

        Ok(Self {
            page: state.pages.page(&session, page.page),
            service,
            session,
        })
    }

    fn audit(&self, action: AuditAction, id: Uuid) {
        AuditService::log(AuditEntry {
            actor_id: self.session.user_id,
            action,
            resource_type: R::RESOURCE_TYPE,
            resource_id: Some(id.to_string()),
            details: None,
        });
    }
}

async fn list<R: Resource>(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Extension(page): Extension<ResourcePage>,
    selected: Option<Extension<SelectedProperty>>,
) -> Result<Json<PageView<R>>> {
    let ctx = ResourceContext::<R>::new(&state, session, page, selected)?;
    let banner = format!("Failed to load {}", R::LABEL);

    let rows = ctx.page.load(&banner, ctx.service.list()).await?;
    Ok(Json(PageView {
        rows,
        page: ctx.page.status(),
    }))
}

async fn get_one<R: Resource>(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Extension(page): Extension<ResourcePage>,
    selected: Option<Extension<SelectedProperty>>,
    Path(id): Path<Uuid>,
) -> Result<Json<R>> {
    let ctx = ResourceContext::<R>::new(&state, session, page, selected)?;
    let banner = format!("Failed to load {}", noun::<R>());

    let row = ctx.page.load(&banner, ctx.service.get(id)).await?;
    Ok(Json(row))
}

async fn create<R: Resource>(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Extension(page): Extension<ResourcePage>,
    selected: Option<Extension<SelectedProperty>>,
    Json(payload): Json<R::Create>,
) -> Result<Json<R>> {
    payload.validate()?;
    let ctx = ResourceContext::<R>::new(&state, session, page, selected)?;
    let banner = format!("Failed to create {}", noun::<R>());

    let row = ctx.page.mutate(&banner, ctx.service.create(&payload)).await?;
    ctx.audit(AuditAction::CreateRecord, row.id());
    Ok(Json(row))
}

async fn update<R: Resource>(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Extension(page): Extension<ResourcePage>,
    selected: Option<Extension<SelectedProperty>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<R::Update>,
) -> Result<Json<R>> {
    payload.validate()?;
    let ctx = ResourceContext::<R>::new(&state, session, page, selected)?;
    let banner = format!("Failed to update {}", noun::<R>());

    let row = ctx.page.mutate(&banner, ctx.service.update(id, &payload)).await?;
    ctx.audit(AuditAction::UpdateRecord, id);
    Ok(Json(row))
}

async fn delete<R: Resource>(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Extension(page): Extension<ResourcePage>,
    selected: Option<Extension<SelectedProperty>>,
    Path(id): Path<Uuid>,
    Query(params): Query<ConfirmQuery>,
) -> Result<Json<serde_json::Value>> {
    if !params.confirm {
        return Err(AppError::ConfirmationRequired);
    }
    let ctx = ResourceContext::<R>::new(&state, session, page, selected)?;
    let banner = format!("Failed to delete {}", noun::<R>());

    ctx.page.mutate(&banner, ctx.service.delete(id)).await?;
    ctx.audit(AuditAction::DeleteRecord, id);
    Ok(Json(serde_json::json!({ "deleted": id })))
}

async fn page_status(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
    Extension(page): Extension<ResourcePage>,
) -> Json<PageStatus> {
    Json(state.pages.page(&session, page.page).status())
}

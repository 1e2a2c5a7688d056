use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use supabase_client::AuthUser;
use validator::Validate;

use crate::context::SelectedProperty;
use crate::error::{AppError, Result};
use crate::middleware::CurrentSession;
use crate::models::BackofficeRole;
use crate::services::{AuthService, AuthTokens, LoginOutcome, UserService};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
    /// Page that sent the user to the login screen
    #[serde(default)]
    pub from: Option<String>,
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginOutcome>> {
    payload.validate()?;

    let outcome = AuthService::new(&state)
        .login(&payload.email, &payload.password, payload.from.as_deref())
        .await?;

    Ok(Json(outcome))
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthTokens>> {
    let tokens = AuthService::new(&state).refresh(&payload.refresh_token).await?;
    Ok(Json(tokens))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Json<serde_json::Value> {
    AuthService::new(&state).logout(&session).await;
    Json(serde_json::json!({ "message": "Logged out successfully" }))
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub user: AuthUser,
    pub selected_property: Option<SelectedProperty>,
    pub backoffice_mode: bool,
    /// Set when the user has an active backoffice profile
    pub backoffice_role: Option<BackofficeRole>,
}

pub async fn session(
    State(state): State<AppState>,
    Extension(session): Extension<CurrentSession>,
) -> Result<Json<SessionInfo>> {
    let users = UserService::new(&state);
    let (user, operator) = tokio::try_join!(
        async {
            state
                .auth
                .get_user(&session.access_token)
                .await
                .map_err(AppError::from)
        },
        users.get(session.user_id),
    )?;

    Ok(Json(SessionInfo {
        user,
        selected_property: state.contexts.selected_property(&session.session_key),
        backoffice_mode: state.contexts.backoffice_enabled(&session.session_key),
        backoffice_role: operator.filter(|o| o.is_active()).map(|o| o.role),
    }))
}

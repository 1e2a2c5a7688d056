use axum::{
    extract::{OriginalUri, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::guard::{GuardDecision, SessionStatus};
use crate::models::{BackofficeRole, BackofficeUser};
use crate::services::UserService;
use crate::AppState;

/// Header carrying the browser path the API call is made from.
pub const PAGE_PATH_HEADER: &str = "x-page-path";

/// Claims of a backend-issued access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub session_id: Option<Uuid>,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct CurrentSession {
    pub user_id: Uuid,
    pub email: Option<String>,
    /// Key for per-session state: the token's session id, else the user id
    pub session_key: String,
    pub access_token: String,
    pub expires_at: i64,
}

impl CurrentSession {
    pub fn from_claims(claims: Claims, access_token: &str) -> Self {
        let session_key = claims.session_id.unwrap_or(claims.sub).to_string();
        Self {
            user_id: claims.sub,
            email: claims.email,
            session_key,
            access_token: access_token.to_string(),
            expires_at: claims.exp,
        }
    }
}

/// Active backoffice profile of the caller.
#[derive(Debug, Clone)]
pub struct CurrentOperator {
    pub id: Uuid,
    pub email: String,
    pub role: BackofficeRole,
}

impl From<BackofficeUser> for CurrentOperator {
    fn from(user: BackofficeUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
        }
    }
}

pub fn verify_token(secret: &str, token: &str) -> Result<Claims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&["authenticated"]);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "Rejected access token");
            AppError::Unauthorized
        })
}

pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|auth| auth.token().to_string())
}

/// Resolve a token into a live session: valid signature, not expired, not
/// signed out through this service.
pub fn resolve_session(state: &AppState, token: Option<&str>) -> Option<CurrentSession> {
    let token = token?;
    let claims = verify_token(&state.config.backend.jwt_secret, token).ok()?;
    let session = CurrentSession::from_claims(claims, token);

    if state.sessions.is_revoked(&session.session_key) {
        return None;
    }
    Some(session)
}

pub fn session_status(session: Option<&CurrentSession>) -> SessionStatus {
    match session {
        Some(_) => SessionStatus::Authenticated,
        None => SessionStatus::Anonymous,
    }
}

fn page_path(request: &Request) -> String {
    request
        .headers()
        .get(PAGE_PATH_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            request
                .extensions()
                .get::<OriginalUri>()
                .map(|uri| uri.path().to_string())
        })
        .unwrap_or_else(|| request.uri().path().to_string())
}

pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = bearer_token(request.headers());

    match resolve_session(&state, token.as_deref()) {
        Some(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => GuardDecision::RedirectToLogin {
            from: page_path(&request),
        }
        .into_response(),
    }
}

/// Must run after [`require_session`].
pub async fn require_property(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let Some(session) = request.extensions().get::<CurrentSession>().cloned() else {
        return AppError::Unauthorized.into_response();
    };

    match state.contexts.selected_property(&session.session_key) {
        Some(property) => {
            request.extensions_mut().insert(property);
            next.run(request).await
        }
        None => GuardDecision::RedirectToPropertySelection.into_response(),
    }
}

/// Must run after [`require_session`]. Only active operators get through.
pub async fn require_backoffice(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let session = request
        .extensions()
        .get::<CurrentSession>()
        .cloned()
        .ok_or(AppError::Unauthorized)?;

    let operator = UserService::new(&state)
        .get(session.user_id)
        .await?
        .filter(BackofficeUser::is_active)
        .ok_or(AppError::Forbidden)?;

    request.extensions_mut().insert(CurrentOperator::from(operator));
    Ok(next.run(request).await)
}

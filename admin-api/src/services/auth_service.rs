use serde::Serialize;
use std::sync::Arc;
use supabase_client::{AuthApi, AuthUser, Session};

use crate::error::{AppError, Result};
use crate::middleware::{verify_token, CurrentSession};
use crate::models::{AuditAction, AuditEntry, ResourceType};
use crate::services::{AuditService, UserService};
use crate::session::SessionRegistry;
use crate::AppState;

/// Tokens handed to the browser after sign-in or refresh.
#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub expires_at: Option<i64>,
    pub user: AuthUser,
}

impl From<Session> for AuthTokens {
    fn from(session: Session) -> Self {
        Self {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            token_type: session.token_type,
            expires_in: session.expires_in,
            expires_at: session.expires_at,
            user: session.user,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    #[serde(flatten)]
    pub tokens: AuthTokens,
    pub redirect_to: String,
}

pub struct AuthService {
    auth: Arc<dyn AuthApi>,
    sessions: SessionRegistry,
    users: UserService,
    jwt_secret: String,
    default_redirect: String,
}

impl AuthService {
    pub fn new(state: &AppState) -> Self {
        Self {
            auth: state.auth.clone(),
            sessions: state.sessions.clone(),
            users: UserService::new(state),
            jwt_secret: state.config.backend.jwt_secret.clone(),
            default_redirect: state.config.auth.default_redirect.clone(),
        }
    }

    /// Sign in and register the session. `from` is the page that bounced the
    /// user to the login screen.
    pub async fn login(&self, email: &str, password: &str, from: Option<&str>) -> Result<LoginOutcome> {
        let session = self
            .auth
            .sign_in_with_password(email, password)
            .await
            .map_err(|e| {
                if e.is_auth_failure() {
                    tracing::info!(email = %email, "Rejected sign-in");
                    AppError::InvalidCredentials
                } else {
                    AppError::Backend(e)
                }
            })?;

        let claims = verify_token(&self.jwt_secret, &session.access_token)?;
        let current = CurrentSession::from_claims(claims, &session.access_token);
        self.sessions.signed_in(&current.session_key, current.user_id);

        // Only operators have a profile row; for everyone else this is a no-op.
        match self.users.touch_last_login(current.user_id).await {
            Ok(true) => tracing::debug!(user_id = %current.user_id, "Stamped operator last login"),
            Ok(false) => {}
            Err(e) => tracing::warn!(user_id = %current.user_id, error = %e, "Failed to stamp last login"),
        }

        AuditService::log(AuditEntry {
            actor_id: current.user_id,
            action: AuditAction::Login,
            resource_type: ResourceType::Session,
            resource_id: Some(current.session_key.clone()),
            details: Some(serde_json::json!({ "email": email })),
        });

        Ok(LoginOutcome {
            tokens: session.into(),
            redirect_to: self.redirect_target(from),
        })
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthTokens> {
        let session = self.auth.refresh_session(refresh_token).await.map_err(|e| {
            if e.is_auth_failure() {
                AppError::Unauthorized
            } else {
                AppError::Backend(e)
            }
        })?;

        let claims = verify_token(&self.jwt_secret, &session.access_token)?;
        let current = CurrentSession::from_claims(claims, &session.access_token);
        if self.sessions.is_revoked(&current.session_key) {
            return Err(AppError::Unauthorized);
        }
        self.sessions.refreshed(&current.session_key);

        Ok(session.into())
    }

    /// Revoke locally even when the backend call fails; the token stays
    /// unusable here until it expires.
    pub async fn logout(&self, session: &CurrentSession) {
        if let Err(e) = self.auth.sign_out(&session.access_token).await {
            tracing::warn!(session = %session.session_key, error = %e, "Backend sign-out failed");
        }
        self.sessions.sign_out(&session.session_key, session.expires_at);

        AuditService::log(AuditEntry {
            actor_id: session.user_id,
            action: AuditAction::Logout,
            resource_type: ResourceType::Session,
            resource_id: Some(session.session_key.clone()),
            details: None,
        });
    }

    fn redirect_target(&self, from: Option<&str>) -> String {
        sanitize_redirect(from).unwrap_or_else(|| self.default_redirect.clone())
    }
}

/// Only same-site paths are echoed back, and never the login page itself.
pub fn sanitize_redirect(from: Option<&str>) -> Option<String> {
    let from = from?.trim();
    let path = from.split(['?', '#']).next().unwrap_or_default();

    if !from.starts_with('/') || from.starts_with("//") || path == "/login" {
        return None;
    }
    Some(from.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_redirect() {
        assert_eq!(sanitize_redirect(Some("/payments")), Some("/payments".into()));
        assert_eq!(sanitize_redirect(Some("/rooms?page=2")), Some("/rooms?page=2".into()));
        assert_eq!(sanitize_redirect(Some("//evil.example")), None);
        assert_eq!(sanitize_redirect(Some("https://evil.example")), None);
        assert_eq!(sanitize_redirect(Some("/login")), None);
        assert_eq!(sanitize_redirect(Some("/login?from=/x")), None);
        assert_eq!(sanitize_redirect(None), None);
    }
}

//! Auth API client
//!
//! Wraps the hosted auth endpoints under `{url}/auth/v1`:
//! password sign-in, refresh, user lookup, sign-out, password recovery, and the
//! service-role admin endpoints for creating and deleting identities.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::error::{BackendError, Result};
use crate::http::{ensure_success, read_json};
use crate::SupabaseConfig;

/// Identity as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_sign_in_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub refresh_token: String,
    pub user: AuthUser,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

/// Body of the admin create-user call.
#[derive(Debug, Clone, Serialize)]
pub struct AdminUserAttributes {
    pub email: String,
    pub password: String,
    /// Mark the email as already confirmed so no confirmation mail goes out.
    pub email_confirm: bool,
}

#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session>;

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session>;

    /// Resolve the identity behind an access token.
    async fn get_user(&self, access_token: &str) -> Result<AuthUser>;

    async fn sign_out(&self, access_token: &str) -> Result<()>;

    async fn admin_create_user(&self, attributes: &AdminUserAttributes) -> Result<AuthUser>;

    async fn admin_delete_user(&self, user_id: Uuid) -> Result<()>;

    async fn reset_password_for_email(&self, email: &str, redirect_to: Option<&str>) -> Result<()>;
}

#[derive(Clone)]
pub struct AuthClient {
    client: Client,
    config: SupabaseConfig,
}

impl AuthClient {
    pub fn new(client: Client, config: SupabaseConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.config.url.trim_end_matches('/'), path)
    }

    async fn token_grant(&self, grant_type: &str, body: serde_json::Value) -> Result<Session> {
        let response = self
            .client
            .post(self.endpoint("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.config.anon_key)
            .json(&body)
            .send()
            .await?;

        read_json(response).await
    }
}

#[async_trait]
impl AuthApi for AuthClient {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        info!(email = %email, "Signing in with password");
        self.token_grant("password", json!({ "email": email, "password": password }))
            .await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        self.token_grant("refresh_token", json!({ "refresh_token": refresh_token }))
            .await
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser> {
        let response = self
            .client
            .get(self.endpoint("user"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        read_json(response).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        let response = self
            .client
            .post(self.endpoint("logout"))
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn admin_create_user(&self, attributes: &AdminUserAttributes) -> Result<AuthUser> {
        info!(email = %attributes.email, "Creating auth identity");

        let response = self
            .client
            .post(self.endpoint("admin/users"))
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
            .json(attributes)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send create user request: {}", e);
                BackendError::from(e)
            })?;

        read_json(response).await
    }

    async fn admin_delete_user(&self, user_id: Uuid) -> Result<()> {
        info!(user_id = %user_id, "Deleting auth identity");

        let response = self
            .client
            .delete(self.endpoint(&format!("admin/users/{}", user_id)))
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
            .send()
            .await?;

        ensure_success(response).await?;
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str, redirect_to: Option<&str>) -> Result<()> {
        info!(email = %email, "Requesting password reset email");

        let mut request = self
            .client
            .post(self.endpoint("recover"))
            .header("apikey", &self.config.anon_key)
            .json(&json!({ "email": email }));

        if let Some(redirect) = redirect_to {
            request = request.query(&[("redirect_to", redirect)]);
        }

        ensure_success(request.send().await?).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_deserializes_auth_payload() {
        let payload = r#"{
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1700003600,
            "refresh_token": "r1",
            "user": {
                "id": "6f1c3a5e-2d0b-4c7e-9a51-5b2f8e0d4c11",
                "aud": "authenticated",
                "email": "ops@kostra.id",
                "role": "authenticated",
                "created_at": "2024-01-01T00:00:00Z"
            }
        }"#;

        let session: Session = serde_json::from_str(payload).unwrap();
        assert_eq!(session.user.email.as_deref(), Some("ops@kostra.id"));
        assert_eq!(session.expires_in, 3600);
        assert!(session.user.last_sign_in_at.is_none());
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let client = AuthClient::new(
            Client::new(),
            SupabaseConfig::new("https://abc.supabase.co/", "anon", "service"),
        );
        assert_eq!(client.endpoint("admin/users"), "https://abc.supabase.co/auth/v1/admin/users");
    }
}

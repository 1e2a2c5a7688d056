use rand::distributions::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use supabase_client::{AdminUserAttributes, AuthApi, Filter, Query, Table};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{BackofficeStatus, BackofficeUser, CreateBackofficeUser, NewBackofficeUser};
use crate::AppState;

const TABLE: &str = "backoffice_users";

/// Operator accounts: an auth identity plus a `backoffice_users` profile row
/// sharing its id.
pub struct UserService {
    auth: Arc<dyn AuthApi>,
    users: Table<BackofficeUser>,
    reset_redirect: Option<String>,
    temp_password_length: usize,
}

impl UserService {
    pub fn new(state: &AppState) -> Self {
        Self {
            auth: state.auth.clone(),
            users: Table::new(state.tables.clone(), TABLE),
            reset_redirect: state.config.auth.password_reset_redirect.clone(),
            temp_password_length: state.config.auth.temp_password_length,
        }
    }

    pub async fn list(&self) -> Result<Vec<BackofficeUser>> {
        let users = self
            .users
            .list(&Query::new().order("created_at", false))
            .await?;
        Ok(users)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<BackofficeUser>> {
        Ok(self.users.find(Filter::new().eq("id", id)).await?)
    }

    pub async fn require(&self, id: Uuid) -> Result<BackofficeUser> {
        self.get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Operator {} not found", id)))
    }

    /// Create identity, then profile, then send the reset email. When a later
    /// step fails the identity is deleted again, which takes the profile with it.
    pub async fn create(&self, input: CreateBackofficeUser) -> Result<BackofficeUser> {
        let identity = self
            .auth
            .admin_create_user(&AdminUserAttributes {
                email: input.email.clone(),
                password: temporary_password(self.temp_password_length),
                email_confirm: true,
            })
            .await?;

        let profile = NewBackofficeUser {
            id: identity.id,
            email: input.email.clone(),
            name: input.name,
            role: input.role,
            status: input.status,
        };

        let created = match self.users.insert(&profile).await {
            Ok(user) => user,
            Err(e) => {
                self.rollback(identity.id).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self
            .auth
            .reset_password_for_email(&input.email, self.reset_redirect.as_deref())
            .await
        {
            self.rollback(identity.id).await;
            return Err(e.into());
        }

        tracing::info!(operator_id = %created.id, role = created.role.as_str(), "Created operator");
        Ok(created)
    }

    async fn rollback(&self, identity_id: Uuid) {
        match self.auth.admin_delete_user(identity_id).await {
            Ok(()) => tracing::warn!(identity_id = %identity_id, "Rolled back partially created operator"),
            Err(e) => tracing::error!(
                identity_id = %identity_id,
                error = %e,
                "Failed to roll back partially created operator"
            ),
        }
    }

    pub async fn set_status(&self, id: Uuid, status: BackofficeStatus) -> Result<BackofficeUser> {
        let updated = self
            .users
            .update(
                &Filter::new().eq("id", id),
                &serde_json::json!({ "status": status }),
            )
            .await?;

        updated
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("Operator {} not found", id)))
    }

    /// Deletes the identity; the profile row cascades server-side.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.auth.admin_delete_user(id).await?;
        Ok(())
    }

    pub async fn touch_last_login(&self, id: Uuid) -> Result<bool> {
        let updated = self
            .users
            .update(
                &Filter::new().eq("id", id),
                &serde_json::json!({ "last_login": chrono::Utc::now() }),
            )
            .await?;
        Ok(!updated.is_empty())
    }
}

fn temporary_password(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temporary_password_is_random() {
        let a = temporary_password(24);
        let b = temporary_password(24);
        assert_eq!(a.len(), 24);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackofficeRole {
    Superadmin,
    Admin,
    Support,
}

impl BackofficeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackofficeRole::Superadmin => "superadmin",
            BackofficeRole::Admin => "admin",
            BackofficeRole::Support => "support",
        }
    }

    /// Create, activate, deactivate and delete operator accounts.
    pub fn can_manage_operators(&self) -> bool {
        matches!(self, BackofficeRole::Superadmin | BackofficeRole::Admin)
    }

    pub fn badge_tone(&self) -> &'static str {
        match self {
            BackofficeRole::Superadmin => "purple",
            BackofficeRole::Admin => "blue",
            BackofficeRole::Support => "gray",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackofficeStatus {
    #[default]
    Active,
    Inactive,
}

impl BackofficeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackofficeStatus::Active => "active",
            BackofficeStatus::Inactive => "inactive",
        }
    }

    pub fn badge_tone(&self) -> &'static str {
        match self {
            BackofficeStatus::Active => "green",
            BackofficeStatus::Inactive => "red",
        }
    }
}

/// Operator profile; `id` is the auth identity id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackofficeUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: BackofficeRole,
    pub status: BackofficeStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    Activate,
    Deactivate,
    Delete,
}

impl BackofficeUser {
    pub fn is_active(&self) -> bool {
        self.status == BackofficeStatus::Active
    }

    /// Case-insensitive substring match on name or email.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.to_lowercase().contains(&query) || self.email.to_lowercase().contains(&query)
    }

    /// Controls shown on the row. Superadmins are untouchable.
    pub fn actions(&self) -> Vec<UserAction> {
        match (self.role, self.status) {
            (BackofficeRole::Superadmin, _) => Vec::new(),
            (_, BackofficeStatus::Active) => vec![UserAction::Deactivate, UserAction::Delete],
            (_, BackofficeStatus::Inactive) => vec![UserAction::Activate, UserAction::Delete],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBackofficeUser {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(custom(function = "assignable_role"))]
    pub role: BackofficeRole,
    #[serde(default)]
    pub status: BackofficeStatus,
}

fn assignable_role(role: &BackofficeRole) -> Result<(), ValidationError> {
    if *role == BackofficeRole::Superadmin {
        let mut err = ValidationError::new("assignable_role");
        err.message = Some("Only admin and support accounts can be created".into());
        return Err(err);
    }
    Ok(())
}

/// Profile row written right after the identity is created.
#[derive(Debug, Clone, Serialize)]
pub struct NewBackofficeUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: BackofficeRole,
    pub status: BackofficeStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatus {
    pub status: BackofficeStatus,
    #[serde(default)]
    pub confirm: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, email: &str, role: BackofficeRole) -> BackofficeUser {
        BackofficeUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            role,
            status: BackofficeStatus::Active,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    #[test]
    fn test_search_matches_name_or_email_case_insensitively() {
        let u = user("Siti Rahma", "ops@Kostra.id", BackofficeRole::Admin);
        assert!(u.matches_search("siti"));
        assert!(u.matches_search("KOSTRA"));
        assert!(u.matches_search(""));
        assert!(!u.matches_search("budi"));
    }

    #[test]
    fn test_superadmin_has_no_actions() {
        let root = user("Root", "root@kostra.id", BackofficeRole::Superadmin);
        assert!(root.actions().is_empty());

        let mut support = user("Ana", "ana@kostra.id", BackofficeRole::Support);
        assert_eq!(support.actions(), vec![UserAction::Deactivate, UserAction::Delete]);
        support.status = BackofficeStatus::Inactive;
        assert_eq!(support.actions(), vec![UserAction::Activate, UserAction::Delete]);
    }

    #[test]
    fn test_create_rejects_superadmin_role() {
        let input = CreateBackofficeUser {
            email: "new@kostra.id".into(),
            name: "New".into(),
            role: BackofficeRole::Superadmin,
            status: BackofficeStatus::Active,
        };
        assert!(input.validate().is_err());

        let input = CreateBackofficeUser {
            role: BackofficeRole::Support,
            ..input
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_role_permissions_and_tones() {
        assert!(BackofficeRole::Superadmin.can_manage_operators());
        assert!(BackofficeRole::Admin.can_manage_operators());
        assert!(!BackofficeRole::Support.can_manage_operators());
        assert_eq!(BackofficeStatus::Inactive.badge_tone(), "red");
    }
}

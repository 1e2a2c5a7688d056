use serde::Serialize;

use super::PageStatus;
use crate::models::{BackofficeUser, UserAction};

pub const LOAD_FAILED: &str = "Failed to load users";
pub const CREATE_FAILED: &str = "Failed to create user";
pub const DELETE_FAILED: &str = "Failed to delete user";
pub const STATUS_FAILED: &str = "Failed to update user status";

#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
    #[serde(flatten)]
    pub user: BackofficeUser,
    pub role_tone: &'static str,
    pub status_tone: &'static str,
    pub actions: Vec<UserAction>,
}

impl From<BackofficeUser> for UserRow {
    fn from(user: BackofficeUser) -> Self {
        Self {
            role_tone: user.role.badge_tone(),
            status_tone: user.status.badge_tone(),
            actions: user.actions(),
            user,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersView {
    pub users: Vec<UserRow>,
    pub query: Option<String>,
    pub page: PageStatus,
}

impl UsersView {
    /// Apply the search box to the loaded rows; an empty query keeps all.
    pub fn new(users: Vec<BackofficeUser>, query: Option<String>, page: PageStatus) -> Self {
        let query = query.filter(|q| !q.trim().is_empty());
        let users = users
            .into_iter()
            .filter(|u| query.as_deref().map_or(true, |q| u.matches_search(q)))
            .map(UserRow::from)
            .collect();
        Self { users, query, page }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BackofficeRole, BackofficeStatus};
    use chrono::Utc;
    use uuid::Uuid;

    fn user(name: &str, email: &str, role: BackofficeRole) -> BackofficeUser {
        BackofficeUser {
            id: Uuid::new_v4(),
            email: email.into(),
            name: name.into(),
            role,
            status: BackofficeStatus::Active,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    fn idle() -> PageStatus {
        PageStatus {
            loading: false,
            controls_enabled: true,
            error: None,
        }
    }

    #[test]
    fn test_filter_keeps_exact_matches() {
        let users = vec![
            user("Dewi Lestari", "dewi@kostra.id", BackofficeRole::Admin),
            user("Budi", "budi@mail.com", BackofficeRole::Support),
            user("Root", "root@KOSTRA.id", BackofficeRole::Superadmin),
        ];

        let view = UsersView::new(users.clone(), Some("Kostra".into()), idle());
        let names: Vec<_> = view.users.iter().map(|r| r.user.name.as_str()).collect();
        assert_eq!(names, vec!["Dewi Lestari", "Root"]);

        let view = UsersView::new(users, Some("  ".into()), idle());
        assert_eq!(view.users.len(), 3);
        assert!(view.query.is_none());
    }

    #[test]
    fn test_rows_carry_tones_and_actions() {
        let row = UserRow::from(user("Root", "root@kostra.id", BackofficeRole::Superadmin));
        assert_eq!(row.role_tone, "purple");
        assert_eq!(row.status_tone, "green");
        assert!(row.actions.is_empty());
    }
}

//! Route guard: decides whether a page may render for the current session.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::routes::AppRoute;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Session lookup has not completed yet
    Pending,
    Authenticated,
    Anonymous,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum GuardDecision {
    Loading,
    Render,
    RedirectToLogin { from: String },
    RedirectToPropertySelection,
}

impl GuardDecision {
    pub fn redirect_path(&self) -> Option<&'static str> {
        match self {
            GuardDecision::RedirectToLogin { .. } => Some(AppRoute::Login.path()),
            GuardDecision::RedirectToPropertySelection => Some(AppRoute::Properties.path()),
            GuardDecision::Loading | GuardDecision::Render => None,
        }
    }
}

pub fn evaluate(status: SessionStatus, property_selected: bool, path: &str) -> GuardDecision {
    let route = AppRoute::resolve(path);
    // Unknown paths are guarded like any page; they just never need a property.
    let protected = route.map(|r| r.is_protected()).unwrap_or(true);
    let requires_property = route.map(|r| r.requires_property()).unwrap_or(false);

    if !protected {
        return GuardDecision::Render;
    }

    match status {
        SessionStatus::Pending => GuardDecision::Loading,
        SessionStatus::Anonymous => GuardDecision::RedirectToLogin {
            from: path.to_string(),
        },
        SessionStatus::Authenticated if requires_property && !property_selected => {
            GuardDecision::RedirectToPropertySelection
        }
        SessionStatus::Authenticated => GuardDecision::Render,
    }
}

impl IntoResponse for GuardDecision {
    fn into_response(self) -> Response {
        match self {
            GuardDecision::RedirectToLogin { from } => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "redirect": AppRoute::Login.path(), "from": from })),
            )
                .into_response(),
            GuardDecision::RedirectToPropertySelection => (
                StatusCode::CONFLICT,
                Json(json!({ "redirect": AppRoute::Properties.path() })),
            )
                .into_response(),
            GuardDecision::Loading => {
                (StatusCode::ACCEPTED, Json(json!({ "loading": true }))).into_response()
            }
            GuardDecision::Render => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROTECTED: &[&str] = &[
        "/",
        "/dashboard",
        "/tenants",
        "/rooms",
        "/payments",
        "/maintenance",
        "/reports",
        "/notifications",
        "/settings",
        "/properties",
        "/backoffice",
        "/backoffice/users",
        "/backoffice/subscription-plans",
    ];

    #[test]
    fn test_anonymous_is_sent_to_login_with_origin() {
        for path in PROTECTED {
            for selected in [false, true] {
                assert_eq!(
                    evaluate(SessionStatus::Anonymous, selected, path),
                    GuardDecision::RedirectToLogin {
                        from: path.to_string()
                    }
                );
            }
        }
    }

    #[test]
    fn test_login_is_never_guarded() {
        assert_eq!(
            evaluate(SessionStatus::Anonymous, false, "/login"),
            GuardDecision::Render
        );
        assert_eq!(
            evaluate(SessionStatus::Pending, false, "/login"),
            GuardDecision::Render
        );
    }

    #[test]
    fn test_pending_session_never_renders() {
        for path in PROTECTED {
            assert_eq!(
                evaluate(SessionStatus::Pending, true, path),
                GuardDecision::Loading
            );
        }
    }

    #[test]
    fn test_missing_property_redirects_tenant_pages_only() {
        for path in ["/dashboard", "/tenants", "/reports", "/"] {
            assert_eq!(
                evaluate(SessionStatus::Authenticated, false, path),
                GuardDecision::RedirectToPropertySelection
            );
        }
        for path in ["/properties", "/backoffice", "/backoffice/users"] {
            assert_eq!(
                evaluate(SessionStatus::Authenticated, false, path),
                GuardDecision::Render
            );
        }
    }

    #[test]
    fn test_selected_property_renders() {
        assert_eq!(
            evaluate(SessionStatus::Authenticated, true, "/payments"),
            GuardDecision::Render
        );
    }

    #[test]
    fn test_redirect_paths() {
        assert_eq!(
            GuardDecision::RedirectToLogin { from: "/rooms".into() }.redirect_path(),
            Some("/login")
        );
        assert_eq!(
            GuardDecision::RedirectToPropertySelection.redirect_path(),
            Some("/properties")
        );
        assert_eq!(GuardDecision::Render.redirect_path(), None);
    }
}

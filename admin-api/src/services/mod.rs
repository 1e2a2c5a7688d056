mod audit_service;
mod auth_service;
pub mod dashboard_service;
mod notification_service;
pub mod report_service;
mod resource_service;
mod settings_service;
mod user_service;

pub use audit_service::AuditService;
pub use auth_service::{sanitize_redirect, AuthService, AuthTokens, LoginOutcome};
pub use dashboard_service::{BackofficeDashboard, DashboardService, PropertyDashboard};
pub use notification_service::NotificationService;
pub use report_service::{FinancialReport, ReportMonth, ReportService};
pub use resource_service::ResourceService;
pub use settings_service::SettingsService;
pub use user_service::UserService;

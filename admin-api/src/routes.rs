//! Page routes known to the dashboard and the layout shell each renders in.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    Tenant,
    Backoffice,
    /// No shell, e.g. the login page
    Bare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub path: &'static str,
    pub label: &'static str,
}

const TENANT_NAV: &[NavItem] = &[
    NavItem { path: "/dashboard", label: "Dashboard" },
    NavItem { path: "/tenants", label: "Penyewa" },
    NavItem { path: "/rooms", label: "Kamar" },
    NavItem { path: "/payments", label: "Pembayaran" },
    NavItem { path: "/maintenance", label: "Pemeliharaan" },
    NavItem { path: "/reports", label: "Laporan" },
    NavItem { path: "/notifications", label: "Notifikasi" },
    NavItem { path: "/settings", label: "Pengaturan" },
];

const BACKOFFICE_NAV: &[NavItem] = &[
    NavItem { path: "/backoffice", label: "Dashboard" },
    NavItem { path: "/backoffice/users", label: "Users" },
    NavItem { path: "/backoffice/properties", label: "Properties" },
    NavItem { path: "/backoffice/subscriptions", label: "Subscriptions" },
    NavItem { path: "/backoffice/subscription-plans", label: "Subscription Plans" },
    NavItem { path: "/backoffice/notifications", label: "Notifications" },
    NavItem { path: "/backoffice/settings", label: "Settings" },
];

impl Layout {
    pub fn nav_items(&self) -> &'static [NavItem] {
        match self {
            Layout::Tenant => TENANT_NAV,
            Layout::Backoffice => BACKOFFICE_NAV,
            Layout::Bare => &[],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AppRoute {
    Root,
    Login,
    Dashboard,
    Tenants,
    Rooms,
    Payments,
    Maintenance,
    Reports,
    Notifications,
    Settings,
    Properties,
    BackofficeDashboard,
    BackofficeUsers,
    BackofficeNotifications,
    BackofficeProperties,
    BackofficeSubscriptions,
    BackofficeSubscriptionPlans,
    BackofficeSettings,
}

const ALL_ROUTES: &[AppRoute] = &[
    AppRoute::Root,
    AppRoute::Login,
    AppRoute::Dashboard,
    AppRoute::Tenants,
    AppRoute::Rooms,
    AppRoute::Payments,
    AppRoute::Maintenance,
    AppRoute::Reports,
    AppRoute::Notifications,
    AppRoute::Settings,
    AppRoute::Properties,
    AppRoute::BackofficeDashboard,
    AppRoute::BackofficeUsers,
    AppRoute::BackofficeNotifications,
    AppRoute::BackofficeProperties,
    AppRoute::BackofficeSubscriptions,
    AppRoute::BackofficeSubscriptionPlans,
    AppRoute::BackofficeSettings,
];

impl AppRoute {
    /// Resolve a browser path (query string and trailing slash ignored).
    pub fn resolve(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        ALL_ROUTES.iter().copied().find(|route| route.path() == path)
    }

    pub fn path(&self) -> &'static str {
        match self {
            AppRoute::Root => "/",
            AppRoute::Login => "/login",
            AppRoute::Dashboard => "/dashboard",
            AppRoute::Tenants => "/tenants",
            AppRoute::Rooms => "/rooms",
            AppRoute::Payments => "/payments",
            AppRoute::Maintenance => "/maintenance",
            AppRoute::Reports => "/reports",
            AppRoute::Notifications => "/notifications",
            AppRoute::Settings => "/settings",
            AppRoute::Properties => "/properties",
            AppRoute::BackofficeDashboard => "/backoffice",
            AppRoute::BackofficeUsers => "/backoffice/users",
            AppRoute::BackofficeNotifications => "/backoffice/notifications",
            AppRoute::BackofficeProperties => "/backoffice/properties",
            AppRoute::BackofficeSubscriptions => "/backoffice/subscriptions",
            AppRoute::BackofficeSubscriptionPlans => "/backoffice/subscription-plans",
            AppRoute::BackofficeSettings => "/backoffice/settings",
        }
    }

    pub fn layout(&self) -> Layout {
        match self {
            AppRoute::Login => Layout::Bare,
            AppRoute::BackofficeDashboard
            | AppRoute::BackofficeUsers
            | AppRoute::BackofficeNotifications
            | AppRoute::BackofficeProperties
            | AppRoute::BackofficeSubscriptions
            | AppRoute::BackofficeSubscriptionPlans
            | AppRoute::BackofficeSettings => Layout::Backoffice,
            _ => Layout::Tenant,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            AppRoute::Root | AppRoute::Dashboard | AppRoute::BackofficeDashboard => "Dashboard",
            AppRoute::Login => "Login",
            AppRoute::Tenants => "Manajemen Penyewa",
            AppRoute::Rooms => "Manajemen Kamar",
            AppRoute::Payments => "Catatan Pembayaran",
            AppRoute::Maintenance => "Pemeliharaan",
            AppRoute::Reports => "Laporan Keuangan",
            AppRoute::Notifications => "Notifikasi",
            AppRoute::Settings => "Pengaturan",
            AppRoute::Properties => "Properti",
            AppRoute::BackofficeUsers => "User Management",
            AppRoute::BackofficeNotifications => "Notifications",
            AppRoute::BackofficeProperties => "Properties",
            AppRoute::BackofficeSubscriptions => "Subscriptions",
            AppRoute::BackofficeSubscriptionPlans => "Subscription Plans",
            AppRoute::BackofficeSettings => "Backoffice Settings",
        }
    }

    pub fn is_protected(&self) -> bool {
        !matches!(self, AppRoute::Login)
    }

    /// Tenant pages work on one property; the selection page itself and the
    /// backoffice do not.
    pub fn requires_property(&self) -> bool {
        self.layout() == Layout::Tenant && *self != AppRoute::Properties
    }

    /// Routes that only forward elsewhere.
    pub fn redirect(&self) -> Option<&'static str> {
        match self {
            AppRoute::Root => Some(AppRoute::Dashboard.path()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_ignores_query_and_trailing_slash() {
        assert_eq!(AppRoute::resolve("/rooms/"), Some(AppRoute::Rooms));
        assert_eq!(AppRoute::resolve("/rooms?page=2"), Some(AppRoute::Rooms));
        assert_eq!(AppRoute::resolve(""), Some(AppRoute::Root));
        assert_eq!(AppRoute::resolve("/backoffice/"), Some(AppRoute::BackofficeDashboard));
        assert_eq!(AppRoute::resolve("/nope"), None);
    }

    #[test]
    fn test_tenant_titles() {
        assert_eq!(AppRoute::Tenants.title(), "Manajemen Penyewa");
        assert_eq!(AppRoute::Reports.title(), "Laporan Keuangan");
        assert_eq!(AppRoute::Properties.title(), "Properti");
    }

    #[test]
    fn test_property_requirement_by_layout() {
        assert!(AppRoute::Dashboard.requires_property());
        assert!(AppRoute::Root.requires_property());
        assert!(!AppRoute::Properties.requires_property());
        assert!(!AppRoute::BackofficeUsers.requires_property());
        assert!(!AppRoute::Login.requires_property());
        assert!(!AppRoute::Login.is_protected());
    }

    #[test]
    fn test_every_route_resolves_to_itself() {
        for route in ALL_ROUTES {
            assert_eq!(AppRoute::resolve(route.path()), Some(*route));
            for item in route.layout().nav_items() {
                assert!(AppRoute::resolve(item.path).is_some(), "{}", item.path);
            }
        }
    }
}

use crate::routes::AppRoute;

/// Whether the session is working in the backoffice panel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BackofficeMode {
    enabled: bool,
}

impl BackofficeMode {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set(&mut self, enabled: bool) -> &'static str {
        self.enabled = enabled;
        self.landing_path()
    }

    pub fn toggle(&mut self) -> &'static str {
        self.set(!self.enabled)
    }

    /// Where the client lands after switching.
    pub fn landing_path(&self) -> &'static str {
        if self.enabled {
            AppRoute::BackofficeDashboard.path()
        } else {
            AppRoute::Dashboard.path()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_switches_landing_path() {
        let mut mode = BackofficeMode::default();
        assert!(!mode.is_enabled());
        assert_eq!(mode.toggle(), "/backoffice");
        assert!(mode.is_enabled());
        assert_eq!(mode.toggle(), "/dashboard");
        assert_eq!(mode.set(true), "/backoffice");
    }
}

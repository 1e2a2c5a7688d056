use serde::Deserialize;
use std::time::Duration;
use supabase_client::SupabaseConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    pub auth: AuthConfig,
    pub notifications: NotificationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub url: String,
    pub anon_key: String,
    pub service_role_key: String,
    /// Secret the backend signs access tokens with
    pub jwt_secret: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Where password-reset links land; the backend default when unset
    #[serde(default)]
    pub password_reset_redirect: Option<String>,
    #[serde(default = "default_temp_password_length")]
    pub temp_password_length: usize,
    /// Landing path after login when the client did not say where it came from
    #[serde(default = "default_redirect")]
    pub default_redirect: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_feed_capacity")]
    pub feed_capacity: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_temp_password_length() -> usize {
    24
}

fn default_redirect() -> String {
    "/dashboard".to_string()
}

fn default_poll_interval_secs() -> u64 {
    30
}

fn default_feed_capacity() -> usize {
    50
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("backend.url", "http://localhost:54321")?
            .set_default("backend.anon_key", "")?
            .set_default("backend.service_role_key", "")?
            .set_default("backend.jwt_secret", "super-secret-jwt-token-with-at-least-32-characters-long")?
            .set_default("backend.request_timeout_secs", 30)?
            .set_default("auth.temp_password_length", 24)?
            .set_default("auth.default_redirect", "/dashboard")?
            .set_default("notifications.poll_interval_secs", 30)?
            .set_default("notifications.feed_capacity", 50)?
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.backend.service_role_key.is_empty() {
            anyhow::bail!("BACKEND__SERVICE_ROLE_KEY must be set");
        }
        if self.auth.temp_password_length < 12 {
            anyhow::bail!("AUTH__TEMP_PASSWORD_LENGTH must be at least 12");
        }
        Ok(())
    }

    pub fn supabase(&self) -> SupabaseConfig {
        SupabaseConfig::new(
            self.backend.url.clone(),
            self.backend.anon_key.clone(),
            self.backend.service_role_key.clone(),
        )
        .with_timeout(Duration::from_secs(self.backend.request_timeout_secs))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.notifications.poll_interval_secs.max(1))
    }

    /// Configuration for tests and local tooling; never read from the environment.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: 0,
            },
            backend: BackendConfig {
                url: "http://localhost:54321".to_string(),
                anon_key: "anon".to_string(),
                service_role_key: "service".to_string(),
                jwt_secret: jwt_secret.to_string(),
                request_timeout_secs: default_request_timeout_secs(),
            },
            auth: AuthConfig {
                password_reset_redirect: None,
                temp_password_length: default_temp_password_length(),
                default_redirect: default_redirect(),
            },
            notifications: NotificationConfig {
                poll_interval_secs: default_poll_interval_secs(),
                feed_capacity: default_feed_capacity(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_short_temp_password() {
        let mut config = Config::for_tests("secret");
        assert!(config.validate().is_ok());

        config.auth.temp_password_length = 8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_supabase_config_carries_timeout() {
        let mut config = Config::for_tests("secret");
        config.backend.request_timeout_secs = 5;
        let supabase = config.supabase();
        assert_eq!(supabase.timeout, Duration::from_secs(5));
        assert_eq!(supabase.service_role_key, "service");
    }

    #[test]
    fn test_poll_interval_never_zero() {
        let mut config = Config::for_tests("secret");
        config.notifications.poll_interval_secs = 0;
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
    }
}

//! Client for the hosted backend-as-a-service
//!
//! The backend owns every piece of persistent state: authentication, the
//! relational tables and their row-level policies. This crate exposes it through
//! two traits so services can swap the HTTP implementation for the in-memory
//! one in tests:
//!
//! - [`AuthApi`]: sign-in, refresh, user lookup, sign-out, password recovery and
//!   the admin identity endpoints
//! - [`TableApi`]: table-scoped select/insert/upsert/update/delete with
//!   [`Query`] and [`Filter`] options
//!
//! # Example
//!
//! ```rust,no_run
//! use supabase_client::{Query, SupabaseClient, SupabaseConfig, TableApi};
//!
//! # async fn run() -> supabase_client::Result<()> {
//! let client = SupabaseClient::new(SupabaseConfig::new(
//!     "https://project.supabase.co",
//!     "anon-key",
//!     "service-role-key",
//! ))?;
//!
//! let users = client
//!     .rest()
//!     .select("backoffice_users", &Query::new().order("created_at", false))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
mod http;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
pub mod query;
pub mod rest;

use std::sync::Arc;
use std::time::Duration;

pub use auth::{AdminUserAttributes, AuthApi, AuthClient, AuthUser, Session};
pub use error::{BackendError, Result};
pub use query::{Filter, FilterOp, Order, Query};
pub use rest::{RestClient, Table, TableApi};

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`
    pub url: String,
    /// Public key sent as `apikey` on user-facing auth calls
    pub anon_key: String,
    /// Privileged key for admin auth calls and table access
    pub service_role_key: String,
    pub timeout: Duration,
}

impl SupabaseConfig {
    pub fn new(
        url: impl Into<String>,
        anon_key: impl Into<String>,
        service_role_key: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            anon_key: anon_key.into(),
            service_role_key: service_role_key.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// HTTP implementation of both backend APIs sharing one connection pool.
#[derive(Clone)]
pub struct SupabaseClient {
    auth: AuthClient,
    rest: RestClient,
}

impl SupabaseClient {
    pub fn new(config: SupabaseConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            auth: AuthClient::new(client.clone(), config.clone()),
            rest: RestClient::new(client, config),
        })
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    /// Split into trait objects for callers that only see the traits.
    pub fn into_apis(self) -> (Arc<dyn AuthApi>, Arc<dyn TableApi>) {
        (Arc::new(self.auth), Arc::new(self.rest))
    }
}

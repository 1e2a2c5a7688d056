//! In-memory backend
//!
//! Implements [`AuthApi`] and [`TableApi`] over process memory so services can
//! be exercised without a hosted project. Every call is recorded; individual
//! operations can be made to fail or to pause until released.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::auth::{AdminUserAttributes, AuthApi, AuthUser, Session};
use crate::error::{BackendError, Result};
use crate::query::{Filter, Query};
use crate::rest::TableApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Select,
    Insert,
    Upsert,
    Update,
    Delete,
    SignIn,
    Refresh,
    GetUser,
    SignOut,
    CreateIdentity,
    DeleteIdentity,
    ResetPassword,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: Operation,
    pub table: Option<String>,
}

/// Claims carried by the access tokens this backend mints.
#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    sub: Uuid,
    email: Option<String>,
    role: String,
    aud: String,
    session_id: Uuid,
    iat: i64,
    exp: i64,
}

struct Identity {
    user: AuthUser,
    password: String,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Value>>,
    identities: HashMap<Uuid, Identity>,
    /// refresh token -> (user id, session id)
    refresh_tokens: HashMap<String, (Uuid, Uuid)>,
    calls: Vec<Call>,
    failures: HashMap<Operation, (Option<String>, String)>,
    pauses: HashMap<Operation, Arc<Notify>>,
    cascades: Vec<String>,
    reset_emails: Vec<String>,
}

#[derive(Clone)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
    jwt_secret: Arc<String>,
}

/// A paused operation; calls of that operation wait until released.
pub struct PauseHandle {
    backend: MemoryBackend,
    op: Operation,
    notify: Arc<Notify>,
}

impl PauseHandle {
    /// Stop pausing new calls and let one waiting call through.
    pub fn release(self) {
        self.backend.state.lock().pauses.remove(&self.op);
        self.notify.notify_one();
    }
}

impl MemoryBackend {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            jwt_secret: Arc::new(jwt_secret.into()),
        }
    }

    /// Rows of `table` keyed by an identity id are removed with the identity.
    pub fn with_cascade(self, table: &str) -> Self {
        self.state.lock().cascades.push(table.to_string());
        self
    }

    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.state
            .lock()
            .tables
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.state.lock().tables.get(table).cloned().unwrap_or_default()
    }

    pub fn add_identity(&self, email: &str, password: &str) -> AuthUser {
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(email.to_string()),
            role: Some("authenticated".to_string()),
            email_confirmed_at: Some(Utc::now()),
            last_sign_in_at: None,
            created_at: Some(Utc::now()),
        };
        self.state.lock().identities.insert(
            user.id,
            Identity {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        user
    }

    pub fn has_identity(&self, user_id: Uuid) -> bool {
        self.state.lock().identities.contains_key(&user_id)
    }

    pub fn identity_count(&self) -> usize {
        self.state.lock().identities.len()
    }

    /// Make every call of `op` fail until cleared.
    pub fn fail(&self, op: Operation, message: &str) {
        self.state
            .lock()
            .failures
            .insert(op, (None, message.to_string()));
    }

    /// Make calls of `op` against `table` fail until cleared.
    pub fn fail_on(&self, op: Operation, table: &str, message: &str) {
        self.state
            .lock()
            .failures
            .insert(op, (Some(table.to_string()), message.to_string()));
    }

    pub fn clear_failures(&self) {
        self.state.lock().failures.clear();
    }

    pub fn pause(&self, op: Operation) -> PauseHandle {
        let notify = Arc::new(Notify::new());
        self.state.lock().pauses.insert(op, notify.clone());
        PauseHandle {
            backend: self.clone(),
            op,
            notify,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn count(&self, op: Operation) -> usize {
        self.state.lock().calls.iter().filter(|c| c.op == op).count()
    }

    pub fn count_on(&self, op: Operation, table: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.op == op && c.table.as_deref() == Some(table))
            .count()
    }

    pub fn reset_emails(&self) -> Vec<String> {
        self.state.lock().reset_emails.clone()
    }

    /// Mint an access token the way the hosted auth service would.
    pub fn issue_token(&self, user: &AuthUser, session_id: Uuid) -> String {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user.id,
            email: user.email.clone(),
            role: "authenticated".to_string(),
            aud: "authenticated".to_string(),
            session_id,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };

        // HS256 encoding with an in-memory key cannot fail
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .unwrap_or_default()
    }

    fn verify(&self, token: &str) -> Result<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&["authenticated"]);
        decode::<TokenClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| BackendError::api(StatusCode::UNAUTHORIZED, "invalid JWT"))
    }

    fn new_session(&self, state: &mut State, user: AuthUser, session_id: Uuid) -> Session {
        let refresh_token = Uuid::new_v4().simple().to_string();
        state
            .refresh_tokens
            .insert(refresh_token.clone(), (user.id, session_id));

        Session {
            access_token: self.issue_token(&user, session_id),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            expires_at: Some((Utc::now() + Duration::hours(1)).timestamp()),
            refresh_token,
            user,
        }
    }

    /// Record the call, wait out any pause, then apply injected failures.
    async fn enter(&self, op: Operation, table: Option<&str>) -> Result<()> {
        let pause = {
            let mut state = self.state.lock();
            state.calls.push(Call {
                op,
                table: table.map(str::to_string),
            });
            state.pauses.get(&op).cloned()
        };

        if let Some(notify) = pause {
            notify.notified().await;
        }

        let state = self.state.lock();
        if let Some((only_table, message)) = state.failures.get(&op) {
            let applies = match only_table {
                Some(t) => table == Some(t.as_str()),
                None => true,
            };
            if applies {
                return Err(BackendError::api(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    message.clone(),
                ));
            }
        }
        Ok(())
    }
}

fn rows_of(value: Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => rows,
        row => vec![row],
    }
}

fn prepare_row(row: Value) -> Result<Value> {
    let Value::Object(mut map) = row else {
        return Err(BackendError::InvalidRequest("row must be a JSON object".into()));
    };
    map.entry("id")
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    map.entry("created_at")
        .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
    Ok(Value::Object(map))
}

fn merge(target: &mut Value, patch: &Map<String, Value>) {
    if let Value::Object(map) = target {
        for (k, v) in patch {
            map.insert(k.clone(), v.clone());
        }
    }
}

#[async_trait]
impl TableApi for MemoryBackend {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        self.enter(Operation::Select, Some(table)).await?;
        let rows = self.rows(table);
        Ok(query.apply(rows))
    }

    async fn insert(&self, table: &str, rows: Value) -> Result<Vec<Value>> {
        self.enter(Operation::Insert, Some(table)).await?;
        let prepared = rows_of(rows)
            .into_iter()
            .map(prepare_row)
            .collect::<Result<Vec<_>>>()?;

        let mut state = self.state.lock();
        let existing = state.tables.entry(table.to_string()).or_default();
        for row in &prepared {
            if existing.iter().any(|r| r.get("id") == row.get("id")) {
                return Err(BackendError::api(
                    StatusCode::CONFLICT,
                    format!("duplicate key value violates unique constraint \"{}_pkey\"", table),
                ));
            }
        }
        existing.extend(prepared.iter().cloned());
        Ok(prepared)
    }

    async fn upsert(&self, table: &str, rows: Value, on_conflict: &str) -> Result<Vec<Value>> {
        self.enter(Operation::Upsert, Some(table)).await?;
        let mut state = self.state.lock();
        let existing = state.tables.entry(table.to_string()).or_default();
        let mut out = Vec::new();

        for row in rows_of(rows) {
            let position = row
                .get(on_conflict)
                .and_then(|key| existing.iter().position(|r| r.get(on_conflict) == Some(key)));
            match position {
                Some(i) => {
                    if let Value::Object(patch) = &row {
                        merge(&mut existing[i], patch);
                    }
                    out.push(existing[i].clone());
                }
                None => {
                    let row = prepare_row(row)?;
                    existing.push(row.clone());
                    out.push(row);
                }
            }
        }
        Ok(out)
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<Vec<Value>> {
        self.enter(Operation::Update, Some(table)).await?;
        let Value::Object(patch) = patch else {
            return Err(BackendError::InvalidRequest("patch must be a JSON object".into()));
        };

        let mut state = self.state.lock();
        let mut out = Vec::new();
        if let Some(rows) = state.tables.get_mut(table) {
            for row in rows.iter_mut().filter(|r| filter.matches(r)) {
                merge(row, &patch);
                out.push(row.clone());
            }
        }
        Ok(out)
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<Vec<Value>> {
        self.enter(Operation::Delete, Some(table)).await?;
        let mut state = self.state.lock();
        let mut removed = Vec::new();
        if let Some(rows) = state.tables.get_mut(table) {
            let (gone, kept): (Vec<Value>, Vec<Value>) =
                rows.drain(..).partition(|r| filter.matches(r));
            *rows = kept;
            removed = gone;
        }
        Ok(removed)
    }
}

#[async_trait]
impl AuthApi for MemoryBackend {
    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session> {
        self.enter(Operation::SignIn, None).await?;
        let mut state = self.state.lock();

        let user = state
            .identities
            .values_mut()
            .find(|i| i.user.email.as_deref() == Some(email) && i.password == password)
            .map(|i| {
                i.user.last_sign_in_at = Some(Utc::now());
                i.user.clone()
            })
            .ok_or_else(|| BackendError::api(StatusCode::BAD_REQUEST, "Invalid login credentials"))?;

        Ok(self.new_session(&mut state, user, Uuid::new_v4()))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        self.enter(Operation::Refresh, None).await?;
        let mut state = self.state.lock();

        let (user_id, session_id) = state
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| BackendError::api(StatusCode::BAD_REQUEST, "Invalid Refresh Token"))?;
        let user = state
            .identities
            .get(&user_id)
            .map(|i| i.user.clone())
            .ok_or_else(|| BackendError::NotFound("user".into()))?;

        Ok(self.new_session(&mut state, user, session_id))
    }

    async fn get_user(&self, access_token: &str) -> Result<AuthUser> {
        self.enter(Operation::GetUser, None).await?;
        let claims = self.verify(access_token)?;
        self.state
            .lock()
            .identities
            .get(&claims.sub)
            .map(|i| i.user.clone())
            .ok_or_else(|| BackendError::NotFound("user".into()))
    }

    async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.enter(Operation::SignOut, None).await?;
        let claims = self.verify(access_token)?;
        self.state
            .lock()
            .refresh_tokens
            .retain(|_, (_, session)| *session != claims.session_id);
        Ok(())
    }

    async fn admin_create_user(&self, attributes: &AdminUserAttributes) -> Result<AuthUser> {
        self.enter(Operation::CreateIdentity, None).await?;
        let mut state = self.state.lock();

        if state
            .identities
            .values()
            .any(|i| i.user.email.as_deref() == Some(attributes.email.as_str()))
        {
            return Err(BackendError::api(
                StatusCode::UNPROCESSABLE_ENTITY,
                "A user with this email address has already been registered",
            ));
        }

        let now = Utc::now();
        let user = AuthUser {
            id: Uuid::new_v4(),
            email: Some(attributes.email.clone()),
            role: Some("authenticated".to_string()),
            email_confirmed_at: attributes.email_confirm.then_some(now),
            last_sign_in_at: None,
            created_at: Some(now),
        };
        state.identities.insert(
            user.id,
            Identity {
                user: user.clone(),
                password: attributes.password.clone(),
            },
        );
        Ok(user)
    }

    async fn admin_delete_user(&self, user_id: Uuid) -> Result<()> {
        self.enter(Operation::DeleteIdentity, None).await?;
        let mut state = self.state.lock();

        if state.identities.remove(&user_id).is_none() {
            return Err(BackendError::api(StatusCode::NOT_FOUND, "User not found"));
        }
        state.refresh_tokens.retain(|_, (user, _)| *user != user_id);

        let id = Value::String(user_id.to_string());
        let cascades = state.cascades.clone();
        for table in cascades {
            if let Some(rows) = state.tables.get_mut(&table) {
                rows.retain(|r| r.get("id") != Some(&id));
            }
        }
        Ok(())
    }

    async fn reset_password_for_email(&self, email: &str, _redirect_to: Option<&str>) -> Result<()> {
        self.enter(Operation::ResetPassword, None).await?;
        self.state.lock().reset_emails.push(email.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn backend() -> MemoryBackend {
        MemoryBackend::new("test-secret").with_cascade("backoffice_users")
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_rejects_duplicates() {
        let backend = backend();
        let rows = backend
            .insert("rooms", json!({ "number": "A1" }))
            .await
            .unwrap();
        let id = rows[0]["id"].clone();
        assert!(id.is_string());

        let err = backend
            .insert("rooms", json!({ "id": id, "number": "A2" }))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert_eq!(backend.rows("rooms").len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_by_filter() {
        let backend = backend();
        backend.seed(
            "tenants",
            vec![
                json!({ "id": "t1", "status": "active" }),
                json!({ "id": "t2", "status": "active" }),
            ],
        );

        let updated = backend
            .update("tenants", &Filter::new().eq("id", "t1"), json!({ "status": "moved_out" }))
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["status"], "moved_out");

        let removed = backend
            .delete("tenants", &Filter::new().eq("status", "active"))
            .await
            .unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(backend.rows("tenants")[0]["id"], "t1");
    }

    #[tokio::test]
    async fn test_upsert_merges_on_conflict_column() {
        let backend = backend();
        backend
            .upsert("property_settings", json!({ "property_id": "p1", "currency": "IDR" }), "property_id")
            .await
            .unwrap();
        backend
            .upsert("property_settings", json!({ "property_id": "p1", "late_fee": 50000 }), "property_id")
            .await
            .unwrap();

        let rows = backend.rows("property_settings");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["currency"], "IDR");
        assert_eq!(rows[0]["late_fee"], 50000);
    }

    #[tokio::test]
    async fn test_sign_in_issues_verifiable_token() {
        let backend = backend();
        let user = backend.add_identity("ops@kostra.id", "s3cret!");

        let err = backend
            .sign_in_with_password("ops@kostra.id", "wrong")
            .await
            .unwrap_err();
        assert!(err.is_auth_failure());

        let session = backend
            .sign_in_with_password("ops@kostra.id", "s3cret!")
            .await
            .unwrap();
        let resolved = backend.get_user(&session.access_token).await.unwrap();
        assert_eq!(resolved.id, user.id);

        let refreshed = backend.refresh_session(&session.refresh_token).await.unwrap();
        assert!(backend.refresh_session(&session.refresh_token).await.is_err());
        assert_eq!(refreshed.user.id, user.id);
    }

    #[tokio::test]
    async fn test_delete_identity_cascades_profile() {
        let backend = backend();
        let user = backend
            .admin_create_user(&AdminUserAttributes {
                email: "new@kostra.id".into(),
                password: "tmp".into(),
                email_confirm: true,
            })
            .await
            .unwrap();
        assert!(user.email_confirmed_at.is_some());
        backend.seed("backoffice_users", vec![json!({ "id": user.id.to_string() })]);

        backend.admin_delete_user(user.id).await.unwrap();
        assert!(backend.rows("backoffice_users").is_empty());
        assert!(!backend.has_identity(user.id));
    }

    #[tokio::test]
    async fn test_injected_failure_is_scoped_to_table() {
        let backend = backend();
        backend.fail_on(Operation::Insert, "backoffice_users", "permission denied");

        assert!(backend.insert("rooms", json!({})).await.is_ok());
        assert!(backend.insert("backoffice_users", json!({})).await.is_err());
        assert_eq!(backend.count_on(Operation::Insert, "backoffice_users"), 1);

        backend.clear_failures();
        assert!(backend.insert("backoffice_users", json!({})).await.is_ok());
    }

    #[tokio::test]
    async fn test_paused_operation_waits_for_release() {
        let backend = backend();
        let handle = backend.pause(Operation::Select);

        let task = {
            let backend = backend.clone();
            tokio::spawn(async move { backend.select("rooms", &Query::new()).await })
        };

        while backend.count(Operation::Select) == 0 {
            tokio::task::yield_now().await;
        }
        assert!(!task.is_finished());

        handle.release();
        assert!(task.await.unwrap().is_ok());
    }
}

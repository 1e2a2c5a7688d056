//! Table REST client
//!
//! Every call is scoped to one named table under `{url}/rest/v1/{table}` and
//! uses the service-role key. Rows travel as JSON values; [`Table`] layers a
//! typed view on top for callers that own a row model.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

use crate::error::{BackendError, Result};
use crate::http::read_json;
use crate::query::{encode_params, Filter, Query};
use crate::SupabaseConfig;

#[async_trait]
pub trait TableApi: Send + Sync {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>>;

    /// Insert one row or an array of rows; returns the stored rows.
    async fn insert(&self, table: &str, rows: Value) -> Result<Vec<Value>>;

    /// Insert or update on primary-key conflict.
    async fn upsert(&self, table: &str, rows: Value, on_conflict: &str) -> Result<Vec<Value>>;

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<Vec<Value>>;

    async fn delete(&self, table: &str, filter: &Filter) -> Result<Vec<Value>>;
}

const RETURN_ROWS: &str = "return=representation";

#[derive(Clone)]
pub struct RestClient {
    client: Client,
    config: SupabaseConfig,
}

impl RestClient {
    pub fn new(client: Client, config: SupabaseConfig) -> Self {
        Self { client, config }
    }

    fn url(&self, table: &str, params: &[(String, String)]) -> String {
        let base = format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), table);
        if params.is_empty() {
            base
        } else {
            format!("{}?{}", base, encode_params(params))
        }
    }

    fn request(&self, method: reqwest::Method, url: String, prefer: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.config.service_role_key)
            .bearer_auth(&self.config.service_role_key)
            .header("Prefer", prefer)
    }
}

/// Mutations without a filter would hit every row of the table.
fn require_filter(table: &str, filter: &Filter) -> Result<()> {
    if filter.is_empty() {
        return Err(BackendError::InvalidRequest(format!(
            "refusing unfiltered mutation on {}",
            table
        )));
    }
    Ok(())
}

#[async_trait]
impl TableApi for RestClient {
    async fn select(&self, table: &str, query: &Query) -> Result<Vec<Value>> {
        let url = self.url(table, &query.to_params());
        debug!(table = %table, "select");
        let response = self.request(reqwest::Method::GET, url, RETURN_ROWS).send().await?;
        read_json(response).await
    }

    async fn insert(&self, table: &str, rows: Value) -> Result<Vec<Value>> {
        debug!(table = %table, "insert");
        let response = self
            .request(reqwest::Method::POST, self.url(table, &[]), RETURN_ROWS)
            .json(&rows)
            .send()
            .await?;
        read_json(response).await
    }

    async fn upsert(&self, table: &str, rows: Value, on_conflict: &str) -> Result<Vec<Value>> {
        debug!(table = %table, on_conflict = %on_conflict, "upsert");
        let params = vec![("on_conflict".to_string(), on_conflict.to_string())];
        let response = self
            .request(
                reqwest::Method::POST,
                self.url(table, &params),
                "return=representation,resolution=merge-duplicates",
            )
            .json(&rows)
            .send()
            .await?;
        read_json(response).await
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<Vec<Value>> {
        require_filter(table, filter)?;
        debug!(table = %table, "update");
        let response = self
            .request(reqwest::Method::PATCH, self.url(table, &filter.to_params()), RETURN_ROWS)
            .json(&patch)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<Vec<Value>> {
        require_filter(table, filter)?;
        debug!(table = %table, "delete");
        let response = self
            .request(reqwest::Method::DELETE, self.url(table, &filter.to_params()), RETURN_ROWS)
            .send()
            .await?;
        read_json(response).await
    }
}

/// Typed handle on one table.
pub struct Table<T> {
    api: Arc<dyn TableApi>,
    name: &'static str,
    _row: PhantomData<fn() -> T>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            name: self.name,
            _row: PhantomData,
        }
    }
}

impl<T> Table<T>
where
    T: DeserializeOwned,
{
    pub fn new(api: Arc<dyn TableApi>, name: &'static str) -> Self {
        Self {
            api,
            name,
            _row: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn list(&self, query: &Query) -> Result<Vec<T>> {
        let rows = self.api.select(self.name, query).await?;
        decode_rows(rows)
    }

    pub async fn find(&self, filter: Filter) -> Result<Option<T>> {
        let rows = self
            .api
            .select(self.name, &Query::new().filter(filter).limit(1))
            .await?;
        Ok(decode_rows(rows)?.into_iter().next())
    }

    pub async fn insert(&self, row: &impl Serialize) -> Result<T> {
        let rows = self.api.insert(self.name, serde_json::to_value(row)?).await?;
        first_row(self.name, rows)
    }

    pub async fn upsert(&self, row: &impl Serialize, on_conflict: &str) -> Result<T> {
        let rows = self
            .api
            .upsert(self.name, serde_json::to_value(row)?, on_conflict)
            .await?;
        first_row(self.name, rows)
    }

    pub async fn update(&self, filter: &Filter, patch: &impl Serialize) -> Result<Vec<T>> {
        let rows = self
            .api
            .update(self.name, filter, serde_json::to_value(patch)?)
            .await?;
        decode_rows(rows)
    }

    pub async fn delete(&self, filter: &Filter) -> Result<usize> {
        Ok(self.api.delete(self.name, filter).await?.len())
    }
}

fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(BackendError::from))
        .collect()
}

fn first_row<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Result<T> {
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::NotFound(format!("{} returned no row", table)))?;
    Ok(serde_json::from_value(row)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> RestClient {
        RestClient::new(
            Client::new(),
            SupabaseConfig::new("https://abc.supabase.co", "anon", "service"),
        )
    }

    #[test]
    fn test_url_with_query() {
        let query = Query::new().order("created_at", false);
        assert_eq!(
            client().url("backoffice_users", &query.to_params()),
            "https://abc.supabase.co/rest/v1/backoffice_users?select=%2A&order=created_at.desc"
        );
    }

    #[test]
    fn test_url_without_params() {
        assert_eq!(client().url("rooms", &[]), "https://abc.supabase.co/rest/v1/rooms");
    }

    #[tokio::test]
    async fn test_unfiltered_delete_is_refused() {
        let err = client().delete("tenants", &Filter::new()).await.unwrap_err();
        assert!(matches!(err, BackendError::InvalidRequest(_)));
    }
}

// Response handling shared by the auth and rest clients

use reqwest::Response;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::{BackendError, Result};

/// Pass a success response through; turn anything else into `BackendError::Api`.
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    let message = error_message(&body);
    warn!(status = %status, message = %message, "Backend returned error");

    Err(BackendError::api(status, message))
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let response = ensure_success(response).await?;
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Auth and rest endpoints report errors under different keys.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };

    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| body.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_description() {
        let body = r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#;
        assert_eq!(error_message(body), "Invalid login credentials");
    }

    #[test]
    fn test_error_message_rest_shape() {
        let body = r#"{"code":"23505","message":"duplicate key value","details":null}"#;
        assert_eq!(error_message(body), "duplicate key value");
    }

    #[test]
    fn test_error_message_plain_text() {
        assert_eq!(error_message("upstream timeout"), "upstream timeout");
    }
}

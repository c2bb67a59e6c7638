//! Base HTTP client with shared logic

use crate::infrastructure::model::types::ModelError;
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;

/// Base HTTP client with shared functionality
#[derive(Clone)]
pub struct HttpClientBase {
    pub id: String,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub http: Client,
}

impl HttpClientBase {
    pub fn new(id: String, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            id,
            endpoint,
            api_key,
            http: Client::new(),
        }
    }

    /// Build URL from endpoint and path segments; each segment is percent-encoded
    pub fn build_url(&self, segments: &[&str]) -> Result<Url, ModelError> {
        let mut url = Url::parse(self.endpoint.trim_end_matches('/'))
            .map_err(|err| ModelError::invalid_endpoint(&self.id, err.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| ModelError::invalid_endpoint(&self.id, "endpoint cannot be a base URL"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Post JSON with bearer auth. Non-success statuses surface the
    /// service's `message` field when it sends one.
    pub async fn post_with_bearer<Req>(&self, url: Url, body: &Req) -> Result<Value, ModelError>
    where
        Req: Serialize,
    {
        let api_key = self.require_api_key()?;

        let response = self
            .http
            .post(url)
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::network(&self.id, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|value| {
                    value
                        .get("message")
                        .or_else(|| value.get("Message"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or(text);
            return Err(ModelError::api(&self.id, status, message));
        }

        response
            .json()
            .await
            .map_err(|e| ModelError::network(&self.id, e))
    }

    fn require_api_key(&self) -> Result<&str, ModelError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ModelError::missing_api_key(&self.id))
    }
}

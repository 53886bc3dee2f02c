//! Shared REST plumbing for the evaluation platform API.
//!
//! All vendor traffic goes through this client: credential headers, URL
//! joining, status handling, and JSON decoding live here so the per-area
//! adapters stay thin.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::Credentials;

/// Evaluation platform API client.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    base_url: String,
    api_key: String,
    secret_key: String,
    http: reqwest::Client,
}

impl PlatformClient {
    /// Create a new client from resolved credentials.
    pub fn new(creds: &Credentials) -> Self {
        Self {
            base_url: creds.base_url.trim_end_matches('/').to_string(),
            api_key: creds.api_key.clone(),
            secret_key: creds.secret_key.clone(),
            http: reqwest::Client::new(),
        }
    }

    /// Build the full URL for an API path.
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a JSON document.
    pub async fn get_json(&self, path: &str) -> Result<Value> {
        debug!("platform GET {}", path);

        let resp = self
            .http
            .get(self.url(path))
            .header("X-Api-Key", &self.api_key)
            .header("X-Secret-Key", &self.secret_key)
            .send()
            .await
            .with_context(|| format!("Platform request failed: GET {path}"))?;

        Self::decode(path, resp).await
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_json<B>(&self, path: &str, body: &B) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.post_inner(path, body, None).await
    }

    /// POST with a per-request timeout, forwarded from the caller.
    pub async fn post_json_with_timeout<B>(
        &self,
        path: &str,
        body: &B,
        timeout: Duration,
    ) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        self.post_inner(path, body, Some(timeout)).await
    }

    async fn post_inner<B>(&self, path: &str, body: &B, timeout: Option<Duration>) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        debug!("platform POST {}", path);

        let mut request = self
            .http
            .post(self.url(path))
            .header("X-Api-Key", &self.api_key)
            .header("X-Secret-Key", &self.secret_key)
            .json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let resp = request
            .send()
            .await
            .with_context(|| format!("Platform request failed: POST {path}"))?;

        Self::decode(path, resp).await
    }

    async fn decode(path: &str, resp: reqwest::Response) -> Result<Value> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            bail!("Platform request to {path} failed ({status}): {body}");
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse platform response from {path}"))
    }
}

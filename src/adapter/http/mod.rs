//! HTTP adapter for the backend's authenticated cart endpoints.
//!
//! Endpoints, relative to the configured base URL:
//!
//! - `GET /cart` - authoritative snapshot
//! - `POST /cart/items` - add an item (server merges duplicates)
//! - `PUT /cart/items/{id}` - replace a line's quantity
//! - `DELETE /cart/items/{id}` - remove a line
//! - `DELETE /cart` - empty the cart
//! - `POST /cart/merge` - fold the anonymous cart into the user's cart
//!
//! Reads are retried on timeout/connect failures; mutations are issued once,
//! since the store recovers from their failures by resynchronizing anyway.

pub mod dto;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tokio::time::sleep;
use tracing::{debug, warn};

use self::dto::{AddItemRequest, CreatedLineResponse, RemoteCartResponse, UpdateItemRequest};
use crate::config::RemoteConfig;
use crate::domain::RemoteLineId;
use crate::error::{RemoteCartError, Result};
use crate::port::{AccessTokens, NewRemoteItem, RemoteCart, RemoteCartView};

/// HTTP client for the cart REST API.
pub struct HttpCartClient {
    http: HttpClient,
    base_url: String,
    tokens: Arc<dyn AccessTokens>,
    retry_max_attempts: u32,
    retry_backoff_ms: u64,
}

impl HttpCartClient {
    /// Create a client with default HTTP settings and no retries.
    #[must_use]
    pub fn new(base_url: impl Into<String>, tokens: Arc<dyn AccessTokens>) -> Self {
        Self {
            http: HttpClient::new(),
            base_url: base_url.into(),
            tokens,
            retry_max_attempts: 1,
            retry_backoff_ms: 0,
        }
    }

    #[must_use]
    pub fn from_config(config: &RemoteConfig, tokens: Arc<dyn AccessTokens>) -> Self {
        let http = HttpClient::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "Failed to build HTTP client, using defaults");
                HttpClient::new()
            });

        Self {
            http,
            base_url: config.base_url.clone(),
            tokens,
            retry_max_attempts: config.retry_max_attempts,
            retry_backoff_ms: config.retry_backoff_ms,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    fn authed(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.tokens.bearer() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_with_retry<T>(&self, url: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut attempt = 0;
        let max_attempts = self.retry_max_attempts.max(1);

        loop {
            attempt += 1;
            let response = self.authed(self.http.get(url)).send().await;
            let response = match response {
                Ok(response) => response,
                Err(err) => {
                    if attempt >= max_attempts || !Self::should_retry(&err) {
                        return Err(err.into());
                    }
                    self.backoff(attempt, max_attempts, &err).await;
                    continue;
                }
            };

            let response = match response.error_for_status() {
                Ok(response) => response,
                Err(err) => return Err(err.into()),
            };

            match response.json::<T>().await {
                Ok(parsed) => return Ok(parsed),
                Err(err) => {
                    if attempt >= max_attempts || !Self::should_retry(&err) {
                        return Err(err.into());
                    }
                    self.backoff(attempt, max_attempts, &err).await;
                }
            }
        }
    }

    fn should_retry(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }

    async fn backoff(&self, attempt: u32, max_attempts: u32, err: &reqwest::Error) {
        warn!(
            attempt,
            max_attempts,
            error = %err,
            "Cart request failed, retrying"
        );
        if self.retry_backoff_ms > 0 {
            sleep(Duration::from_millis(self.retry_backoff_ms)).await;
        }
    }

    async fn send_expecting_success(&self, request: reqwest::RequestBuilder) -> Result<()> {
        self.authed(request).send().await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl RemoteCart for HttpCartClient {
    async fn get_cart(&self) -> Result<RemoteCartView> {
        let url = self.url("/cart");
        debug!(url = %url, "Fetching remote cart");
        let response: RemoteCartResponse = self.get_with_retry(&url).await?;
        Ok(RemoteCartView::from(response))
    }

    async fn add_item(&self, item: &NewRemoteItem) -> Result<Option<RemoteLineId>> {
        let url = self.url("/cart/items");
        debug!(url = %url, product = %item.product_id, quantity = item.quantity, "Adding cart item");

        let response = self
            .authed(self.http.post(&url).json(&AddItemRequest::from(item)))
            .send()
            .await?
            .error_for_status()?;

        let body = response
            .bytes()
            .await
            .map_err(RemoteCartError::Transport)?;
        if body.is_empty() {
            return Ok(None);
        }
        let created: CreatedLineResponse = serde_json::from_slice(&body)?;
        Ok(created.id.map(RemoteLineId::new))
    }

    async fn update_item(&self, id: RemoteLineId, quantity: u32) -> Result<()> {
        let url = self.url(&format!("/cart/items/{id}"));
        debug!(url = %url, quantity, "Updating cart item quantity");
        self.send_expecting_success(self.http.put(&url).json(&UpdateItemRequest { quantity }))
            .await
    }

    async fn remove_item(&self, id: RemoteLineId) -> Result<()> {
        let url = self.url(&format!("/cart/items/{id}"));
        debug!(url = %url, "Removing cart item");
        self.send_expecting_success(self.http.delete(&url)).await
    }

    async fn clear(&self) -> Result<()> {
        let url = self.url("/cart");
        debug!(url = %url, "Clearing remote cart");
        self.send_expecting_success(self.http.delete(&url)).await
    }

    async fn merge_from_anonymous(&self) -> Result<()> {
        let url = self.url("/cart/merge");
        debug!(url = %url, "Merging anonymous cart into remote cart");
        self.send_expecting_success(self.http.post(&url)).await
    }
}

//! HTTP adapter for the remote order source
//!
//! Talks to the hosted ordering storefront over its REST interface.
//! Pending orders live in an `orders` collection filtered by status;
//! marking synced is a status update on the same collection.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use super::{RemoteOrder, RemoteOrderSource};
use crate::utils::{AppError, AppResult};

const REQUEST_TIMEOUT_SECS: u64 = 30;

pub struct HttpRemoteSource {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpRemoteSource {
    /// Create a new client for the remote storefront
    ///
    /// `base_url` is the service root (e.g. "https://xyz.example.co");
    /// `api_key` is sent as both the `apikey` header and a bearer token.
    pub fn new(base_url: String, api_key: String) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::Remote(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn orders_url(&self) -> String {
        format!("{}/rest/v1/orders", self.base_url)
    }
}

#[async_trait]
impl RemoteOrderSource for HttpRemoteSource {
    async fn fetch_pending(&self) -> AppResult<Vec<RemoteOrder>> {
        let response = self
            .client
            .get(self.orders_url())
            .query(&[("status", "eq.pending"), ("select", "*")])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AppError::Remote(format!("Fetch pending orders failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!(
                "Fetch pending orders failed with status {status}: {body}"
            )));
        }

        let orders: Vec<RemoteOrder> = response
            .json()
            .await
            .map_err(|e| AppError::Remote(format!("Failed to parse pending orders: {e}")))?;

        Ok(orders)
    }

    async fn mark_synced(&self, remote_id: &str) -> AppResult<()> {
        let response = self
            .client
            .patch(self.orders_url())
            .query(&[("id", format!("eq.{remote_id}"))])
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .json(&json!({ "status": "synced" }))
            .send()
            .await
            .map_err(|e| AppError::Remote(format!("Mark synced failed for {remote_id}: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!(
                "Mark synced failed for {remote_id} with status {status}: {body}"
            )));
        }

        Ok(())
    }
}

//! HTTP client for the two outbound notifications of a pipeline run.
//!
//! `submit_results` POSTs the document payload to the results endpoint;
//! `request_cleanup` sends `DELETE {"documentId": ...}` so the source images
//! can be removed. Any non-2xx status is reported as an error.
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Serialize;
use std::time::Duration;

use docmark_core::config::NotifySettings;
use docmark_core::traits::Notifier;
use docmark_core::types::Document;
use docmark_core::Error;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CleanupRequest<'a> {
    document_id: &'a str,
}

#[derive(Clone)]
pub struct HttpNotifier {
    client: Client,
    results_endpoint: String,
    delete_images_endpoint: String,
}

impl HttpNotifier {
    pub fn new(results_endpoint: String, delete_images_endpoint: String, timeout: Duration, accept_invalid_certs: bool) -> Result<Self> {
        anyhow::ensure!(!results_endpoint.trim().is_empty(), "missing results endpoint");
        anyhow::ensure!(!delete_images_endpoint.trim().is_empty(), "missing delete-images endpoint");
        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(accept_invalid_certs)
            .build()
            .context("failed to build notification HTTP client")?;
        Ok(Self { client, results_endpoint, delete_images_endpoint })
    }

    pub fn from_settings(settings: &NotifySettings) -> Result<Self> {
        Self::new(
            settings.results_endpoint.clone(),
            settings.delete_images_endpoint.clone(),
            Duration::from_secs(settings.timeout_secs),
            settings.accept_invalid_certs,
        )
    }
}

async fn check(response: Response, what: &str) -> Result<()> {
    let status = response.status();
    let body = response.text().await.unwrap_or_else(|_| "<body unavailable>".to_string());
    tracing::info!(%status, %body, "{} response", what);
    if status.is_success() {
        return Ok(());
    }
    Err(Error::DispatchFailure(format!("{} returned {}: {}", what, status, body)).into())
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn submit_results(&self, document: &Document) -> Result<()> {
        let payload = document.to_payload().context("serializing document payload")?;
        tracing::info!(endpoint = %self.results_endpoint, document_id = document.document_id(), "submitting bookmarks");
        tracing::debug!(%payload, "results payload");
        let response = self
            .client
            .post(&self.results_endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::DispatchFailure(format!("POST {} failed: {}", self.results_endpoint, e)))?;
        check(response, "results endpoint").await
    }

    async fn request_cleanup(&self, document_id: &str) -> Result<()> {
        tracing::info!(endpoint = %self.delete_images_endpoint, document_id, "requesting image cleanup");
        let response = self
            .client
            .delete(&self.delete_images_endpoint)
            .json(&CleanupRequest { document_id })
            .send()
            .await
            .map_err(|e| Error::DispatchFailure(format!("DELETE {} failed: {}", self.delete_images_endpoint, e)))?;
        check(response, "delete-images endpoint").await
    }
}

//! QI REST API client.
//!
//! Thin typed wrapper over the queue's job endpoints:
//!
//! ```text
//!   POST /jobs                submit circuits        → job record
//!   GET  /jobs/{id}           poll status
//!   GET  /jobs/{id}/results   per-circuit histograms (completed jobs only)
//! ```

use std::collections::HashMap;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use clifftest_ir::Circuit;

use crate::error::{QiError, QiResult};

/// QI REST API client.
#[derive(Debug, Clone)]
pub struct QiClient {
    client: Client,
    base_url: String,
    token: String,
}

impl QiClient {
    /// Create a new QI client.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> QiResult<Self> {
        let base_url = base_url.into();
        let token = token.into();

        if token.is_empty() {
            return Err(QiError::MissingToken);
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .map_err(QiError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Submit circuits for execution.
    pub async fn submit_job(&self, request: &SubmitRequest) -> QiResult<SubmitResponse> {
        let url = format!("{}/jobs", self.base_url);
        debug!(%url, circuits = request.circuits.len(), "submitting job");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(request)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get the status of a job.
    pub async fn get_job_status(&self, job_id: &str) -> QiResult<JobStatusResponse> {
        let url = format!("{}/jobs/{}", self.base_url, job_id);
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get the per-circuit histograms of a completed job.
    pub async fn get_job_results(&self, job_id: &str) -> QiResult<JobResultsResponse> {
        let url = format!("{}/jobs/{}/results", self.base_url, job_id);
        debug!(%url, "fetching job results");

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        self.handle_response(response).await
    }

    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> QiResult<T> {
        let status = response.status();

        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let code = status.as_u16();
            let message = response.text().await.unwrap_or_default();

            match status {
                StatusCode::UNAUTHORIZED => Err(QiError::MissingToken),
                StatusCode::NOT_FOUND => Err(QiError::JobNotFound(message)),
                _ => Err(QiError::Api {
                    status: code,
                    message,
                }),
            }
        }
    }
}

// ── Request / Response types ──────────────────────────────────────────

/// Job submission request.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitRequest {
    /// Target device name.
    pub backend: String,
    /// Circuits, executed jointly; result index i belongs to circuit i.
    pub circuits: Vec<Circuit>,
    /// Shots per circuit.
    pub shots: u32,
}

/// Job submission response.
///
/// The queue may accept work before assigning it a public id; `id` is then
/// absent or empty until the job registers.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    /// Public job id, once registered.
    #[serde(default)]
    pub id: Option<String>,
    /// Queue state at submission time.
    pub status: String,
}

impl SubmitResponse {
    /// The registered id, treating an empty string as unregistered.
    pub fn registered_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Job status response.
#[derive(Debug, Clone, Deserialize)]
pub struct JobStatusResponse {
    /// Job id.
    pub id: String,
    /// Queue state.
    pub status: String,
    /// Optional detail, set on failure.
    #[serde(default)]
    pub message: Option<String>,
}

impl JobStatusResponse {
    /// Whether the job is still waiting or running.
    pub fn is_pending(&self) -> bool {
        matches!(
            self.status.to_lowercase().as_str(),
            "pending" | "queued" | "running" | "executing" | "submitted"
        )
    }

    /// Whether the job completed successfully.
    pub fn is_completed(&self) -> bool {
        matches!(
            self.status.to_lowercase().as_str(),
            "completed" | "ready" | "done"
        )
    }

    /// Whether the job failed or was cancelled.
    pub fn is_failed(&self) -> bool {
        matches!(
            self.status.to_lowercase().as_str(),
            "failed" | "error" | "aborted" | "cancelled"
        )
    }
}

/// Job results response: one histogram per submitted circuit, in
/// submission order.
#[derive(Debug, Clone, Deserialize)]
pub struct JobResultsResponse {
    /// Job id.
    pub id: String,
    /// Per-circuit histograms, bitstring → count.
    pub results: Vec<HashMap<String, u64>>,
    /// Shots per circuit.
    pub shots: u32,
}

//! QI backend implementation.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use clifftest_hal::{
    Backend, BackendConfig, Counts, ExecutionResult, HalError, HalResult, JobHandle, JobId,
    Retrieval, TranspileFn, job,
};
use clifftest_ir::Circuit;

use crate::api::{QiClient, SubmitRequest};
use crate::error::{QiError, QiResult};

/// Default QI API endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.quantum-inspire.com/v1";

/// Default target device.
pub const DEFAULT_TARGET: &str = "Tuna-9";

/// Default status poll interval.
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Tuna-9 physical qubit priority, best-calibrated first.
///
/// See the device's operational specifics; an n-qubit circuit is laid out
/// on the first n entries.
const TUNA_9_QUBIT_PRIORITY: [usize; 9] = [4, 1, 2, 6, 7, 0, 3, 5, 8];

/// A transpile pass that relabels logical qubits onto the Tuna-9 priority
/// layout. Circuits wider than the device are passed through unchanged;
/// submission will reject them.
pub fn tuna9_transpile() -> TranspileFn {
    std::sync::Arc::new(|qc: &Circuit| {
        let n = qc.num_qubits();
        if n > TUNA_9_QUBIT_PRIORITY.len() {
            return qc.clone();
        }
        let mut out = Circuit::new(qc.name(), TUNA_9_QUBIT_PRIORITY.len(), qc.num_clbits());
        match out.compose(qc, &TUNA_9_QUBIT_PRIORITY[..n]) {
            Ok(_) => out,
            // The layout map cannot introduce index errors; pass through
            // rather than panic if the circuit is itself malformed.
            Err(_) => qc.clone(),
        }
    })
}

/// On-disk descriptor for a submitted QI job.
///
/// Everything needed to reattach after a process restart, written next to
/// the checkpoint ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// The registered job id.
    pub job_id: String,
    /// API endpoint the job was submitted to.
    pub endpoint: String,
    /// Target device.
    pub target: String,
    /// Number of circuits in the joint submission.
    pub num_circuits: usize,
    /// Shots per circuit.
    pub shots: u32,
    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,
}

/// Remote hardware-queue backend.
pub struct QiBackend {
    config: BackendConfig,
    client: QiClient,
    target: String,
    poll_interval: Duration,
}

impl QiBackend {
    /// Create a backend against the default endpoint and target.
    ///
    /// Reads the API token from the `QI_TOKEN` environment variable.
    pub fn new() -> QiResult<Self> {
        let token = std::env::var("QI_TOKEN").map_err(|_| QiError::MissingToken)?;
        Self::with_credentials(DEFAULT_ENDPOINT, token, DEFAULT_TARGET)
    }

    /// Create a backend with explicit endpoint, token, and target device.
    pub fn with_credentials(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        target: impl Into<String>,
    ) -> QiResult<Self> {
        let endpoint = endpoint.into();
        let token = token.into();
        let config = BackendConfig::new("qi")
            .with_endpoint(&endpoint)
            .with_token(&token);
        let client = QiClient::new(&endpoint, &token)?;
        Ok(Self {
            config,
            client,
            target: target.into(),
            poll_interval: POLL_INTERVAL,
        })
    }

    /// Override the status poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// The target device name.
    pub fn target(&self) -> &str {
        &self.target
    }

    fn endpoint(&self) -> &str {
        self.config.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    fn handle(&self, id: Option<JobId>, num_circuits: usize, shots: u32) -> QiJobHandle {
        QiJobHandle {
            client: self.client.clone(),
            id,
            endpoint: self.endpoint().to_string(),
            target: self.target.clone(),
            num_circuits,
            shots,
            poll_interval: self.poll_interval,
        }
    }
}

#[async_trait]
impl Backend for QiBackend {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn submit(&self, circuits: &[Circuit], shots: u32) -> HalResult<Box<dyn JobHandle>> {
        let request = SubmitRequest {
            backend: self.target.clone(),
            circuits: circuits.to_vec(),
            shots,
        };
        let response = self
            .client
            .submit_job(&request)
            .await
            .map_err(|e| match HalError::from(e) {
                HalError::Backend(msg) => HalError::SubmissionFailed(msg),
                other => other,
            })?;

        let id = response.registered_id().map(JobId::new);
        match &id {
            Some(id) => info!(job_id = %id, status = %response.status, "job submitted"),
            None => warn!(
                status = %response.status,
                "job accepted without a public id; cannot checkpoint yet"
            ),
        }
        Ok(Box::new(self.handle(id, circuits.len(), shots)))
    }

    async fn retrieve(
        &self,
        checkpoint_dir: &Path,
        id: &JobId,
    ) -> HalResult<Box<dyn JobHandle>> {
        // Prefer the on-disk descriptor: it carries the submission shape
        // and catches a ledger/descriptor id divergence before any remote
        // call is made.
        if let Some(content) = job::read_descriptor(checkpoint_dir, id).await? {
            let descriptor: JobDescriptor = serde_json::from_str(&content)?;
            if descriptor.job_id != id.0 {
                return Err(HalError::JobNotFound(format!(
                    "descriptor for job {} holds id {}",
                    id, descriptor.job_id
                )));
            }
            debug!(job_id = %id, "reattached from descriptor");
            return Ok(Box::new(self.handle(
                Some(id.clone()),
                descriptor.num_circuits,
                descriptor.shots,
            )));
        }

        // Fall back to id-only reattachment: confirm the job exists
        // remotely before handing out a handle.
        let status = self
            .client
            .get_job_status(&id.0)
            .await
            .map_err(HalError::from)?;
        debug!(job_id = %id, status = %status.status, "reattached by id");
        Ok(Box::new(self.handle(Some(id.clone()), 0, 0)))
    }
}

/// Handle to a QI queue job.
pub struct QiJobHandle {
    client: QiClient,
    id: Option<JobId>,
    endpoint: String,
    target: String,
    num_circuits: usize,
    shots: u32,
    poll_interval: Duration,
}

impl QiJobHandle {
    async fn poll(&self, id: &JobId, timeout: Option<Duration>) -> Retrieval {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let status = match self.client.get_job_status(&id.0).await {
                Ok(status) => status,
                Err(e) => return Retrieval::TransientFailure(e.to_string()),
            };

            if status.is_completed() {
                return match self.client.get_job_results(&id.0).await {
                    Ok(response) => {
                        let counts = response
                            .results
                            .into_iter()
                            .map(Counts::from_iter)
                            .collect();
                        Retrieval::Success(ExecutionResult::new(counts, response.shots))
                    }
                    Err(e) => Retrieval::TransientFailure(e.to_string()),
                };
            }
            if status.is_failed() {
                let reason = status
                    .message
                    .unwrap_or_else(|| format!("job entered state '{}'", status.status));
                return Retrieval::TransientFailure(reason);
            }
            // A state outside the known vocabulary will never complete
            // from our point of view; abort rather than poll forever.
            if !status.is_pending() {
                return Retrieval::TransientFailure(format!(
                    "job entered unrecognized state '{}'",
                    status.status
                ));
            }

            debug!(job_id = %id, status = %status.status, "job pending");
            match deadline {
                Some(deadline) if Instant::now() + self.poll_interval > deadline => {
                    warn!(job_id = %id, "wait deadline elapsed; job may still be running");
                    return Retrieval::TimedOut;
                }
                _ => tokio::time::sleep(self.poll_interval).await,
            }
        }
    }
}

#[async_trait]
impl JobHandle for QiJobHandle {
    fn id(&self) -> Option<JobId> {
        self.id.clone()
    }

    async fn serialize(&self, dir: &Path) -> HalResult<()> {
        let Some(id) = &self.id else {
            debug!("job has no id yet; descriptor not written");
            return Ok(());
        };
        let descriptor = JobDescriptor {
            job_id: id.0.clone(),
            endpoint: self.endpoint.clone(),
            target: self.target.clone(),
            num_circuits: self.num_circuits,
            shots: self.shots,
            submitted_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&descriptor)?;
        job::write_descriptor(dir, id, &content).await?;
        debug!(job_id = %id, "descriptor written");
        Ok(())
    }

    async fn result(&self, timeout: Option<Duration>) -> Retrieval {
        let Some(id) = &self.id else {
            // Without an id there is nothing to poll and nothing running
            // that a resubmission would duplicate.
            return Retrieval::TransientFailure(
                "job was never registered remotely".to_string(),
            );
        };
        self.poll(id, timeout).await
    }
}

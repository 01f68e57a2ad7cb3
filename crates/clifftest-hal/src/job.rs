//! Job identity, handles, and the retrieval outcome.
//!
//! A [`JobHandle`] wraps one backend submission. The orchestrators only ever
//! interact with a submission through this trait:
//!
//! ```text
//!   submit() ──→ id()? ──→ serialize()? ──→ result(timeout) ──→ Retrieval
//! ```
//!
//! **Invariants:**
//! - `id()` may be `None` while the backend has not registered the job
//!   remotely. That means "cannot checkpoint this submission yet", never
//!   an error.
//! - `serialize()` atomically replaces any prior descriptor for the same
//!   directory; stale descriptors never accumulate.
//! - `result()` distinguishes `TimedOut` from every other failure. A timed
//!   out job may still be running and must not be resubmitted.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::HalResult;
use crate::result::ExecutionResult;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    /// Create a new job ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Outcome of a blocking result retrieval.
///
/// An explicit tag instead of an error type: orchestrators branch on this
/// to decide between collecting, resubmitting, and aborting, and the three
/// cases have very different cost consequences on paid hardware.
#[derive(Debug)]
pub enum Retrieval {
    /// The job completed; per-circuit histograms in submission order.
    Success(ExecutionResult),
    /// The job is presumed lost (not found, malformed response, backend
    /// error). Safe to resubmit.
    TransientFailure(String),
    /// The wait deadline elapsed while the job may still be running
    /// remotely. Fatal to the current run; never resubmit.
    TimedOut,
}

impl Retrieval {
    /// Whether this is a successful retrieval.
    pub fn is_success(&self) -> bool {
        matches!(self, Retrieval::Success(_))
    }
}

impl std::fmt::Debug for dyn JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle").field("id", &self.id()).finish()
    }
}

/// A handle to one backend submission.
#[async_trait]
pub trait JobHandle: Send + Sync {
    /// The job's identifier, once the backend has registered it.
    ///
    /// `None` means the submission cannot be checkpointed by id yet.
    fn id(&self) -> Option<JobId>;

    /// Persist a descriptor for this job under `dir`, replacing any prior
    /// descriptor atomically.
    ///
    /// Only meaningful for backends that cannot reattach to a job from its
    /// id alone; the default is a no-op.
    async fn serialize(&self, _dir: &Path) -> HalResult<()> {
        Ok(())
    }

    /// Block until the job completes or `timeout` elapses.
    ///
    /// `None` waits indefinitely.
    async fn result(&self, timeout: Option<Duration>) -> Retrieval;
}

/// Path of the serialized descriptor for `id` under `dir`.
pub fn descriptor_path(dir: &Path, id: &JobId) -> PathBuf {
    dir.join(format!("job_{id}.json"))
}

/// Remove every `job_*.json` descriptor under `dir`.
///
/// Called before writing a fresh descriptor so a resumed run can never
/// reload a stale one.
pub async fn purge_descriptors(dir: &Path) -> HalResult<()> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with("job_") && name.ends_with(".json") {
            tokio::fs::remove_file(entry.path()).await?;
        }
    }
    Ok(())
}

/// Atomically write a job descriptor: temp sibling, then rename.
///
/// Purges stale descriptors first, so at most one descriptor exists per
/// directory at any time.
pub async fn write_descriptor(dir: &Path, id: &JobId, content: &str) -> HalResult<()> {
    tokio::fs::create_dir_all(dir).await?;
    purge_descriptors(dir).await?;
    let path = descriptor_path(dir, id);
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, &path).await?;
    Ok(())
}

/// Read the descriptor for `id` under `dir`, or `None` if absent.
pub async fn read_descriptor(dir: &Path, id: &JobId) -> HalResult<Option<String>> {
    let path = descriptor_path(dir, id);
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_display() {
        let id = JobId::new("abc-123");
        assert_eq!(id.to_string(), "abc-123");
    }

    #[tokio::test]
    async fn test_write_descriptor_purges_stale() {
        let dir = tempfile::tempdir().unwrap();
        let old = JobId::new("old");
        let new = JobId::new("new");

        write_descriptor(dir.path(), &old, "{}").await.unwrap();
        assert!(read_descriptor(dir.path(), &old).await.unwrap().is_some());

        write_descriptor(dir.path(), &new, r#"{"a":1}"#).await.unwrap();
        assert!(read_descriptor(dir.path(), &old).await.unwrap().is_none());
        assert_eq!(
            read_descriptor(dir.path(), &new).await.unwrap().as_deref(),
            Some(r#"{"a":1}"#)
        );
    }

    #[tokio::test]
    async fn test_purge_missing_dir_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        purge_descriptors(&missing).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_descriptor_absent() {
        let dir = tempfile::tempdir().unwrap();
        let id = JobId::new("ghost");
        assert!(read_descriptor(dir.path(), &id).await.unwrap().is_none());
    }
}

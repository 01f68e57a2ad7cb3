//! Terminal result artifacts.
//!
//! Raw results are the durable output of an experiment; once
//! `raw_results.json` exists the checkpoint is deleted and the run is
//! never re-executed. Summaries are derived purely from raw results and
//! are idempotently recomputable.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use clifftest_hal::Counts;

use crate::checkpoint::atomic_write_json;
use crate::error::TesterResult;
use crate::key::WeylKey;

/// Raw results filename.
pub const RAW_RESULTS_FILE: &str = "raw_results.json";
/// Summary filename.
pub const SUMMARY_FILE: &str = "summary.json";
/// Expected-acceptance-probability filename.
pub const EXPECTED_FILE: &str = "expected_acceptance_probability.json";

/// Batched raw results: encoded Weyl key → outcome histogram.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchedRawResults(pub BTreeMap<String, Counts>);

impl BatchedRawResults {
    /// Histogram for a key.
    pub fn get(&self, key: &WeylKey) -> Option<&Counts> {
        self.0.get(&key.encode())
    }

    /// Insert a key's histogram.
    pub fn insert(&mut self, key: &WeylKey, counts: Counts) {
        self.0.insert(key.encode(), counts);
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over histograms.
    pub fn histograms(&self) -> impl Iterator<Item = &Counts> {
        self.0.values()
    }
}

/// One paired-runs sample: a key and two outcomes drawn as if from two
/// independent executions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedSample {
    /// The Weyl key this pair was run under.
    pub key: WeylKey,
    /// First outcome bitstring.
    pub y1: String,
    /// Second outcome bitstring.
    pub y2: String,
}

/// Paired raw results: the concatenated per-key pair lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairedRawResults(pub Vec<PairedSample>);

impl PairedRawResults {
    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The scalar acceptance estimate, persisted as `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Acceptance rate: 1.0 for Clifford gates, strictly less otherwise.
    pub acceptance_rate: f64,
}

/// The closed-form expectation, persisted alongside measured results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedAcceptanceProbability {
    /// Expected acceptance probability of the unitary under test.
    pub expected_acceptance_probability: f64,
}

async fn load_json<T: serde::de::DeserializeOwned>(path: &Path) -> TesterResult<Option<T>> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Persist batched raw results.
pub async fn save_batched_raw(results: &BatchedRawResults, dir: &Path) -> TesterResult<()> {
    tokio::fs::create_dir_all(dir).await?;
    atomic_write_json(&dir.join(RAW_RESULTS_FILE), results).await
}

/// Load batched raw results, or `None` if absent.
pub async fn load_batched_raw(dir: &Path) -> TesterResult<Option<BatchedRawResults>> {
    load_json(&dir.join(RAW_RESULTS_FILE)).await
}

/// Persist paired raw results.
pub async fn save_paired_raw(results: &PairedRawResults, dir: &Path) -> TesterResult<()> {
    tokio::fs::create_dir_all(dir).await?;
    atomic_write_json(&dir.join(RAW_RESULTS_FILE), results).await
}

/// Load paired raw results, or `None` if absent.
pub async fn load_paired_raw(dir: &Path) -> TesterResult<Option<PairedRawResults>> {
    load_json(&dir.join(RAW_RESULTS_FILE)).await
}

/// Persist the summary.
pub async fn save_summary(acceptance_rate: f64, dir: &Path) -> TesterResult<()> {
    tokio::fs::create_dir_all(dir).await?;
    atomic_write_json(&dir.join(SUMMARY_FILE), &Summary { acceptance_rate }).await
}

/// Persist the expected acceptance probability.
pub async fn save_expected(expected: f64, dir: &Path) -> TesterResult<()> {
    tokio::fs::create_dir_all(dir).await?;
    atomic_write_json(
        &dir.join(EXPECTED_FILE),
        &ExpectedAcceptanceProbability {
            expected_acceptance_probability: expected,
        },
    )
    .await
}

/// Load the expected acceptance probability, or `None` if absent.
pub async fn load_expected(dir: &Path) -> TesterResult<Option<ExpectedAcceptanceProbability>> {
    load_json(&dir.join(EXPECTED_FILE)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_batched_raw_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let key = WeylKey::new(vec![0, 1]).unwrap();
        let mut raw = BatchedRawResults::default();
        let counts: Counts = [("00".to_string(), 3), ("01".to_string(), 1)]
            .into_iter()
            .collect();
        raw.insert(&key, counts);

        save_batched_raw(&raw, dir.path()).await.unwrap();
        let loaded = load_batched_raw(dir.path()).await.unwrap().unwrap();
        assert_eq!(raw, loaded);
        assert_eq!(loaded.get(&key).unwrap().get("00"), 3);
    }

    #[tokio::test]
    async fn test_paired_raw_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let raw = PairedRawResults(vec![PairedSample {
            key: WeylKey::new(vec![1, 0]).unwrap(),
            y1: "00".into(),
            y2: "00".into(),
        }]);

        save_paired_raw(&raw, dir.path()).await.unwrap();
        let loaded = load_paired_raw(dir.path()).await.unwrap().unwrap();
        assert_eq!(raw, loaded);
    }

    #[tokio::test]
    async fn test_missing_raw_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_batched_raw(dir.path()).await.unwrap().is_none());
        assert!(load_paired_raw(dir.path()).await.unwrap().is_none());
    }

    #[test]
    fn test_paired_sample_json_shape() {
        let sample = PairedSample {
            key: WeylKey::new(vec![0, 1]).unwrap(),
            y1: "01".into(),
            y2: "10".into(),
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert_eq!(json, r#"{"key":[0,1],"y1":"01","y2":"10"}"#);
    }
}

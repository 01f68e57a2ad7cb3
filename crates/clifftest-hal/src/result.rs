//! Measurement outcome histograms.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Outcome counts for one executed circuit: bitstring → frequency.
///
/// Backed by a `BTreeMap` so persisted JSON is stable and human-diffable.
/// Bitstrings are little-endian: character `i` is qubit `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counts(BTreeMap<String, u64>);

impl Counts {
    /// Create an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` observations of `bitstring`.
    pub fn add(&mut self, bitstring: impl Into<String>, count: u64) {
        *self.0.entry(bitstring.into()).or_insert(0) += count;
    }

    /// Record a single observation.
    pub fn record(&mut self, bitstring: impl Into<String>) {
        self.add(bitstring, 1);
    }

    /// Frequency of a bitstring (0 if never observed).
    pub fn get(&self, bitstring: &str) -> u64 {
        self.0.get(bitstring).copied().unwrap_or(0)
    }

    /// Total number of observations.
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    /// Number of distinct outcomes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the histogram is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over (bitstring, frequency) pairs in bitstring order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// The most frequent outcome, if any.
    pub fn most_frequent(&self) -> Option<(&str, u64)> {
        self.0
            .iter()
            .max_by_key(|&(_, &v)| v)
            .map(|(k, &v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, u64)> for Counts {
    fn from_iter<T: IntoIterator<Item = (String, u64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Result of one backend submission.
///
/// `counts[i]` is the histogram for the i-th submitted circuit. The index
/// order is the cross-reference key between submission and collection, so
/// it MUST match the submission order exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// One histogram per submitted circuit, in submission order.
    pub counts: Vec<Counts>,
    /// Shots requested per circuit.
    pub shots: u32,
}

impl ExecutionResult {
    /// Create a result.
    pub fn new(counts: Vec<Counts>, shots: u32) -> Self {
        Self { counts, shots }
    }

    /// Histogram for the i-th circuit.
    pub fn get_counts(&self, index: usize) -> Option<&Counts> {
        self.counts.get(index)
    }

    /// Number of circuits this result covers.
    pub fn num_circuits(&self) -> usize {
        self.counts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_accumulate() {
        let mut counts = Counts::new();
        counts.record("00");
        counts.record("00");
        counts.add("11", 3);
        assert_eq!(counts.get("00"), 2);
        assert_eq!(counts.get("11"), 3);
        assert_eq!(counts.get("01"), 0);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn test_counts_most_frequent() {
        let counts: Counts = [("00".to_string(), 4), ("11".to_string(), 2)]
            .into_iter()
            .collect();
        assert_eq!(counts.most_frequent(), Some(("00", 4)));
    }

    #[test]
    fn test_counts_serde_transparent() {
        let counts: Counts = [("01".to_string(), 7)].into_iter().collect();
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{"01":7}"#);
        let back: Counts = serde_json::from_str(&json).unwrap();
        assert_eq!(counts, back);
    }

    #[test]
    fn test_execution_result_indexing() {
        let result = ExecutionResult::new(vec![Counts::new(), Counts::new()], 100);
        assert_eq!(result.num_circuits(), 2);
        assert!(result.get_counts(1).is_some());
        assert!(result.get_counts(2).is_none());
    }
}

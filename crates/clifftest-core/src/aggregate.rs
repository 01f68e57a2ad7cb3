//! Acceptance-rate reducers.
//!
//! Pure, total functions over already-collected raw results. No failure
//! modes: empty inputs aggregate to 0.0.

use clifftest_hal::Counts;

use crate::results::{BatchedRawResults, PairedRawResults};

/// Collision probability of a histogram: Σᵢ (countᵢ / total)².
///
/// Estimates the probability that two independent samples from the same
/// outcome distribution coincide; 1.0 for a deterministic distribution.
pub fn collision_probability(counts: &Counts) -> f64 {
    let total = counts.total();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    counts.iter().map(|(_, c)| (c as f64 / total).powi(2)).sum()
}

/// Batched acceptance estimate: mean collision probability over all keys.
pub fn summarise_batched(results: &BatchedRawResults) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let total: f64 = results.histograms().map(collision_probability).sum();
    total / results.len() as f64
}

/// Paired acceptance estimate: the fraction of pairs with y1 == y2.
pub fn summarise_paired(results: &PairedRawResults) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let accepts = results.0.iter().filter(|s| s.y1 == s.y2).count();
    accepts as f64 / results.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::WeylKey;
    use crate::results::PairedSample;

    fn counts(pairs: &[(&str, u64)]) -> Counts {
        pairs
            .iter()
            .map(|(s, c)| (s.to_string(), *c))
            .collect()
    }

    #[test]
    fn test_collision_probability_worked_example() {
        // (3/4)^2 + (1/4)^2 = 0.625
        let c = counts(&[("00", 3), ("01", 1)]);
        assert!((collision_probability(&c) - 0.625).abs() < 1e-12);
    }

    #[test]
    fn test_collision_probability_deterministic_is_one() {
        let c = counts(&[("11", 1000)]);
        assert!((collision_probability(&c) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_collision_probability_empty_is_zero() {
        assert_eq!(collision_probability(&Counts::new()), 0.0);
    }

    #[test]
    fn test_summarise_batched_averages() {
        let mut raw = BatchedRawResults::default();
        raw.insert(
            &WeylKey::new(vec![0, 0]).unwrap(),
            counts(&[("00", 3), ("01", 1)]),
        );
        raw.insert(&WeylKey::new(vec![0, 1]).unwrap(), counts(&[("11", 10)]));
        // (0.625 + 1.0) / 2
        assert!((summarise_batched(&raw) - 0.8125).abs() < 1e-12);
    }

    #[test]
    fn test_summarise_batched_empty_is_zero() {
        assert_eq!(summarise_batched(&BatchedRawResults::default()), 0.0);
    }

    #[test]
    fn test_summarise_paired_worked_example() {
        let key = WeylKey::new(vec![0, 0]).unwrap();
        let sample = |y1: &str, y2: &str| PairedSample {
            key: key.clone(),
            y1: y1.into(),
            y2: y2.into(),
        };
        let raw = PairedRawResults(vec![
            sample("00", "00"),
            sample("00", "11"),
            sample("01", "01"),
        ]);
        assert!((summarise_paired(&raw) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_summarise_paired_empty_is_zero() {
        assert_eq!(summarise_paired(&PairedRawResults::default()), 0.0);
    }
}

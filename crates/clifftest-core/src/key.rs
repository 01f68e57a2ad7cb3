//! Weyl operator keys.
//!
//! A [`WeylKey`] is an ordered bit-vector of length 2n selecting one Weyl
//! operator P_x: the first n bits control Z gates, the last n bits control
//! X gates. Keys are used as map keys throughout the checkpoint format, so
//! they carry one canonical string encoding (a JSON array literal) used
//! consistently for every write and every lookup.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{TesterError, TesterResult};

/// A 2n-bit Weyl operator index.
///
/// Serializes as a plain bit array (`[0,1,1,0]`), both inside JSON
/// documents and, via [`WeylKey::encode`], as a map key string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeylKey(Vec<u8>);

impl WeylKey {
    /// Create a key from bits. Every element must be 0 or 1.
    pub fn new(bits: Vec<u8>) -> TesterResult<Self> {
        if let Some(&bad) = bits.iter().find(|&&b| b > 1) {
            return Err(TesterError::InvalidKey(format!(
                "bit value {bad} is not 0 or 1"
            )));
        }
        Ok(Self(bits))
    }

    /// The bits of this key.
    pub fn bits(&self) -> &[u8] {
        &self.0
    }

    /// Number of bits (2n).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The first n bits (Z controls).
    pub fn z_bits(&self) -> &[u8] {
        &self.0[..self.0.len() / 2]
    }

    /// The last n bits (X controls).
    pub fn x_bits(&self) -> &[u8] {
        &self.0[self.0.len() / 2..]
    }

    /// Canonical string encoding: a JSON array literal, e.g. `"[0,1,1,0]"`.
    ///
    /// This is the persisted map-key form; it is order-preserving and
    /// round-trips exactly through [`WeylKey::decode`].
    pub fn encode(&self) -> String {
        let mut out = String::with_capacity(2 * self.0.len() + 1);
        out.push('[');
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push(if *b == 0 { '0' } else { '1' });
        }
        out.push(']');
        out
    }

    /// Decode the canonical string encoding.
    pub fn decode(s: &str) -> TesterResult<Self> {
        let bits: Vec<u8> = serde_json::from_str(s)
            .map_err(|e| TesterError::InvalidKey(format!("'{s}': {e}")))?;
        Self::new(bits)
    }

    /// Enumerate all 2^(2n) keys for n qubits, in lexicographic order
    /// (first bit varies slowest).
    pub fn all(n: usize) -> Vec<WeylKey> {
        let width = 2 * n;
        (0..1u64 << width)
            .map(|v| {
                let bits = (0..width)
                    .map(|j| ((v >> (width - 1 - j)) & 1) as u8)
                    .collect();
                WeylKey(bits)
            })
            .collect()
    }

    /// Draw one key uniformly at random from {0,1}^2n.
    pub fn random(n: usize, rng: &mut impl Rng) -> WeylKey {
        WeylKey((0..2 * n).map(|_| rng.gen_range(0..=1u8)).collect())
    }
}

impl TryFrom<Vec<u8>> for WeylKey {
    type Error = String;

    fn try_from(bits: Vec<u8>) -> Result<Self, Self::Error> {
        WeylKey::new(bits).map_err(|e| e.to_string())
    }
}

impl From<WeylKey> for Vec<u8> {
    fn from(key: WeylKey) -> Self {
        key.0
    }
}

impl std::fmt::Display for WeylKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashSet;

    #[test]
    fn test_all_enumerates_4_pow_n() {
        for n in 1..=3 {
            let keys = WeylKey::all(n);
            assert_eq!(keys.len(), 1 << (2 * n));
            assert!(keys.iter().all(|k| k.len() == 2 * n));
            let distinct: HashSet<_> = keys.iter().collect();
            assert_eq!(distinct.len(), keys.len());
        }
    }

    #[test]
    fn test_all_is_lexicographic() {
        let keys = WeylKey::all(1);
        let bits: Vec<&[u8]> = keys.iter().map(|k| k.bits()).collect();
        assert_eq!(bits, vec![&[0, 0][..], &[0, 1], &[1, 0], &[1, 1]]);
    }

    #[test]
    fn test_encode_is_json_array_literal() {
        let key = WeylKey::new(vec![0, 1, 1, 0]).unwrap();
        assert_eq!(key.encode(), "[0,1,1,0]");
    }

    #[test]
    fn test_decode_rejects_non_bits() {
        assert!(WeylKey::decode("[0,2]").is_err());
        assert!(WeylKey::decode("not json").is_err());
    }

    #[test]
    fn test_z_and_x_halves() {
        let key = WeylKey::new(vec![1, 0, 0, 1]).unwrap();
        assert_eq!(key.z_bits(), &[1, 0]);
        assert_eq!(key.x_bits(), &[0, 1]);
    }

    #[test]
    fn test_random_has_correct_length() {
        let mut rng = StdRng::seed_from_u64(7);
        let key = WeylKey::random(3, &mut rng);
        assert_eq!(key.len(), 6);
    }

    proptest! {
        #[test]
        fn prop_encode_decode_round_trip(bits in proptest::collection::vec(0u8..=1, 0..32)) {
            let key = WeylKey::new(bits).unwrap();
            let decoded = WeylKey::decode(&key.encode()).unwrap();
            prop_assert_eq!(key, decoded);
        }
    }
}

//! Landmark selection rules

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TdaError};

/// How landmarks are picked out of the witness sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LandmarkSelector {
    /// Every `ds_rate`-th witness, starting with the first
    #[default]
    Stride,
    /// `n / ds_rate` witnesses drawn without replacement from a seeded RNG
    Random { seed: u64 },
}

impl LandmarkSelector {
    /// Witness indices promoted to landmarks, ascending
    pub fn select(&self, n_witnesses: usize, ds_rate: usize) -> Result<Vec<usize>> {
        if ds_rate == 0 {
            return Err(TdaError::invalid("ds_rate must be at least 1"));
        }

        match *self {
            LandmarkSelector::Stride => Ok((0..n_witnesses).step_by(ds_rate).collect()),
            LandmarkSelector::Random { seed } => {
                let count = n_witnesses / ds_rate;
                let mut rng = StdRng::seed_from_u64(seed);
                let mut picked = rand::seq::index::sample(&mut rng, n_witnesses, count).into_vec();
                picked.sort_unstable();
                Ok(picked)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stride() {
        let idx = LandmarkSelector::Stride.select(10, 3).unwrap();
        assert_eq!(idx, vec![0, 3, 6, 9]);
    }

    #[test]
    fn test_random_reproducible() {
        let sel = LandmarkSelector::Random { seed: 42 };
        let a = sel.select(100, 5).unwrap();
        let b = sel.select(100, 5).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 20);
        assert!(a.windows(2).all(|w| w[0] < w[1]));
        assert!(a.iter().all(|&i| i < 100));
    }

    #[test]
    fn test_wire_encoding() {
        let json = serde_json::to_string(&LandmarkSelector::Random { seed: 3 }).unwrap();
        assert_eq!(json, r#"{"random":{"seed":3}}"#);
        let stride: LandmarkSelector = serde_json::from_str(r#""stride""#).unwrap();
        assert_eq!(stride, LandmarkSelector::Stride);
    }

    #[test]
    fn test_zero_rate() {
        assert!(LandmarkSelector::Stride.select(10, 0).is_err());
    }
}

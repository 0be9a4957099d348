//! Persistence Diagrams over Epsilon Indices
//!
//! A persistence pair (b, d) records a homology class born when the complex
//! reaches threshold index b and killed at index d. Classes that survive the
//! whole filtration are *immortal* and carry no death index.
//!
//! ## Interpretation
//!
//! - Long-lived classes (large ε_d - ε_b) reflect robust loops in the attractor
//! - Short-lived classes are usually sampling noise
//! - Immortal classes are loops never filled before the cutoff

use serde::{Deserialize, Serialize};

/// A single (birth, death) pair in epsilon-index units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersistencePair {
    pub birth: usize,
    /// `None` for classes that never die
    pub death: Option<usize>,
}

impl PersistencePair {
    pub fn mortal(birth: usize, death: usize) -> Self {
        Self {
            birth,
            death: Some(death),
        }
    }

    pub fn immortal(birth: usize) -> Self {
        Self { birth, death: None }
    }

    pub fn is_immortal(&self) -> bool {
        self.death.is_none()
    }

    /// Is the class alive at threshold index `t`?
    pub fn alive_at(&self, t: usize) -> bool {
        self.birth <= t && self.death.map_or(true, |d| t < d)
    }
}

/// Persistence pairs of one homological degree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceDiagram {
    pub dimension: usize,
    pub pairs: Vec<PersistencePair>,
}

impl PersistenceDiagram {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            pairs: Vec::new(),
        }
    }

    pub fn add(&mut self, pair: PersistencePair) {
        self.pairs.push(pair);
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs with a finite death
    pub fn mortal(&self) -> impl Iterator<Item = &PersistencePair> {
        self.pairs.iter().filter(|p| !p.is_immortal())
    }

    /// Pairs that never die
    pub fn immortal(&self) -> impl Iterator<Item = &PersistencePair> {
        self.pairs.iter().filter(|p| p.is_immortal())
    }

    /// Sort pairs by (birth, death) with immortal classes last among equal births
    pub fn sorted(mut self) -> Self {
        self.pairs
            .sort_by_key(|p| (p.birth, p.death.unwrap_or(usize::MAX)));
        self
    }
}

//! Simplices tagged with their birth index

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A simplex over landmark indices.
///
/// `vertices` is kept sorted ascending; `birth` is an index into the
/// filtration's epsilon sequence.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Simplex {
    pub vertices: Vec<usize>,
    pub birth: usize,
}

impl Simplex {
    pub fn new(mut vertices: Vec<usize>, birth: usize) -> Self {
        vertices.sort_unstable();
        Self { vertices, birth }
    }

    pub fn dimension(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }

    /// Codimension-1 faces (vertex lists, sorted)
    pub fn faces(&self) -> Vec<Vec<usize>> {
        if self.vertices.len() < 2 {
            return Vec::new();
        }
        (0..self.vertices.len())
            .map(|skip| {
                self.vertices
                    .iter()
                    .enumerate()
                    .filter(|&(i, _)| i != skip)
                    .map(|(_, &v)| v)
                    .collect()
            })
            .collect()
    }

    /// Filtration order: birth, then dimension, then vertex tuple
    pub fn filtration_cmp(&self, other: &Self) -> Ordering {
        self.birth
            .cmp(&other.birth)
            .then(self.dimension().cmp(&other.dimension()))
            .then_with(|| self.vertices.cmp(&other.vertices))
    }
}

//! Betti Curves: Class Counts Across the Filtration
//!
//! β(t) counts the homology classes of the tracked degree alive at
//! threshold index t. It is the diagonal of the persistence rank function
//! and a cheap one-dimensional summary of a filtration.

use serde::{Deserialize, Serialize};

use super::persistence::PersistenceDiagram;

/// Betti numbers of one degree at each epsilon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BettiCurve {
    pub dimension: usize,
    /// `(epsilon, β)` per threshold index
    pub values: Vec<(f64, usize)>,
}

impl BettiCurve {
    /// Count classes alive at each threshold
    pub fn from_diagram(diagram: &PersistenceDiagram, epsilons: &[f64]) -> Self {
        let values = epsilons
            .iter()
            .enumerate()
            .map(|(t, &eps)| {
                let alive = diagram.pairs.iter().filter(|p| p.alive_at(t)).count();
                (eps, alive)
            })
            .collect();

        Self {
            dimension: diagram.dimension,
            values,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::persistence::PersistencePair;

    #[test]
    fn test_curve() {
        let mut pd = PersistenceDiagram::new(1);
        pd.add(PersistencePair::mortal(1, 3));
        pd.add(PersistencePair::immortal(2));

        let eps = [0.0, 1.0, 2.0, 3.0];
        let curve = BettiCurve::from_diagram(&pd, &eps);
        let betti: Vec<usize> = curve.values.iter().map(|&(_, b)| b).collect();
        assert_eq!(betti, vec![0, 1, 2, 1]);
        assert_eq!(curve.values[3].0, 3.0);
    }
}

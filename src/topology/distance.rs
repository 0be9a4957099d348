//! Pairwise Euclidean distances among witnesses and landmarks

use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TdaError};

/// Dense distance matrix.
///
/// `from_points` is symmetric with a zero diagonal; `between` yields a
/// rectangular witness × landmark table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    distances: Array2<f64>,
}

fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

impl DistanceMatrix {
    /// Compute the symmetric distance matrix of a point cloud.
    ///
    /// Each unordered pair is evaluated once and mirrored.
    pub fn from_points(points: &Array2<f64>) -> Result<Self> {
        let n = points.nrows();
        if n < 2 {
            return Err(TdaError::invalid(format!(
                "distance matrix needs at least 2 points, got {}",
                n
            )));
        }

        let mut dm = Array2::<f64>::zeros((n, n));
        for i in 0..n {
            for j in i + 1..n {
                let dist = euclidean(points.row(i), points.row(j));
                dm[[i, j]] = dist;
                dm[[j, i]] = dist;
            }
        }

        Ok(Self { distances: dm })
    }

    /// Distances from every row of `from` to every row of `to`
    pub fn between(from: &Array2<f64>, to: &Array2<f64>) -> Result<Self> {
        if from.nrows() == 0 || to.nrows() == 0 {
            return Err(TdaError::invalid("cannot measure distances to an empty set"));
        }
        if from.ncols() != to.ncols() {
            return Err(TdaError::invalid(format!(
                "dimension mismatch: {} vs {}",
                from.ncols(),
                to.ncols()
            )));
        }

        let distances =
            Array2::from_shape_fn((from.nrows(), to.nrows()), |(i, j)| {
                euclidean(from.row(i), to.row(j))
            });
        Ok(Self { distances })
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.distances[[i, j]]
    }

    pub fn nrows(&self) -> usize {
        self.distances.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.distances.ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_symmetric() {
        let points = array![[0.0, 0.0], [3.0, 4.0], [0.0, 1.0]];
        let dm = DistanceMatrix::from_points(&points).unwrap();
        assert!((dm.get(0, 1) - 5.0).abs() < 1e-12);
        assert_eq!(dm.get(1, 0), dm.get(0, 1));
        assert_eq!(dm.get(2, 2), 0.0);
    }

    #[test]
    fn test_too_few_points() {
        let err = DistanceMatrix::from_points(&array![[1.0, 2.0]]).unwrap_err();
        assert!(matches!(err, TdaError::InvalidInput(_)));
    }

    #[test]
    fn test_between() {
        let w = array![[0.0], [2.0], [5.0]];
        let l = array![[1.0], [4.0]];
        let dm = DistanceMatrix::between(&w, &l).unwrap();
        assert_eq!(dm.nrows(), 3);
        assert_eq!(dm.ncols(), 2);
        assert!((dm.get(2, 0) - 4.0).abs() < 1e-12);
    }
}

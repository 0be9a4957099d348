//! Persistence Rank Functions: Interval Counts on a Birth/Death Grid
//!
//! For grid coordinates x₀ < x₁ < … < x_{R-1} over [0, ε_max], the rank
//! function is
//!
//!   PRF(i, j) = #{ intervals [b, d) : b ≤ x_i and d ≥ x_j },   i ≤ j
//!
//! Immortal classes count as dying at ε_max. Cells below the diagonal
//! (i > j) lie outside the domain and hold `NaN`.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::norm::Weight;
use crate::error::{Result, TdaError};
use crate::topology::{linspace_to, PersistenceDiagram, EPSILON_TOLERANCE};

/// Rank function sampled on an R × R grid; rows are births, columns deaths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistenceRankFunction {
    values: Array2<f64>,
    domain_max: f64,
}

impl PersistenceRankFunction {
    /// Count the diagram's intervals over the grid spanning `[0, max(epsilons)]`
    pub fn from_diagram(
        diagram: &PersistenceDiagram,
        epsilons: &[f64],
        resolution: usize,
    ) -> Result<Self> {
        if resolution < 2 {
            return Err(TdaError::invalid(format!(
                "PRF resolution must be at least 2, got {}",
                resolution
            )));
        }
        let domain_max = epsilons
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        if !(domain_max.is_finite() && domain_max > 0.0) {
            return Err(TdaError::invalid(
                "PRF domain needs a positive maximum epsilon",
            ));
        }

        let grid = linspace_to(domain_max, resolution);
        let mut values = Array2::from_shape_fn((resolution, resolution), |(i, j)| {
            if i > j {
                f64::NAN
            } else {
                0.0
            }
        });

        for pair in &diagram.pairs {
            let birth = *epsilons.get(pair.birth).ok_or_else(|| {
                TdaError::invalid(format!("birth index {} out of range", pair.birth))
            })?;
            let death = match pair.death {
                Some(d) => *epsilons.get(d).ok_or_else(|| {
                    TdaError::invalid(format!("death index {} out of range", d))
                })?,
                None => domain_max,
            };

            // first birth row that covers the interval, last death column
            let first_row = grid.partition_point(|&x| x + EPSILON_TOLERANCE < birth);
            let last_col = grid.partition_point(|&x| x - EPSILON_TOLERANCE <= death);

            for i in first_row..last_col {
                for j in i..last_col {
                    values[[i, j]] += 1.0;
                }
            }
        }

        Ok(Self { values, domain_max })
    }

    /// Wrap precomputed values; cells below the diagonal are forced to `NaN`
    pub fn from_values(mut values: Array2<f64>, domain_max: f64) -> Result<Self> {
        let (rows, cols) = values.dim();
        if rows != cols || rows < 2 {
            return Err(TdaError::invalid(format!(
                "PRF values must be square with side at least 2, got {}x{}",
                rows, cols
            )));
        }
        if !(domain_max.is_finite() && domain_max > 0.0) {
            return Err(TdaError::invalid("PRF domain maximum must be positive"));
        }
        for ((i, j), v) in values.indexed_iter_mut() {
            if i > j {
                *v = f64::NAN;
            }
        }
        Ok(Self { values, domain_max })
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn resolution(&self) -> usize {
        self.values.nrows()
    }

    pub fn domain_max(&self) -> f64 {
        self.domain_max
    }

    /// Birth (and death) coordinates of the grid
    pub fn grid(&self) -> Vec<f64> {
        linspace_to(self.domain_max, self.resolution())
    }

    pub fn get(&self, birth: usize, death: usize) -> f64 {
        self.values[[birth, death]]
    }

    /// Same counts over the unit domain
    pub fn normalized(&self) -> Self {
        Self {
            values: self.values.clone(),
            domain_max: 1.0,
        }
    }

    /// Cellwise multiple
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            values: &self.values * factor,
            domain_max: self.domain_max,
        }
    }

    /// Each cell multiplied by `weight` at its unit-grid coordinates
    pub fn weighted(&self, weight: &Weight) -> Self {
        match weight {
            Weight::Uniform => self.clone(),
            Weight::Function(_) => {
                let unit = linspace_to(1.0, self.resolution());
                let mut values = self.values.clone();
                for ((i, j), v) in values.indexed_iter_mut() {
                    *v *= weight.at(unit[i], unit[j]);
                }
                self.with_values(values)
            }
        }
    }

    pub(crate) fn with_values(&self, values: Array2<f64>) -> Self {
        Self {
            values,
            domain_max: self.domain_max,
        }
    }

    /// Fails unless both functions share a resolution and a domain
    pub fn check_compatible(&self, other: &Self) -> Result<()> {
        let same_domain = (self.domain_max - other.domain_max).abs()
            <= EPSILON_TOLERANCE * self.domain_max.abs().max(1.0);
        if self.resolution() != other.resolution() || !same_domain {
            return Err(TdaError::IncompatibleGrid {
                left: format!("{0}x{0} over [0, {1}]", self.resolution(), self.domain_max),
                right: format!("{0}x{0} over [0, {1}]", other.resolution(), other.domain_max),
            });
        }
        Ok(())
    }

    /// Rank never increases away from the diagonal
    pub fn is_monotone(&self) -> bool {
        let r = self.resolution();
        for i in 0..r {
            for j in i..r {
                let v = self.values[[i, j]];
                if j + 1 < r && self.values[[i, j + 1]] > v {
                    return false;
                }
                if i > 0 && self.values[[i - 1, j]] > v {
                    return false;
                }
            }
        }
        true
    }
}

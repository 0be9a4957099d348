//! Statistics over sets of rank functions
//!
//! All functions require the members of a set to share one grid. Pointwise
//! results are themselves rank functions and reduce to scalars through
//! [`norm`].

use serde::{Deserialize, Serialize};

use super::norm::{distance, norm, DistanceOptions, ScaleMode};
use super::rank::PersistenceRankFunction;
use crate::error::{Result, TdaError};

fn require_samples(prfs: &[PersistenceRankFunction]) -> Result<&PersistenceRankFunction> {
    let first = prfs.first().ok_or(TdaError::InsufficientSamples {
        required: 1,
        found: 0,
    })?;
    for other in &prfs[1..] {
        first.check_compatible(other)?;
    }
    Ok(first)
}

/// Pointwise arithmetic mean
pub fn mean(prfs: &[PersistenceRankFunction]) -> Result<PersistenceRankFunction> {
    let first = require_samples(prfs)?;
    let mut sum = first.values().clone();
    for prf in &prfs[1..] {
        sum += prf.values();
    }
    Ok(first.with_values(sum / prfs.len() as f64))
}

/// Pointwise population variance around the mean
pub fn pointwise_variance(prfs: &[PersistenceRankFunction]) -> Result<PersistenceRankFunction> {
    let mu = mean(prfs)?;
    let mut acc = mu.values().mapv(|_| 0.0);
    for prf in prfs {
        let dev = prf.values() - mu.values();
        acc += &dev.mapv(|d| d * d);
    }
    Ok(mu.with_values(acc / prfs.len() as f64))
}

/// Pointwise variance over mean; `NaN` where the mean vanishes
pub fn functional_cov(prfs: &[PersistenceRankFunction]) -> Result<PersistenceRankFunction> {
    let mu = mean(prfs)?;
    let var = pointwise_variance(prfs)?;
    let mut cov = var.values().clone();
    cov.zip_mut_with(mu.values(), |v, &m| {
        *v = if m == 0.0 { f64::NAN } else { *v / m };
    });
    Ok(mu.with_values(cov))
}

/// Distance from every member of `prfs` to `reference`
pub fn distances_to_reference(
    prfs: &[PersistenceRankFunction],
    reference: &PersistenceRankFunction,
    options: &DistanceOptions,
) -> Result<Vec<f64>> {
    prfs.iter()
        .map(|prf| distance(prf, reference, options))
        .collect()
}

/// Distances between the means of neighbouring sets
pub fn consecutive_mean_distances(
    sets: &[Vec<PersistenceRankFunction>],
    options: &DistanceOptions,
) -> Result<Vec<f64>> {
    let means = sets
        .iter()
        .map(|set| mean(set))
        .collect::<Result<Vec<_>>>()?;
    means
        .windows(2)
        .map(|w| distance(&w[0], &w[1], options))
        .collect()
}

/// Scalar summary of one set of rank functions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalarStats {
    /// Norm of the mean function
    pub mean_norm: f64,
    /// Mean unscaled distance to the mean
    pub variance: f64,
    /// Mean distance to the mean under the requested scaling
    pub scaled_variance: f64,
    pub pointwise_variance_norm: f64,
    pub functional_cov_norm: f64,
}

impl ScalarStats {
    pub fn compute(prfs: &[PersistenceRankFunction], options: &DistanceOptions) -> Result<Self> {
        let mu = mean(prfs)?;
        let n = prfs.len() as f64;

        let unscaled = options.clone().with_scale(ScaleMode::None);
        let variance = distances_to_reference(prfs, &mu, &unscaled)?.iter().sum::<f64>() / n;
        let scaled_variance =
            distances_to_reference(prfs, &mu, options)?.iter().sum::<f64>() / n;

        Ok(Self {
            mean_norm: norm(&mu, options.metric, &options.weight),
            variance,
            scaled_variance,
            pointwise_variance_norm: norm(
                &pointwise_variance(prfs)?,
                options.metric,
                &options.weight,
            ),
            functional_cov_norm: norm(&functional_cov(prfs)?, options.metric, &options.weight),
        })
    }
}

//! Nearest-mean classification of rank functions
//!
//! A class is summarised by its mean rank function and the spread
//!
//!   σ = ( (1/n) Σ d(fᵢ, f̄)² )^½
//!
//! of its training set. A function is accepted at threshold k when it lies
//! within k·σ of the mean; sweeping k yields an ROC curve.

use serde::{Deserialize, Serialize};

use super::norm::{distance, DistanceOptions};
use super::rank::PersistenceRankFunction;
use super::stats::mean;
use crate::error::{Result, TdaError};

/// One point of an ROC curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub k: f64,
    pub tpr: f64,
    pub fpr: f64,
}

#[derive(Debug, Clone)]
pub struct NearestMeanClassifier {
    mean: PersistenceRankFunction,
    sigma: f64,
    options: DistanceOptions,
}

impl NearestMeanClassifier {
    pub fn train(training: &[PersistenceRankFunction], options: &DistanceOptions) -> Result<Self> {
        let mean = mean(training)?;
        let mut sq_sum = 0.0;
        for prf in training {
            let d = distance(prf, &mean, options)?;
            sq_sum += d * d;
        }
        let sigma = (sq_sum / training.len() as f64).sqrt();

        Ok(Self {
            mean,
            sigma,
            options: options.clone(),
        })
    }

    pub fn mean(&self) -> &PersistenceRankFunction {
        &self.mean
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn options(&self) -> &DistanceOptions {
        &self.options
    }

    pub fn distance_to_mean(&self, prf: &PersistenceRankFunction) -> Result<f64> {
        distance(prf, &self.mean, &self.options)
    }

    pub fn accepts(&self, prf: &PersistenceRankFunction, k: f64) -> Result<bool> {
        Ok(self.distance_to_mean(prf)? <= k * self.sigma)
    }

    /// Acceptance rates of in-class and out-of-class tests for each `k`
    pub fn roc(
        &self,
        positives: &[PersistenceRankFunction],
        negatives: &[PersistenceRankFunction],
        ks: &[f64],
    ) -> Result<Vec<RocPoint>> {
        if positives.is_empty() || negatives.is_empty() {
            return Err(TdaError::InsufficientSamples {
                required: 1,
                found: 0,
            });
        }

        let pos = positives
            .iter()
            .map(|p| self.distance_to_mean(p))
            .collect::<Result<Vec<_>>>()?;
        let neg = negatives
            .iter()
            .map(|p| self.distance_to_mean(p))
            .collect::<Result<Vec<_>>>()?;

        let rate = |ds: &[f64], k: f64| {
            ds.iter().filter(|&&d| d <= k * self.sigma).count() as f64 / ds.len() as f64
        };

        Ok(ks
            .iter()
            .map(|&k| RocPoint {
                k,
                tpr: rate(&pos, k),
                fpr: rate(&neg, k),
            })
            .collect())
    }
}

/// Index of the classifier whose mean is nearest; ties go to the lower index
pub fn classify(
    prf: &PersistenceRankFunction,
    classifiers: &[NearestMeanClassifier],
) -> Result<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, classifier) in classifiers.iter().enumerate() {
        let d = classifier.distance_to_mean(prf)?;
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((idx, d));
        }
    }
    best.map(|(idx, _)| idx).ok_or(TdaError::InsufficientSamples {
        required: 1,
        found: 0,
    })
}

/// Split into (training, test): odd positions train, even positions test
pub fn split_alternating<T: Clone>(items: &[T]) -> (Vec<T>, Vec<T>) {
    let mut train = Vec::with_capacity(items.len() / 2);
    let mut test = Vec::with_capacity(items.len() - items.len() / 2);
    for (i, item) in items.iter().enumerate() {
        if i % 2 == 1 {
            train.push(item.clone());
        } else {
            test.push(item.clone());
        }
    }
    (train, test)
}

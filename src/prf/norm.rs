//! Weighted norms and distances between rank functions
//!
//! With R grid points per axis each cell has area dA = 2 / R², so the
//! triangular unit domain has total area 1:
//!
//!   ‖f‖₁ = Σ |f(i, j)| · w(xᵢ, xⱼ) · dA
//!   ‖f‖₂ = ( Σ f(i, j)² · w(xᵢ, xⱼ) · dA )^½
//!
//! `NaN` cells contribute nothing. Weights are evaluated on the unit grid
//! regardless of the functions' own domain.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::rank::PersistenceRankFunction;
use crate::error::Result;
use crate::topology::linspace_to;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Metric {
    L1,
    #[default]
    L2,
}

/// Normalisation applied to a distance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleMode {
    #[default]
    None,
    /// Divide by the first operand's norm
    A,
    /// Divide by the second operand's norm
    B,
    /// Divide by the sum of both norms
    #[serde(rename = "a+b")]
    Sum,
}

/// Weight function w(birth, death) over the unit domain
#[derive(Clone, Default)]
pub enum Weight {
    #[default]
    Uniform,
    Function(Arc<dyn Fn(f64, f64) -> f64 + Send + Sync>),
}

impl Weight {
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(f64, f64) -> f64 + Send + Sync + 'static,
    {
        Weight::Function(Arc::new(f))
    }

    /// Weight on the persistence `death - birth`
    pub fn persistence() -> Self {
        Weight::function(|birth, death| death - birth)
    }

    pub fn at(&self, birth: f64, death: f64) -> f64 {
        match self {
            Weight::Uniform => 1.0,
            Weight::Function(f) => f(birth, death),
        }
    }
}

impl fmt::Debug for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Weight::Uniform => f.write_str("Uniform"),
            Weight::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// How two rank functions are compared
#[derive(Debug, Clone, Default)]
pub struct DistanceOptions {
    pub metric: Metric,
    pub weight: Weight,
    pub scale: ScaleMode,
}

impl DistanceOptions {
    pub fn new(metric: Metric, scale: ScaleMode) -> Self {
        Self {
            metric,
            weight: Weight::Uniform,
            scale,
        }
    }

    pub fn with_weight(mut self, weight: Weight) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_scale(mut self, scale: ScaleMode) -> Self {
        self.scale = scale;
        self
    }
}

pub fn norm(prf: &PersistenceRankFunction, metric: Metric, weight: &Weight) -> f64 {
    let r = prf.resolution();
    let unit = linspace_to(1.0, r);
    let cell_area = 2.0 / (r * r) as f64;

    let mut sum = 0.0;
    for ((i, j), &v) in prf.values().indexed_iter() {
        if v.is_nan() {
            continue;
        }
        let w = weight.at(unit[i], unit[j]);
        sum += match metric {
            Metric::L1 => v.abs() * w,
            Metric::L2 => v * v * w,
        };
    }

    match metric {
        Metric::L1 => sum * cell_area,
        Metric::L2 => (sum * cell_area).sqrt(),
    }
}

/// Norm of `a - b`, scaled as requested; `0/0` comes out as `NaN`
pub fn distance(
    a: &PersistenceRankFunction,
    b: &PersistenceRankFunction,
    options: &DistanceOptions,
) -> Result<f64> {
    a.check_compatible(b)?;
    let diff = a.with_values(a.values() - b.values());
    let d = norm(&diff, options.metric, &options.weight);

    let uniform = Weight::Uniform;
    let scaled = match options.scale {
        ScaleMode::None => d,
        ScaleMode::A => d / norm(a, options.metric, &uniform),
        ScaleMode::B => d / norm(b, options.metric, &uniform),
        ScaleMode::Sum => {
            d / (norm(a, options.metric, &uniform) + norm(b, options.metric, &uniform))
        }
    };
    Ok(scaled)
}

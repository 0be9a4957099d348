//! Filtration configuration
//!
//! `FiltrationParams` is an immutable value: it is built once, validated,
//! and handed to the builder. Parameter sweeps derive new values with the
//! `with_*` methods instead of mutating a shared table.
//!
//! On the wire (TOML / JSON) the two legacy encodings are kept:
//!
//! ```toml
//! ds_rate = 10
//! num_divisions = 30
//! max_filtration_param = -4   # negative: stop at the first 4-simplex
//! use_cliques = true
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TdaError};
use crate::trajectory::LandmarkSelector;

/// How far the epsilon sequence extends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum FiltrationCutoff {
    /// Epsilons span `[0, max]`
    Explicit(f64),
    /// Epsilons span `[0, ε*]`, where ε* is the first threshold at which a
    /// simplex of this dimension exists
    AdaptiveDimension(usize),
}

impl TryFrom<f64> for FiltrationCutoff {
    type Error = String;

    fn try_from(value: f64) -> std::result::Result<Self, Self::Error> {
        if !value.is_finite() || value == 0.0 {
            return Err(format!(
                "max_filtration_param must be a non-zero finite number, got {}",
                value
            ));
        }
        if value > 0.0 {
            Ok(FiltrationCutoff::Explicit(value))
        } else {
            Ok(FiltrationCutoff::AdaptiveDimension(value.abs().round() as usize))
        }
    }
}

impl From<FiltrationCutoff> for f64 {
    fn from(cutoff: FiltrationCutoff) -> f64 {
        match cutoff {
            FiltrationCutoff::Explicit(max) => max,
            FiltrationCutoff::AdaptiveDimension(dim) => -(dim as f64),
        }
    }
}

/// Complex-growth rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum ComplexMode {
    /// Simplices are born when a single witness sees all their vertices
    Witness,
    /// Edges from landmark distances, then the full clique (flag) complex
    Clique,
}

impl From<bool> for ComplexMode {
    fn from(use_cliques: bool) -> Self {
        if use_cliques {
            ComplexMode::Clique
        } else {
            ComplexMode::Witness
        }
    }
}

impl From<ComplexMode> for bool {
    fn from(mode: ComplexMode) -> bool {
        mode == ComplexMode::Clique
    }
}

/// Parameters of a single filtration build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FiltrationParams {
    worm_length: Option<usize>,
    ds_rate: usize,
    num_divisions: usize,
    max_filtration_param: FiltrationCutoff,
    #[serde(rename = "use_cliques")]
    mode: ComplexMode,
    landmark_selector: LandmarkSelector,
    max_simplex_dim: usize,
}

impl Default for FiltrationParams {
    fn default() -> Self {
        Self {
            worm_length: None,
            ds_rate: 10,
            num_divisions: 30,
            max_filtration_param: FiltrationCutoff::AdaptiveDimension(5),
            mode: ComplexMode::Witness,
            landmark_selector: LandmarkSelector::Stride,
            max_simplex_dim: 2,
        }
    }
}

impl FiltrationParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let params: FiltrationParams = toml::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    /// Load and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            TdaError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.ds_rate == 0 {
            return Err(TdaError::Config("ds_rate must be at least 1".into()));
        }
        if self.num_divisions < 2 {
            return Err(TdaError::Config("num_divisions must be at least 2".into()));
        }
        if self.max_simplex_dim < 2 {
            return Err(TdaError::Config(
                "max_simplex_dim must be at least 2 for H1 classes to die".into(),
            ));
        }
        if self.worm_length == Some(0) {
            return Err(TdaError::Config("worm_length must be positive".into()));
        }
        match self.max_filtration_param {
            FiltrationCutoff::Explicit(max) if !(max.is_finite() && max > 0.0) => Err(
                TdaError::Config(format!("explicit cutoff must be positive, got {}", max)),
            ),
            FiltrationCutoff::AdaptiveDimension(0) => Err(TdaError::Config(
                "adaptive cutoff dimension must be at least 1".into(),
            )),
            _ => Ok(()),
        }
    }

    pub fn worm_length(&self) -> Option<usize> {
        self.worm_length
    }

    pub fn ds_rate(&self) -> usize {
        self.ds_rate
    }

    pub fn num_divisions(&self) -> usize {
        self.num_divisions
    }

    pub fn cutoff(&self) -> FiltrationCutoff {
        self.max_filtration_param
    }

    pub fn mode(&self) -> ComplexMode {
        self.mode
    }

    pub fn landmark_selector(&self) -> LandmarkSelector {
        self.landmark_selector
    }

    pub fn max_simplex_dim(&self) -> usize {
        self.max_simplex_dim
    }

    pub fn with_worm_length(&self, worm_length: Option<usize>) -> Self {
        Self {
            worm_length,
            ..self.clone()
        }
    }

    pub fn with_ds_rate(&self, ds_rate: usize) -> Self {
        Self {
            ds_rate,
            ..self.clone()
        }
    }

    pub fn with_num_divisions(&self, num_divisions: usize) -> Self {
        Self {
            num_divisions,
            ..self.clone()
        }
    }

    pub fn with_cutoff(&self, cutoff: FiltrationCutoff) -> Self {
        Self {
            max_filtration_param: cutoff,
            ..self.clone()
        }
    }

    pub fn with_mode(&self, mode: ComplexMode) -> Self {
        Self {
            mode,
            ..self.clone()
        }
    }

    pub fn with_landmark_selector(&self, landmark_selector: LandmarkSelector) -> Self {
        Self {
            landmark_selector,
            ..self.clone()
        }
    }

    pub fn with_max_simplex_dim(&self, max_simplex_dim: usize) -> Self {
        Self {
            max_simplex_dim,
            ..self.clone()
        }
    }
}

//! Batch pipelines over windowed trajectories
//!
//! A [`WindowPipeline`] cuts a trajectory into windows, builds one
//! filtration per window in parallel, computes persistence, and turns the
//! results into rank functions on the unit domain. The statistics of
//! [`crate::prf`] then run over the resulting sets.
//!
//! Every window is independent and every build is deterministic, so the
//! parallel output equals a sequential run, in window order.

use log::info;
use ndarray::Array2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cache::{load_value, store_value, ArtifactCache, CacheKey};
use crate::error::{Result, TdaError};
use crate::prf::{
    consecutive_mean_distances, distances_to_reference, mean, split_alternating,
    DistanceOptions, NearestMeanClassifier, PersistenceRankFunction, RocPoint, ScalarStats,
    Weight,
};
use crate::topology::{Filtration, FiltrationBuilder, FiltrationParams, PersistenceReducer};
use crate::trajectory::Trajectory;

/// ROC curves of two classifiers trained against each other
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualRoc {
    /// Class A tests as positives, class B tests as negatives
    pub a: Vec<RocPoint>,
    /// Class B tests as positives, class A tests as negatives
    pub b: Vec<RocPoint>,
}

/// Windows of two trajectories measured against both mean rank functions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeanDists {
    /// A windows to the A mean
    pub a_vs_a: Vec<f64>,
    /// B windows to the A mean
    pub b_vs_a: Vec<f64>,
    /// A windows to the B mean
    pub a_vs_b: Vec<f64>,
    /// B windows to the B mean
    pub b_vs_b: Vec<f64>,
    pub mean_a: PersistenceRankFunction,
    pub mean_b: PersistenceRankFunction,
}

/// Settings of one sweep cell: filtration parameters, plus the weight
/// multiplied into its rank functions before any statistics
#[derive(Debug, Clone)]
pub struct Variant {
    pub params: FiltrationParams,
    pub weight: Weight,
}

impl Variant {
    pub fn with_params(&self, params: FiltrationParams) -> Self {
        Self {
            params,
            weight: self.weight.clone(),
        }
    }

    pub fn with_weight(&self, weight: Weight) -> Self {
        Self {
            params: self.params.clone(),
            weight,
        }
    }
}

/// Values of one swept setting and how each derives a variant from its base
///
/// ```no_run
/// use tda_prf_dynamics::analysis::{SweepAxis, Variant};
/// use tda_prf_dynamics::Weight;
///
/// let divisions = SweepAxis::new(vec![10usize, 20, 40], |base: &Variant, &n: &usize| {
///     base.with_params(base.params.with_num_divisions(n))
/// });
/// let weights = SweepAxis::new(
///     vec![Weight::Uniform, Weight::persistence()],
///     |base: &Variant, w: &Weight| base.with_weight(w.clone()),
/// );
/// # let _ = (divisions, weights);
/// ```
pub struct SweepAxis<V, F> {
    values: Vec<V>,
    vary: F,
}

impl<V, F> SweepAxis<V, F>
where
    F: Fn(&Variant, &V) -> Variant,
{
    pub fn new(values: Vec<V>, vary: F) -> Self {
        Self { values, vary }
    }

    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn variants(&self, base: &Variant) -> Vec<Variant> {
        self.values.iter().map(|v| (self.vary)(base, v)).collect()
    }
}

/// Windowing, filtration and PRF settings shared by a batch run
#[derive(Clone, Copy)]
pub struct WindowPipeline<'a> {
    params: &'a FiltrationParams,
    reducer: &'a dyn PersistenceReducer,
    cache: Option<&'a dyn ArtifactCache>,
    num_windows: usize,
    window_len: usize,
    resolution: usize,
}

impl<'a> WindowPipeline<'a> {
    /// One window spanning the whole trajectory, 50 × 50 grid, no cache
    pub fn new(params: &'a FiltrationParams, reducer: &'a dyn PersistenceReducer) -> Self {
        Self {
            params,
            reducer,
            cache: None,
            num_windows: 1,
            window_len: usize::MAX,
            resolution: 50,
        }
    }

    pub fn with_windows(self, num_windows: usize, window_len: usize) -> Self {
        Self {
            num_windows,
            window_len,
            ..self
        }
    }

    pub fn with_resolution(self, resolution: usize) -> Self {
        Self { resolution, ..self }
    }

    pub fn with_cache(self, cache: &'a dyn ArtifactCache) -> Self {
        Self {
            cache: Some(cache),
            ..self
        }
    }

    pub fn params(&self) -> &FiltrationParams {
        self.params
    }

    /// Filtrations of every window, persistence already computed
    pub fn filtration_set(&self, trajectory: &Trajectory) -> Result<Vec<Filtration>> {
        let builder = FiltrationBuilder::new(self.params.clone())?;
        let windows = trajectory.slice(self.num_windows, self.window_len)?;
        info!(
            "building {} window filtrations ({} samples each)",
            windows.len(),
            self.window_len.min(trajectory.len())
        );

        windows
            .par_iter()
            .map(|window| self.window_filtration(&builder, window))
            .collect()
    }

    fn window_filtration(
        &self,
        builder: &FiltrationBuilder,
        window: &Trajectory,
    ) -> Result<Filtration> {
        let key = match self.cache {
            Some(cache) => {
                let tag = self.reducer.cache_tag();
                let key = CacheKey::filtration(window, builder.params(), &tag)?;
                if let Some(filtration) = load_value::<Filtration>(cache, &key)? {
                    if filtration.persistence().is_some() {
                        return Ok(filtration);
                    }
                }
                Some((cache, key))
            }
            None => None,
        };

        let mut filtration = builder.build(window)?;
        filtration.compute_persistence(self.reducer)?;

        if let Some((cache, key)) = key {
            store_value(cache, &key, &filtration)?;
        }
        Ok(filtration)
    }

    /// Normalized rank functions of every window
    pub fn prf_set(&self, trajectory: &Trajectory) -> Result<Vec<PersistenceRankFunction>> {
        let filtrations = self.filtration_set(trajectory)?;
        let resolution = self.resolution;
        filtrations
            .par_iter()
            .map(|f| f.prf(resolution).map(|prf| prf.normalized()))
            .collect()
    }

    /// Distance of every window's rank function to `reference`
    pub fn dists_to_ref(
        &self,
        trajectory: &Trajectory,
        reference: &PersistenceRankFunction,
        options: &DistanceOptions,
    ) -> Result<Vec<f64>> {
        let prfs = self.prf_set(trajectory)?;
        distances_to_reference(&prfs, &reference.normalized(), options)
    }

    /// Train one classifier per trajectory on alternate windows and score
    /// each on the held-out windows of both
    pub fn dual_roc(
        &self,
        a: &Trajectory,
        b: &Trajectory,
        options: &DistanceOptions,
        ks: &[f64],
    ) -> Result<DualRoc> {
        dual_roc_of(&self.prf_set(a)?, &self.prf_set(b)?, options, ks)
    }

    /// Each trajectory's windows measured against both trajectories' mean
    /// rank functions
    pub fn dists_to_means(
        &self,
        a: &Trajectory,
        b: &Trajectory,
        options: &DistanceOptions,
    ) -> Result<MeanDists> {
        let prfs_a = self.prf_set(a)?;
        let prfs_b = self.prf_set(b)?;
        let mean_a = mean(&prfs_a)?;
        let mean_b = mean(&prfs_b)?;

        Ok(MeanDists {
            a_vs_a: distances_to_reference(&prfs_a, &mean_a, options)?,
            b_vs_a: distances_to_reference(&prfs_b, &mean_a, options)?,
            a_vs_b: distances_to_reference(&prfs_a, &mean_b, options)?,
            b_vs_b: distances_to_reference(&prfs_b, &mean_b, options)?,
            mean_a,
            mean_b,
        })
    }

    /// Scalar statistics of the window set for each value on `axis`.
    ///
    /// Every value derives a fresh variant from the pipeline's parameters
    /// (uniform weight); the base is never modified.
    pub fn variance_over<V, F>(
        &self,
        trajectory: &Trajectory,
        axis: &SweepAxis<V, F>,
        options: &DistanceOptions,
    ) -> Result<Vec<ScalarStats>>
    where
        F: Fn(&Variant, &V) -> Variant,
    {
        axis.variants(&self.base_variant())
            .iter()
            .map(|variant| {
                let prfs = self.variant_prfs(trajectory, variant)?;
                ScalarStats::compute(&prfs, options)
            })
            .collect()
    }

    /// Scalar statistics over the grid `axis_1 × axis_2`; entry `[i][j]`
    /// applies the i-th value of `axis_1`, then the j-th value of `axis_2`
    pub fn variance_grid<V1, F1, V2, F2>(
        &self,
        trajectory: &Trajectory,
        axis_1: &SweepAxis<V1, F1>,
        axis_2: &SweepAxis<V2, F2>,
        options: &DistanceOptions,
    ) -> Result<Vec<Vec<ScalarStats>>>
    where
        F1: Fn(&Variant, &V1) -> Variant,
        F2: Fn(&Variant, &V2) -> Variant,
    {
        self.grid_prfs(trajectory, axis_1, axis_2)?
            .iter()
            .map(|row| {
                row.iter()
                    .map(|prfs| ScalarStats::compute(prfs, options))
                    .collect()
            })
            .collect()
    }

    /// Distance between the mean rank functions of neighbouring `axis_1`
    /// values, for every value of `axis_2`.
    ///
    /// Entry `[i, j]` compares cells `(i, j)` and `(i + 1, j)`, so the result
    /// has one row fewer than `axis_1` has values.
    pub fn pairwise_mean_dists<V1, F1, V2, F2>(
        &self,
        trajectory: &Trajectory,
        axis_1: &SweepAxis<V1, F1>,
        axis_2: &SweepAxis<V2, F2>,
        options: &DistanceOptions,
    ) -> Result<Array2<f64>>
    where
        F1: Fn(&Variant, &V1) -> Variant,
        F2: Fn(&Variant, &V2) -> Variant,
    {
        if axis_1.len() < 2 {
            return Err(TdaError::InsufficientSamples {
                required: 2,
                found: axis_1.len(),
            });
        }
        let grid = self.grid_prfs(trajectory, axis_1, axis_2)?;

        let mut dists = Array2::zeros((axis_1.len() - 1, axis_2.len()));
        for j in 0..axis_2.len() {
            let column: Vec<Vec<PersistenceRankFunction>> =
                grid.iter().map(|row| row[j].clone()).collect();
            for (i, d) in consecutive_mean_distances(&column, options)?
                .into_iter()
                .enumerate()
            {
                dists[[i, j]] = d;
            }
        }
        Ok(dists)
    }

    /// [`WindowPipeline::dual_roc`] for each value on `axis`
    pub fn dual_roc_over<V, F>(
        &self,
        a: &Trajectory,
        b: &Trajectory,
        axis: &SweepAxis<V, F>,
        options: &DistanceOptions,
        ks: &[f64],
    ) -> Result<Vec<DualRoc>>
    where
        F: Fn(&Variant, &V) -> Variant,
    {
        axis.variants(&self.base_variant())
            .iter()
            .map(|variant| {
                let prfs_a = self.variant_prfs(a, variant)?;
                let prfs_b = self.variant_prfs(b, variant)?;
                dual_roc_of(&prfs_a, &prfs_b, options, ks)
            })
            .collect()
    }

    fn base_variant(&self) -> Variant {
        Variant {
            params: self.params.clone(),
            weight: Weight::Uniform,
        }
    }

    /// Normalized, weighted rank functions of every window under `variant`
    fn variant_prfs(
        &self,
        trajectory: &Trajectory,
        variant: &Variant,
    ) -> Result<Vec<PersistenceRankFunction>> {
        let pipeline = WindowPipeline {
            params: &variant.params,
            ..*self
        };
        let prfs = pipeline.prf_set(trajectory)?;
        Ok(prfs.iter().map(|p| p.weighted(&variant.weight)).collect())
    }

    fn grid_prfs<V1, F1, V2, F2>(
        &self,
        trajectory: &Trajectory,
        axis_1: &SweepAxis<V1, F1>,
        axis_2: &SweepAxis<V2, F2>,
    ) -> Result<Vec<Vec<Vec<PersistenceRankFunction>>>>
    where
        F1: Fn(&Variant, &V1) -> Variant,
        F2: Fn(&Variant, &V2) -> Variant,
    {
        info!("sweeping {} x {} variants", axis_1.len(), axis_2.len());
        axis_1
            .variants(&self.base_variant())
            .iter()
            .map(|row_base| {
                axis_2
                    .variants(row_base)
                    .iter()
                    .map(|variant| self.variant_prfs(trajectory, variant))
                    .collect()
            })
            .collect()
    }
}

/// Train one classifier per set on alternate windows and score each on the
/// held-out windows of both
fn dual_roc_of(
    prfs_a: &[PersistenceRankFunction],
    prfs_b: &[PersistenceRankFunction],
    options: &DistanceOptions,
    ks: &[f64],
) -> Result<DualRoc> {
    let (train_a, test_a) = split_alternating(prfs_a);
    let (train_b, test_b) = split_alternating(prfs_b);

    let clf_a = NearestMeanClassifier::train(&train_a, options)?;
    let clf_b = NearestMeanClassifier::train(&train_b, options)?;
    info!(
        "dual ROC: sigma_a = {:.6}, sigma_b = {:.6}",
        clf_a.sigma(),
        clf_b.sigma()
    );

    Ok(DualRoc {
        a: clf_a.roc(&test_a, &test_b, ks)?,
        b: clf_b.roc(&test_b, &test_a, ks)?,
    })
}

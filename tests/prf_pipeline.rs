//! Rank functions from real filtrations, batch pipelines and caching

use std::f64::consts::PI;

use approx::assert_relative_eq;
use ndarray::Array2;
use tda_prf_dynamics::prf::split_alternating;
use tda_prf_dynamics::{
    classify, distance, mean, norm, ComplexMode, DirCache, DistanceOptions, Filtration,
    FiltrationBuilder, FiltrationParams, MatrixReducer, Metric, NearestMeanClassifier,
    ScaleMode, Trajectory, Weight, WindowPipeline,
};

/// `loops` turns around the unit circle, 30 samples per turn
fn circle(loops: usize) -> Trajectory {
    let n = 30 * loops;
    let points = Array2::from_shape_fn((n, 2), |(i, k)| {
        let theta = 2.0 * PI * i as f64 / 30.0;
        if k == 0 {
            theta.cos()
        } else {
            theta.sin()
        }
    });
    Trajectory::new(points).unwrap()
}

/// Evenly spaced points on a segment of length 2
fn segment(n: usize) -> Trajectory {
    let points = Array2::from_shape_fn((n, 2), |(i, k)| {
        if k == 0 {
            2.0 * i as f64 / (n - 1) as f64
        } else {
            0.0
        }
    });
    Trajectory::new(points).unwrap()
}

fn clique_params() -> FiltrationParams {
    FiltrationParams::from_toml_str(
        "ds_rate = 3\nnum_divisions = 12\nmax_filtration_param = 1.5\nuse_cliques = true\n",
    )
    .unwrap()
}

fn window_pipeline(params: &FiltrationParams) -> WindowPipeline<'_> {
    WindowPipeline::new(params, &MatrixReducer)
        .with_windows(4, 30)
        .with_resolution(12)
}

#[test]
fn test_prf_of_circle_counts_one_loop() {
    let mut filt = FiltrationBuilder::new(clique_params())
        .unwrap()
        .build(&circle(1))
        .unwrap();
    filt.compute_persistence(&MatrixReducer).unwrap();

    let pd = filt.persistence().unwrap();
    assert_eq!(pd.len(), 1);
    assert!(pd.pairs[0].is_immortal());

    let prf = filt.prf(12).unwrap();
    assert!(prf.is_monotone());
    let max = prf.values().iter().filter(|v| !v.is_nan()).fold(0.0_f64, |a, &b| a.max(b));
    assert_eq!(max, 1.0);
    // born before the domain edge, alive through it
    assert_eq!(prf.get(11, 11), 1.0);
    assert_eq!(prf.get(0, 11), 0.0);
}

#[test]
fn test_mean_of_single_prf_is_exact() {
    let mut filt = FiltrationBuilder::new(clique_params())
        .unwrap()
        .build(&circle(1))
        .unwrap();
    filt.compute_persistence(&MatrixReducer).unwrap();
    let prf = filt.prf(10).unwrap().normalized();

    let mu = mean(std::slice::from_ref(&prf)).unwrap();
    assert_eq!(distance(&mu, &prf, &DistanceOptions::default()).unwrap(), 0.0);
}

#[test]
fn test_scaled_distances_on_real_prf() {
    let mut filt = FiltrationBuilder::new(clique_params())
        .unwrap()
        .build(&circle(1))
        .unwrap();
    filt.compute_persistence(&MatrixReducer).unwrap();
    let p = filt.prf(10).unwrap().normalized();
    let q = p.scaled(2.0);

    for metric in [Metric::L1, Metric::L2] {
        let d = |scale| distance(&p, &q, &DistanceOptions::new(metric, scale)).unwrap();
        assert_relative_eq!(d(ScaleMode::A), 1.0, epsilon = 1e-12);
        assert_relative_eq!(d(ScaleMode::B), 0.5, epsilon = 1e-12);
        assert_relative_eq!(d(ScaleMode::Sum), 1.0 / 3.0, epsilon = 1e-12);
        assert_eq!(
            distance(&p, &p, &DistanceOptions::new(metric, ScaleMode::Sum)).unwrap(),
            0.0
        );
    }

    // a weight that vanishes on the diagonal lowers the norm
    let weighted = norm(&p, Metric::L1, &Weight::persistence());
    assert!(weighted < norm(&p, Metric::L1, &Weight::Uniform));
}

#[test]
fn test_dual_roc_separates_circle_from_segment() {
    let params = clique_params();
    let pipeline = window_pipeline(&params);
    let ks = [0.0, 1.0, 2.0];
    let roc = pipeline
        .dual_roc(&circle(4), &segment(120), &DistanceOptions::default(), &ks)
        .unwrap();

    for point in roc.a.iter().chain(&roc.b) {
        assert_eq!(point.tpr, 1.0);
        assert_eq!(point.fpr, 0.0);
    }
}

#[test]
fn test_classify_held_out_windows() {
    let params = clique_params();
    let pipeline = window_pipeline(&params);
    let opts = DistanceOptions::new(Metric::L1, ScaleMode::None);

    let (train_c, test_c) = split_alternating(&pipeline.prf_set(&circle(4)).unwrap());
    let (train_s, test_s) = split_alternating(&pipeline.prf_set(&segment(120)).unwrap());
    let classifiers = [
        NearestMeanClassifier::train(&train_c, &opts).unwrap(),
        NearestMeanClassifier::train(&train_s, &opts).unwrap(),
    ];

    assert!(test_c.iter().all(|p| classify(p, &classifiers).unwrap() == 0));
    assert!(test_s.iter().all(|p| classify(p, &classifiers).unwrap() == 1));
}

#[test]
fn test_dir_cache_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let params = clique_params();
    let traj = circle(4);

    let first = {
        let cache = DirCache::new(dir.path()).unwrap();
        window_pipeline(&params).with_cache(&cache).filtration_set(&traj).unwrap()
    };
    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 4);

    let cache = DirCache::new(dir.path()).unwrap();
    let second = window_pipeline(&params).with_cache(&cache).filtration_set(&traj).unwrap();
    assert_eq!(first, second);
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 4);
}

#[test]
fn test_params_file_and_saved_filtration() {
    let dir = tempfile::tempdir().unwrap();
    let params_path = dir.path().join("params.toml");
    std::fs::write(
        &params_path,
        "ds_rate = 3\nnum_divisions = 8\nmax_filtration_param = -2\nuse_cliques = true\n",
    )
    .unwrap();

    let params = FiltrationParams::from_file(&params_path).unwrap();
    assert_eq!(params.mode(), ComplexMode::Clique);

    let mut filt = FiltrationBuilder::new(params).unwrap().build(&circle(1)).unwrap();
    filt.compute_persistence(&MatrixReducer).unwrap();
    // the run stops as soon as the first triangle appears
    let last = filt.epsilons().len() - 1;
    assert!(filt.simplices().iter().filter(|s| s.dimension() == 2).all(|s| s.birth == last));

    let saved = dir.path().join("circle.filt");
    filt.save(&saved).unwrap();
    let loaded = Filtration::load(&saved).unwrap();
    assert_eq!(loaded.get_pd_data().unwrap(), filt.get_pd_data().unwrap());
}

//! End-to-end filtration scenarios: birth times, persistence and PD data

use ndarray::array;
use tda_prf_dynamics::{
    ComplexMode, Filtration, FiltrationBuilder, FiltrationParams, FiltrationState,
    MatrixReducer, PersistenceReducer, Trajectory,
};

fn birth_of(filtration: &Filtration, vertices: &[usize]) -> Option<usize> {
    filtration
        .simplices()
        .iter()
        .find(|s| s.vertices == vertices)
        .map(|s| s.birth)
}

/// Corners and edge midpoints of the unit square, corners at even indices
fn square_with_midpoints() -> Trajectory {
    Trajectory::new(array![
        [0.0, 0.0],
        [0.5, 0.0],
        [1.0, 0.0],
        [1.0, 0.5],
        [1.0, 1.0],
        [0.5, 1.0],
        [0.0, 1.0],
        [0.0, 0.5]
    ])
    .unwrap()
}

/// Triangle with side 1 plus a far-away fourth point
fn triangle_and_outlier() -> Trajectory {
    let h = 3.0_f64.sqrt() / 2.0;
    Trajectory::new(array![[0.0, 0.0], [1.0, 0.0], [0.5, h], [10.0, 0.0]]).unwrap()
}

#[test]
fn test_three_landmark_clique_births() {
    let traj = Trajectory::new(array![[0.0], [-1.0], [1.0]]).unwrap();
    let params = FiltrationParams::new()
        .with_ds_rate(1)
        .with_mode(ComplexMode::Clique);
    let filt = FiltrationBuilder::new(params)
        .unwrap()
        .build_with_epsilons(&traj, &[0.0, 1.0, 1.5, 2.0])
        .unwrap();

    assert_eq!(birth_of(&filt, &[0, 1]), Some(1));
    assert_eq!(birth_of(&filt, &[0, 2]), Some(1));
    assert_eq!(birth_of(&filt, &[1, 2]), Some(3));
    assert_eq!(birth_of(&filt, &[0, 1, 2]), Some(3));
}

#[test]
fn test_filled_triangle_has_no_loop() {
    let params = FiltrationParams::new()
        .with_ds_rate(1)
        .with_mode(ComplexMode::Clique);
    let mut filt = FiltrationBuilder::new(params)
        .unwrap()
        .build_with_epsilons(&triangle_and_outlier(), &[0.0, 0.5, 1.0])
        .unwrap();

    let triangles: Vec<_> = filt.simplices().iter().filter(|s| s.dimension() == 2).collect();
    assert_eq!(triangles.len(), 1);
    assert_eq!(triangles[0].vertices, vec![0, 1, 2]);
    assert_eq!(triangles[0].birth, 2);
    // the outlier stays an isolated vertex
    assert!(filt.simplices().iter().all(|s| s.dimension() == 0 || !s.vertices.contains(&3)));

    filt.compute_persistence(&MatrixReducer).unwrap();
    assert!(filt.get_pd_data().unwrap().is_empty());
}

#[test]
fn test_witnessed_loop_persists() {
    // midpoints witness the sides; nothing witnesses a diagonal below 1.118
    let params = FiltrationParams::new().with_ds_rate(2);
    let mut filt = FiltrationBuilder::new(params)
        .unwrap()
        .build_with_epsilons(&square_with_midpoints(), &[0.0, 0.5, 0.9])
        .unwrap();

    assert_eq!(filt.landmark_indices(), &[0, 2, 4, 6]);
    assert_eq!(filt.max_dimension(), 1);
    assert_eq!(birth_of(&filt, &[0, 1]), Some(1));
    assert_eq!(birth_of(&filt, &[0, 2]), None);

    filt.compute_persistence(&MatrixReducer).unwrap();
    let data = filt.get_pd_data().unwrap();
    assert!(data.mortal.is_empty());
    assert_eq!(data.immortal.len(), 1);
    assert_eq!(data.immortal[0].birth, 0.5);
    assert_eq!(data.immortal[0].count, 1);
}

#[test]
fn test_witnessed_loop_fills_at_side_length() {
    // at epsilon 1 each corner witnesses its two neighbours
    let params = FiltrationParams::new().with_ds_rate(2);
    let mut filt = FiltrationBuilder::new(params)
        .unwrap()
        .build_with_epsilons(&square_with_midpoints(), &[0.0, 0.5, 0.9, 1.0])
        .unwrap();

    assert_eq!(birth_of(&filt, &[0, 1, 3]), Some(3));
    let pd = filt.compute_persistence(&MatrixReducer).unwrap();
    assert_eq!(pd.len(), 1);
    assert_eq!(pd.pairs[0].birth, 1);
    assert_eq!(pd.pairs[0].death, Some(3));
}

#[test]
fn test_filtration_is_nested() {
    let params = FiltrationParams::new().with_ds_rate(1);
    let filt = FiltrationBuilder::new(params)
        .unwrap()
        .build_with_epsilons(&square_with_midpoints(), &[0.0, 0.3, 0.6, 0.9, 1.2])
        .unwrap();

    assert!(filt.is_monotone());
    for t in 1..filt.epsilons().len() {
        let before = filt.complex_at(t - 1);
        let after = filt.complex_at(t);
        assert!(before.len() <= after.len());
        assert!(before.iter().all(|s| after.contains(s)));
    }
}

#[test]
fn test_persistence_is_computed_once() {
    struct Refusing;
    impl PersistenceReducer for Refusing {
        fn reduce(
            &self,
            _: &[tda_prf_dynamics::Simplex],
            _: usize,
        ) -> tda_prf_dynamics::Result<tda_prf_dynamics::PersistenceDiagram> {
            Err(tda_prf_dynamics::TdaError::InvalidInput("called twice".into()))
        }
    }

    let params = FiltrationParams::new().with_ds_rate(2);
    let mut filt = FiltrationBuilder::new(params)
        .unwrap()
        .build_with_epsilons(&square_with_midpoints(), &[0.0, 0.5, 0.9])
        .unwrap();

    assert!(filt.compute_persistence(&Refusing).is_err());
    assert_eq!(filt.state(), FiltrationState::Built);

    filt.compute_persistence(&MatrixReducer).unwrap();
    assert_eq!(filt.state(), FiltrationState::PersistenceComputed);
    // cached: the second reducer is never consulted
    assert!(filt.compute_persistence(&Refusing).is_ok());
}

#[cfg(unix)]
mod external_tool {
    use super::*;
    use std::ffi::OsStr;
    use std::fs;
    use std::path::Path;
    use tda_prf_dynamics::topology::format_reduction_input;
    use tda_prf_dynamics::ExternalReducer;

    /// Shell script that keeps a copy of its input and emits a canned result
    fn fake_tool(dir: &Path, output: &str) -> ExternalReducer {
        let script = dir.join("tool.sh");
        fs::write(
            &script,
            format!(
                "cp \"$2\" '{}'\nprintf '{}' > \"$3_1.txt\"\n",
                dir.join("received.txt").display(),
                output
            ),
        )
        .unwrap();
        ExternalReducer::new("sh").with_args([script.as_os_str(), OsStr::new("nmfsimtop")])
    }

    #[test]
    fn test_round_trip_witnessed_loop() {
        let params = FiltrationParams::new().with_ds_rate(2);
        let mut filt = FiltrationBuilder::new(params)
            .unwrap()
            .build_with_epsilons(&square_with_midpoints(), &[0.0, 0.5, 0.9])
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(dir.path(), "2 -1\\n");

        filt.compute_persistence(&tool).unwrap();
        let received = fs::read_to_string(dir.path().join("received.txt")).unwrap();
        assert_eq!(received, format_reduction_input(filt.simplices()));
        let data = filt.get_pd_data().unwrap();
        assert!(data.mortal.is_empty());
        assert_eq!(data.immortal.len(), 1);
        assert_eq!(data.immortal[0].birth, 0.5);
    }

    #[test]
    fn test_round_trip_filled_triangle() {
        let params = FiltrationParams::new()
            .with_ds_rate(1)
            .with_mode(ComplexMode::Clique);
        let mut filt = FiltrationBuilder::new(params)
            .unwrap()
            .build_with_epsilons(&triangle_and_outlier(), &[0.0, 0.5, 1.0])
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let tool = fake_tool(dir.path(), "");

        filt.compute_persistence(&tool).unwrap();
        let received = fs::read_to_string(dir.path().join("received.txt")).unwrap();
        assert!(received.starts_with("1\n"));
        assert!(received.lines().any(|l| l == "2 0 1 2 3"));
        assert!(filt.get_pd_data().unwrap().is_empty());
    }
}

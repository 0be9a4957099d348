//! Filtrations and Their Persistence Data
//!
//! A [`Filtration`] is produced by the builder in the *built* state. Running
//! a [`PersistenceReducer`] over it moves it, once and for good, to the
//! *persistence computed* state; the diagram is cached and every later query
//! reads from the cache.
//!
//! ```text
//!   FiltrationBuilder ──build──▶ Built ──compute_persistence──▶ PersistenceComputed
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use super::betti::BettiCurve;
use super::params::FiltrationParams;
use super::persistence::PersistenceDiagram;
use super::reduction::PersistenceReducer;
use super::simplex::Simplex;
use crate::error::{Result, TdaError};
use crate::prf::PersistenceRankFunction;

/// Homological degree tracked by the rank functions (loops)
pub const TRACKED_DIMENSION: usize = 1;

/// Lifecycle position of a filtration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiltrationState {
    Built,
    PersistenceComputed,
}

/// Finite diagram point with its multiplicity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MortalPoint {
    pub birth: f64,
    pub death: f64,
    pub count: usize,
}

/// Immortal diagram point with its multiplicity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImmortalPoint {
    pub birth: f64,
    pub count: usize,
}

/// Diagram points in epsilon units, grouped for marker sizing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PdData {
    pub mortal: Vec<MortalPoint>,
    pub immortal: Vec<ImmortalPoint>,
}

impl PdData {
    pub fn is_empty(&self) -> bool {
        self.mortal.is_empty() && self.immortal.is_empty()
    }
}

/// Landmark complex grown over an epsilon sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filtration {
    params: FiltrationParams,
    witness_coords: Array2<f64>,
    landmark_indices: Vec<usize>,
    landmark_coords: Array2<f64>,
    epsilons: Vec<f64>,
    simplices: Vec<Simplex>,
    persistence: Option<PersistenceDiagram>,
}

impl Filtration {
    pub(crate) fn from_parts(
        params: FiltrationParams,
        witness_coords: Array2<f64>,
        landmark_indices: Vec<usize>,
        landmark_coords: Array2<f64>,
        epsilons: Vec<f64>,
        simplices: Vec<Simplex>,
    ) -> Self {
        Self {
            params,
            witness_coords,
            landmark_indices,
            landmark_coords,
            epsilons,
            simplices,
            persistence: None,
        }
    }

    pub fn params(&self) -> &FiltrationParams {
        &self.params
    }

    pub fn epsilons(&self) -> &[f64] {
        &self.epsilons
    }

    pub fn num_divisions(&self) -> usize {
        self.epsilons.len()
    }

    pub fn witness_coords(&self) -> &Array2<f64> {
        &self.witness_coords
    }

    /// Witness indices of the landmarks, in landmark order
    pub fn landmark_indices(&self) -> &[usize] {
        &self.landmark_indices
    }

    pub fn landmark_coords(&self) -> &Array2<f64> {
        &self.landmark_coords
    }

    pub fn num_landmarks(&self) -> usize {
        self.landmark_indices.len()
    }

    /// All simplices in filtration order
    pub fn simplices(&self) -> &[Simplex] {
        &self.simplices
    }

    pub fn max_dimension(&self) -> usize {
        self.simplices.iter().map(|s| s.dimension()).max().unwrap_or(0)
    }

    /// Simplices grouped by the epsilon index at which they are born
    pub fn simplices_by_time(&self) -> Vec<Vec<&Simplex>> {
        let mut by_time: Vec<Vec<&Simplex>> = vec![Vec::new(); self.epsilons.len()];
        for s in &self.simplices {
            by_time[s.birth].push(s);
        }
        by_time
    }

    /// The complex as it stands at threshold index `t`
    pub fn complex_at(&self, t: usize) -> Vec<&Simplex> {
        self.simplices.iter().filter(|s| s.birth <= t).collect()
    }

    /// Every face is present no later than its coface
    pub fn is_monotone(&self) -> bool {
        let births: HashMap<&[usize], usize> = self
            .simplices
            .iter()
            .map(|s| (s.vertices.as_slice(), s.birth))
            .collect();

        self.simplices.iter().all(|s| {
            s.faces().iter().all(|face| {
                births
                    .get(face.as_slice())
                    .map_or(false, |&b| b <= s.birth)
            })
        })
    }

    pub fn state(&self) -> FiltrationState {
        match self.persistence {
            Some(_) => FiltrationState::PersistenceComputed,
            None => FiltrationState::Built,
        }
    }

    /// Run the reduction once; later calls return the cached diagram
    pub fn compute_persistence(
        &mut self,
        reducer: &dyn PersistenceReducer,
    ) -> Result<&PersistenceDiagram> {
        if self.persistence.is_none() {
            let diagram = reducer.reduce(&self.simplices, TRACKED_DIMENSION)?;
            check_pair_indices(&diagram, self.epsilons.len())?;
            debug!(
                "persistence computed: {} classes ({} immortal)",
                diagram.len(),
                diagram.immortal().count()
            );
            self.persistence = Some(diagram);
        }
        self.persistence.as_ref().ok_or_else(|| {
            TdaError::invalid("persistence diagram missing after reduction")
        })
    }

    /// The cached diagram, if persistence has been computed
    pub fn persistence(&self) -> Option<&PersistenceDiagram> {
        self.persistence.as_ref()
    }

    fn require_persistence(&self) -> Result<&PersistenceDiagram> {
        self.persistence.as_ref().ok_or_else(|| {
            TdaError::invalid("persistence has not been computed for this filtration")
        })
    }

    /// Diagram points in epsilon units with multiplicities
    pub fn get_pd_data(&self) -> Result<PdData> {
        let diagram = self.require_persistence()?;

        let mut mortal: BTreeMap<(usize, usize), usize> = BTreeMap::new();
        let mut immortal: BTreeMap<usize, usize> = BTreeMap::new();
        for pair in &diagram.pairs {
            match pair.death {
                Some(death) => *mortal.entry((pair.birth, death)).or_insert(0) += 1,
                None => *immortal.entry(pair.birth).or_insert(0) += 1,
            }
        }

        Ok(PdData {
            mortal: mortal
                .into_iter()
                .map(|((b, d), count)| MortalPoint {
                    birth: self.epsilons[b],
                    death: self.epsilons[d],
                    count,
                })
                .collect(),
            immortal: immortal
                .into_iter()
                .map(|(b, count)| ImmortalPoint {
                    birth: self.epsilons[b],
                    count,
                })
                .collect(),
        })
    }

    /// Per epsilon index, the coordinates of the simplices born there.
    ///
    /// Edges become 2-point polylines and triangles 3-point polygons; larger
    /// simplices are expanded into their triangles. Vertices are omitted.
    pub fn get_complexes_mpl(&self) -> Vec<Vec<Vec<Vec<f64>>>> {
        let coords = |v: usize| self.landmark_coords.row(v).to_vec();

        self.simplices_by_time()
            .into_iter()
            .map(|born| {
                let mut shapes = Vec::new();
                for s in born {
                    match s.vertices.len() {
                        0 | 1 => {}
                        2 | 3 => shapes.push(s.vertices.iter().map(|&v| coords(v)).collect()),
                        _ => {
                            for tri in triangles_of(&s.vertices) {
                                shapes.push(tri.iter().map(|&v| coords(v)).collect());
                            }
                        }
                    }
                }
                shapes
            })
            .collect()
    }

    pub fn betti_curve(&self) -> Result<BettiCurve> {
        let diagram = self.require_persistence()?;
        Ok(BettiCurve::from_diagram(diagram, &self.epsilons))
    }

    /// Rank function of the tracked degree on an R × R grid
    pub fn prf(&self, resolution: usize) -> Result<PersistenceRankFunction> {
        let diagram = self.require_persistence()?;
        PersistenceRankFunction::from_diagram(diagram, &self.epsilons, resolution)
    }

    /// Write the filtration to a bincode archive
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let writer = BufWriter::new(File::create(path.as_ref())?);
        bincode::serialize_into(writer, self)?;
        Ok(())
    }

    /// Read a filtration written by [`Filtration::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        Ok(bincode::deserialize_from(reader)?)
    }
}

/// Reject pairs that point outside the epsilon sequence
fn check_pair_indices(diagram: &PersistenceDiagram, num_divisions: usize) -> Result<()> {
    let bad = diagram.pairs.iter().find(|p| {
        p.birth >= num_divisions || p.death.map_or(false, |d| d >= num_divisions || d < p.birth)
    });
    match bad {
        Some(pair) => Err(TdaError::tool(
            None,
            format!(
                "reducer reported {:?}, outside the {} epsilon indices",
                pair, num_divisions
            ),
        )),
        None => Ok(()),
    }
}

fn triangles_of(vertices: &[usize]) -> Vec<[usize; 3]> {
    let n = vertices.len();
    let mut out = Vec::new();
    for a in 0..n {
        for b in a + 1..n {
            for c in b + 1..n {
                out.push([vertices[a], vertices[b], vertices[c]]);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::params::{ComplexMode, FiltrationCutoff};
    use crate::topology::persistence::PersistencePair;
    use crate::topology::reduction::MatrixReducer;
    use crate::topology::FiltrationBuilder;
    use crate::trajectory::Trajectory;
    use ndarray::array;

    /// Unit square landmarks: a loop at epsilon 1, filled at sqrt 2
    fn square_filtration() -> Filtration {
        let traj = Trajectory::new(array![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]).unwrap();
        let params = FiltrationParams::new()
            .with_ds_rate(1)
            .with_mode(ComplexMode::Clique);
        FiltrationBuilder::new(params)
            .unwrap()
            .build_with_epsilons(&traj, &[0.0, 0.5, 1.0, 1.2, 1.5])
            .unwrap()
    }

    struct CountingReducer(std::sync::atomic::AtomicUsize);

    impl PersistenceReducer for CountingReducer {
        fn reduce(&self, simplices: &[Simplex], dimension: usize) -> Result<PersistenceDiagram> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            MatrixReducer.reduce(simplices, dimension)
        }
    }

    #[test]
    fn test_state_machine() {
        let mut filt = square_filtration();
        assert_eq!(filt.state(), FiltrationState::Built);
        assert!(filt.get_pd_data().is_err());
        assert!(filt.prf(10).is_err());

        let reducer = CountingReducer(Default::default());
        filt.compute_persistence(&reducer).unwrap();
        filt.compute_persistence(&reducer).unwrap();
        assert_eq!(filt.state(), FiltrationState::PersistenceComputed);
        assert_eq!(reducer.0.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    struct CannedReducer(&'static str);

    impl PersistenceReducer for CannedReducer {
        fn reduce(&self, _: &[Simplex], dimension: usize) -> Result<PersistenceDiagram> {
            crate::topology::parse_reduction_output(self.0, dimension)
        }
    }

    #[test]
    fn test_out_of_range_pairs_rejected() {
        let mut filt = square_filtration();
        for output in ["50 -1\n", "2 9\n", "6 -1\n"] {
            let err = filt.compute_persistence(&CannedReducer(output)).unwrap_err();
            assert!(matches!(err, TdaError::ExternalTool { .. }), "{}", output);
            assert_eq!(filt.state(), FiltrationState::Built);
            assert!(filt.get_pd_data().is_err());
        }

        // last index is still in range
        filt.compute_persistence(&CannedReducer("5 -1\n")).unwrap();
        assert_eq!(filt.get_pd_data().unwrap().immortal[0].birth, 1.5);
    }

    #[test]
    fn test_square_loop_diagram() {
        let mut filt = square_filtration();
        let pd = filt.compute_persistence(&MatrixReducer).unwrap();
        assert_eq!(pd.pairs, vec![PersistencePair::mortal(2, 4)]);

        let data = filt.get_pd_data().unwrap();
        assert_eq!(data.mortal.len(), 1);
        assert_eq!(data.mortal[0].birth, 1.0);
        assert_eq!(data.mortal[0].death, 1.5);
        assert_eq!(data.mortal[0].count, 1);
        assert!(data.immortal.is_empty());
    }

    #[test]
    fn test_pd_multiplicity() {
        let mut filt = square_filtration();
        filt.persistence = Some(PersistenceDiagram {
            dimension: 1,
            pairs: vec![
                PersistencePair::mortal(1, 3),
                PersistencePair::immortal(2),
                PersistencePair::mortal(1, 3),
                PersistencePair::immortal(2),
                PersistencePair::immortal(0),
            ],
        });
        let data = filt.get_pd_data().unwrap();
        assert_eq!(
            data.mortal,
            vec![MortalPoint { birth: 0.5, death: 1.2, count: 2 }]
        );
        assert_eq!(
            data.immortal,
            vec![
                ImmortalPoint { birth: 0.0, count: 1 },
                ImmortalPoint { birth: 1.0, count: 2 }
            ]
        );
    }

    #[test]
    fn test_simplices_by_time_nested() {
        let filt = square_filtration();
        let by_time = filt.simplices_by_time();
        assert_eq!(by_time.len(), 5);
        assert_eq!(by_time[0].len(), 4);
        assert_eq!(by_time[2].len(), 4);

        for t in 1..filt.num_divisions() {
            let before = filt.complex_at(t - 1);
            let after = filt.complex_at(t);
            assert!(before.iter().all(|s| after.contains(s)));
        }
        assert!(filt.is_monotone());
    }

    #[test]
    fn test_complexes_mpl() {
        let filt = square_filtration();
        let frames = filt.get_complexes_mpl();
        assert_eq!(frames.len(), 5);
        assert!(frames[0].is_empty());
        assert_eq!(frames[2].len(), 4);
        assert!(frames[2].iter().all(|edge| edge.len() == 2));
        // two diagonals plus four triangles at sqrt 2
        assert_eq!(frames[4].len(), 6);
    }

    #[test]
    fn test_triangles_of_tetrahedron() {
        assert_eq!(triangles_of(&[0, 1, 2, 3]).len(), 4);
    }

    #[test]
    fn test_save_load() {
        let mut filt = square_filtration();
        filt.compute_persistence(&MatrixReducer).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("square.filt");
        filt.save(&path).unwrap();
        let loaded = Filtration::load(&path).unwrap();
        assert_eq!(loaded, filt);
        assert_eq!(loaded.state(), FiltrationState::PersistenceComputed);
    }

    #[test]
    fn test_betti_curve() {
        let mut filt = square_filtration();
        filt.compute_persistence(&MatrixReducer).unwrap();
        let betti: Vec<usize> = filt.betti_curve().unwrap().values.iter().map(|v| v.1).collect();
        assert_eq!(betti, vec![0, 0, 1, 1, 0]);
    }

    #[test]
    fn test_adaptive_build_reports_cutoff() {
        let traj = Trajectory::new(array![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]).unwrap();
        let params = FiltrationParams::new()
            .with_ds_rate(1)
            .with_num_divisions(3)
            .with_mode(ComplexMode::Clique)
            .with_cutoff(FiltrationCutoff::AdaptiveDimension(2));
        let filt = FiltrationBuilder::new(params).unwrap().build(&traj).unwrap();
        assert_eq!(filt.num_divisions(), 3);
        assert_eq!(filt.params().cutoff(), FiltrationCutoff::AdaptiveDimension(2));
    }
}

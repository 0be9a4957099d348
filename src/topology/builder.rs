//! Filtration Construction: Witness and Clique Complexes
//!
//! Grows a simplicial complex on the landmark set across an ascending
//! sequence of thresholds ε₀ < ε₁ < … < ε_{N-1}, recording for every simplex
//! the first index at which it is present.
//!
//! ## Witness mode
//!
//! A simplex σ is born at
//!
//!   ε(σ) = min_w max_{v ∈ σ} d(w, l_v)
//!
//! i.e. as soon as a single witness lies within ε of all its vertices. For
//! edges this is the minimal enclosing witness distance. The rule is
//! monotone by construction: a face takes its max over fewer vertices.
//! Every witnessed simplex is a clique of the witnessed-edge graph, so the
//! builder tabulates each witness's landmark births once, derives the edges,
//! and extends cliques while narrowing the set of common witnesses.
//!
//! ## Clique mode
//!
//! Edges are born at their landmark-landmark distance and a k-simplex is born
//! when its last edge appears (flag complex). Edges are inserted threshold by
//! threshold; each inserted edge (u, v) discovers exactly the cliques it
//! completes by extending cliques inside N(u) ∩ N(v), so nothing is
//! re-enumerated.
//!
//! ## Termination
//!
//! With an explicit cutoff the thresholds are `linspace(0, max, N)`. With an
//! adaptive cutoff of dimension d the builder first locates ε*, the smallest
//! scale at which a d-simplex exists, and uses `linspace(0, ε*, N)`.

use std::collections::{BTreeSet, HashMap};

use log::{debug, info, warn};
use ndarray::Array2;

use super::distance::DistanceMatrix;
use super::filtration::Filtration;
use super::params::{ComplexMode, FiltrationCutoff, FiltrationParams};
use super::simplex::Simplex;
use crate::error::{Result, TdaError};
use crate::trajectory::Trajectory;

/// Slack used when comparing a distance against a threshold
pub const EPSILON_TOLERANCE: f64 = 1e-10;

/// First threshold index at which `distance` qualifies
fn birth_index(distance: f64, epsilons: &[f64]) -> Option<usize> {
    let idx = epsilons.partition_point(|&eps| eps + EPSILON_TOLERANCE < distance);
    (idx < epsilons.len()).then_some(idx)
}

/// `n` evenly spaced values over `[0, max]` with the last pinned to `max`
pub fn linspace_to(max: f64, n: usize) -> Vec<f64> {
    let mut values: Vec<f64> = (0..n)
        .map(|i| max * i as f64 / (n - 1) as f64)
        .collect();
    if let Some(last) = values.last_mut() {
        *last = max;
    }
    values
}

fn check_epsilons(epsilons: &[f64]) -> Result<()> {
    if epsilons.len() < 2 {
        return Err(TdaError::invalid("epsilon sequence needs at least 2 values"));
    }
    if epsilons.iter().any(|e| !e.is_finite() || *e < 0.0) {
        return Err(TdaError::invalid(
            "epsilons must be finite and non-negative",
        ));
    }
    if epsilons.windows(2).any(|w| w[1] <= w[0]) {
        return Err(TdaError::invalid("epsilons must be strictly ascending"));
    }
    Ok(())
}

/// Birth table keyed by sorted vertex list; keeps the earliest birth
#[derive(Default)]
struct BirthTable {
    births: HashMap<Vec<usize>, usize>,
}

impl BirthTable {
    fn offer(&mut self, vertices: Vec<usize>, birth: usize) {
        self.births
            .entry(vertices)
            .and_modify(|b| *b = (*b).min(birth))
            .or_insert(birth);
    }

    fn into_simplices(self) -> Vec<Simplex> {
        let mut simplices: Vec<Simplex> = self
            .births
            .into_iter()
            .map(|(vertices, birth)| Simplex::new(vertices, birth))
            .collect();
        simplices.sort_by(|a, b| a.filtration_cmp(b));
        simplices
    }
}

/// Landmark data shared by both modes
struct LandmarkSet {
    witnesses: Array2<f64>,
    indices: Vec<usize>,
    coords: Array2<f64>,
}

impl LandmarkSet {
    fn len(&self) -> usize {
        self.indices.len()
    }

    fn witness_distances(&self) -> Result<DistanceMatrix> {
        DistanceMatrix::between(&self.witnesses, &self.coords)
    }

    fn landmark_distances(&self) -> Result<DistanceMatrix> {
        DistanceMatrix::from_points(&self.coords)
    }
}

/// Builds a [`Filtration`] from a trajectory under fixed parameters
#[derive(Debug, Clone)]
pub struct FiltrationBuilder {
    params: FiltrationParams,
}

impl FiltrationBuilder {
    pub fn new(params: FiltrationParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &FiltrationParams {
        &self.params
    }

    /// Build with the epsilon sequence implied by the configured cutoff
    pub fn build(&self, trajectory: &Trajectory) -> Result<Filtration> {
        let landmarks = self.select_landmarks(trajectory)?;
        let n = self.params.num_divisions();

        let epsilons = match self.params.cutoff() {
            FiltrationCutoff::Explicit(max) => linspace_to(max, n),
            FiltrationCutoff::AdaptiveDimension(dim) => {
                let eps_star = self.adaptive_cutoff(&landmarks, dim)?;
                info!(
                    "adaptive cutoff: first {}-simplex at epsilon = {:.6}",
                    dim, eps_star
                );
                if eps_star <= 0.0 {
                    return Err(TdaError::degenerate(format!(
                        "a {}-simplex already exists at epsilon = 0 (duplicate landmarks?)",
                        dim
                    )));
                }
                linspace_to(eps_star, n)
            }
        };

        self.grow(landmarks, epsilons)
    }

    /// Build over a caller-supplied, strictly ascending epsilon sequence
    pub fn build_with_epsilons(
        &self,
        trajectory: &Trajectory,
        epsilons: &[f64],
    ) -> Result<Filtration> {
        check_epsilons(epsilons)?;
        let landmarks = self.select_landmarks(trajectory)?;
        self.grow(landmarks, epsilons.to_vec())
    }

    fn select_landmarks(&self, trajectory: &Trajectory) -> Result<LandmarkSet> {
        let witnesses = match self.params.worm_length() {
            Some(len) => trajectory.truncate(len),
            None => trajectory.clone(),
        };
        let indices = self
            .params
            .landmark_selector()
            .select(witnesses.len(), self.params.ds_rate())?;

        if indices.len() < 2 {
            return Err(TdaError::degenerate(format!(
                "need at least 2 landmarks, got {} from {} witnesses at ds_rate {}",
                indices.len(),
                witnesses.len(),
                self.params.ds_rate()
            )));
        }

        let points = witnesses.points();
        let coords = Array2::from_shape_fn((indices.len(), points.ncols()), |(i, k)| {
            points[[indices[i], k]]
        });

        Ok(LandmarkSet {
            witnesses: points.clone(),
            indices,
            coords,
        })
    }

    /// Smallest scale at which a `dim`-simplex exists
    fn adaptive_cutoff(&self, landmarks: &LandmarkSet, dim: usize) -> Result<f64> {
        if landmarks.len() < dim + 1 {
            return Err(TdaError::degenerate(format!(
                "a {}-simplex needs {} landmarks, only {} available",
                dim,
                dim + 1,
                landmarks.len()
            )));
        }

        match self.params.mode() {
            ComplexMode::Witness => {
                // distance from each witness to its (dim+1)-th nearest landmark
                let wd = landmarks.witness_distances()?;
                let mut best = f64::INFINITY;
                for w in 0..wd.nrows() {
                    let mut row: Vec<f64> = (0..wd.ncols()).map(|l| wd.get(w, l)).collect();
                    row.sort_by(|a, b| a.total_cmp(b));
                    best = best.min(row[dim]);
                }
                Ok(best)
            }
            ComplexMode::Clique => {
                let ld = landmarks.landmark_distances()?;
                let n = ld.nrows();
                let mut edges: Vec<(f64, usize, usize)> = Vec::with_capacity(n * (n - 1) / 2);
                for i in 0..n {
                    for j in i + 1..n {
                        edges.push((ld.get(i, j), i, j));
                    }
                }
                edges.sort_by(|a, b| a.0.total_cmp(&b.0).then((a.1, a.2).cmp(&(b.1, b.2))));

                let mut adjacency = vec![BTreeSet::new(); n];
                for (d, u, v) in edges {
                    let common: Vec<usize> =
                        adjacency[u].intersection(&adjacency[v]).copied().collect();
                    if has_clique(&common, dim - 1, &adjacency) {
                        return Ok(d);
                    }
                    adjacency[u].insert(v);
                    adjacency[v].insert(u);
                }
                Err(TdaError::degenerate(format!(
                    "no {}-simplex forms on {} landmarks",
                    dim, n
                )))
            }
        }
    }

    fn grow(&self, landmarks: LandmarkSet, epsilons: Vec<f64>) -> Result<Filtration> {
        info!(
            "building {:?} filtration: {} witnesses, {} landmarks, epsilon in [{:.6}, {:.6}] over {} steps",
            self.params.mode(),
            landmarks.witnesses.nrows(),
            landmarks.len(),
            epsilons[0],
            epsilons[epsilons.len() - 1],
            epsilons.len()
        );

        let mut table = BirthTable::default();
        for v in 0..landmarks.len() {
            table.offer(vec![v], 0);
        }

        match self.params.mode() {
            ComplexMode::Witness => self.grow_witness(&landmarks, &epsilons, &mut table)?,
            ComplexMode::Clique => self.grow_clique(&landmarks, &epsilons, &mut table)?,
        }

        let simplices = table.into_simplices();
        info!("filtration built with {} simplices", simplices.len());

        let filtration = Filtration::from_parts(
            self.params.clone(),
            landmarks.witnesses,
            landmarks.indices,
            landmarks.coords,
            epsilons,
            simplices,
        );
        debug_assert!(filtration.is_monotone(), "builder produced a non-monotone filtration");
        Ok(filtration)
    }

    fn grow_witness(
        &self,
        landmarks: &LandmarkSet,
        epsilons: &[f64],
        table: &mut BirthTable,
    ) -> Result<()> {
        let wd = landmarks.witness_distances()?;
        let n = wd.ncols();
        let max_size = self.params.max_simplex_dim() + 1;

        // sees[[w, l]]: first index at which witness w is within epsilon of landmark l
        let sees = Array2::from_shape_fn((wd.nrows(), n), |(w, l)| {
            birth_index(wd.get(w, l), epsilons)
        });
        let active: Vec<usize> = (0..sees.nrows())
            .filter(|&w| sees.row(w).iter().any(Option::is_some))
            .collect();

        let blind = sees.nrows() - active.len();
        if blind > 0 {
            warn!(
                "{} of {} witnesses have no landmark within epsilon = {:.6}; they witness nothing",
                blind,
                sees.nrows(),
                epsilons[epsilons.len() - 1]
            );
        }

        // witnessed edges form the graph every higher simplex is a clique of
        let mut adjacency = vec![BTreeSet::new(); n];
        let mut edges = Vec::new();
        for u in 0..n {
            for v in u + 1..n {
                let support = edge_support(&sees, &active, u, v);
                if let Some(birth) = support.iter().map(|&(_, t)| t).min() {
                    table.offer(vec![u, v], birth);
                    adjacency[u].insert(v);
                    adjacency[v].insert(u);
                    edges.push((u, v, support));
                }
            }
        }
        debug!("{} witnessed edges among {} landmarks", edges.len(), n);

        for (u, v, support) in edges {
            let candidates: Vec<usize> = adjacency[u]
                .intersection(&adjacency[v])
                .copied()
                .filter(|&c| c > v)
                .collect();
            let mut base = vec![u, v];
            extend_witnessed(&mut base, &support, &candidates, &sees, &adjacency, max_size, table);
        }
        Ok(())
    }

    fn grow_clique(
        &self,
        landmarks: &LandmarkSet,
        epsilons: &[f64],
        table: &mut BirthTable,
    ) -> Result<()> {
        let ld = landmarks.landmark_distances()?;
        let n = ld.nrows();
        let max_size = self.params.max_simplex_dim() + 1;

        // bucket edges by birth index; buckets stay lexicographic
        let mut buckets: Vec<Vec<(usize, usize)>> = vec![Vec::new(); epsilons.len()];
        for i in 0..n {
            for j in i + 1..n {
                if let Some(t) = birth_index(ld.get(i, j), epsilons) {
                    buckets[t].push((i, j));
                }
            }
        }

        let mut adjacency = vec![BTreeSet::new(); n];
        for (t, bucket) in buckets.iter().enumerate() {
            if !bucket.is_empty() {
                debug!("epsilon[{}] = {:.6}: {} new edges", t, epsilons[t], bucket.len());
            }
            for &(u, v) in bucket {
                let common: Vec<usize> =
                    adjacency[u].intersection(&adjacency[v]).copied().collect();
                let mut base = vec![u, v];
                table.offer(base.clone(), t);
                extend_cliques(&mut base, &common, &adjacency, max_size, t, table);
                adjacency[u].insert(v);
                adjacency[v].insert(u);
            }
        }
        Ok(())
    }
}

/// Witnesses seeing both `u` and `v`, each with the index at which it sees the pair
fn edge_support(
    sees: &Array2<Option<usize>>,
    active: &[usize],
    u: usize,
    v: usize,
) -> Vec<(usize, usize)> {
    active
        .iter()
        .filter_map(|&w| match (sees[[w, u]], sees[[w, v]]) {
            (Some(a), Some(b)) => Some((w, a.max(b))),
            _ => None,
        })
        .collect()
}

/// Offer every witnessed `base ∪ S` with S a clique inside `candidates`.
///
/// `support` holds the witnesses of `base` with their birth indices; it only
/// shrinks as vertices are added, so an empty support prunes the branch.
fn extend_witnessed(
    base: &mut Vec<usize>,
    support: &[(usize, usize)],
    candidates: &[usize],
    sees: &Array2<Option<usize>>,
    adjacency: &[BTreeSet<usize>],
    max_size: usize,
    table: &mut BirthTable,
) {
    if base.len() == max_size {
        return;
    }
    for (k, &c) in candidates.iter().enumerate() {
        let narrowed_support: Vec<(usize, usize)> = support
            .iter()
            .filter_map(|&(w, t)| sees[[w, c]].map(|s| (w, t.max(s))))
            .collect();
        let birth = match narrowed_support.iter().map(|&(_, t)| t).min() {
            Some(birth) => birth,
            None => continue,
        };

        base.push(c);
        table.offer(base.clone(), birth);

        let narrowed: Vec<usize> = candidates[k + 1..]
            .iter()
            .copied()
            .filter(|x| adjacency[c].contains(x))
            .collect();
        extend_witnessed(base, &narrowed_support, &narrowed, sees, adjacency, max_size, table);
        base.pop();
    }
}

/// Offer every clique `base ∪ S` with S a clique inside `candidates`
fn extend_cliques(
    base: &mut Vec<usize>,
    candidates: &[usize],
    adjacency: &[BTreeSet<usize>],
    max_size: usize,
    birth: usize,
    table: &mut BirthTable,
) {
    if base.len() == max_size {
        return;
    }
    for (k, &c) in candidates.iter().enumerate() {
        base.push(c);
        let mut vertices = base.clone();
        vertices.sort_unstable();
        table.offer(vertices, birth);

        let narrowed: Vec<usize> = candidates[k + 1..]
            .iter()
            .copied()
            .filter(|x| adjacency[c].contains(x))
            .collect();
        extend_cliques(base, &narrowed, adjacency, max_size, birth, table);
        base.pop();
    }
}

/// Is there a clique of `need` vertices among `candidates`?
fn has_clique(candidates: &[usize], need: usize, adjacency: &[BTreeSet<usize>]) -> bool {
    if need == 0 {
        return true;
    }
    if candidates.len() < need {
        return false;
    }
    candidates.iter().enumerate().any(|(k, &c)| {
        let narrowed: Vec<usize> = candidates[k + 1..]
            .iter()
            .copied()
            .filter(|x| adjacency[c].contains(x))
            .collect();
        has_clique(&narrowed, need - 1, adjacency)
    })
}

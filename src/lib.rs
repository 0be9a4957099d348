//! # TDA-PRF-Dynamics
//!
//! Landmark Filtrations and Persistence Rank Functions for Trajectories
//!
//! ## Theoretical Framework
//!
//! A trajectory sampled from a dynamical system is a point cloud whose shape
//! carries the dynamics: periodic orbits trace loops, chaotic attractors
//! trace more tangled sets. This crate measures that shape with persistent
//! homology and compares shapes statistically.
//!
//! ### Methodology
//!
//! 1. **Landmark filtrations**: a subset of the trajectory (landmarks) spans
//!    a simplicial complex grown over a threshold sequence, either as a
//!    witness complex (the whole trajectory votes) or as a clique complex
//!
//! 2. **Persistent homology**: an external reduction tool, or the built-in
//!    boundary-matrix reducer, pairs births and deaths of loops (H₁)
//!
//! 3. **Persistence rank functions**: each diagram becomes a step function
//!    on the birth/death triangle, which can be averaged, subtracted and
//!    normed
//!
//! 4. **Statistics**: means, pointwise variance, weighted distances and a
//!    nearest-mean classifier with ROC curves
//!
//! ## Example
//!
//! ```no_run
//! use tda_prf_dynamics::{
//!     FiltrationBuilder, FiltrationParams, MatrixReducer, Trajectory,
//! };
//!
//! # fn main() -> tda_prf_dynamics::Result<()> {
//! let traj = Trajectory::from_file("orbit.txt")?;
//! let params = FiltrationParams::from_file("params.toml")?;
//! let mut filtration = FiltrationBuilder::new(params)?.build(&traj)?;
//! filtration.compute_persistence(&MatrixReducer)?;
//! let prf = filtration.prf(50)?.normalized();
//! # let _ = prf;
//! # Ok(())
//! # }
//! ```
//!
//! ## References
//!
//! - de Silva & Carlsson, "Topological estimation using witness complexes" (2004)
//! - Edelsbrunner & Harer, "Computational Topology" (2010)
//! - Robins & Turner, "Principal component analysis of persistent homology
//!   rank functions" (2016)

pub mod analysis;
pub mod cache;
pub mod error;
pub mod prf;
pub mod topology;
pub mod trajectory;

pub use error::{Result, TdaError};

// Re-exports from trajectory
pub use trajectory::{LandmarkSelector, Trajectory, WindowInfo};

// Re-exports from topology
pub use topology::{
    // Construction
    ComplexMode,
    DistanceMatrix,
    Filtration,
    FiltrationBuilder,
    FiltrationCutoff,
    FiltrationParams,
    FiltrationState,
    Simplex,
    // Persistence
    BettiCurve,
    ExternalReducer,
    MatrixReducer,
    PdData,
    PersistenceDiagram,
    PersistencePair,
    PersistenceReducer,
};

// Re-exports from prf
pub use prf::{
    classify,
    distance,
    mean,
    norm,
    DistanceOptions,
    Metric,
    NearestMeanClassifier,
    PersistenceRankFunction,
    RocPoint,
    ScalarStats,
    ScaleMode,
    Weight,
};

// Re-exports from cache and analysis
pub use analysis::{DualRoc, MeanDists, SweepAxis, Variant, WindowPipeline};
pub use cache::{ArtifactCache, CacheKey, DirCache, MemoryCache};

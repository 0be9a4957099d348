//! Topology Module: Landmark Filtrations and Persistent Homology
//!
//! Builds filtered simplicial complexes on a landmark subset of a trajectory
//! and extracts their persistence diagrams:
//! - Distance matrices (witness × landmark, landmark × landmark)
//! - Witness and clique complex growth over an epsilon sequence
//! - Persistence reduction (external tool or in-process matrix reduction)
//! - Betti curves
//!
//! ## Mathematical Background
//!
//! Given witnesses W ⊂ ℝ^m and landmarks L ⊆ W, a filtration is a nested
//! family of complexes K(ε₀) ⊆ K(ε₁) ⊆ … ⊆ K(ε_{N-1}) on the vertex set L.
//! Every simplex carries the index of the first threshold at which it is
//! present, and that index is never smaller than the index of any face.
//!
//! Persistent homology pairs the birth of a homology class with the
//! threshold that kills it. Only degree 1 (loops) feeds the rank functions.

mod betti;
mod builder;
mod distance;
mod filtration;
mod params;
mod persistence;
mod reduction;
mod simplex;

pub use betti::BettiCurve;
pub use builder::{linspace_to, FiltrationBuilder, EPSILON_TOLERANCE};
pub use distance::DistanceMatrix;
pub use filtration::{
    Filtration, FiltrationState, ImmortalPoint, MortalPoint, PdData, TRACKED_DIMENSION,
};
pub use params::{ComplexMode, FiltrationCutoff, FiltrationParams};
pub use persistence::{PersistenceDiagram, PersistencePair};
pub use reduction::{
    format_reduction_input, parse_reduction_output, ExternalReducer, MatrixReducer,
    PersistenceReducer,
};
pub use simplex::Simplex;

//! Persistence Rank Functions and Their Statistics
//!
//! A persistence rank function (PRF) turns a diagram into a function on the
//! birth/death triangle: the number of classes alive over [b, d]. Unlike
//! diagrams, PRFs on a shared grid live in a vector space, so means,
//! variances and distances are computed cell by cell.
//!
//! ## Pipeline
//!
//! ```text
//!   Filtration ──prf(R)──▶ PersistenceRankFunction ──normalized()──▶ unit domain
//!                                     │
//!                  norm / distance / mean / variance / classifier
//! ```
//!
//! ## Reference
//!
//! Robins & Turner (2016). "Principal Component Analysis of Persistent
//! Homology Rank Functions with case studies of Spatial Point Patterns,
//! Sphere Packing and Colloids". Physica D.

mod classifier;
mod norm;
mod rank;
mod stats;

pub use classifier::{classify, split_alternating, NearestMeanClassifier, RocPoint};
pub use norm::{distance, norm, DistanceOptions, Metric, ScaleMode, Weight};
pub use rank::PersistenceRankFunction;
pub use stats::{
    consecutive_mean_distances, distances_to_reference, functional_cov, mean,
    pointwise_variance, ScalarStats,
};

//! Trajectory Module: Point Clouds Sampled From Dynamical Systems
//!
//! A trajectory is an ordered sequence of points in ℝᵐ, typically a
//! delay-coordinate reconstruction of a recorded signal. Every point is a
//! *witness*; a subset of them is promoted to *landmarks*, which form the
//! vertex set of all simplices built downstream.
//!
//! ```text
//!   witnesses  w₀ w₁ w₂ w₃ w₄ w₅ w₆ w₇ w₈ ...
//!   landmarks  l₀       l₁       l₂       ...   (stride = ds_rate = 3)
//! ```

mod landmarks;
mod points;

pub use landmarks::LandmarkSelector;
pub use points::{Trajectory, WindowInfo};

//! Trajectory storage, text loading and windowing

use std::fs;
use std::path::Path;

use ndarray::{s, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TdaError};

/// Position of a window inside the trajectory it was cut from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    /// Window number (0-based)
    pub index: usize,
    /// First sample (inclusive)
    pub start: usize,
    /// Last sample (exclusive)
    pub end: usize,
}

/// Ordered point cloud; rows are points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    points: Array2<f64>,
    window: Option<WindowInfo>,
}

impl Trajectory {
    /// Wrap a point array (one point per row)
    pub fn new(points: Array2<f64>) -> Result<Self> {
        if points.nrows() == 0 || points.ncols() == 0 {
            return Err(TdaError::invalid("trajectory has no points"));
        }
        if points.iter().any(|v| !v.is_finite()) {
            return Err(TdaError::invalid("trajectory contains non-finite values"));
        }
        Ok(Self {
            points,
            window: None,
        })
    }

    /// Parse a whitespace-delimited numeric matrix, one point per line
    pub fn from_text(text: &str) -> Result<Self> {
        let mut data = Vec::new();
        let mut ncols = None;
        let mut nrows = 0;

        for (line_no, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let row: Vec<f64> = line
                .split_whitespace()
                .map(|tok| {
                    tok.parse::<f64>().map_err(|_| {
                        TdaError::invalid(format!(
                            "line {}: '{}' is not a number",
                            line_no + 1,
                            tok
                        ))
                    })
                })
                .collect::<Result<_>>()?;

            match ncols {
                None => ncols = Some(row.len()),
                Some(n) if n != row.len() => {
                    return Err(TdaError::invalid(format!(
                        "line {}: expected {} columns, found {}",
                        line_no + 1,
                        n,
                        row.len()
                    )));
                }
                _ => {}
            }
            data.extend(row);
            nrows += 1;
        }

        let ncols = ncols.ok_or_else(|| TdaError::invalid("trajectory text is empty"))?;
        let points = Array2::from_shape_vec((nrows, ncols), data)
            .map_err(|e| TdaError::invalid(e.to_string()))?;
        Self::new(points)
    }

    /// Load a trajectory text file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        Self::from_text(&text)
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.points.nrows() == 0
    }

    /// Ambient dimension m
    pub fn dimension(&self) -> usize {
        self.points.ncols()
    }

    pub fn points(&self) -> &Array2<f64> {
        &self.points
    }

    pub fn point(&self, i: usize) -> ArrayView1<'_, f64> {
        self.points.row(i)
    }

    /// Window metadata, if this trajectory was produced by [`Trajectory::slice`]
    pub fn window(&self) -> Option<WindowInfo> {
        self.window
    }

    /// Keep only the first `len` points
    pub fn truncate(&self, len: usize) -> Self {
        let end = len.min(self.len());
        Self {
            points: self.points.slice(s![..end, ..]).to_owned(),
            window: self.window,
        }
    }

    /// Cut the trajectory into `num_windows` evenly started windows.
    ///
    /// Start points are `floor(linspace(0, n - 1, num_windows))` (endpoint
    /// excluded); windows running past the end are shortened.
    pub fn slice(&self, num_windows: usize, window_len: usize) -> Result<Vec<Trajectory>> {
        if num_windows == 0 || window_len == 0 {
            return Err(TdaError::invalid(
                "num_windows and window_len must both be positive",
            ));
        }
        let n = self.len();
        let span = n.saturating_sub(1) as f64;

        let windows = (0..num_windows)
            .map(|index| {
                let start = (span * index as f64 / num_windows as f64).floor() as usize;
                let end = start.saturating_add(window_len).min(n);
                Trajectory {
                    points: self.points.slice(s![start..end, ..]).to_owned(),
                    window: Some(WindowInfo { index, start, end }),
                }
            })
            .collect();

        Ok(windows)
    }
}

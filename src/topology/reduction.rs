//! Persistence Reduction: Simplex Lists to Persistence Pairs
//!
//! The reduction step is a black box behind [`PersistenceReducer`]. Two
//! implementations are provided:
//!
//! - [`ExternalReducer`] writes the simplex list in the reduction tool's text
//!   format, runs the binary and parses its output file.
//! - [`MatrixReducer`] runs the standard algorithm in-process: Z/2 column
//!   reduction of the boundary matrix in filtration order. It produces the
//!   same pairs and is what tests use in place of the binary.
//!
//! ## Text contract
//!
//! ```text
//! 1                 <- header
//! 0 4 1             <- dim, vertex ids..., birth index + 1
//! 1 0 4 3
//! 2 0 1 4 5
//! ```
//!
//! The tool is invoked as `<binary> nmfsimtop <input> <prefix>` and writes
//! `<prefix>_<dim>.txt` with one `birth death` pair per line (1-based,
//! `-1` for classes that never die).
//!
//! ## Reference
//!
//! Edelsbrunner, Letscher, Zomorodian (2002). "Topological Persistence
//! and Simplification". Discrete & Computational Geometry.

use std::collections::{BTreeSet, HashMap};
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::process::Command;

use log::{debug, info};

use super::persistence::{PersistenceDiagram, PersistencePair};
use super::simplex::Simplex;
use crate::error::{Result, TdaError};

/// Turns a birth-ordered simplex list into persistence pairs of one degree
pub trait PersistenceReducer: Send + Sync {
    fn reduce(&self, simplices: &[Simplex], dimension: usize) -> Result<PersistenceDiagram>;

    /// Names the reducer in cache keys
    fn cache_tag(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Serialize simplices in the reduction tool's input format
pub fn format_reduction_input(simplices: &[Simplex]) -> String {
    let mut out = String::from("1\n");
    for simplex in simplices {
        out.push_str(&simplex.dimension().to_string());
        for v in &simplex.vertices {
            out.push(' ');
            out.push_str(&v.to_string());
        }
        out.push_str(&format!(" {}\n", simplex.birth + 1));
    }
    out
}

/// Parse a `birth death` output file back into 0-based epsilon indices
pub fn parse_reduction_output(text: &str, dimension: usize) -> Result<PersistenceDiagram> {
    let mut diagram = PersistenceDiagram::new(dimension);

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<i64> = line
            .split_whitespace()
            .map(|tok| tok.parse::<i64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| unparsable(line_no, line))?;

        let (birth, death) = match fields.as_slice() {
            [b, d] => (*b, *d),
            _ => return Err(unparsable(line_no, line)),
        };
        if birth < 1 || (death != -1 && death < birth) {
            return Err(unparsable(line_no, line));
        }

        let birth = (birth - 1) as usize;
        if death == -1 {
            diagram.add(PersistencePair::immortal(birth));
        } else if (death - 1) as usize > birth {
            diagram.add(PersistencePair::mortal(birth, (death - 1) as usize));
        }
    }

    Ok(diagram)
}

fn unparsable(line_no: usize, line: &str) -> TdaError {
    TdaError::tool(
        None,
        format!("unparsable output line {}: '{}'", line_no + 1, line),
    )
}

/// Runs the external persistence binary through temporary files
#[derive(Debug, Clone)]
pub struct ExternalReducer {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ExternalReducer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec![OsString::from("nmfsimtop")],
        }
    }

    /// Replace the arguments passed before the input and output names
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl PersistenceReducer for ExternalReducer {
    fn cache_tag(&self) -> String {
        let args: Vec<_> = self.args.iter().map(|a| a.to_string_lossy()).collect();
        format!("external:{} {}", self.program.display(), args.join(" "))
    }

    fn reduce(&self, simplices: &[Simplex], dimension: usize) -> Result<PersistenceDiagram> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("reduction_in.txt");
        let prefix = workdir.path().join("reduction_out");
        fs::write(&input, format_reduction_input(simplices))?;

        info!(
            "running {} on {} simplices",
            self.program.display(),
            simplices.len()
        );
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&input)
            .arg(&prefix)
            .output()
            .map_err(|e| {
                TdaError::tool(
                    None,
                    format!("could not run {}: {}", self.program.display(), e),
                )
            })?;

        if !output.status.success() {
            return Err(TdaError::tool(
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        let result_path = workdir
            .path()
            .join(format!("reduction_out_{}.txt", dimension));
        let text = fs::read_to_string(&result_path).map_err(|e| {
            TdaError::tool(
                output.status.code(),
                format!("missing output {}: {}", result_path.display(), e),
            )
        })?;
        parse_reduction_output(&text, dimension)
    }
}

/// Sparse Z/2 column of the boundary matrix
#[derive(Debug, Clone, Default)]
struct SparseColumn {
    rows: BTreeSet<usize>,
}

impl SparseColumn {
    fn is_zero(&self) -> bool {
        self.rows.is_empty()
    }

    /// Lowest (maximum) non-zero row
    fn low(&self) -> Option<usize> {
        self.rows.iter().next_back().copied()
    }

    /// Column addition over Z/2 (symmetric difference)
    fn add_assign(&mut self, other: &SparseColumn) {
        for &row in &other.rows {
            if !self.rows.remove(&row) {
                self.rows.insert(row);
            }
        }
    }
}

/// In-process standard reduction
#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixReducer;

impl PersistenceReducer for MatrixReducer {
    fn reduce(&self, simplices: &[Simplex], dimension: usize) -> Result<PersistenceDiagram> {
        let mut index: HashMap<&[usize], usize> = HashMap::with_capacity(simplices.len());
        for (i, s) in simplices.iter().enumerate() {
            index.insert(s.vertices.as_slice(), i);
        }

        let m = simplices.len();
        let mut columns: Vec<SparseColumn> = Vec::with_capacity(m);
        let mut low_to_col: HashMap<usize, usize> = HashMap::new();

        for (col_idx, simplex) in simplices.iter().enumerate() {
            let mut boundary = SparseColumn::default();
            for face in simplex.faces() {
                let face_idx = *index.get(face.as_slice()).ok_or_else(|| {
                    TdaError::invalid(format!(
                        "face {:?} of {:?} is missing from the filtration",
                        face, simplex.vertices
                    ))
                })?;
                if face_idx >= col_idx {
                    return Err(TdaError::invalid(format!(
                        "face {:?} appears after {:?}; simplices are not in filtration order",
                        face, simplex.vertices
                    )));
                }
                boundary.rows.insert(face_idx);
            }

            while let Some(low_idx) = boundary.low() {
                match low_to_col.get(&low_idx) {
                    Some(&pivot_col) => boundary.add_assign(&columns[pivot_col]),
                    None => break,
                }
            }
            if let Some(low_idx) = boundary.low() {
                low_to_col.insert(low_idx, col_idx);
            }
            columns.push(boundary);
        }

        let mut diagram = PersistenceDiagram::new(dimension);
        let mut paired = vec![false; m];

        for (col_idx, column) in columns.iter().enumerate() {
            if let Some(low_idx) = column.low() {
                paired[low_idx] = true;
                paired[col_idx] = true;

                let born = &simplices[low_idx];
                let killer = &simplices[col_idx];
                if born.dimension() == dimension && killer.birth > born.birth {
                    diagram.add(PersistencePair::mortal(born.birth, killer.birth));
                }
            }
        }

        for (idx, simplex) in simplices.iter().enumerate() {
            if !paired[idx] && columns[idx].is_zero() && simplex.dimension() == dimension {
                diagram.add(PersistencePair::immortal(simplex.birth));
            }
        }

        debug!(
            "reduced {} simplices: {} classes in degree {}",
            m,
            diagram.len(),
            dimension
        );
        Ok(diagram.sorted())
    }
}

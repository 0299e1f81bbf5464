use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VeidtError};

// ---------------------------------------------------------------------------
// Structure – the domain object handed to describers
// ---------------------------------------------------------------------------

/// A periodic atomic structure: lattice vectors plus sites in fractional
/// coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Structure {
    /// Lattice vectors as rows, in Å.
    pub lattice: [[f64; 3]; 3],
    /// Species label per site (e.g. `"Li"`).
    pub species: Vec<String>,
    /// Fractional coordinates per site – same length as `species`.
    pub frac_coords: Vec<[f64; 3]>,
    /// Named scalar properties such as `energy`, usable as targets.
    #[serde(flatten)]
    pub properties: BTreeMap<String, f64>,
}

impl Structure {
    /// Build a structure, checking that every site has a species.
    pub fn new(
        lattice: [[f64; 3]; 3],
        species: Vec<String>,
        frac_coords: Vec<[f64; 3]>,
    ) -> Result<Self> {
        if species.len() != frac_coords.len() {
            return Err(VeidtError::DimensionMismatch {
                context: "structure sites",
                expected: species.len(),
                found: frac_coords.len(),
            });
        }
        Ok(Structure {
            lattice,
            species,
            frac_coords,
            properties: BTreeMap::new(),
        })
    }

    /// Cubic cell with edge `a`.
    pub fn cubic<S: Into<String>>(
        a: f64,
        species: impl IntoIterator<Item = S>,
        frac_coords: Vec<[f64; 3]>,
    ) -> Result<Self> {
        let lattice = [[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]];
        Self::new(
            lattice,
            species.into_iter().map(Into::into).collect(),
            frac_coords,
        )
    }

    /// Attach a named scalar property.
    pub fn with_property(mut self, name: impl Into<String>, value: f64) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Look up a named scalar property.
    pub fn property(&self, name: &str) -> Option<f64> {
        self.properties.get(name).copied()
    }

    /// Number of sites.
    pub fn num_sites(&self) -> usize {
        self.frac_coords.len()
    }

    /// Site count per species, sorted by species label.
    pub fn composition(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for sp in &self.species {
            *counts.entry(sp.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// Distinct species labels, sorted.
    pub fn elements(&self) -> BTreeSet<&str> {
        self.species.iter().map(String::as_str).collect()
    }

    /// Cartesian coordinates of every site (`frac · lattice`).
    pub fn cart_coords(&self) -> Vec<[f64; 3]> {
        self.frac_coords
            .iter()
            .map(|f| {
                let mut cart = [0.0; 3];
                for (k, c) in cart.iter_mut().enumerate() {
                    *c = (0..3).map(|i| f[i] * self.lattice[i][k]).sum();
                }
                cart
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Descriptor – named columns over a row-major numeric matrix
// ---------------------------------------------------------------------------

/// A labeled numeric table: one row per object (or per site), one named
/// column per feature.
///
/// Invariants: `values.ncols() == columns.len()` and column names are
/// unique. Both are checked on construction, so a `Descriptor` in hand is
/// always consistent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Descriptor {
    columns: Vec<String>,
    values: Array2<f64>,
}

impl Descriptor {
    /// Pair column names with a value matrix.
    pub fn new(columns: Vec<String>, values: Array2<f64>) -> Result<Self> {
        if values.ncols() != columns.len() {
            return Err(VeidtError::DimensionMismatch {
                context: "descriptor columns",
                expected: columns.len(),
                found: values.ncols(),
            });
        }
        let mut seen = BTreeSet::new();
        for col in &columns {
            if !seen.insert(col.as_str()) {
                return Err(VeidtError::DuplicateColumn(col.clone()));
            }
        }
        Ok(Descriptor { columns, values })
    }

    /// A table with the given columns and zero rows.
    pub fn empty(columns: Vec<String>) -> Result<Self> {
        let width = columns.len();
        Self::new(columns, Array2::zeros((0, width)))
    }

    /// Build a table from row vectors.
    pub fn from_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: &[Vec<f64>],
    ) -> Result<Self> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        let width = columns.len();
        let mut flat = Vec::with_capacity(rows.len() * width);
        for row in rows {
            if row.len() != width {
                return Err(VeidtError::DimensionMismatch {
                    context: "descriptor row",
                    expected: width,
                    found: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        let values = Array2::from_shape_vec((rows.len(), width), flat)?;
        Self::new(columns, values)
    }

    /// Concatenate tables row-wise, in iteration order.
    ///
    /// Every part must carry the same columns in the same order. With no
    /// parts at all the result has zero rows and zero columns.
    pub fn concat<I: IntoIterator<Item = Descriptor>>(parts: I) -> Result<Self> {
        let mut parts = parts.into_iter();
        let Some(first) = parts.next() else {
            return Ok(Descriptor::default());
        };

        let columns = first.columns;
        let mut n_rows = first.values.nrows();
        let mut flat: Vec<f64> = first.values.iter().copied().collect();

        for part in parts {
            if part.columns != columns {
                return Err(VeidtError::ColumnMismatch {
                    expected: columns,
                    found: part.columns,
                });
            }
            n_rows += part.values.nrows();
            flat.extend(part.values.iter().copied());
        }

        let values = Array2::from_shape_vec((n_rows, columns.len()), flat)?;
        Ok(Descriptor { columns, values })
    }

    /// Column names, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// The numeric payload.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    /// Drop the labels and keep the numbers.
    pub fn into_values(self) -> Array2<f64> {
        self.values
    }

    /// Split into labels and numbers.
    pub fn into_parts(self) -> (Vec<String>, Array2<f64>) {
        (self.columns, self.values)
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    /// One row by position.
    pub fn row(&self, i: usize) -> Option<ArrayView1<'_, f64>> {
        (i < self.n_rows()).then(|| self.values.row(i))
    }

    /// One column by name.
    pub fn column(&self, name: &str) -> Option<ArrayView1<'_, f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.values.index_axis(Axis(1), idx))
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let index_width = self.n_rows().saturating_sub(1).to_string().len();
        write!(f, "{:index_width$}", "")?;
        for col in &self.columns {
            write!(f, " {col:>10}")?;
        }
        writeln!(f)?;
        for (i, row) in self.values.rows().into_iter().enumerate() {
            write!(f, "{i:<index_width$}")?;
            for v in row {
                write!(f, " {v:>10.6}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

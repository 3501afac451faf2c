//! Column-addressable numeric datasets.
//!
//! A [`Dataset`] wraps a column-major `f32` matrix together with a table of
//! [`Variable`] bindings. Variable names are hashed once at bind time and
//! the table is kept sorted by hash, so every lookup is a binary search.
//!
//! A dataset either owns its storage or shares an external matrix. Shared
//! datasets are read-only: the mutating operations (`shuffle`, `normalize`,
//! `standardize`) fail with [`Error::ViewNotMutable`].

use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

use ndarray::{Array2, ArrayView1, ShapeBuilder};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::range::Range;
use crate::error::{Error, Result};
use crate::hash::hash_name;
use crate::stat::MeanVarianceCalculator;
use crate::Scalar;

/// A named dataset column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub name: String,
    /// Column index into the backing matrix.
    pub index: usize,
    /// Hash of `name`; the key used for all lookups.
    pub hash: u64,
}

impl Variable {
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        let name = name.into();
        let hash = hash_name(&name);
        Self { name, index, hash }
    }
}

#[derive(Debug, Clone)]
enum Storage {
    Owned(Array2<Scalar>),
    Shared(Arc<Array2<Scalar>>),
}

impl Storage {
    fn matrix(&self) -> &Array2<Scalar> {
        match self {
            Storage::Owned(m) => m,
            Storage::Shared(m) => m,
        }
    }
}

/// Column-major numeric matrix with hashed variable bindings.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Always sorted by `hash`.
    variables: Vec<Variable>,
    storage: Storage,
}

/// Auto-generated variables `X1 .. Xn`, sorted by hash.
fn default_variables(count: usize) -> Vec<Variable> {
    let mut variables: Vec<Variable> = (0..count)
        .map(|i| Variable::new(format!("X{}", i + 1), i))
        .collect();
    variables.sort_by_key(|v| v.hash);
    variables
}

impl Dataset {
    /// Takes ownership of a matrix; columns are named `X1 .. Xn`.
    pub fn from_matrix(values: Array2<Scalar>) -> Self {
        Self {
            variables: default_variables(values.ncols()),
            storage: Storage::Owned(values),
        }
    }

    /// Builds an owning dataset from columns.
    ///
    /// # Panics
    /// Panics if the columns have unequal lengths.
    pub fn from_columns(columns: Vec<Vec<Scalar>>) -> Self {
        let ncol = columns.len();
        let nrow = columns.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(nrow * ncol);
        for column in &columns {
            assert_eq!(column.len(), nrow, "columns must have equal length");
            data.extend_from_slice(column);
        }
        let values = Array2::from_shape_vec((nrow, ncol).f(), data)
            .expect("data length equals nrow * ncol");
        Self::from_matrix(values)
    }

    /// Wraps an externally owned matrix without copying.
    ///
    /// The resulting dataset rejects mutating operations.
    pub fn from_shared(values: Arc<Array2<Scalar>>) -> Self {
        Self {
            variables: default_variables(values.ncols()),
            storage: Storage::Shared(values),
        }
    }

    /// Reads a CSV file.
    ///
    /// With `has_header`, the first row supplies variable names; otherwise
    /// columns are named `X1 .. Xn`. All fields must parse as `f32`.
    pub fn read_csv(path: impl AsRef<Path>, has_header: bool) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref()).map_err(|e| {
            Error::Csv(csv::Error::from(e))
        })?;
        Self::from_csv_reader(file, has_header)
    }

    /// Reads CSV data from any reader. See [`read_csv`](Self::read_csv).
    pub fn from_csv_reader<R: Read>(reader: R, has_header: bool) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(has_header)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let names: Option<Vec<String>> = if has_header {
            Some(
                csv_reader
                    .headers()?
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            )
        } else {
            None
        };

        let mut rows: Vec<Vec<Scalar>> = Vec::new();
        for (row_idx, record) in csv_reader.records().enumerate() {
            let record = record?;
            let mut row = Vec::with_capacity(record.len());
            for (col_idx, field) in record.iter().enumerate() {
                let value: Scalar = field.parse().map_err(|_| Error::ParseError {
                    row: row_idx,
                    column: col_idx,
                })?;
                row.push(value);
            }
            rows.push(row);
        }

        let nrow = rows.len();
        let ncol = rows.first().map_or_else(|| names.as_ref().map_or(0, Vec::len), Vec::len);
        let mut data = vec![0.0; nrow * ncol];
        for (r, row) in rows.iter().enumerate() {
            for (c, &v) in row.iter().enumerate() {
                data[c * nrow + r] = v;
            }
        }
        let values = Array2::from_shape_vec((nrow, ncol).f(), data)
            .expect("data length equals nrow * ncol");

        let mut dataset = Self::from_matrix(values);
        if let Some(names) = names {
            dataset.set_variable_names(&names);
        }
        Ok(dataset)
    }

    /// Writes the dataset as CSV with a header row.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        let matrix = self.storage.matrix();

        let mut names = vec![String::new(); self.ncols()];
        for v in &self.variables {
            names[v.index] = v.name.clone();
        }
        csv_writer.write_record(&names)?;

        for r in 0..self.nrows() {
            let row: Vec<String> = (0..self.ncols())
                .map(|c| format!("{}", matrix[(r, c)]))
                .collect();
            csv_writer.write_record(&row)?;
        }
        csv_writer.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Rebinds column names.
    ///
    /// # Panics
    /// Panics if the name count does not match the column count.
    pub fn set_variable_names(&mut self, names: &[impl AsRef<str>]) {
        assert_eq!(
            names.len(),
            self.ncols(),
            "one name per column required"
        );
        self.variables = names
            .iter()
            .enumerate()
            .map(|(i, name)| Variable::new(name.as_ref(), i))
            .collect();
        self.variables.sort_by_key(|v| v.hash);
    }

    /// Variable bindings, sorted by hash.
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Variable names, in hash order.
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables.iter().map(|v| v.name.as_str()).collect()
    }

    /// Looks a variable up by name.
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variable_by_hash(hash_name(name))
    }

    /// Looks a variable up by name hash (binary search).
    pub fn variable_by_hash(&self, hash: u64) -> Option<&Variable> {
        self.variables
            .binary_search_by_key(&hash, |v| v.hash)
            .ok()
            .map(|i| &self.variables[i])
    }

    /// Column values by variable hash.
    pub fn values_by_hash(&self, hash: u64) -> Option<ArrayView1<'_, Scalar>> {
        self.variable_by_hash(hash)
            .map(|v| self.storage.matrix().column(v.index))
    }

    /// Column values by name.
    pub fn values(&self, name: &str) -> Option<ArrayView1<'_, Scalar>> {
        self.values_by_hash(hash_name(name))
    }

    /// Column values by column index.
    pub fn column(&self, index: usize) -> ArrayView1<'_, Scalar> {
        self.storage.matrix().column(index)
    }

    pub fn nrows(&self) -> usize {
        self.storage.matrix().nrows()
    }

    pub fn ncols(&self) -> usize {
        self.storage.matrix().ncols()
    }

    /// Whether this dataset shares external storage (read-only).
    pub fn is_view(&self) -> bool {
        matches!(self.storage, Storage::Shared(_))
    }

    fn matrix_mut(&mut self, operation: &'static str) -> Result<&mut Array2<Scalar>> {
        match &mut self.storage {
            Storage::Owned(m) => Ok(m),
            Storage::Shared(_) => Err(Error::ViewNotMutable { operation }),
        }
    }

    /// Randomly permutes the rows (Fisher-Yates).
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) -> Result<()> {
        let matrix = self.matrix_mut("shuffle")?;
        let (nrow, ncol) = (matrix.nrows(), matrix.ncols());
        for i in (1..nrow).rev() {
            let j = rng.random_range(0..=i);
            if i != j {
                for c in 0..ncol {
                    matrix.swap((i, c), (j, c));
                }
            }
        }
        Ok(())
    }

    /// Min-max scales column `index` using statistics from `range`.
    ///
    /// Columns that are constant over the range are left unchanged.
    pub fn normalize(&mut self, index: usize, range: Range) -> Result<()> {
        assert!(range.end() <= self.nrows(), "range exceeds row count");
        let matrix = self.matrix_mut("normalize")?;
        let column = matrix.column(index);
        let segment = column.iter().skip(range.start()).take(range.size());
        let (mut min, mut max) = (Scalar::INFINITY, Scalar::NEG_INFINITY);
        for &v in segment {
            min = min.min(v);
            max = max.max(v);
        }
        if max > min {
            matrix
                .column_mut(index)
                .mapv_inplace(|v| (v - min) / (max - min));
        }
        Ok(())
    }

    /// Standardizes column `index` to zero mean and unit standard deviation
    /// using statistics from `range`.
    ///
    /// Columns that are constant over the range are left unchanged.
    pub fn standardize(&mut self, index: usize, range: Range) -> Result<()> {
        assert!(range.end() <= self.nrows(), "range exceeds row count");
        let matrix = self.matrix_mut("standardize")?;
        let segment: Vec<Scalar> = matrix
            .column(index)
            .iter()
            .skip(range.start())
            .take(range.size())
            .copied()
            .collect();
        let stats = MeanVarianceCalculator::of(&segment);
        let mean = stats.mean() as Scalar;
        let sd = stats.standard_deviation() as Scalar;
        if sd > 0.0 {
            matrix
                .column_mut(index)
                .mapv_inplace(|v| (v - mean) / sd);
        }
        Ok(())
    }
}

//! Problem descriptor: dataset, primitive set, and row ranges.

use super::dataset::{Dataset, Variable};
use super::pset::PrimitiveSet;
use super::range::Range;
use crate::Scalar;

/// Binds a dataset, a primitive set, a target column, and the training and
/// test row ranges into one regression problem.
///
/// The problem is immutable during a run and shared read-only across
/// evaluation workers.
#[derive(Debug, Clone)]
pub struct Problem {
    dataset: Dataset,
    pset: PrimitiveSet,
    training_range: Range,
    test_range: Range,
    target: Variable,
    inputs: Vec<Variable>,
}

impl Problem {
    /// Creates a problem predicting `target_name` from every other column,
    /// training on all rows.
    ///
    /// # Panics
    /// Panics if the target column does not exist.
    pub fn new(dataset: Dataset, target_name: &str) -> Self {
        let target = dataset
            .variable(target_name)
            .unwrap_or_else(|| panic!("target column {target_name:?} not found in dataset"))
            .clone();
        let inputs: Vec<Variable> = dataset
            .variables()
            .iter()
            .filter(|v| v.hash != target.hash)
            .cloned()
            .collect();
        let rows = dataset.nrows();
        Self {
            dataset,
            pset: PrimitiveSet::new(),
            training_range: Range::new(0, rows),
            test_range: Range::new(rows, rows),
            target,
            inputs,
        }
    }

    /// Replaces the primitive set.
    pub fn with_pset(mut self, pset: PrimitiveSet) -> Self {
        self.pset = pset;
        self
    }

    /// Sets the training rows.
    ///
    /// # Panics
    /// Panics if the range exceeds the dataset.
    pub fn with_training_range(mut self, range: Range) -> Self {
        assert!(range.end() <= self.dataset.nrows(), "range exceeds row count");
        self.training_range = range;
        self
    }

    /// Sets the test rows.
    ///
    /// # Panics
    /// Panics if the range exceeds the dataset.
    pub fn with_test_range(mut self, range: Range) -> Self {
        assert!(range.end() <= self.dataset.nrows(), "range exceeds row count");
        self.test_range = range;
        self
    }

    /// Restricts the input variables to the named columns.
    ///
    /// # Panics
    /// Panics if a name does not exist or names the target.
    pub fn with_inputs(mut self, names: &[impl AsRef<str>]) -> Self {
        self.inputs = names
            .iter()
            .map(|n| {
                let name = n.as_ref();
                let v = self
                    .dataset
                    .variable(name)
                    .unwrap_or_else(|| panic!("input column {name:?} not found in dataset"))
                    .clone();
                assert!(v.hash != self.target.hash, "target cannot be an input");
                v
            })
            .collect();
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn pset(&self) -> &PrimitiveSet {
        &self.pset
    }

    pub fn pset_mut(&mut self) -> &mut PrimitiveSet {
        &mut self.pset
    }

    pub fn training_range(&self) -> Range {
        self.training_range
    }

    pub fn test_range(&self) -> Range {
        self.test_range
    }

    pub fn target(&self) -> &Variable {
        &self.target
    }

    /// Input variables available to tree synthesis.
    pub fn inputs(&self) -> &[Variable] {
        &self.inputs
    }

    /// Target column values over `range`.
    pub fn target_values(&self, range: Range) -> Vec<Scalar> {
        self.dataset
            .column(self.target.index)
            .iter()
            .skip(range.start())
            .take(range.size())
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_problem() -> Problem {
        let ds = Dataset::from_columns(vec![
            vec![1.0, 2.0, 3.0, 4.0],
            vec![5.0, 6.0, 7.0, 8.0],
            vec![9.0, 10.0, 11.0, 12.0],
        ]);
        Problem::new(ds, "X3")
    }

    #[test]
    fn test_inputs_exclude_target() {
        let p = sample_problem();
        assert_eq!(p.inputs().len(), 2);
        assert!(p.inputs().iter().all(|v| v.name != "X3"));
        assert_eq!(p.target().name, "X3");
    }

    #[test]
    fn test_default_ranges() {
        let p = sample_problem();
        assert_eq!(p.training_range().size(), 4);
        assert!(p.test_range().is_empty());
    }

    #[test]
    fn test_target_values() {
        let p = sample_problem().with_training_range(Range::new(1, 3));
        assert_eq!(p.target_values(p.training_range()), vec![10.0, 11.0]);
    }

    #[test]
    fn test_with_inputs() {
        let p = sample_problem().with_inputs(&["X1"]);
        assert_eq!(p.inputs().len(), 1);
        assert_eq!(p.inputs()[0].name, "X1");
    }

    #[test]
    #[should_panic(expected = "not found")]
    fn test_unknown_target_panics() {
        let ds = Dataset::from_columns(vec![vec![1.0]]);
        Problem::new(ds, "Y");
    }
}

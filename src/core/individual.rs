//! Individuals and dominance comparison.

use serde::{Deserialize, Serialize};

use super::tree::Tree;
use crate::Scalar;

/// Outcome of a Pareto dominance comparison.
///
/// Strict dominance: weakly better in every objective and strictly better
/// in at least one. All objectives are minimized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    /// The left individual dominates.
    Left,
    /// The right individual dominates.
    Right,
    /// The fitness vectors are identical.
    Equal,
    /// Neither dominates the other.
    None,
}

/// A candidate solution: an expression tree plus its fitness vector.
///
/// Fitness is multi-dimensional to support Pareto-based runs; single
/// objective runs use a vector of length one. Lower values are better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Individual {
    pub genotype: Tree,
    pub fitness: Vec<Scalar>,
}

impl Individual {
    /// Wraps a genotype with empty (not yet evaluated) fitness.
    pub fn new(genotype: Tree) -> Self {
        Self {
            genotype,
            fitness: Vec::new(),
        }
    }

    /// Fitness in objective `index`.
    #[inline]
    pub fn objective(&self, index: usize) -> Scalar {
        self.fitness[index]
    }

    /// Strict Pareto comparison of the fitness vectors (minimization).
    ///
    /// # Panics
    /// Panics if the fitness vectors have different lengths.
    pub fn pareto_compare(&self, other: &Individual) -> Dominance {
        assert_eq!(
            self.fitness.len(),
            other.fitness.len(),
            "fitness dimensions must match"
        );
        let mut left_better = false;
        let mut right_better = false;
        for (&a, &b) in self.fitness.iter().zip(other.fitness.iter()) {
            if a < b {
                left_better = true;
            } else if b < a {
                right_better = true;
            }
        }
        match (left_better, right_better) {
            (true, false) => Dominance::Left,
            (false, true) => Dominance::Right,
            (false, false) => Dominance::Equal,
            (true, true) => Dominance::None,
        }
    }

    /// Lexicographic fitness comparison; the total order used to seed
    /// non-dominated sorting.
    pub fn lexicographic_cmp(&self, other: &Individual) -> std::cmp::Ordering {
        for (&a, &b) in self.fitness.iter().zip(other.fitness.iter()) {
            match a.partial_cmp(&b) {
                Some(std::cmp::Ordering::Equal) | None => continue,
                Some(ord) => return ord,
            }
        }
        std::cmp::Ordering::Equal
    }
}

impl From<Tree> for Individual {
    fn from(genotype: Tree) -> Self {
        Self::new(genotype)
    }
}

//! Fitness-proportional selection via prefix sums.
//!
//! Fitness values are cost-oriented (lower is better), so each individual
//! is weighted by its distance to the worst fitness in the population. The
//! weights are sorted, prefix-summed once per generation, and each draw is
//! then a single binary search.
//!
//! # References
//!
//! - Goldberg & Deb (1991), "A Comparative Analysis of Selection Schemes
//!   Used in Genetic Algorithms"

use rand::Rng;

use super::Selector;
use crate::core::Individual;
use crate::Scalar;

/// Proportional (roulette-wheel) selector with O(log n) draws.
pub struct ProportionalSelector {
    objective: usize,
    /// Inclusive prefix sums of `(v_max - fitness)` paired with the
    /// original population index, ascending.
    cumulative: Vec<(Scalar, usize)>,
}

impl ProportionalSelector {
    /// Selects on fitness dimension `objective`.
    pub fn new(objective: usize) -> Self {
        Self {
            objective,
            cumulative: Vec::new(),
        }
    }
}

impl Selector for ProportionalSelector {
    fn prepare(&mut self, population: &[Individual]) {
        assert!(
            !population.is_empty(),
            "cannot select from empty population"
        );
        let v_max = population
            .iter()
            .map(|ind| ind.objective(self.objective))
            .fold(Scalar::NEG_INFINITY, Scalar::max);

        self.cumulative.clear();
        self.cumulative.extend(
            population
                .iter()
                .enumerate()
                .map(|(i, ind)| (v_max - ind.objective(self.objective), i)),
        );
        self.cumulative.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
        });
        let mut sum = 0.0;
        for entry in self.cumulative.iter_mut() {
            sum += entry.0;
            entry.0 = sum;
        }
    }

    fn select<R: Rng>(&self, rng: &mut R) -> usize {
        assert!(!self.cumulative.is_empty(), "selector not prepared");
        let total = self.cumulative.last().expect("prepared non-empty").0;
        if total <= 0.0 {
            // degenerate population with uniform fitness
            return self.cumulative[rng.random_range(0..self.cumulative.len())].1;
        }
        let u: Scalar = rng.random_range(0.0..total);
        let pos = self.cumulative.partition_point(|entry| entry.0 < u);
        self.cumulative[pos.min(self.cumulative.len() - 1)].1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Node, Tree};
    use crate::random::create_rng;

    fn population(fitness: &[Scalar]) -> Vec<Individual> {
        fitness
            .iter()
            .map(|&f| {
                let mut ind = Individual::new(Tree::new(vec![Node::constant(0.0)]));
                ind.fitness = vec![f];
                ind
            })
            .collect()
    }

    #[test]
    fn test_prefix_sum_layout() {
        let pop = population(&[1.0, 2.0, 3.0]);
        let mut selector = ProportionalSelector::new(0);
        selector.prepare(&pop);
        // weights (v_max - f): 2, 1, 0; ascending by weight, prefix-summed
        assert_eq!(selector.cumulative, vec![(0.0, 2), (1.0, 1), (3.0, 0)]);
    }

    #[test]
    fn test_selection_frequency_proportional_to_weight() {
        let pop = population(&[1.0, 2.0, 3.0]);
        let mut selector = ProportionalSelector::new(0);
        selector.prepare(&pop);
        let mut rng = create_rng(42);

        let n = 60_000;
        let mut counts = [0usize; 3];
        for _ in 0..n {
            counts[selector.select(&mut rng)] += 1;
        }
        // weights 2 : 1 : 0
        let p0 = counts[0] as f64 / n as f64;
        let p1 = counts[1] as f64 / n as f64;
        assert!((p0 - 2.0 / 3.0).abs() < 0.02, "p0 = {p0}");
        assert!((p1 - 1.0 / 3.0).abs() < 0.02, "p1 = {p1}");
        assert!(counts[2] < n / 100, "worst should almost never win: {counts:?}");
    }

    #[test]
    fn test_uniform_fitness_selects_uniformly() {
        let pop = population(&[5.0, 5.0, 5.0, 5.0]);
        let mut selector = ProportionalSelector::new(0);
        selector.prepare(&pop);
        let mut rng = create_rng(42);

        let n = 20_000;
        let mut counts = [0usize; 4];
        for _ in 0..n {
            counts[selector.select(&mut rng)] += 1;
        }
        for &c in &counts {
            assert!(c > n / 8, "expected roughly uniform, got {counts:?}");
        }
    }

    #[test]
    fn test_single_individual() {
        let pop = population(&[3.0]);
        let mut selector = ProportionalSelector::new(0);
        selector.prepare(&pop);
        let mut rng = create_rng(42);
        assert_eq!(selector.select(&mut rng), 0);
    }

    #[test]
    fn test_prepare_resets_state() {
        let mut selector = ProportionalSelector::new(0);
        selector.prepare(&population(&[1.0, 2.0]));
        selector.prepare(&population(&[1.0, 2.0, 3.0]));
        assert_eq!(selector.cumulative.len(), 3);
    }

    #[test]
    #[should_panic(expected = "empty population")]
    fn test_empty_population_panics() {
        ProportionalSelector::new(0).prepare(&[]);
    }

    #[test]
    #[should_panic(expected = "not prepared")]
    fn test_unprepared_select_panics() {
        let mut rng = create_rng(42);
        ProportionalSelector::new(0).select(&mut rng);
    }
}

//! Hierarchical non-dominated sorting.
//!
//! Partitions a population into Pareto fronts by repeated sweeps over a
//! candidate queue. The queue is seeded in lexicographic fitness order, so
//! the head of the queue can never be dominated by anything behind it;
//! each sweep extracts one front and demotes dominated entries to the next
//! round.
//!
//! All objectives are minimized (cost-oriented fitness).
//!
//! # References
//!
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic
//!   Algorithm: NSGA-II"

use std::collections::VecDeque;

use crate::core::{Dominance, Individual};

/// Per-instance operation counters.
///
/// Updated only by the owning sorter; for multi-threaded sorting, give
/// each thread its own sorter and [`merge`](SorterStats::merge) at the
/// barrier (merging is associative).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SorterStats {
    pub dominance_comparisons: usize,
    pub lexicographical_comparisons: usize,
    /// Number of front-extraction sweeps.
    pub sweeps: usize,
}

impl SorterStats {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn merge(&mut self, other: &SorterStats) {
        self.dominance_comparisons += other.dominance_comparisons;
        self.lexicographical_comparisons += other.lexicographical_comparisons;
        self.sweeps += other.sweeps;
    }
}

/// Hierarchical Pareto front decomposition.
pub struct HierarchicalSorter {
    stats: SorterStats,
}

impl HierarchicalSorter {
    pub fn new() -> Self {
        Self {
            stats: SorterStats::default(),
        }
    }

    pub fn stats(&self) -> &SorterStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats.reset();
    }

    /// Partitions `population` into Pareto fronts of indices, best front
    /// first.
    ///
    /// # Panics
    /// Panics if the population is empty or fitness dimensions disagree.
    pub fn sort(&mut self, population: &[Individual]) -> Vec<Vec<usize>> {
        assert!(!population.is_empty(), "cannot sort an empty population");
        let dims = population[0].fitness.len();
        debug_assert!(
            population.iter().all(|ind| ind.fitness.len() == dims),
            "all fitness vectors must have the same dimension"
        );

        let mut seed: Vec<usize> = (0..population.len()).collect();
        let mut lex_comparisons = 0usize;
        seed.sort_by(|&a, &b| {
            lex_comparisons += 1;
            population[a].lexicographic_cmp(&population[b])
        });

        let mut q: VecDeque<usize> = seed.into();
        let mut dominated: Vec<usize> = Vec::with_capacity(q.len());
        let mut fronts: Vec<Vec<usize>> = Vec::new();
        let mut dominance_comparisons = 0usize;

        while !q.is_empty() {
            self.stats.sweeps += 1;
            let mut front = Vec::new();

            while let Some(q1) = q.pop_front() {
                front.push(q1);
                let mut non_dominated = 0usize;
                while q.len() > non_dominated {
                    let qj = q.pop_front().expect("queue length checked");
                    dominance_comparisons += 1;
                    // qj cannot dominate q1: q1 precedes it in lex order
                    match population[q1].pareto_compare(&population[qj]) {
                        Dominance::Left => dominated.push(qj),
                        _ => {
                            q.push_back(qj);
                            non_dominated += 1;
                        }
                    }
                }
            }
            fronts.push(front);

            q.extend(dominated.drain(..));
            q.make_contiguous().sort_by(|&a, &b| {
                lex_comparisons += 1;
                population[a].lexicographic_cmp(&population[b])
            });
        }

        self.stats.dominance_comparisons += dominance_comparisons;
        self.stats.lexicographical_comparisons += lex_comparisons;
        fronts
    }
}

impl Default for HierarchicalSorter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Node, Tree};
    use crate::Scalar;

    fn population(fitness: &[Vec<Scalar>]) -> Vec<Individual> {
        fitness
            .iter()
            .map(|f| {
                let mut ind = Individual::new(Tree::new(vec![Node::constant(0.0)]));
                ind.fitness = f.clone();
                ind
            })
            .collect()
    }

    fn sorted(mut fronts: Vec<Vec<usize>>) -> Vec<Vec<usize>> {
        for front in fronts.iter_mut() {
            front.sort_unstable();
        }
        fronts
    }

    #[test]
    fn test_two_layer_partition() {
        let pop = population(&[
            vec![1.0, 4.0],
            vec![2.0, 3.0],
            vec![3.0, 2.0],
            vec![4.0, 1.0],
            vec![2.0, 2.0],
        ]);
        let fronts = sorted(HierarchicalSorter::new().sort(&pop));
        // (2,2) dominates (2,3) and (3,2); the rest are incomparable
        assert_eq!(fronts, vec![vec![0, 3, 4], vec![1, 2]]);
    }

    #[test]
    fn test_total_order_chain() {
        let pop = population(&[vec![1.0, 1.0], vec![2.0, 2.0], vec![3.0, 3.0]]);
        let fronts = HierarchicalSorter::new().sort(&pop);
        assert_eq!(fronts, vec![vec![0], vec![1], vec![2]]);
    }

    #[test]
    fn test_single_front() {
        let pop = population(&[vec![1.0, 5.0], vec![3.0, 3.0], vec![5.0, 1.0]]);
        let fronts = HierarchicalSorter::new().sort(&pop);
        assert_eq!(fronts.len(), 1);
        assert_eq!(sorted(fronts), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_equal_individuals_share_a_front() {
        let pop = population(&[vec![2.0, 2.0], vec![2.0, 2.0], vec![2.0, 2.0]]);
        let fronts = HierarchicalSorter::new().sort(&pop);
        assert_eq!(fronts.len(), 1);
        assert_eq!(fronts[0].len(), 3);
    }

    #[test]
    fn test_mixed_three_fronts() {
        let pop = population(&[
            vec![1.0, 5.0],
            vec![3.0, 3.0],
            vec![5.0, 1.0],
            vec![4.0, 4.0], // dominated by (3,3)
            vec![6.0, 6.0], // dominated by (4,4)
        ]);
        let fronts = sorted(HierarchicalSorter::new().sort(&pop));
        assert_eq!(fronts, vec![vec![0, 1, 2], vec![3], vec![4]]);
    }

    #[test]
    fn test_every_index_appears_once() {
        let pop = population(&[
            vec![1.0, 2.0, 3.0],
            vec![3.0, 1.0, 2.0],
            vec![2.0, 3.0, 1.0],
            vec![2.0, 2.0, 2.0],
            vec![4.0, 4.0, 4.0],
        ]);
        let fronts = HierarchicalSorter::new().sort(&pop);
        let mut all: Vec<usize> = fronts.into_iter().flatten().collect();
        all.sort_unstable();
        assert_eq!(all, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_fronts_are_mutually_non_dominating() {
        let pop = population(&[
            vec![1.0, 9.0],
            vec![9.0, 1.0],
            vec![5.0, 5.0],
            vec![6.0, 6.0],
            vec![2.0, 8.0],
            vec![8.0, 2.0],
        ]);
        let fronts = HierarchicalSorter::new().sort(&pop);
        for front in &fronts {
            for (i, &a) in front.iter().enumerate() {
                for &b in &front[i + 1..] {
                    assert!(matches!(
                        pop[a].pareto_compare(&pop[b]),
                        Dominance::None | Dominance::Equal
                    ));
                }
            }
        }
    }

    #[test]
    fn test_stats_accumulate_and_merge() {
        let pop = population(&[vec![1.0, 2.0], vec![2.0, 1.0], vec![3.0, 3.0]]);
        let mut sorter = HierarchicalSorter::new();
        sorter.sort(&pop);
        let first = *sorter.stats();
        assert!(first.dominance_comparisons > 0);
        assert!(first.sweeps >= 1);

        sorter.sort(&pop);
        let mut merged = first;
        merged.merge(&first);
        assert_eq!(*sorter.stats(), merged);

        sorter.reset_stats();
        assert_eq!(*sorter.stats(), SorterStats::default());
    }

    #[test]
    #[should_panic(expected = "empty population")]
    fn test_empty_population_panics() {
        HierarchicalSorter::new().sort(&[]);
    }
}

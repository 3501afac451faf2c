//! Tournament selection.

use rand::Rng;

use super::Selector;
use crate::core::Individual;
use crate::Scalar;

/// Picks `k` individuals at random and returns the best.
///
/// Higher `k` means stronger selection pressure; `k = 1` degenerates to
/// uniform random selection.
pub struct TournamentSelector {
    objective: usize,
    tournament_size: usize,
    fitness: Vec<Scalar>,
}

impl TournamentSelector {
    pub fn new(objective: usize, tournament_size: usize) -> Self {
        Self {
            objective,
            tournament_size: tournament_size.max(1),
            fitness: Vec::new(),
        }
    }
}

impl Selector for TournamentSelector {
    fn prepare(&mut self, population: &[Individual]) {
        assert!(
            !population.is_empty(),
            "cannot select from empty population"
        );
        self.fitness.clear();
        self.fitness
            .extend(population.iter().map(|ind| ind.objective(self.objective)));
    }

    fn select<R: Rng>(&self, rng: &mut R) -> usize {
        assert!(!self.fitness.is_empty(), "selector not prepared");
        let n = self.fitness.len();
        let mut best = rng.random_range(0..n);
        for _ in 1..self.tournament_size {
            let challenger = rng.random_range(0..n);
            if self.fitness[challenger] < self.fitness[best] {
                best = challenger;
            }
        }
        best
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
    fn test_favors_best() {
        let pop = population(&[10.0, 5.0, 1.0, 8.0]);
        let mut selector = TournamentSelector::new(0, 4);
        selector.prepare(&pop);
        let mut rng = create_rng(42);

        let n = 10_000;
        let mut counts = [0usize; 4];
        for _ in 0..n {
            counts[selector.select(&mut rng)] += 1;
        }
        assert!(
            counts[2] > n * 6 / 10,
            "expected the best to win most tournaments: {counts:?}"
        );
    }

    #[test]
    fn test_size_one_is_uniform() {
        let pop = population(&[10.0, 5.0, 1.0, 8.0]);
        let mut selector = TournamentSelector::new(0, 1);
        selector.prepare(&pop);
        let mut rng = create_rng(42);

        let n = 10_000;
        let mut counts = [0usize; 4];
        for _ in 0..n {
            counts[selector.select(&mut rng)] += 1;
        }
        for &c in &counts {
            assert!(c > n * 15 / 100, "expected uniform, got {counts:?}");
        }
    }

    #[test]
    fn test_single_individual() {
        let pop = population(&[1.0]);
        let mut selector = TournamentSelector::new(0, 3);
        selector.prepare(&pop);
        let mut rng = create_rng(42);
        assert_eq!(selector.select(&mut rng), 0);
    }
}

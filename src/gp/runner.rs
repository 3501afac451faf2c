//! Generational GP loops.
//!
//! [`GpRunner`] wires the core pieces together: a creator seeds the
//! population, the evaluator scores it in parallel, and each generation
//! rebuilds the population from elites plus selected, recombined and
//! mutated offspring.
//!
//! Two modes are provided: [`run`](GpRunner::run) optimizes a single
//! metric with tournament selection, and
//! [`run_multi_objective`](GpRunner::run_multi_objective) evaluates one
//! fitness dimension per metric and drives selection and elitism from
//! [`HierarchicalSorter`] Pareto fronts. Both stop at the generation cap
//! or when the evaluation budget runs out; the scalar mode also stops on
//! stagnation.

use rand::Rng;

use super::config::GpConfig;
use crate::core::{Individual, Problem};
use crate::creator::{BalancedTreeCreator, TreeCreator};
use crate::error::Result;
use crate::eval::{Evaluator, Metric};
use crate::operators::{
    ChangeFunctionMutation, ChangeVariableMutation, OnePointMutation, SubtreeCrossover,
};
use crate::random::create_rng;
use crate::selection::{HierarchicalSorter, Selector, TournamentSelector};
use crate::Scalar;

/// Result of a single-objective GP run.
#[derive(Debug, Clone)]
pub struct GpResult {
    /// The best individual found during the entire run.
    pub best: Individual,

    /// Cost of the best individual (lower is better).
    pub best_fitness: Scalar,

    /// Number of generations executed.
    pub generations: usize,

    /// Whether the run stopped due to stagnation.
    pub stagnated: bool,

    /// Whether the evaluation budget ran out.
    pub budget_exhausted: bool,

    /// Best cost at initialization and after each generation.
    pub fitness_history: Vec<f64>,
}

/// Result of a multi-objective GP run.
#[derive(Debug, Clone)]
pub struct GpParetoResult {
    /// The first (non-dominated) front of the final population.
    pub pareto_front: Vec<Individual>,

    /// Number of generations executed.
    pub generations: usize,

    /// Whether the evaluation budget ran out.
    pub budget_exhausted: bool,

    /// Size of the first front at the start of each generation.
    pub front_sizes: Vec<usize>,
}

/// The genetic operators shared by both run modes.
struct Operators<'a> {
    crossover: SubtreeCrossover,
    change_variable: ChangeVariableMutation<'a>,
    change_function: ChangeFunctionMutation<'a>,
}

impl<'a> Operators<'a> {
    fn new(problem: &'a Problem, config: &GpConfig) -> Self {
        Self {
            crossover: SubtreeCrossover::new(0.9, config.max_depth, config.max_length),
            change_variable: ChangeVariableMutation::new(problem.inputs()),
            change_function: ChangeFunctionMutation::new(problem.pset()),
        }
    }

    /// Produces one offspring from the selected parents.
    fn breed<R: Rng>(
        &self,
        rng: &mut R,
        population: &[Individual],
        p1: usize,
        p2: usize,
        config: &GpConfig,
    ) -> Result<Individual> {
        let tree = if rng.random_bool(config.crossover_probability) {
            self.crossover
                .apply(rng, &population[p1].genotype, &population[p2].genotype)?
        } else {
            population[p1].genotype.clone()
        };
        let mut child = Individual::new(tree);

        if rng.random_bool(config.mutation_probability) {
            match rng.random_range(0..3) {
                0 => OnePointMutation.apply(rng, &mut child.genotype),
                1 => self.change_variable.apply(rng, &mut child.genotype),
                _ => self.change_function.apply(rng, &mut child.genotype),
            }
        }
        Ok(child)
    }
}

/// Seeds a population with uniformly distributed length targets.
fn initialize<R: Rng>(
    rng: &mut R,
    creator: &BalancedTreeCreator<'_>,
    config: &GpConfig,
) -> Result<Vec<Individual>> {
    (0..config.population_size)
        .map(|_| {
            let target = rng.random_range(1..=config.max_length);
            creator
                .create(rng, target, 0, config.max_depth)
                .map(Individual::new)
        })
        .collect()
}

/// Executes the generational loop.
pub struct GpRunner;

impl GpRunner {
    /// Runs single-objective GP on `problem` with the given metric.
    ///
    /// # Panics
    /// Panics if the configuration is invalid (call [`GpConfig::validate`]
    /// first for a descriptive error).
    pub fn run<M: Metric + 'static>(
        problem: &Problem,
        metric: M,
        config: &GpConfig,
    ) -> Result<GpResult> {
        config.validate().expect("invalid GpConfig");

        let mut rng = match config.seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };

        let creator = BalancedTreeCreator::new(problem.pset(), problem.inputs())
            .with_irregularity_bias(config.irregularity_bias);
        let evaluator = Evaluator::new(problem, metric)
            .with_budget(config.budget.unwrap_or(u64::MAX))
            .with_local_iterations(config.local_iterations);
        let operators = Operators::new(problem, config);
        let mut selector = TournamentSelector::new(0, config.tournament_size);

        // 1. initialize and evaluate
        let mut population = initialize(&mut rng, &creator, config)?;
        evaluator.evaluate_population(&mut rng, &mut population)?;

        let mut best = best_of(&population).clone();
        let mut fitness_history = Vec::with_capacity(config.max_generations + 1);
        fitness_history.push(f64::from(best.fitness[0]));

        let elite_count = (config.population_size as f64 * config.elite_ratio) as usize;
        let mut stagnation_counter = 0usize;
        let mut generations = 0usize;
        let mut stagnated = false;

        // 2. generational loop
        for generation in 0..config.max_generations {
            if evaluator.budget_exhausted() {
                break;
            }

            population.sort_by(|a, b| {
                a.fitness[0]
                    .partial_cmp(&b.fitness[0])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            selector.prepare(&population);

            let mut next_gen: Vec<Individual> = population[..elite_count].to_vec();
            while next_gen.len() < config.population_size {
                let p1 = selector.select(&mut rng);
                let p2 = selector.select(&mut rng);
                next_gen.push(operators.breed(&mut rng, &population, p1, p2, config)?);
            }

            // elites keep their fitness; only offspring are evaluated
            evaluator.evaluate_population(&mut rng, &mut next_gen[elite_count..])?;
            population = next_gen;
            generations = generation + 1;

            let generation_best = best_of(&population);
            if generation_best.fitness[0] < best.fitness[0] {
                best = generation_best.clone();
                stagnation_counter = 0;
            } else {
                stagnation_counter += 1;
            }
            fitness_history.push(f64::from(best.fitness[0]));
            tracing::debug!(
                generation = generations,
                best = fitness_history.last().copied(),
                remaining_budget = evaluator.remaining_budget(),
                "generation complete"
            );

            if config.stagnation_limit > 0 && stagnation_counter >= config.stagnation_limit {
                stagnated = true;
                break;
            }
        }

        Ok(GpResult {
            best_fitness: best.fitness[0],
            best,
            generations,
            stagnated,
            budget_exhausted: evaluator.budget_exhausted(),
            fitness_history,
        })
    }

    /// Runs multi-objective GP, one fitness dimension per metric.
    ///
    /// Selection pressure comes from Pareto rank: each generation the
    /// population is partitioned by [`HierarchicalSorter`], elites are
    /// taken front by front (lexicographically best first within the cut
    /// front), and parents win tournaments on `(rank, lexicographic
    /// fitness)`. Returns the first front of the final population.
    ///
    /// # Panics
    /// Panics if the configuration is invalid or fewer than two metrics
    /// are given.
    pub fn run_multi_objective(
        problem: &Problem,
        metrics: Vec<Box<dyn Metric>>,
        config: &GpConfig,
    ) -> Result<GpParetoResult> {
        config.validate().expect("invalid GpConfig");
        assert!(
            metrics.len() >= 2,
            "multi-objective runs need at least two metrics"
        );

        let mut rng = match config.seed {
            Some(seed) => create_rng(seed),
            None => create_rng(rand::random()),
        };

        let creator = BalancedTreeCreator::new(problem.pset(), problem.inputs())
            .with_irregularity_bias(config.irregularity_bias);
        let evaluator = Evaluator::from_metrics(problem, metrics)
            .with_budget(config.budget.unwrap_or(u64::MAX))
            .with_local_iterations(config.local_iterations);
        let operators = Operators::new(problem, config);
        let mut sorter = HierarchicalSorter::new();

        let mut population = initialize(&mut rng, &creator, config)?;
        evaluator.evaluate_population(&mut rng, &mut population)?;

        let elite_count = (config.population_size as f64 * config.elite_ratio) as usize;
        let mut front_sizes = Vec::with_capacity(config.max_generations);
        let mut generations = 0usize;

        for generation in 0..config.max_generations {
            if evaluator.budget_exhausted() {
                break;
            }

            let fronts = sorter.sort(&population);
            front_sizes.push(fronts[0].len());

            let mut rank = vec![0usize; population.len()];
            for (r, front) in fronts.iter().enumerate() {
                for &i in front {
                    rank[i] = r;
                }
            }

            // elites front by front; the cut front contributes its
            // lexicographically best members
            let mut next_gen: Vec<Individual> = Vec::with_capacity(config.population_size);
            'elites: for front in &fronts {
                let mut members = front.clone();
                members.sort_by(|&a, &b| population[a].lexicographic_cmp(&population[b]));
                for i in members {
                    if next_gen.len() == elite_count {
                        break 'elites;
                    }
                    next_gen.push(population[i].clone());
                }
            }

            while next_gen.len() < config.population_size {
                let p1 = rank_tournament(&mut rng, &rank, &population, config.tournament_size);
                let p2 = rank_tournament(&mut rng, &rank, &population, config.tournament_size);
                next_gen.push(operators.breed(&mut rng, &population, p1, p2, config)?);
            }

            evaluator.evaluate_population(&mut rng, &mut next_gen[elite_count..])?;
            population = next_gen;
            generations = generation + 1;
            tracing::debug!(
                generation = generations,
                front_size = front_sizes.last().copied(),
                remaining_budget = evaluator.remaining_budget(),
                "generation complete"
            );
        }

        let fronts = sorter.sort(&population);
        let pareto_front: Vec<Individual> = fronts[0]
            .iter()
            .map(|&i| population[i].clone())
            .collect();

        Ok(GpParetoResult {
            pareto_front,
            generations,
            budget_exhausted: evaluator.budget_exhausted(),
            front_sizes,
        })
    }
}

/// The individual with the lowest cost.
fn best_of(population: &[Individual]) -> &Individual {
    population
        .iter()
        .min_by(|a, b| {
            a.fitness[0]
                .partial_cmp(&b.fitness[0])
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .expect("population must not be empty")
}

/// Tournament on Pareto rank, ties broken lexicographically on fitness.
fn rank_tournament<R: Rng>(
    rng: &mut R,
    rank: &[usize],
    population: &[Individual],
    tournament_size: usize,
) -> usize {
    let n = population.len();
    let mut best = rng.random_range(0..n);
    for _ in 1..tournament_size.max(1) {
        let challenger = rng.random_range(0..n);
        let wins = match rank[challenger].cmp(&rank[best]) {
            std::cmp::Ordering::Less => true,
            std::cmp::Ordering::Greater => false,
            std::cmp::Ordering::Equal => {
                population[challenger].lexicographic_cmp(&population[best])
                    == std::cmp::Ordering::Less
            }
        };
        if wins {
            best = challenger;
        }
    }
    best
}

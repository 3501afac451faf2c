//! Fitness evaluation with a shared budget and parallel population sweeps.
//!
//! The evaluator owns the interpreter, the metrics, and an atomic
//! evaluation budget. Fitness is a vector with one component per
//! configured metric — a single metric for scalar runs, several for
//! Pareto-based runs — and is always stored **cost-oriented** (lower is
//! better): higher-is-better metrics are negated, so selection and sorting
//! never need to know a metric's monotonicity.
//!
//! Population evaluation runs one independent task per individual on the
//! rayon pool. Per-individual RNG seeds are drawn from the master generator
//! before the parallel region, so fitness values are deterministic
//! regardless of scheduling.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use rand::{Rng, RngCore};
use rayon::prelude::*;

use super::interpreter::Interpreter;
use super::metrics::Metric;
use super::nelder_mead;
use crate::core::{Individual, Problem, Tree};
use crate::error::Result;
use crate::random::create_rng;
use crate::Scalar;

/// Evaluates individuals against a problem's training range.
pub struct Evaluator<'a> {
    problem: &'a Problem,
    interpreter: Interpreter,
    /// One fitness dimension per metric; the first is the primary
    /// objective used by local search.
    metrics: Vec<Box<dyn Metric>>,
    /// Target column over the training range, cached at construction.
    target: Vec<Scalar>,
    /// Cap on coefficient-tuning objective calls per individual; 0 disables.
    local_iterations: usize,
    remaining: AtomicI64,
    exhausted: AtomicBool,
}

impl<'a> Evaluator<'a> {
    /// Creates a single-objective evaluator with an unlimited budget and
    /// no local search.
    pub fn new(problem: &'a Problem, metric: impl Metric + 'static) -> Self {
        Self::from_metrics(problem, vec![Box::new(metric)])
    }

    /// Creates an evaluator with one fitness dimension per metric.
    ///
    /// # Panics
    /// Panics if `metrics` is empty.
    pub fn from_metrics(problem: &'a Problem, metrics: Vec<Box<dyn Metric>>) -> Self {
        assert!(!metrics.is_empty(), "at least one metric required");
        let target = problem.target_values(problem.training_range());
        Self {
            problem,
            interpreter: Interpreter::new(),
            metrics,
            target,
            local_iterations: 0,
            remaining: AtomicI64::new(i64::MAX),
            exhausted: AtomicBool::new(false),
        }
    }

    /// Appends a further fitness dimension for Pareto-based runs.
    pub fn with_metric(mut self, metric: impl Metric + 'static) -> Self {
        self.metrics.push(Box::new(metric));
        self
    }

    /// Sets the global evaluation budget, in individual evaluations.
    pub fn with_budget(self, budget: u64) -> Self {
        self.remaining
            .store(budget.min(i64::MAX as u64) as i64, Ordering::Relaxed);
        self
    }

    /// Sets the per-individual local-search budget (objective calls).
    pub fn with_local_iterations(mut self, iterations: usize) -> Self {
        self.local_iterations = iterations;
        self
    }

    /// Replaces the interpreter (custom dispatch table or numeric options).
    pub fn with_interpreter(mut self, interpreter: Interpreter) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// The configured metrics, primary objective first.
    pub fn metrics(&self) -> &[Box<dyn Metric>] {
        &self.metrics
    }

    /// Number of fitness dimensions.
    pub fn objectives(&self) -> usize {
        self.metrics.len()
    }

    /// Evaluations left before the sentinel kicks in.
    pub fn remaining_budget(&self) -> u64 {
        self.remaining.load(Ordering::Relaxed).max(0) as u64
    }

    /// Whether the budget ran out at some point.
    pub fn budget_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::Relaxed)
    }

    /// The worst-case fitness vector assigned to skipped individuals.
    pub fn sentinel_fitness(&self) -> Vec<Scalar> {
        vec![Scalar::INFINITY; self.metrics.len()]
    }

    /// Consumes one unit of budget, failing with
    /// [`Error::BudgetExhausted`](crate::Error::BudgetExhausted) once it
    /// reaches zero.
    fn consume_budget(&self) -> Result<()> {
        if self.remaining.fetch_sub(1, Ordering::Relaxed) > 0 {
            return Ok(());
        }
        if !self.exhausted.swap(true, Ordering::Relaxed) {
            tracing::debug!("evaluation budget exhausted");
        }
        Err(crate::error::Error::BudgetExhausted)
    }

    /// The primary objective driving local search.
    fn primary_metric(&self) -> &dyn Metric {
        self.metrics[0].as_ref()
    }

    /// Evaluates one individual, storing and returning its fitness.
    ///
    /// Consumes one unit of budget; once the budget is exhausted the
    /// sentinel worst-case fitness is returned without touching the tree.
    /// `scratch` holds the prediction buffer between calls.
    pub fn evaluate<R: Rng>(
        &self,
        rng: &mut R,
        individual: &mut Individual,
        scratch: &mut Vec<Scalar>,
    ) -> Result<Vec<Scalar>> {
        // a run past its budget terminates gracefully on sentinel fitness
        if self.consume_budget().is_err() {
            individual.fitness = self.sentinel_fitness();
            return Ok(individual.fitness.clone());
        }

        if self.local_iterations > 0 {
            self.optimize_coefficients(rng, &mut individual.genotype, scratch)?;
        }

        let range = self.problem.training_range();
        self.interpreter
            .evaluate_into(&individual.genotype, self.problem.dataset(), range, scratch)?;
        let predicted: &[Scalar] = scratch;
        individual.fitness = self
            .metrics
            .iter()
            .map(|metric| cost(metric.as_ref(), metric.evaluate(predicted, &self.target)))
            .collect();
        Ok(individual.fitness.clone())
    }

    /// Tunes the optimizable leaf payloads with a bounded simplex search,
    /// keeping the best parameters found.
    fn optimize_coefficients<R: Rng>(
        &self,
        _rng: &mut R,
        tree: &mut Tree,
        scratch: &mut Vec<Scalar>,
    ) -> Result<()> {
        let start = optimizable_coefficients(tree);
        if start.is_empty() {
            return Ok(());
        }

        let range = self.problem.training_range();
        let dataset = self.problem.dataset();
        let primary = self.primary_metric();

        // baseline before touching anything
        self.interpreter.evaluate_into(tree, dataset, range, scratch)?;
        let baseline = f64::from(cost(primary, primary.evaluate(scratch, &self.target)));

        let mut trial = tree.clone();
        let objective = |x: &[f64]| {
            set_optimizable_coefficients(&mut trial, x);
            match self
                .interpreter
                .evaluate_into(&trial, dataset, range, scratch)
            {
                Ok(_) => f64::from(cost(primary, primary.evaluate(scratch, &self.target))),
                Err(_) => f64::INFINITY,
            }
        };
        let (best, value) = nelder_mead::minimize(objective, &start, self.local_iterations);
        if value < baseline {
            set_optimizable_coefficients(tree, &best);
        }
        Ok(())
    }

    /// Evaluates every individual of a population in parallel.
    ///
    /// Each individual gets a deterministic seed drawn from `rng` up front;
    /// completion order is unspecified and does not affect the result.
    pub fn evaluate_population<R: Rng>(
        &self,
        rng: &mut R,
        population: &mut [Individual],
    ) -> Result<()> {
        let seeds: Vec<u64> = (0..population.len()).map(|_| rng.next_u64()).collect();
        population
            .par_iter_mut()
            .zip(seeds.into_par_iter())
            .try_for_each(|(individual, seed)| {
                let mut worker_rng = create_rng(seed);
                let mut scratch = Vec::new();
                self.evaluate(&mut worker_rng, individual, &mut scratch)
                    .map(|_| ())
            })
    }
}

/// Converts a raw metric value into a cost (lower is better).
fn cost(metric: &dyn Metric, raw: Scalar) -> Scalar {
    let cost = if metric.higher_is_better() { -raw } else { raw };
    if cost.is_finite() {
        cost
    } else {
        Scalar::INFINITY
    }
}

fn optimizable_coefficients(tree: &Tree) -> Vec<f64> {
    tree.nodes()
        .iter()
        .filter(|n| n.is_leaf() && n.optimize)
        .map(|n| f64::from(n.value))
        .collect()
}

fn set_optimizable_coefficients(tree: &mut Tree, x: &[f64]) {
    let mut it = x.iter();
    for node in tree
        .nodes_mut()
        .iter_mut()
        .filter(|n| n.is_leaf() && n.optimize)
    {
        node.value = *it.next().expect("one coefficient per optimizable leaf") as Scalar;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Dataset, Node, NodeType, Range};
    use crate::eval::metrics::{MeanAbsoluteError, MeanSquaredError, RSquared};
    use crate::random::create_rng;

    /// y = 2 x1 + 1 over ten rows
    fn linear_problem() -> Problem {
        let x: Vec<Scalar> = (0..10).map(|i| i as Scalar).collect();
        let y: Vec<Scalar> = x.iter().map(|v| 2.0 * v + 1.0).collect();
        Problem::new(Dataset::from_columns(vec![x, y]), "X2")
    }

    fn model(problem: &Problem, coefficient: Scalar, intercept: Scalar) -> Individual {
        let hash = problem.dataset().variable("X1").unwrap().hash;
        let mut tree = Tree::new(vec![
            Node::variable(hash, coefficient),
            Node::constant(intercept),
            {
                let mut n = Node::new(NodeType::Add);
                n.arity = 2;
                n
            },
        ]);
        tree.update_derived().unwrap();
        Individual::new(tree)
    }

    #[test]
    fn test_perfect_model_has_zero_cost() {
        let problem = linear_problem();
        let evaluator = Evaluator::new(&problem, MeanSquaredError);
        let mut rng = create_rng(42);
        let mut individual = model(&problem, 2.0, 1.0);
        let fitness = evaluator
            .evaluate(&mut rng, &mut individual, &mut Vec::new())
            .unwrap();
        assert_eq!(fitness, vec![0.0]);
        assert_eq!(individual.fitness, vec![0.0]);
    }

    #[test]
    fn test_higher_is_better_metric_is_negated() {
        let problem = linear_problem();
        let evaluator = Evaluator::new(&problem, RSquared);
        let mut rng = create_rng(42);
        let mut individual = model(&problem, 2.0, 1.0);
        let fitness = evaluator
            .evaluate(&mut rng, &mut individual, &mut Vec::new())
            .unwrap();
        // r2 = 1 stored as cost -1
        assert!((fitness[0] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_multi_metric_fitness_dimensions() {
        let problem = linear_problem();
        let evaluator =
            Evaluator::new(&problem, MeanSquaredError).with_metric(MeanAbsoluteError);
        assert_eq!(evaluator.objectives(), 2);
        let mut rng = create_rng(42);
        let mut individual = model(&problem, 2.0, 1.0);
        let fitness = evaluator
            .evaluate(&mut rng, &mut individual, &mut Vec::new())
            .unwrap();
        assert_eq!(fitness, vec![0.0, 0.0]);
        assert_eq!(individual.fitness.len(), 2);
    }

    #[test]
    fn test_multi_metric_sentinel_dimensions() {
        let problem = linear_problem();
        let evaluator = Evaluator::new(&problem, MeanSquaredError)
            .with_metric(MeanAbsoluteError)
            .with_budget(0);
        let mut rng = create_rng(42);
        let mut individual = model(&problem, 2.0, 1.0);
        let fitness = evaluator
            .evaluate(&mut rng, &mut individual, &mut Vec::new())
            .unwrap();
        assert_eq!(fitness, vec![Scalar::INFINITY, Scalar::INFINITY]);
        assert!(evaluator.budget_exhausted());
    }

    #[test]
    fn test_budget_limits_evaluations() {
        let problem = linear_problem();
        let evaluator = Evaluator::new(&problem, MeanSquaredError).with_budget(10);
        let mut rng = create_rng(42);
        let mut population: Vec<Individual> =
            (0..100).map(|_| model(&problem, 2.0, 1.0)).collect();
        evaluator
            .evaluate_population(&mut rng, &mut population)
            .unwrap();

        let evaluated = population
            .iter()
            .filter(|i| i.fitness[0].is_finite())
            .count();
        let sentinel = population
            .iter()
            .filter(|i| i.fitness[0] == Scalar::INFINITY)
            .count();
        assert_eq!(evaluated, 10);
        assert_eq!(sentinel, 90);
        assert_eq!(evaluator.remaining_budget(), 0);
        assert!(evaluator.budget_exhausted());
    }

    #[test]
    fn test_population_fitness_deterministic() {
        let problem = linear_problem();
        let run = || {
            let evaluator = Evaluator::new(&problem, MeanSquaredError);
            let mut rng = create_rng(7);
            let mut population: Vec<Individual> = (0..20)
                .map(|i| model(&problem, i as Scalar * 0.3, 0.5))
                .collect();
            evaluator
                .evaluate_population(&mut rng, &mut population)
                .unwrap();
            population
                .into_iter()
                .map(|i| i.fitness[0])
                .collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_local_search_improves_coefficients() {
        let problem = linear_problem();
        let evaluator = Evaluator::new(&problem, MeanSquaredError).with_local_iterations(400);
        let mut rng = create_rng(42);

        // start away from the optimum (2, 1)
        let mut individual = model(&problem, 0.5, 0.0);
        let before = {
            let no_search = Evaluator::new(&problem, MeanSquaredError);
            let mut copy = individual.clone();
            no_search
                .evaluate(&mut rng, &mut copy, &mut Vec::new())
                .unwrap()[0]
        };
        let after = evaluator
            .evaluate(&mut rng, &mut individual, &mut Vec::new())
            .unwrap()[0];
        assert!(
            after < before * 0.1,
            "local search should sharply reduce cost: {after} vs {before}"
        );
    }

    #[test]
    fn test_invalid_tree_surfaces_error() {
        let problem = linear_problem();
        let evaluator = Evaluator::new(&problem, MeanSquaredError);
        let mut rng = create_rng(42);
        let mut individual = Individual::new(Tree::new(vec![{
            let mut n = Node::new(NodeType::Add);
            n.arity = 2;
            n
        }]));
        assert!(evaluator
            .evaluate(&mut rng, &mut individual, &mut Vec::new())
            .is_err());
    }

    #[test]
    fn test_training_range_restricts_rows() {
        let problem = linear_problem().with_training_range(Range::new(0, 5));
        let evaluator = Evaluator::new(&problem, MeanSquaredError);
        let mut rng = create_rng(42);
        let mut individual = model(&problem, 2.0, 1.0);
        let fitness = evaluator
            .evaluate(&mut rng, &mut individual, &mut Vec::new())
            .unwrap();
        assert_eq!(fitness, vec![0.0]);
    }
}

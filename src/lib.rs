//! Evolutionary symbolic regression core.
//!
//! Evolves mathematical expressions to fit tabular numeric data. The crate
//! provides the engine only: expression representation, tree synthesis,
//! evaluation, selection, and the generational loop. CSV parsing beyond
//! numeric matrices, command-line driving, and benchmark harnesses are
//! left to consumers.
//!
//! # Architecture
//!
//! - [`core`]: the data model — postfix expression trees ([`core::Tree`]),
//!   column-major datasets ([`core::Dataset`]), primitive sets, individuals,
//!   and the [`core::Problem`] descriptor binding them together.
//! - [`creator`]: random tree synthesis (balanced and PTC2 growth).
//! - [`eval`]: the stack-machine interpreter, fitness metrics, and the
//!   budgeted, rayon-parallel population [`eval::Evaluator`].
//! - [`operators`]: subtree crossover and point mutations.
//! - [`selection`]: proportional and tournament selection plus
//!   hierarchical non-dominated sorting for multi-objective runs.
//! - [`gp`]: the generational loops tying everything together — scalar,
//!   or Pareto-based over one fitness dimension per metric.
//! - [`random`], [`hash`], [`stat`]: small-state PRNGs, stable hashing,
//!   and streaming statistics used throughout.
//!
//! # Conventions
//!
//! Fitness is cost-oriented: lower is always better, and the evaluator
//! negates higher-is-better metrics. All predictions are computed in
//! single precision; statistics accumulate in `f64`.
//!
//! # Example
//!
//! ```
//! use symreg::core::{Dataset, Problem};
//! use symreg::eval::MeanSquaredError;
//! use symreg::gp::{GpConfig, GpRunner};
//!
//! // y = 2 x
//! let x: Vec<f32> = (0..20).map(|i| i as f32).collect();
//! let y: Vec<f32> = x.iter().map(|v| 2.0 * v).collect();
//! let problem = Problem::new(Dataset::from_columns(vec![x, y]), "X2");
//!
//! let config = GpConfig::default()
//!     .with_population_size(20)
//!     .with_max_generations(5)
//!     .with_max_length(10)
//!     .with_seed(42);
//! let result = GpRunner::run(&problem, MeanSquaredError, &config).unwrap();
//! assert!(result.best_fitness.is_finite());
//! ```

pub mod core;
pub mod creator;
pub mod error;
pub mod eval;
pub mod gp;
pub mod hash;
pub mod operators;
pub mod random;
pub mod selection;
pub mod stat;

pub use error::{Error, Result};

/// The numeric type of dataset values, predictions, and fitness.
pub type Scalar = f32;

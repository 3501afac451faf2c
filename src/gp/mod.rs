//! Generational genetic programming driver.
//!
//! # Key Types
//!
//! - [`GpConfig`]: run parameters (population, operators, budget)
//! - [`GpRunner`]: executes the generational loop — scalar
//!   ([`run`](GpRunner::run)) or Pareto-based
//!   ([`run_multi_objective`](GpRunner::run_multi_objective))
//! - [`GpResult`] / [`GpParetoResult`]: best individual or final Pareto
//!   front, plus run statistics
//!
//! # References
//!
//! - Koza (1992), *Genetic Programming: On the Programming of Computers by
//!   Means of Natural Selection*
//! - Poli, Langdon & McPhee (2008), *A Field Guide to Genetic Programming*
//! - Deb et al. (2002), "A Fast and Elitist Multiobjective Genetic
//!   Algorithm: NSGA-II"

mod config;
mod runner;

pub use config::GpConfig;
pub use runner::{GpParetoResult, GpResult, GpRunner};

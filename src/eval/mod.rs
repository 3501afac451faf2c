//! Evaluation pipeline: interpreter, metrics, evaluator, local search.

mod evaluator;
mod interpreter;
mod metrics;
pub mod nelder_mead;

pub use evaluator::Evaluator;
pub use interpreter::{DispatchTable, EvalOptions, Interpreter};
pub use metrics::{
    MeanAbsoluteError, MeanSquaredError, Metric, NormalizedMeanSquaredError, RSquared,
};

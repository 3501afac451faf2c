//! Genetic operators over tree genotypes.
//!
//! Subtree crossover exploits the postfix layout: a subtree is a contiguous
//! slice, so recombination is three slice copies. Mutations are small,
//! local edits that preserve the layout by construction.

mod crossover;
mod mutation;

pub use crossover::SubtreeCrossover;
pub use mutation::{ChangeFunctionMutation, ChangeVariableMutation, OnePointMutation};

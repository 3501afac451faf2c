//! Core data model: nodes, trees, datasets, individuals, primitive sets.

mod dataset;
mod individual;
mod node;
mod pset;
mod problem;
mod range;
mod tree;

pub use dataset::{Dataset, Variable};
pub use individual::{Dominance, Individual};
pub use node::{Node, NodeType};
pub use pset::{Primitive, PrimitiveSet};
pub use problem::Problem;
pub use range::Range;
pub use tree::{Children, Tree};

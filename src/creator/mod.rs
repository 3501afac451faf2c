//! Random tree synthesis.
//!
//! Two creators with complementary sampling characteristics:
//!
//! - [`BalancedTreeCreator`]: regulates open argument slots against the
//!   remaining node budget, producing a near-uniform length distribution.
//! - [`ProbabilisticTreeCreator`] (PTC2): grows breadth-first from a random
//!   frontier, matching a target length with diverse shapes.
//!
//! Both honor the primitive set's arity windows, force leaves at the
//! `max_depth` ceiling, and support an irregularity bias that forces leaves
//! at random to diversify shapes.

mod balanced;
mod ptc2;

pub use balanced::BalancedTreeCreator;
pub use ptc2::ProbabilisticTreeCreator;

use rand::Rng;
use rand_distr::StandardNormal;

use crate::core::{Node, NodeType, Tree, Variable};
use crate::error::Result;

/// Produces random trees of a controlled size.
///
/// `target_length` is a soft node-count target; `1` always yields a single
/// leaf. `max_depth` is a hard ceiling enforced by forcing leaves.
/// `min_depth` is accepted for interface compatibility and currently
/// ignored by both creators.
pub trait TreeCreator {
    fn create<R: Rng>(
        &self,
        rng: &mut R,
        target_length: usize,
        min_depth: usize,
        max_depth: usize,
    ) -> Result<Tree>;
}

/// Binds a freshly sampled leaf: variables pick a random input column,
/// and every leaf draws a standard-normal payload.
pub(crate) fn init_leaf<R: Rng>(node: &mut Node, variables: &[Variable], rng: &mut R) {
    if !node.is_leaf() {
        return;
    }
    if node.node_type == NodeType::Variable {
        let variable = &variables[rng.random_range(0..variables.len())];
        node.hash_value = variable.hash;
        node.calculated_hash_value = variable.hash;
    }
    node.value = rng.sample(StandardNormal);
}

/// Emits the postfix linearization of a node arena by a postorder walk.
///
/// `child_index[i]` is the arena index of node `i`'s first child; children
/// are contiguous. The array is filled from the back so that the root lands
/// at the last position.
pub(crate) fn linearize(nodes: &[Node], child_index: &[usize]) -> Tree {
    let mut postfix = vec![Node::constant(0.0); nodes.len()];
    let mut idx = nodes.len();
    fill(nodes, child_index, 0, &mut postfix, &mut idx);
    Tree::new(postfix)
}

fn fill(nodes: &[Node], child_index: &[usize], i: usize, postfix: &mut [Node], idx: &mut usize) {
    *idx -= 1;
    postfix[*idx] = nodes[i];
    if nodes[i].is_leaf() {
        return;
    }
    for c in child_index[i]..child_index[i] + nodes[i].arity as usize {
        fill(nodes, child_index, c, postfix, idx);
    }
}

//! Probabilistic tree creator (PTC2).
//!
//! Grows a tree from a frontier of pending depth slots, dequeued in random
//! order, so that the shape distribution stays diverse while the node count
//! tracks the target. When a length is not achievable with the available
//! arities, the target is pushed up by the shortfall.
//!
//! # References
//!
//! - Luke (2000), "Two Fast Tree-Creation Algorithms for Genetic
//!   Programming"

use std::collections::VecDeque;

use rand::Rng;

use super::{init_leaf, linearize, TreeCreator};
use crate::core::{Node, PrimitiveSet, Tree, Variable};
use crate::error::{Error, Result};

/// Creator matching a target length with controlled shape diversity.
pub struct ProbabilisticTreeCreator<'a> {
    pset: &'a PrimitiveSet,
    variables: &'a [Variable],
    irregularity_bias: f64,
}

impl<'a> ProbabilisticTreeCreator<'a> {
    /// # Panics
    /// Panics if `variables` is empty.
    pub fn new(pset: &'a PrimitiveSet, variables: &'a [Variable]) -> Self {
        assert!(!variables.is_empty(), "at least one input variable required");
        Self {
            pset,
            variables,
            irregularity_bias: 0.0,
        }
    }

    /// Per-child probability of forcing a leaf. Clamped to `[0, 1]`;
    /// default 0.
    pub fn with_irregularity_bias(mut self, bias: f64) -> Self {
        self.irregularity_bias = bias.clamp(0.0, 1.0);
        self
    }
}

/// Swaps a random element to the front and pops it.
fn random_dequeue<R: Rng>(q: &mut VecDeque<u16>, rng: &mut R) -> u16 {
    let j = rng.random_range(0..q.len());
    q.swap(0, j);
    q.pop_front().expect("queue checked non-empty")
}

impl TreeCreator for ProbabilisticTreeCreator<'_> {
    fn create<R: Rng>(
        &self,
        rng: &mut R,
        target_length: usize,
        _min_depth: usize,
        max_depth: usize,
    ) -> Result<Tree> {
        let requested = target_length.max(1);
        let unreachable = |_| Error::UnreachableTargetLength { target: requested };

        let Some((min_fa, max_fa)) = self.pset.function_arity_limits() else {
            let mut leaf = self.pset.sample_random_symbol(rng, 0, 0).map_err(unreachable)?;
            init_leaf(&mut leaf, self.variables, rng);
            let mut tree = Tree::new(vec![leaf]);
            tree.update_derived()?;
            return Ok(tree);
        };

        let mut target = requested;
        if target > 1 && target < min_fa as usize + 1 {
            target = min_fa as usize + 1;
        }

        // the root sits at depth 1, so a ceiling of 1 forces a leaf root
        let root_max = if max_depth <= 1 {
            0
        } else {
            (max_fa as usize).min(target - 1) as u16
        };
        let root_min = min_fa.min(root_max);
        let mut root = self
            .pset
            .sample_random_symbol(rng, root_min, root_max)
            .map_err(unreachable)?;
        init_leaf(&mut root, self.variables, rng);

        if root.is_leaf() {
            let mut tree = Tree::new(vec![root]);
            tree.update_derived()?;
            return Ok(tree);
        }

        root.depth = 1;
        let mut arena: Vec<Node> = Vec::with_capacity(target);
        arena.push(root);

        let mut q: VecDeque<u16> = VecDeque::with_capacity(target);
        for _ in 0..root.arity {
            q.push_back(2);
        }

        while !q.is_empty() {
            let child_depth = random_dequeue(&mut q, rng);

            let force_leaf = child_depth as usize >= max_depth
                || (q.len() > 1 && rng.random_bool(self.irregularity_bias));
            let budget = target.saturating_sub(q.len() + arena.len() + 1);
            let mut max_arity = if force_leaf {
                0
            } else {
                (max_fa as usize).min(budget) as u16
            };
            // some lengths are not reachable with the available arities;
            // push the target up by the shortfall
            if max_arity > 0 && max_arity < min_fa {
                target += (min_fa - max_arity) as usize;
                let budget = target.saturating_sub(q.len() + arena.len() + 1);
                max_arity = (max_fa as usize).min(budget) as u16;
            }
            let min_arity = min_fa.min(max_arity);

            let mut node = self
                .pset
                .sample_random_symbol(rng, min_arity, max_arity)
                .map_err(unreachable)?;
            init_leaf(&mut node, self.variables, rng);
            node.depth = child_depth;

            for _ in 0..node.arity {
                q.push_back(child_depth + 1);
            }
            arena.push(node);
        }

        // group by depth, then assign contiguous child ranges level by level
        arena.sort_by_key(|n| n.depth);
        let mut child_index = vec![0usize; arena.len()];
        let mut c = 1;
        for (i, node) in arena.iter().enumerate() {
            if node.is_leaf() {
                continue;
            }
            child_index[i] = c;
            c += node.arity as usize;
        }

        let mut tree = linearize(&arena, &child_index);
        tree.update_derived()?;
        Ok(tree)
    }
}

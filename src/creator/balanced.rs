//! Balanced tree creator.
//!
//! Regulates open argument slots against the remaining node budget: every
//! child is sampled as a function while budget remains, and as a leaf once
//! the budget is spent. The resulting tree length concentrates tightly at
//! the target.

use rand::Rng;

use super::{init_leaf, linearize, TreeCreator};
use crate::core::{Node, PrimitiveSet, Tree, Variable};
use crate::error::{Error, Result};

/// Creator producing trees with a near-uniform length distribution.
pub struct BalancedTreeCreator<'a> {
    pset: &'a PrimitiveSet,
    variables: &'a [Variable],
    irregularity_bias: f64,
}

impl<'a> BalancedTreeCreator<'a> {
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

    /// Per-child probability of forcing a leaf, encouraging irregular
    /// shapes. Clamped to `[0, 1]`; default 0.
    pub fn with_irregularity_bias(mut self, bias: f64) -> Self {
        self.irregularity_bias = bias.clamp(0.0, 1.0);
        self
    }
}

impl TreeCreator for BalancedTreeCreator<'_> {
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
            // leaf-only primitive set: every tree is a single leaf
            let mut leaf = self.pset.sample_random_symbol(rng, 0, 0).map_err(unreachable)?;
            init_leaf(&mut leaf, self.variables, rng);
            let mut tree = Tree::new(vec![leaf]);
            tree.update_derived()?;
            return Ok(tree);
        };

        // the smallest tree with a function root has min_fa + 1 nodes
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

        // work queue of (node, depth, first-child arena index)
        let mut arena: Vec<Node> = Vec::with_capacity(target);
        let mut depths: Vec<usize> = Vec::with_capacity(target);
        let mut child_index: Vec<usize> = Vec::with_capacity(target);
        let mut open_slots = root.arity as usize;
        arena.push(root);
        depths.push(1);
        child_index.push(0);

        let mut i = 0;
        while i < arena.len() {
            let arity = arena[i].arity as usize;
            let child_depth = depths[i] + 1;
            child_index[i] = arena.len();
            for _ in 0..arity {
                let force_leaf = child_depth >= max_depth
                    || (open_slots > arena.len() + 1 && rng.random_bool(self.irregularity_bias));
                let budget = target.saturating_sub(open_slots + 1);
                let max_arity = if force_leaf {
                    0
                } else {
                    (max_fa as usize).min(budget) as u16
                };
                let min_arity = if max_arity < min_fa { 0 } else { min_fa };

                let mut child = self
                    .pset
                    .sample_random_symbol(rng, min_arity, max_arity)
                    .map_err(unreachable)?;
                init_leaf(&mut child, self.variables, rng);
                open_slots += child.arity as usize;
                arena.push(child);
                depths.push(child_depth);
                child_index.push(0);
            }
            i += 1;
        }

        let mut tree = linearize(&arena, &child_index);
        tree.update_derived()?;
        Ok(tree)
    }
}

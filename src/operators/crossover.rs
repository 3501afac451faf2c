//! Subtree crossover.

use rand::Rng;

use crate::core::Tree;
use crate::error::Result;

/// Swaps a random subtree of one parent with a compatible subtree of the
/// other.
///
/// Cut points are biased toward internal nodes with probability
/// `internal_probability` (leaves carry little material). The donor
/// subtree is constrained so the offspring respects `max_length` and
/// `max_depth`; when no donor site qualifies, the first parent is cloned.
pub struct SubtreeCrossover {
    internal_probability: f64,
    max_depth: usize,
    max_length: usize,
}

impl SubtreeCrossover {
    pub fn new(internal_probability: f64, max_depth: usize, max_length: usize) -> Self {
        Self {
            internal_probability: internal_probability.clamp(0.0, 1.0),
            max_depth,
            max_length,
        }
    }

    /// Picks from `candidates`, preferring internal nodes.
    fn choose_cut<R: Rng>(&self, rng: &mut R, candidates: &[usize], tree: &Tree) -> Option<usize> {
        if candidates.is_empty() {
            return None;
        }
        let internal: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&i| !tree.nodes()[i].is_leaf())
            .collect();
        let pool = if !internal.is_empty() && rng.random_bool(self.internal_probability) {
            &internal
        } else {
            candidates
        };
        Some(pool[rng.random_range(0..pool.len())])
    }

    /// Produces one offspring from two parents.
    ///
    /// Requires both parents to have up-to-date derived fields.
    pub fn apply<R: Rng>(&self, rng: &mut R, parent1: &Tree, parent2: &Tree) -> Result<Tree> {
        let all: Vec<usize> = (0..parent1.len()).collect();
        let Some(cut) = self.choose_cut(rng, &all, parent1) else {
            return Ok(parent1.clone());
        };
        let cut_node = parent1.nodes()[cut];
        let removed = cut_node.length as usize + 1;
        let kept = parent1.len() - removed;
        let cut_level = cut_node.level as usize;

        // donor subtrees that keep the offspring within bounds
        let donors: Vec<usize> = (0..parent2.len())
            .filter(|&j| {
                let d = &parent2.nodes()[j];
                kept + d.length as usize + 1 <= self.max_length
                    && cut_level + d.depth as usize - 1 <= self.max_depth
            })
            .collect();
        let Some(donor) = self.choose_cut(rng, &donors, parent2) else {
            return Ok(parent1.clone());
        };

        let donor_node = parent2.nodes()[donor];
        let donor_start = donor - donor_node.length as usize;
        let cut_start = cut - cut_node.length as usize;

        let mut nodes = Vec::with_capacity(kept + donor_node.length as usize + 1);
        nodes.extend_from_slice(&parent1.nodes()[..cut_start]);
        nodes.extend_from_slice(&parent2.nodes()[donor_start..=donor]);
        nodes.extend_from_slice(&parent1.nodes()[cut + 1..]);

        let mut child = Tree::new(nodes);
        child.update_derived()?;
        Ok(child)
    }
}

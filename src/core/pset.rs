//! Primitive sets: the alphabet available to tree synthesis.
//!
//! Each node type carries a sampling frequency, an enabled flag, and an
//! arity window. Configurations are bit masks over [`NodeType`], so
//! enabling a family of primitives is a single integer op.

use rand::Rng;

use super::node::{Node, NodeType};
use crate::error::{Error, Result};

/// Per-type sampling configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Primitive {
    /// Sampling weight; a weight of zero removes the type from sampling
    /// without disabling it.
    pub frequency: usize,
    pub enabled: bool,
    pub min_arity: u16,
    pub max_arity: u16,
}

/// Catalog of allowed node types with sampling weights and arity windows.
#[derive(Debug, Clone)]
pub struct PrimitiveSet {
    table: [Primitive; NodeType::COUNT],
}

impl PrimitiveSet {
    /// Basic arithmetic plus leaves.
    pub const ARITHMETIC: u32 = NodeType::Add as u32
        | NodeType::Sub as u32
        | NodeType::Mul as u32
        | NodeType::Div as u32
        | NodeType::Constant as u32
        | NodeType::Variable as u32;

    /// Every node type.
    pub const FULL: u32 = (1 << NodeType::COUNT as u32) - 1;

    /// Creates a set with the arithmetic configuration.
    pub fn new() -> Self {
        Self::with_config(Self::ARITHMETIC)
    }

    /// Creates a set enabling exactly the types in `config`.
    pub fn with_config(config: u32) -> Self {
        let table = NodeType::ALL.map(|t| Primitive {
            frequency: 1,
            enabled: config & t as u32 != 0,
            min_arity: t.default_arity(),
            max_arity: t.default_arity(),
        });
        Self { table }
    }

    /// Re-applies an enabled mask, leaving frequencies and arities intact.
    pub fn set_config(&mut self, config: u32) {
        for t in NodeType::ALL {
            self.table[t.bit_index()].enabled = config & t as u32 != 0;
        }
    }

    /// The enabled mask.
    pub fn config(&self) -> u32 {
        NodeType::ALL
            .iter()
            .filter(|t| self.table[t.bit_index()].enabled)
            .fold(0, |mask, &t| mask | t as u32)
    }

    pub fn enable(&mut self, node_type: NodeType, enabled: bool) {
        self.table[node_type.bit_index()].enabled = enabled;
    }

    pub fn is_enabled(&self, node_type: NodeType) -> bool {
        self.table[node_type.bit_index()].enabled
    }

    pub fn set_frequency(&mut self, node_type: NodeType, frequency: usize) {
        self.table[node_type.bit_index()].frequency = frequency;
    }

    pub fn frequency(&self, node_type: NodeType) -> usize {
        self.table[node_type.bit_index()].frequency
    }

    /// Sets the arity window of an n-ary type.
    ///
    /// # Panics
    /// Panics if `min_arity > max_arity`.
    pub fn set_min_max_arity(&mut self, node_type: NodeType, min_arity: u16, max_arity: u16) {
        assert!(
            min_arity <= max_arity,
            "min_arity {min_arity} exceeds max_arity {max_arity}"
        );
        let primitive = &mut self.table[node_type.bit_index()];
        primitive.min_arity = min_arity;
        primitive.max_arity = max_arity;
    }

    pub fn primitive(&self, node_type: NodeType) -> &Primitive {
        &self.table[node_type.bit_index()]
    }

    /// Enabled types with a positive sampling weight.
    pub fn enabled_types(&self) -> impl Iterator<Item = NodeType> + '_ {
        NodeType::ALL.into_iter().filter(|t| {
            let p = &self.table[t.bit_index()];
            p.enabled && p.frequency > 0
        })
    }

    /// Tightest arity envelope over the enabled function types, or `None`
    /// if no function is enabled.
    pub fn function_arity_limits(&self) -> Option<(u16, u16)> {
        let mut limits = None;
        for t in self.enabled_types() {
            if t.is_leaf() {
                continue;
            }
            let p = self.primitive(t);
            limits = Some(match limits {
                None => (p.min_arity, p.max_arity),
                Some((lo, hi)) => (p.min_arity.min(lo), p.max_arity.max(hi)),
            });
        }
        limits
    }

    /// Samples an enabled symbol whose arity window intersects
    /// `[min_arity, max_arity]`, weighted by frequency, and instantiates a
    /// node with an arity drawn uniformly from the intersection.
    pub fn sample_random_symbol<R: Rng>(
        &self,
        rng: &mut R,
        min_arity: u16,
        max_arity: u16,
    ) -> Result<Node> {
        let candidates: Vec<(NodeType, u16, u16, usize)> = self
            .enabled_types()
            .filter_map(|t| {
                let p = self.primitive(t);
                let lo = p.min_arity.max(min_arity);
                let hi = p.max_arity.min(max_arity);
                (lo <= hi).then_some((t, lo, hi, p.frequency))
            })
            .collect();

        let total: usize = candidates.iter().map(|c| c.3).sum();
        if total == 0 {
            return Err(Error::NoSymbolAvailable {
                min_arity: min_arity as usize,
                max_arity: max_arity as usize,
            });
        }

        let mut u = rng.random_range(0..total);
        for (t, lo, hi, frequency) in candidates {
            if u < frequency {
                let mut node = Node::new(t);
                node.arity = if lo == hi { lo } else { rng.random_range(lo..=hi) };
                return Ok(node);
            }
            u -= frequency;
        }
        unreachable!("weighted draw is within the cumulative total")
    }
}

impl Default for PrimitiveSet {
    fn default() -> Self {
        Self::new()
    }
}

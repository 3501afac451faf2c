//! Point mutations.
//!
//! Each operator performs one small, layout-preserving edit in place and
//! is a no-op when the tree has no applicable node.

use rand::Rng;
use rand_distr::StandardNormal;

use crate::core::{NodeType, PrimitiveSet, Tree, Variable};
use crate::Scalar;

fn pick<R: Rng, F: Fn(&crate::core::Node) -> bool>(
    tree: &Tree,
    rng: &mut R,
    filter: F,
) -> Option<usize> {
    let candidates: Vec<usize> = tree
        .nodes()
        .iter()
        .enumerate()
        .filter(|(_, n)| filter(n))
        .map(|(i, _)| i)
        .collect();
    if candidates.is_empty() {
        None
    } else {
        Some(candidates[rng.random_range(0..candidates.len())])
    }
}

/// Perturbs one random leaf payload with standard-normal noise.
#[derive(Debug, Clone, Copy, Default)]
pub struct OnePointMutation;

impl OnePointMutation {
    pub fn apply<R: Rng>(&self, rng: &mut R, tree: &mut Tree) {
        if let Some(i) = pick(tree, rng, |n| n.is_leaf() && n.optimize) {
            let noise: Scalar = rng.sample(StandardNormal);
            tree.nodes_mut()[i].value += noise;
        }
    }
}

/// Rebinds one random variable leaf to another input column.
pub struct ChangeVariableMutation<'a> {
    variables: &'a [Variable],
}

impl<'a> ChangeVariableMutation<'a> {
    /// # Panics
    /// Panics if `variables` is empty.
    pub fn new(variables: &'a [Variable]) -> Self {
        assert!(!variables.is_empty(), "at least one input variable required");
        Self { variables }
    }

    pub fn apply<R: Rng>(&self, rng: &mut R, tree: &mut Tree) {
        if let Some(i) = pick(tree, rng, |n| n.node_type == NodeType::Variable) {
            let variable = &self.variables[rng.random_range(0..self.variables.len())];
            let node = &mut tree.nodes_mut()[i];
            node.hash_value = variable.hash;
            node.calculated_hash_value = variable.hash;
        }
    }
}

/// Replaces one random function node with another enabled symbol of the
/// same arity.
pub struct ChangeFunctionMutation<'a> {
    pset: &'a PrimitiveSet,
}

impl<'a> ChangeFunctionMutation<'a> {
    pub fn new(pset: &'a PrimitiveSet) -> Self {
        Self { pset }
    }

    pub fn apply<R: Rng>(&self, rng: &mut R, tree: &mut Tree) {
        if let Some(i) = pick(tree, rng, |n| !n.is_leaf()) {
            let arity = tree.nodes()[i].arity;
            if let Ok(replacement) = self.pset.sample_random_symbol(rng, arity, arity) {
                let node = &mut tree.nodes_mut()[i];
                node.node_type = replacement.node_type;
                node.hash_value = replacement.hash_value;
                node.calculated_hash_value = replacement.calculated_hash_value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Node;
    use crate::random::create_rng;

    fn variables() -> Vec<Variable> {
        (0..4).map(|i| Variable::new(format!("X{}", i + 1), i)).collect()
    }

    /// `x1 + 1`
    fn sample_tree(vars: &[Variable]) -> Tree {
        let mut add = Node::new(NodeType::Add);
        add.arity = 2;
        let mut t = Tree::new(vec![
            Node::variable(vars[0].hash, 1.0),
            Node::constant(1.0),
            add,
        ]);
        t.update_derived().unwrap();
        t
    }

    #[test]
    fn test_one_point_changes_a_payload() {
        let vars = variables();
        let mut tree = sample_tree(&vars);
        let before: Vec<f32> = tree.coefficients();
        let mut rng = create_rng(42);
        OnePointMutation.apply(&mut rng, &mut tree);
        assert_ne!(tree.coefficients(), before);
        tree.validate().unwrap();
    }

    #[test]
    fn test_change_variable_rebinds() {
        let vars = variables();
        let mut rng = create_rng(42);
        let mutation = ChangeVariableMutation::new(&vars[1..]);
        let mut tree = sample_tree(&vars);
        mutation.apply(&mut rng, &mut tree);
        let hash = tree.nodes()[0].calculated_hash_value;
        assert!(vars[1..].iter().any(|v| v.hash == hash));
        assert_ne!(hash, vars[0].hash);
    }

    #[test]
    fn test_change_function_preserves_arity() {
        let pset = PrimitiveSet::new();
        let vars = variables();
        let mutation = ChangeFunctionMutation::new(&pset);
        let mut rng = create_rng(42);
        for _ in 0..50 {
            let mut tree = sample_tree(&vars);
            mutation.apply(&mut rng, &mut tree);
            let root = tree.nodes().last().unwrap();
            assert_eq!(root.arity, 2);
            assert!(root.node_type.is_function());
            tree.validate().unwrap();
        }
    }

    #[test]
    fn test_noop_without_candidates() {
        let vars = variables();
        let mut rng = create_rng(42);
        // constant-only tree has no variable to rebind and no function
        let mut tree = Tree::new(vec![Node::constant(5.0)]);
        tree.update_derived().unwrap();
        ChangeVariableMutation::new(&vars).apply(&mut rng, &mut tree);
        ChangeFunctionMutation::new(&PrimitiveSet::new()).apply(&mut rng, &mut tree);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.nodes()[0].value, 5.0);
    }
}

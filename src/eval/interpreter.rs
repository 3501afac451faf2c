//! Stack-machine evaluation of postfix trees over dataset columns.
//!
//! The interpreter walks the node array in order, keeping one column buffer
//! per unconsumed subtree on a stack. A node of arity `a` folds the top `a`
//! buffers into one, so buffer lifetimes follow subtree lifetimes and spent
//! buffers are recycled through a free list.
//!
//! Function nodes dispatch through an immutable [`DispatchTable`] built at
//! construction; distinct interpreter instances can be used freely on
//! distinct threads, and a single instance may be shared (`&self` only).

use crate::core::{Dataset, NodeType, Range, Tree};
use crate::error::{Error, Result};
use crate::Scalar;

/// Numeric evaluation options.
#[derive(Debug, Clone, Copy)]
pub struct EvalOptions {
    /// When set (default), division returns `division_fallback` whenever
    /// the divisor magnitude is below `epsilon`.
    pub protected_division: bool,
    pub epsilon: Scalar,
    pub division_fallback: Scalar,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            protected_division: true,
            epsilon: Scalar::EPSILON,
            division_fallback: 0.0,
        }
    }
}

#[inline]
fn protected_div(x: Scalar, y: Scalar, options: &EvalOptions) -> Scalar {
    if options.protected_division && y.abs() < options.epsilon {
        options.division_fallback
    } else {
        x / y
    }
}

/// Element-wise handler for one function node type.
#[derive(Clone, Copy)]
enum Handler {
    /// Left fold over two or more children; `single` covers the
    /// single-argument form (negation for `sub`, inversion for `div`).
    Fold {
        fold: fn(&mut [Scalar], &[Scalar], &EvalOptions),
        single: fn(&mut [Scalar], &EvalOptions),
    },
    /// Exactly two children.
    Binary(fn(&mut [Scalar], &[Scalar])),
    /// Exactly one child, applied in place.
    Unary(fn(&mut [Scalar])),
}

/// Immutable table mapping node types to element-wise handlers.
///
/// The default table covers every function type; handlers can be removed
/// to restrict an interpreter to a subset of the primitive alphabet.
#[derive(Clone)]
pub struct DispatchTable {
    handlers: [Option<Handler>; NodeType::COUNT],
}

impl Default for DispatchTable {
    fn default() -> Self {
        let mut handlers: [Option<Handler>; NodeType::COUNT] = [None; NodeType::COUNT];

        let mut set = |t: NodeType, h: Handler| handlers[t.bit_index()] = Some(h);

        set(
            NodeType::Add,
            Handler::Fold {
                fold: |dst, src, _| {
                    for (d, s) in dst.iter_mut().zip(src) {
                        *d += s;
                    }
                },
                single: |_, _| {},
            },
        );
        set(
            NodeType::Sub,
            Handler::Fold {
                fold: |dst, src, _| {
                    for (d, s) in dst.iter_mut().zip(src) {
                        *d -= s;
                    }
                },
                single: |dst, _| {
                    for d in dst.iter_mut() {
                        *d = -*d;
                    }
                },
            },
        );
        set(
            NodeType::Mul,
            Handler::Fold {
                fold: |dst, src, _| {
                    for (d, s) in dst.iter_mut().zip(src) {
                        *d *= s;
                    }
                },
                single: |_, _| {},
            },
        );
        set(
            NodeType::Div,
            Handler::Fold {
                fold: |dst, src, options| {
                    for (d, s) in dst.iter_mut().zip(src) {
                        *d = protected_div(*d, *s, options);
                    }
                },
                single: |dst, options| {
                    for d in dst.iter_mut() {
                        *d = protected_div(1.0, *d, options);
                    }
                },
            },
        );
        set(
            NodeType::Aq,
            Handler::Binary(|dst, src| {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d /= (1.0 + s * s).sqrt();
                }
            }),
        );
        set(
            NodeType::Pow,
            Handler::Binary(|dst, src| {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d = d.powf(*s);
                }
            }),
        );
        set(NodeType::Exp, Handler::Unary(|dst| dst.iter_mut().for_each(|d| *d = d.exp())));
        set(NodeType::Log, Handler::Unary(|dst| dst.iter_mut().for_each(|d| *d = d.ln())));
        set(NodeType::Sin, Handler::Unary(|dst| dst.iter_mut().for_each(|d| *d = d.sin())));
        set(NodeType::Cos, Handler::Unary(|dst| dst.iter_mut().for_each(|d| *d = d.cos())));
        set(NodeType::Tan, Handler::Unary(|dst| dst.iter_mut().for_each(|d| *d = d.tan())));
        set(NodeType::Sqrt, Handler::Unary(|dst| dst.iter_mut().for_each(|d| *d = d.sqrt())));
        set(NodeType::Cbrt, Handler::Unary(|dst| dst.iter_mut().for_each(|d| *d = d.cbrt())));
        set(NodeType::Square, Handler::Unary(|dst| dst.iter_mut().for_each(|d| *d = *d * *d)));

        Self { handlers }
    }
}

impl DispatchTable {
    /// Removes the handler for a node type.
    pub fn unregister(&mut self, node_type: NodeType) {
        self.handlers[node_type.bit_index()] = None;
    }

    fn get(&self, node_type: NodeType) -> Option<Handler> {
        self.handlers[node_type.bit_index()]
    }
}

/// Evaluates trees over a dataset row range.
#[derive(Clone, Default)]
pub struct Interpreter {
    table: DispatchTable,
    options: EvalOptions,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EvalOptions) -> Self {
        Self {
            table: DispatchTable::default(),
            options,
        }
    }

    pub fn with_table(table: DispatchTable, options: EvalOptions) -> Self {
        Self { table, options }
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    /// Evaluates `tree` over `range`, returning one prediction per row.
    pub fn evaluate(&self, tree: &Tree, dataset: &Dataset, range: Range) -> Result<Vec<Scalar>> {
        let mut out = Vec::new();
        self.evaluate_into(tree, dataset, range, &mut out)?;
        Ok(out)
    }

    /// Evaluates into a caller-provided buffer.
    ///
    /// Returns `true` when every prediction is finite; non-finite outputs
    /// are not errors and are left for the metric to judge.
    pub fn evaluate_into(
        &self,
        tree: &Tree,
        dataset: &Dataset,
        range: Range,
        out: &mut Vec<Scalar>,
    ) -> Result<bool> {
        assert!(range.end() <= dataset.nrows(), "range exceeds row count");
        let n = range.size();

        let mut stack: Vec<Vec<Scalar>> = Vec::new();
        let mut free: Vec<Vec<Scalar>> = Vec::new();
        let alloc = |free: &mut Vec<Vec<Scalar>>, fill: Scalar| {
            let mut buffer = free.pop().unwrap_or_default();
            buffer.clear();
            buffer.resize(n, fill);
            buffer
        };

        for (i, node) in tree.nodes().iter().enumerate() {
            match node.node_type {
                NodeType::Constant => {
                    stack.push(alloc(&mut free, node.value));
                }
                NodeType::Variable => {
                    let column = dataset
                        .values_by_hash(node.calculated_hash_value)
                        .ok_or_else(|| {
                            Error::InvalidTree(format!("node {i}: variable not bound in dataset"))
                        })?;
                    let mut buffer = alloc(&mut free, 0.0);
                    for (dst, src) in buffer
                        .iter_mut()
                        .zip(column.iter().skip(range.start()).take(n))
                    {
                        *dst = src * node.value;
                    }
                    stack.push(buffer);
                }
                t => {
                    let handler = self
                        .table
                        .get(t)
                        .ok_or(Error::InvalidNodeType(t.name()))?;
                    let arity = node.arity as usize;
                    if stack.len() < arity || arity == 0 {
                        return Err(Error::InvalidTree(format!(
                            "node {i}: arity {arity} with {} operands available",
                            stack.len()
                        )));
                    }
                    match handler {
                        Handler::Unary(f) => {
                            if arity != 1 {
                                return Err(Error::InvalidTree(format!(
                                    "node {i}: {t} requires arity 1, got {arity}"
                                )));
                            }
                            f(stack.last_mut().expect("stack checked non-empty"));
                        }
                        Handler::Binary(f) => {
                            if arity != 2 {
                                return Err(Error::InvalidTree(format!(
                                    "node {i}: {t} requires arity 2, got {arity}"
                                )));
                            }
                            let src = stack.pop().expect("stack checked non-empty");
                            f(stack.last_mut().expect("stack checked non-empty"), &src);
                            free.push(src);
                        }
                        Handler::Fold { fold, single } => {
                            if arity == 1 {
                                single(
                                    stack.last_mut().expect("stack checked non-empty"),
                                    &self.options,
                                );
                            } else {
                                let base = stack.len() - arity;
                                for k in 1..arity {
                                    let (head, tail) = stack.split_at_mut(base + k);
                                    fold(&mut head[base], &tail[0], &self.options);
                                }
                                for _ in 1..arity {
                                    free.push(stack.pop().expect("stack holds folded operands"));
                                }
                            }
                        }
                    }
                }
            }
        }

        if stack.len() != 1 {
            return Err(Error::InvalidTree(format!(
                "{} roots left on the stack after evaluation",
                stack.len()
            )));
        }
        let result = stack.pop().expect("single root buffer");
        let finite = result.iter().all(|v| v.is_finite());
        *out = result;
        Ok(finite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Node;

    fn dataset() -> Dataset {
        // rows: (1, 2), (3, 4)
        Dataset::from_columns(vec![vec![1.0, 3.0], vec![2.0, 4.0]])
    }

    fn var(ds: &Dataset, name: &str, coefficient: Scalar) -> Node {
        Node::variable(ds.variable(name).unwrap().hash, coefficient)
    }

    fn function(t: NodeType, arity: u16) -> Node {
        let mut n = Node::new(t);
        n.arity = arity;
        n
    }

    fn eval(tree: &mut Tree, ds: &Dataset) -> Vec<Scalar> {
        tree.update_derived().unwrap();
        Interpreter::new()
            .evaluate(tree, ds, Range::new(0, ds.nrows()))
            .unwrap()
    }

    #[test]
    fn test_linear_combination() {
        // ((x1 + x2) * 2) over rows (1,2), (3,4) -> 6, 14
        let ds = dataset();
        let mut tree = Tree::new(vec![
            var(&ds, "X1", 1.0),
            var(&ds, "X2", 1.0),
            function(NodeType::Add, 2),
            Node::constant(2.0),
            function(NodeType::Mul, 2),
        ]);
        assert_eq!(eval(&mut tree, &ds), vec![6.0, 14.0]);
    }

    #[test]
    fn test_constant_broadcast() {
        let ds = dataset();
        let mut tree = Tree::new(vec![Node::constant(3.5)]);
        assert_eq!(eval(&mut tree, &ds), vec![3.5, 3.5]);
    }

    #[test]
    fn test_variable_coefficient() {
        let ds = dataset();
        let mut tree = Tree::new(vec![var(&ds, "X1", -2.0)]);
        assert_eq!(eval(&mut tree, &ds), vec![-2.0, -6.0]);
    }

    #[test]
    fn test_nary_add() {
        let ds = dataset();
        let mut tree = Tree::new(vec![
            var(&ds, "X1", 1.0),
            var(&ds, "X2", 1.0),
            Node::constant(10.0),
            function(NodeType::Add, 3),
        ]);
        assert_eq!(eval(&mut tree, &ds), vec![13.0, 17.0]);
    }

    #[test]
    fn test_unary_sub_negates() {
        let ds = dataset();
        let mut tree = Tree::new(vec![var(&ds, "X1", 1.0), function(NodeType::Sub, 1)]);
        assert_eq!(eval(&mut tree, &ds), vec![-1.0, -3.0]);
    }

    #[test]
    fn test_subtraction_order() {
        let ds = dataset();
        // x1 - x2
        let mut tree = Tree::new(vec![
            var(&ds, "X1", 1.0),
            var(&ds, "X2", 1.0),
            function(NodeType::Sub, 2),
        ]);
        assert_eq!(eval(&mut tree, &ds), vec![-1.0, -1.0]);
    }

    #[test]
    fn test_protected_division() {
        let ds = dataset();
        // x1 / 0 -> fallback 0
        let mut tree = Tree::new(vec![
            var(&ds, "X1", 1.0),
            Node::constant(0.0),
            function(NodeType::Div, 2),
        ]);
        assert_eq!(eval(&mut tree, &ds), vec![0.0, 0.0]);
    }

    #[test]
    fn test_unprotected_division_yields_infinity() {
        let ds = dataset();
        let mut tree = Tree::new(vec![
            var(&ds, "X1", 1.0),
            Node::constant(0.0),
            function(NodeType::Div, 2),
        ]);
        tree.update_derived().unwrap();
        let interpreter = Interpreter::with_options(EvalOptions {
            protected_division: false,
            ..EvalOptions::default()
        });
        let mut out = Vec::new();
        let finite = interpreter
            .evaluate_into(&tree, &ds, Range::new(0, 2), &mut out)
            .unwrap();
        assert!(!finite);
        assert!(out.iter().all(|v| v.is_infinite()));
    }

    #[test]
    fn test_division_inverse() {
        let ds = dataset();
        // div with a single argument is inversion
        let mut tree = Tree::new(vec![var(&ds, "X2", 1.0), function(NodeType::Div, 1)]);
        assert_eq!(eval(&mut tree, &ds), vec![0.5, 0.25]);
    }

    #[test]
    fn test_pow_and_square() {
        let ds = dataset();
        let mut pow = Tree::new(vec![
            var(&ds, "X1", 1.0),
            Node::constant(2.0),
            function(NodeType::Pow, 2),
        ]);
        let mut square = Tree::new(vec![var(&ds, "X1", 1.0), function(NodeType::Square, 1)]);
        assert_eq!(eval(&mut pow, &ds), eval(&mut square, &ds));
    }

    #[test]
    fn test_aq() {
        let ds = dataset();
        // aq(x1, x2) = x1 / sqrt(1 + x2^2)
        let mut tree = Tree::new(vec![
            var(&ds, "X1", 1.0),
            var(&ds, "X2", 1.0),
            function(NodeType::Aq, 2),
        ]);
        let out = eval(&mut tree, &ds);
        let expected = [1.0 / 5.0f32.sqrt(), 3.0 / 17.0f32.sqrt()];
        for (o, e) in out.iter().zip(expected.iter()) {
            assert!((o - e).abs() < 1e-6);
        }
    }

    #[test]
    fn test_log_of_negative_reports_non_finite() {
        let ds = dataset();
        let mut tree = Tree::new(vec![var(&ds, "X1", -1.0), function(NodeType::Log, 1)]);
        tree.update_derived().unwrap();
        let mut out = Vec::new();
        let finite = Interpreter::new()
            .evaluate_into(&tree, &ds, Range::new(0, 2), &mut out)
            .unwrap();
        assert!(!finite);
    }

    #[test]
    fn test_subrange() {
        let ds = Dataset::from_columns(vec![vec![1.0, 2.0, 3.0, 4.0, 5.0]]);
        let mut tree = Tree::new(vec![Node::variable(ds.variable("X1").unwrap().hash, 1.0)]);
        tree.update_derived().unwrap();
        let out = Interpreter::new()
            .evaluate(&tree, &ds, Range::new(1, 4))
            .unwrap();
        assert_eq!(out, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_missing_handler_fails() {
        let ds = dataset();
        let mut tree = Tree::new(vec![var(&ds, "X1", 1.0), function(NodeType::Sin, 1)]);
        tree.update_derived().unwrap();
        let mut table = DispatchTable::default();
        table.unregister(NodeType::Sin);
        let interpreter = Interpreter::with_table(table, EvalOptions::default());
        assert!(matches!(
            interpreter.evaluate(&tree, &ds, Range::new(0, 2)),
            Err(Error::InvalidNodeType("sin"))
        ));
    }

    #[test]
    fn test_malformed_tree_fails() {
        let ds = dataset();
        // binary add with a single operand available
        let tree = Tree::new(vec![var(&ds, "X1", 1.0), function(NodeType::Add, 2)]);
        assert!(matches!(
            Interpreter::new().evaluate(&tree, &ds, Range::new(0, 2)),
            Err(Error::InvalidTree(_))
        ));
    }

    #[test]
    fn test_interpreter_is_share_safe() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Interpreter>();
        assert_send_sync::<DispatchTable>();
    }

    #[test]
    fn test_unbound_variable_fails() {
        let ds = dataset();
        let tree = Tree::new(vec![Node::variable(0xdead, 1.0)]);
        assert!(matches!(
            Interpreter::new().evaluate(&tree, &ds, Range::new(0, 2)),
            Err(Error::InvalidTree(_))
        ));
    }
}

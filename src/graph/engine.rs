use super::node::{Node, NodeId};
use super::op::{Op, Operand};
use super::value::Value;
use crate::error::{EngineError, Result};
use log::{debug, trace};
use std::cell::RefCell;
use std::collections::HashSet;

/// Marks the arena length at some point so later nodes can be dropped with
/// [`Engine::rewind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

/// Main computational graph engine.
///
/// Nodes live in an append-only arena and are addressed by [`NodeId`]. Every
/// operation appends exactly one result node whose operands already exist, so
/// the graph is a DAG by construction. The arena sits behind a `RefCell` so
/// that [`Value`] handles can share `&Engine` while building expressions.
#[derive(Debug, Default)]
pub struct Engine {
    nodes: RefCell<Vec<Node>>,
}

impl Engine {
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(Vec::new()),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: RefCell::new(Vec::with_capacity(capacity)),
        }
    }

    // Creates a new leaf node in the computational graph
    pub fn create_variable(&self, value: f64) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        let id = NodeId(nodes.len());
        nodes.push(Node::new_leaf(id, value));
        trace!("created leaf {} = {}", id, value);
        id
    }

    /// Creates a leaf and returns an operator-friendly handle to it.
    pub fn value(&self, value: f64) -> Value<'_> {
        let id = self.create_variable(value);
        Value::new(self, id)
    }

    /// Wraps an existing node id into a handle.
    pub fn handle(&self, id: NodeId) -> Result<Value<'_>> {
        self.check_node(id)?;
        Ok(Value::new(self, id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        id.0 < self.nodes.borrow().len()
    }

    fn check_node(&self, id: NodeId) -> Result<()> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(EngineError::NodeNotFound(id))
        }
    }

    // Node operands are validated before any scalar gets wrapped, so a failing
    // call never leaves stray leaves behind.
    fn resolve_all(&self, operands: &[Operand]) -> Result<Vec<NodeId>> {
        for operand in operands {
            if let Operand::Node(id) = operand {
                self.check_node(*id)?;
            }
        }

        Ok(operands.iter().map(|&operand| self.coerce(operand)).collect())
    }

    fn coerce(&self, operand: Operand) -> NodeId {
        match operand {
            Operand::Node(id) => id,
            Operand::Scalar(value) => self.create_variable(value),
        }
    }

    /// Appends the result of `op` over existing nodes.
    pub fn apply_operation(&self, op: Op, input_ids: Vec<NodeId>) -> Result<NodeId> {
        for &input_id in &input_ids {
            self.check_node(input_id)?;
        }

        let mut nodes = self.nodes.borrow_mut();
        let inputs: Vec<f64> = input_ids.iter().map(|id| nodes[id.0].value).collect();
        let value = op.compute(&inputs)?;

        let id = NodeId(nodes.len());
        trace!("appending {} = {:?}{:?} -> {}", id, op, input_ids, value);
        nodes.push(Node::new_evaluated(id, value, op, input_ids));
        Ok(id)
    }

    fn binary(&self, op: Op, a: Operand, b: Operand) -> Result<NodeId> {
        let ids = self.resolve_all(&[a, b])?;
        self.apply_operation(op, ids)
    }

    fn unary(&self, op: Op, a: Operand) -> Result<NodeId> {
        let ids = self.resolve_all(&[a])?;
        self.apply_operation(op, ids)
    }

    pub fn add(&self, a: impl Into<Operand>, b: impl Into<Operand>) -> Result<NodeId> {
        self.binary(Op::Add, a.into(), b.into())
    }

    pub fn mul(&self, a: impl Into<Operand>, b: impl Into<Operand>) -> Result<NodeId> {
        self.binary(Op::Mul, a.into(), b.into())
    }

    /// `base ** exponent`. The exponent must be a constant; a node exponent is
    /// rejected with [`EngineError::InvalidOperand`].
    pub fn pow(&self, base: impl Into<Operand>, exponent: impl Into<Operand>) -> Result<NodeId> {
        let exponent = match exponent.into() {
            Operand::Scalar(exponent) => exponent,
            Operand::Node(id) => {
                return Err(EngineError::InvalidOperand(format!(
                    "exponent must be a constant number, got node {}",
                    id
                )));
            }
        };
        self.unary(Op::Pow(exponent), base.into())
    }

    pub fn neg(&self, a: impl Into<Operand>) -> Result<NodeId> {
        self.mul(a, -1.0)
    }

    pub fn sub(&self, a: impl Into<Operand>, b: impl Into<Operand>) -> Result<NodeId> {
        let a = a.into();
        let b = b.into();
        // Check `a` before `-b` is appended.
        if let Operand::Node(id) = a {
            self.check_node(id)?;
        }
        let negated = self.neg(b)?;
        self.add(a, negated)
    }

    pub fn div(&self, a: impl Into<Operand>, b: impl Into<Operand>) -> Result<NodeId> {
        let a = a.into();
        let b = b.into();
        if let Operand::Node(id) = a {
            self.check_node(id)?;
        }
        let reciprocal = self.pow(b, -1.0)?;
        self.mul(a, reciprocal)
    }

    pub fn relu(&self, a: impl Into<Operand>) -> Result<NodeId> {
        self.unary(Op::Relu, a.into())
    }

    pub fn exp(&self, a: impl Into<Operand>) -> Result<NodeId> {
        self.unary(Op::Exp, a.into())
    }

    /// Left fold of `add` over `terms`, starting from `start`.
    pub fn sum<I>(&self, start: impl Into<Operand>, terms: I) -> Result<NodeId>
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        let start = start.into();
        if let Operand::Node(id) = start {
            self.check_node(id)?;
        }
        let mut acc = self.coerce(start);
        for term in terms {
            acc = self.add(acc, term)?;
        }
        Ok(acc)
    }

    pub fn get_node(&self, node_id: NodeId) -> Option<Node> {
        self.nodes.borrow().get(node_id.0).cloned()
    }

    pub fn get_value(&self, node_id: NodeId) -> Option<f64> {
        self.nodes.borrow().get(node_id.0).map(|node| node.value)
    }

    pub fn get_gradient(&self, node_id: NodeId) -> Option<f64> {
        self.nodes.borrow().get(node_id.0).map(|node| node.grad)
    }

    pub fn get_op(&self, node_id: NodeId) -> Option<Op> {
        self.nodes.borrow().get(node_id.0).map(|node| node.op)
    }

    pub fn get_predecessors(&self, node_id: NodeId) -> Option<Vec<NodeId>> {
        self.nodes.borrow().get(node_id.0).map(|node| node.predecessors())
    }

    pub fn set_gradient(&self, node_id: NodeId, grad: f64) -> Result<()> {
        let mut nodes = self.nodes.borrow_mut();
        let node = nodes
            .get_mut(node_id.0)
            .ok_or(EngineError::NodeNotFound(node_id))?;
        node.grad = grad;
        Ok(())
    }

    /// Fails unless `node_id` is a leaf that no node consumes yet.
    pub fn check_writable(&self, node_id: NodeId) -> Result<()> {
        let nodes = self.nodes.borrow();
        let node = nodes
            .get(node_id.0)
            .ok_or(EngineError::NodeNotFound(node_id))?;
        if !node.is_leaf() {
            return Err(EngineError::InvalidOperand(format!(
                "cannot overwrite the value of computed node {}",
                node_id
            )));
        }

        // Consumers always sit after their operands in the arena.
        if let Some(consumer) = nodes[node_id.0 + 1..]
            .iter()
            .find(|node| node.inputs.contains(&node_id))
        {
            return Err(EngineError::InvalidOperand(format!(
                "cannot overwrite leaf {} while {} depends on it, rewind first",
                node_id, consumer.id
            )));
        }
        Ok(())
    }

    /// Overwrites the value of a leaf that nothing has consumed yet. Built
    /// nodes are immutable apart from their gradients.
    pub fn set_value(&self, node_id: NodeId, value: f64) -> Result<()> {
        self.check_writable(node_id)?;
        self.nodes.borrow_mut()[node_id.0].value = value;
        Ok(())
    }

    /// Every node reachable from `root`, each exactly once, predecessors
    /// first.
    pub fn topological_order(&self, root: NodeId) -> Result<Vec<NodeId>> {
        self.find_topo_sort(&[root])
    }

    /// Topological order of the union of the ancestries of `roots`.
    pub fn find_topo_sort(&self, roots: &[NodeId]) -> Result<Vec<NodeId>> {
        for &root in roots {
            self.check_node(root)?;
        }

        let nodes = self.nodes.borrow();
        let mut visited = HashSet::new();
        let mut topo_order = Vec::new();
        // Iterative post-order DFS; long sums would blow the call stack.
        let mut stack = Vec::new();

        for &root in roots {
            stack.push((root, false));
            while let Some((node_id, expanded)) = stack.pop() {
                if expanded {
                    topo_order.push(node_id);
                    continue;
                }
                if !visited.insert(node_id) {
                    continue;
                }
                stack.push((node_id, true));
                for input_id in nodes[node_id.0].predecessors().into_iter().rev() {
                    if !visited.contains(&input_id) {
                        stack.push((input_id, false));
                    }
                }
            }
        }

        Ok(topo_order)
    }

    /// Seeds `root` with gradient 1 and runs every local gradient rule in
    /// reverse topological order.
    pub fn backward(&self, root: NodeId) -> Result<()> {
        let topo_order = self.topological_order(root)?;
        self.set_gradient(root, 1.0)?;

        for &node_id in topo_order.iter().rev() {
            self.backward_node(node_id);
        }

        debug!(
            "backward from {} visited {} nodes",
            root,
            topo_order.len()
        );
        Ok(())
    }

    fn backward_node(&self, node_id: NodeId) {
        let mut nodes = self.nodes.borrow_mut();

        let (op, grad_output, output, input_ids) = {
            let node = &nodes[node_id.0];
            if node.is_leaf() {
                return;
            }
            (node.op, node.grad, node.value, node.inputs.clone())
        };

        let inputs: Vec<f64> = input_ids.iter().map(|id| nodes[id.0].value).collect();
        let input_grads = op.gradient(grad_output, &inputs, output);

        // Accumulate, duplicated operands receive one contribution each.
        for (input_id, input_grad) in input_ids.iter().zip(input_grads) {
            nodes[input_id.0].grad += input_grad;
        }
    }

    /// Resets every gradient in the arena to zero.
    pub fn zero_gradients(&self) {
        for node in self.nodes.borrow_mut().iter_mut() {
            node.grad = 0.0;
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.num_nodes())
    }

    /// Drops every node appended after `checkpoint`. Ids of dropped nodes must
    /// not be used afterwards; taking `&mut self` guarantees no [`Value`]
    /// handle outlives this call.
    pub fn rewind(&mut self, checkpoint: Checkpoint) {
        let nodes = self.nodes.get_mut();
        if checkpoint.0 < nodes.len() {
            debug!("rewinding arena from {} to {} nodes", nodes.len(), checkpoint.0);
            nodes.truncate(checkpoint.0);
        }
    }

    /// GRAPH STATISTICS
    pub fn num_nodes(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn num_leaves(&self) -> usize {
        self.nodes.borrow().iter().filter(|node| node.is_leaf()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }
}

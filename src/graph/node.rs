use super::op::Op;

/// Index of a node inside its engine's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Computational graph node.
///
/// `inputs` keeps the operands in call order, duplicates included, so that
/// `x * x` routes both gradient contributions back into `x`.
/// [`Node::predecessors`] gives the deduplicated set view.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub value: f64,
    pub grad: f64,
    pub op: Op,
    pub inputs: Vec<NodeId>,
}

impl Node {
    pub fn new_leaf(id: NodeId, value: f64) -> Self {
        Self {
            id,
            value,
            grad: 0.0,
            op: Op::Leaf,
            inputs: Vec::new(),
        }
    }

    pub fn new_evaluated(id: NodeId, value: f64, op: Op, inputs: Vec<NodeId>) -> Self {
        Self {
            id,
            value,
            grad: 0.0,
            op,
            inputs,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.op, Op::Leaf)
    }

    /// Distinct operands, in first-seen order.
    pub fn predecessors(&self) -> Vec<NodeId> {
        let mut seen = Vec::with_capacity(self.inputs.len());
        for &input in &self.inputs {
            if !seen.contains(&input) {
                seen.push(input);
            }
        }
        seen
    }

    /// Operator tag, empty for leaves.
    pub fn tag(&self) -> String {
        self.op.tag()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_defaults() {
        let node = Node::new_leaf(NodeId(0), 3.5);
        assert!(node.is_leaf());
        assert_eq!(node.grad, 0.0);
        assert!(node.predecessors().is_empty());
        assert_eq!(node.tag(), "");
    }

    #[test]
    fn test_predecessors_are_a_set() {
        let node = Node::new_evaluated(NodeId(1), 4.0, Op::Add, vec![NodeId(0), NodeId(0)]);
        assert_eq!(node.inputs.len(), 2);
        assert_eq!(node.predecessors(), vec![NodeId(0)]);
    }

    #[test]
    fn test_node_id_display() {
        assert_eq!(format!("{}", NodeId(7)), "NodeId(7)");
        assert_eq!(NodeId(7).index(), 7);
    }
}

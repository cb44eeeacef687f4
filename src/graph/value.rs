// value.rs
// Copyable handle over a node of an `Engine`, so expressions can be written
// with ordinary operators: `(a * b + c).relu()`.
use super::engine::Engine;
use super::node::NodeId;
use super::op::{Op, Operand};
use crate::error::Result;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A node of an [`Engine`] together with the engine it lives in.
///
/// The operator impls (`+ - * /` and unary `-`) accept `Value` or `f64` on
/// either side. They panic if the two handles come from different engines,
/// since ids of one arena mean nothing in another.
#[derive(Clone, Copy)]
pub struct Value<'g> {
    engine: &'g Engine,
    id: NodeId,
}

impl<'g> Value<'g> {
    pub(crate) fn new(engine: &'g Engine, id: NodeId) -> Self {
        Self { engine, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn engine(&self) -> &'g Engine {
        self.engine
    }

    /// Forward value.
    pub fn data(&self) -> f64 {
        self.engine.get_value(self.id).unwrap_or(f64::NAN)
    }

    /// Accumulated gradient.
    pub fn grad(&self) -> f64 {
        self.engine.get_gradient(self.id).unwrap_or(f64::NAN)
    }

    pub fn op(&self) -> Op {
        self.engine.get_op(self.id).unwrap_or(Op::Leaf)
    }

    pub fn tag(&self) -> String {
        self.op().tag()
    }

    pub fn predecessors(&self) -> Vec<Value<'g>> {
        self.engine
            .get_predecessors(self.id)
            .unwrap_or_default()
            .into_iter()
            .map(|id| Value::new(self.engine, id))
            .collect()
    }

    /// `self ** exponent`. Fails with `InvalidOperand` when the exponent is a
    /// node rather than a number.
    pub fn pow(&self, exponent: impl Into<Operand>) -> Result<Value<'g>> {
        let id = self.engine.pow(self.id, exponent)?;
        Ok(Value::new(self.engine, id))
    }

    /// `self ** exponent` for a numeric exponent, which cannot fail.
    pub fn powf(&self, exponent: f64) -> Value<'g> {
        self.lift(self.engine.pow(self.id, exponent))
    }

    pub fn relu(&self) -> Value<'g> {
        self.lift(self.engine.relu(self.id))
    }

    pub fn exp(&self) -> Value<'g> {
        self.lift(self.engine.exp(self.id))
    }

    /// Runs the backward pass with this node as the output.
    pub fn backward(&self) {
        // The handle borrows the engine, so the id cannot have been rewound.
        if let Err(e) = self.engine.backward(self.id) {
            panic!("backward on a dangling handle: {}", e);
        }
    }

    /// Topological order of this node's ancestry, as handles.
    pub fn topological_order(&self) -> Vec<Value<'g>> {
        self.engine
            .topological_order(self.id)
            .unwrap_or_default()
            .into_iter()
            .map(|id| Value::new(self.engine, id))
            .collect()
    }

    fn same_engine(&self, other: &Value<'_>) {
        assert!(
            std::ptr::eq(self.engine, other.engine),
            "cannot combine values from different engines"
        );
    }

    fn lift(&self, result: Result<NodeId>) -> Value<'g> {
        match result {
            Ok(id) => Value::new(self.engine, id),
            // Only reachable with ids foreign to this engine.
            Err(e) => panic!("{}", e),
        }
    }
}

impl std::fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Value")
            .field("id", &self.id)
            .field("data", &self.data())
            .field("grad", &self.grad())
            .field("op", &self.op())
            .finish()
    }
}

impl std::fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Value(data={}, grad={})", self.data(), self.grad())
    }
}

// Value (op) Value, Value (op) f64 and f64 (op) Value for a binary engine method.
// Reversed forms call the engine with the operands in their written order, so
// `2.0 - a` is `2 + (-a)` and `2.0 / a` is `2 * a**-1`.
macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $engine_fn:ident) => {
        impl<'g> $trait<Value<'g>> for Value<'g> {
            type Output = Value<'g>;

            fn $method(self, rhs: Value<'g>) -> Value<'g> {
                self.same_engine(&rhs);
                self.lift(self.engine.$engine_fn(self.id, rhs.id))
            }
        }

        impl<'g> $trait<f64> for Value<'g> {
            type Output = Value<'g>;

            fn $method(self, rhs: f64) -> Value<'g> {
                self.lift(self.engine.$engine_fn(self.id, rhs))
            }
        }

        impl<'g> $trait<Value<'g>> for f64 {
            type Output = Value<'g>;

            fn $method(self, rhs: Value<'g>) -> Value<'g> {
                rhs.lift(rhs.engine.$engine_fn(self, rhs.id))
            }
        }

        impl<'g> $trait<&Value<'g>> for &Value<'g> {
            type Output = Value<'g>;

            fn $method(self, rhs: &Value<'g>) -> Value<'g> {
                (*self).$method(*rhs)
            }
        }
    };
}

impl_binary_op!(Add, add, add);
impl_binary_op!(Sub, sub, sub);
impl_binary_op!(Mul, mul, mul);
impl_binary_op!(Div, div, div);

impl<'g> Neg for Value<'g> {
    type Output = Value<'g>;

    fn neg(self) -> Value<'g> {
        self.lift(self.engine.neg(self.id))
    }
}

impl<'g> Neg for &Value<'g> {
    type Output = Value<'g>;

    fn neg(self) -> Value<'g> {
        -(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_display_matches_repr() {
        let engine = Engine::new();
        let a = engine.value(2.0);
        assert_eq!(format!("{}", a), "Value(data=2, grad=0)");
    }

    #[test]
    fn test_reversed_operands() {
        let engine = Engine::new();
        let a = engine.value(4.0);

        let r_sub = 10.0 - a;
        assert_abs_diff_eq!(r_sub.data(), 6.0);
        r_sub.backward();
        assert_abs_diff_eq!(a.grad(), -1.0);

        engine.zero_gradients();
        let r_div = 2.0 / a;
        assert_abs_diff_eq!(r_div.data(), 0.5);
        r_div.backward();
        // d(2/a)/da = -2 / a^2
        assert_abs_diff_eq!(a.grad(), -0.125);
    }

    #[test]
    fn test_multiplication_is_symmetric() {
        let engine = Engine::new();
        let a = engine.value(3.0);
        let left = a * 2.0;
        let right = 2.0 * a;
        assert_eq!(left.data(), right.data());
        assert_eq!(left.op(), right.op());

        left.backward();
        let from_left = a.grad();
        engine.zero_gradients();
        right.backward();
        assert_eq!(a.grad(), from_left);
        assert_eq!(a.grad(), 2.0);
    }

    #[test]
    fn test_reference_operators() {
        let engine = Engine::new();
        let a = engine.value(1.5);
        let b = engine.value(-0.5);
        assert_abs_diff_eq!((&a + &b).data(), 1.0);
        assert_abs_diff_eq!((&a * &b).data(), -0.75);
        assert_abs_diff_eq!((-&a).data(), -1.5);
    }

    #[test]
    fn test_pow_rejects_node_exponent() {
        let engine = Engine::new();
        let a = engine.value(2.0);
        let b = engine.value(3.0);
        let before = engine.num_nodes();
        assert!(a.pow(b).is_err());
        assert_eq!(engine.num_nodes(), before);
        assert_abs_diff_eq!(a.pow(3).unwrap().data(), 8.0);
    }

    #[test]
    #[should_panic(expected = "different engines")]
    fn test_mixing_engines_panics() {
        let first = Engine::new();
        let second = Engine::new();
        let a = first.value(1.0);
        let b = second.value(2.0);
        let _ = a + b;
    }
}

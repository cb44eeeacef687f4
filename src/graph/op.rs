// op.rs
// Each node records the operation that produced it as a plain enum variant.
// The backward pass matches on it instead of calling a stored closure, so the
// gradient rule of every node can be inspected, cloned and compared.
use super::node::NodeId;
use super::value::Value;
use crate::error::{EngineError, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Op {
    /// Input or parameter. Has no operands and no gradient rule.
    Leaf,
    Add,
    Mul,
    /// Power by a constant exponent.
    Pow(f64),
    Relu,
    Exp,
}

impl Op {
    // Get number of inputs this operator expects
    pub fn num_inputs(&self) -> usize {
        match self {
            Op::Leaf => 0,
            Op::Add | Op::Mul => 2,
            Op::Pow(_) | Op::Relu | Op::Exp => 1,
        }
    }

    /// Label shown by the visualizer. Never used for computation.
    pub fn tag(&self) -> String {
        match self {
            Op::Leaf => String::new(),
            Op::Add => "+".to_string(),
            Op::Mul => "*".to_string(),
            Op::Pow(exponent) => format!("**{}", exponent),
            Op::Relu => "ReLU".to_string(),
            Op::Exp => "exp".to_string(),
        }
    }

    /// Forward value of the operation.
    pub fn compute(&self, inputs: &[f64]) -> Result<f64> {
        if inputs.len() != self.num_inputs() {
            return Err(EngineError::InvalidOperand(format!(
                "Operation {:?} expects {} inputs, got {}",
                self,
                self.num_inputs(),
                inputs.len()
            )));
        }

        let value = match *self {
            Op::Leaf => {
                return Err(EngineError::InvalidOperand(
                    "Leaf nodes are created with create_variable".to_string(),
                ));
            }
            Op::Add => inputs[0] + inputs[1],
            Op::Mul => inputs[0] * inputs[1],
            Op::Pow(exponent) => inputs[0].powf(exponent),
            Op::Relu => {
                if inputs[0] > 0.0 {
                    inputs[0]
                } else {
                    0.0
                }
            }
            Op::Exp => inputs[0].exp(),
        };
        Ok(value)
    }

    /// Contribution of `grad_output` to each operand's gradient, one entry per
    /// operand in the same order as `inputs`.
    pub fn gradient(&self, grad_output: f64, inputs: &[f64], output: f64) -> Vec<f64> {
        match *self {
            Op::Leaf => Vec::new(),
            // d(a + b)/da = 1, d(a + b)/db = 1
            Op::Add => vec![grad_output, grad_output],
            // d(a * b)/da = b, d(a * b)/db = a
            Op::Mul => vec![grad_output * inputs[1], grad_output * inputs[0]],
            // x^0 is constant; 0 * 0^-1 would be NaN at x = 0.
            Op::Pow(exponent) if exponent == 0.0 => vec![0.0],
            Op::Pow(exponent) => {
                vec![exponent * inputs[0].powf(exponent - 1.0) * grad_output]
            }
            Op::Relu => {
                if output > 0.0 {
                    vec![grad_output]
                } else {
                    vec![0.0]
                }
            }
            // d(e^a)/da = e^a, which is the cached output
            Op::Exp => vec![output * grad_output],
        }
    }
}

/// Anything an operation can take as an operand: an existing node, or a raw
/// number that gets wrapped into a fresh leaf first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operand {
    Node(NodeId),
    Scalar(f64),
}

impl From<NodeId> for Operand {
    fn from(id: NodeId) -> Self {
        Operand::Node(id)
    }
}

impl From<Value<'_>> for Operand {
    fn from(value: Value<'_>) -> Self {
        Operand::Node(value.id())
    }
}

impl From<&Value<'_>> for Operand {
    fn from(value: &Value<'_>) -> Self {
        Operand::Node(value.id())
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Scalar(value)
    }
}

impl From<f32> for Operand {
    fn from(value: f32) -> Self {
        Operand::Scalar(value as f64)
    }
}

impl From<i32> for Operand {
    fn from(value: i32) -> Self {
        Operand::Scalar(value as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags() {
        assert_eq!(Op::Leaf.tag(), "");
        assert_eq!(Op::Add.tag(), "+");
        assert_eq!(Op::Mul.tag(), "*");
        assert_eq!(Op::Pow(2.0).tag(), "**2");
        assert_eq!(Op::Pow(-1.0).tag(), "**-1");
        assert_eq!(Op::Pow(0.5).tag(), "**0.5");
        assert_eq!(Op::Relu.tag(), "ReLU");
        assert_eq!(Op::Exp.tag(), "exp");
    }

    #[test]
    fn test_compute_checks_arity() {
        assert!(Op::Add.compute(&[1.0]).is_err());
        assert!(Op::Relu.compute(&[1.0, 2.0]).is_err());
        assert!(Op::Leaf.compute(&[]).is_err());
        assert_eq!(Op::Mul.compute(&[3.0, -2.0]).unwrap(), -6.0);
    }

    #[test]
    fn test_relu_gradient_uses_output() {
        assert_eq!(Op::Relu.gradient(5.0, &[2.0], 2.0), vec![5.0]);
        assert_eq!(Op::Relu.gradient(5.0, &[-2.0], 0.0), vec![0.0]);
        // Exactly zero does not pass gradient through.
        assert_eq!(Op::Relu.gradient(5.0, &[0.0], 0.0), vec![0.0]);
    }

    #[test]
    fn test_pow_gradient() {
        // d(x^3)/dx at x = 2 is 12
        assert_eq!(Op::Pow(3.0).gradient(1.0, &[2.0], 8.0), vec![12.0]);
        assert_eq!(Op::Pow(0.0).gradient(1.0, &[0.0], 1.0), vec![0.0]);
        assert_eq!(Op::Pow(0.0).gradient(2.0, &[3.0], 1.0), vec![0.0]);
    }

    #[test]
    fn test_operand_coercion() {
        assert_eq!(Operand::from(2), Operand::Scalar(2.0));
        assert_eq!(Operand::from(0.5f32), Operand::Scalar(0.5));
        assert_eq!(Operand::from(NodeId(3)), Operand::Node(NodeId(3)));
    }
}

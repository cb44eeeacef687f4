use super::engine::Engine;
use super::node::NodeId;
use crate::error::EngineError;
use thiserror::Error;

/// Error type specifically for gradient checking failures.
#[derive(Error, Debug)]
pub enum GradCheckError {
    #[error(
        "Gradient check failed for input {input_index}: analytical grad {analytical_grad} != numerical grad {numerical_grad} (difference {difference})"
    )]
    GradientMismatch {
        input_index: usize,
        analytical_grad: f64,
        numerical_grad: f64,
        difference: f64,
    },

    #[error("Non-finite gradient for input {input_index}: analytical {analytical_grad}, numerical {numerical_grad}")]
    NonFinite {
        input_index: usize,
        analytical_grad: f64,
        numerical_grad: f64,
    },

    #[error("Engine error during gradient check: {0}")]
    Engine(#[from] EngineError),
}

/// Checks analytical gradients against central finite differences.
///
/// `func` builds the expression inside the engine it is given, from the leaf
/// ids created for `inputs`, and returns the output node. It is called once
/// for the backward pass and twice per input for the numerical estimate, each
/// time on a fresh engine. Returns the analytical gradients on success.
pub fn check_grad<F>(
    func: F,
    inputs: &[f64],
    epsilon: f64,
    tolerance: f64,
) -> Result<Vec<f64>, GradCheckError>
where
    F: Fn(&Engine, &[NodeId]) -> Result<NodeId, EngineError>,
{
    let evaluate = |values: &[f64]| -> Result<f64, GradCheckError> {
        let engine = Engine::with_capacity(values.len() * 4);
        let leaves: Vec<NodeId> = values.iter().map(|&v| engine.create_variable(v)).collect();
        let output = func(&engine, &leaves)?;
        engine
            .get_value(output)
            .ok_or(GradCheckError::Engine(EngineError::NodeNotFound(output)))
    };

    // Analytical pass
    let engine = Engine::with_capacity(inputs.len() * 4);
    let leaves: Vec<NodeId> = inputs.iter().map(|&v| engine.create_variable(v)).collect();
    let output = func(&engine, &leaves)?;
    engine.backward(output)?;

    let mut analytical = Vec::with_capacity(inputs.len());
    for (input_index, &leaf) in leaves.iter().enumerate() {
        let analytical_grad = engine
            .get_gradient(leaf)
            .ok_or(EngineError::NodeNotFound(leaf))?;

        let mut plus = inputs.to_vec();
        plus[input_index] += epsilon;
        let mut minus = inputs.to_vec();
        minus[input_index] -= epsilon;
        let numerical_grad = (evaluate(&plus)? - evaluate(&minus)?) / (2.0 * epsilon);

        if !analytical_grad.is_finite() || !numerical_grad.is_finite() {
            return Err(GradCheckError::NonFinite {
                input_index,
                analytical_grad,
                numerical_grad,
            });
        }

        let difference = (analytical_grad - numerical_grad).abs();
        if difference > tolerance {
            return Err(GradCheckError::GradientMismatch {
                input_index,
                analytical_grad,
                numerical_grad,
                difference,
            });
        }
        analytical.push(analytical_grad);
    }

    Ok(analytical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_grad_passes_for_product() {
        let grads = check_grad(|g, x| g.mul(x[0], x[1]), &[3.0, -4.0], 1e-6, 1e-4).unwrap();
        assert_eq!(grads.len(), 2);
        assert!((grads[0] + 4.0).abs() < 1e-12);
        assert!((grads[1] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_check_grad_propagates_engine_errors() {
        let result = check_grad(|g, x| g.pow(x[0], x[0]), &[2.0], 1e-6, 1e-4);
        assert!(matches!(
            result,
            Err(GradCheckError::Engine(EngineError::InvalidOperand(_)))
        ));
    }
}

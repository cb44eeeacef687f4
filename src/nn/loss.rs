use crate::error::{EngineError, Result};
use crate::graph::{Engine, NodeId};

/// Mean squared error between `predictions` and constant `targets`.
pub fn mse_loss(engine: &Engine, predictions: &[NodeId], targets: &[f64]) -> Result<NodeId> {
    if predictions.len() != targets.len() {
        return Err(EngineError::DimensionMismatch {
            expected: predictions.len(),
            actual: targets.len(),
        });
    }
    if predictions.is_empty() {
        return Err(EngineError::InvalidOperand(
            "mse_loss needs at least one prediction".to_string(),
        ));
    }

    let squared = predictions
        .iter()
        .zip(targets)
        .map(|(&prediction, &target)| {
            let diff = engine.sub(prediction, target)?;
            engine.pow(diff, 2.0)
        })
        .collect::<Result<Vec<_>>>()?;

    let total = engine.sum(0.0, squared)?;
    engine.div(total, predictions.len() as f64)
}

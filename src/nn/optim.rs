use crate::error::{EngineError, Result};
use crate::graph::{Engine, NodeId};
use log::debug;

/// Plain stochastic gradient descent: `p.data -= lr * p.grad`.
#[derive(Debug, Clone)]
pub struct Sgd {
    lr: f64,
    params: Vec<NodeId>,
}

impl Sgd {
    pub fn new(lr: f64, params: Vec<NodeId>) -> Result<Self> {
        validate_lr(lr)?;
        Ok(Self { lr, params })
    }

    pub fn lr(&self) -> f64 {
        self.lr
    }

    pub fn set_lr(&mut self, lr: f64) -> Result<()> {
        validate_lr(lr)?;
        self.lr = lr;
        Ok(())
    }

    pub fn params(&self) -> &[NodeId] {
        &self.params
    }

    /// Updates every parameter, or none of them if any one is missing or
    /// still consumed by a live graph (see [`Engine::check_writable`]).
    pub fn step(&self, engine: &Engine) -> Result<()> {
        let mut updates = Vec::with_capacity(self.params.len());
        let mut grad_norm_sq = 0.0;
        for &param in &self.params {
            engine.check_writable(param)?;
            let value = engine
                .get_value(param)
                .ok_or(EngineError::NodeNotFound(param))?;
            let grad = engine
                .get_gradient(param)
                .ok_or(EngineError::NodeNotFound(param))?;
            grad_norm_sq += grad * grad;
            updates.push((param, value - self.lr * grad));
        }

        for (param, value) in updates {
            engine.set_value(param, value)?;
        }
        debug!(
            "SGD step over {} params, lr = {}, grad norm = {}",
            self.params.len(),
            self.lr,
            grad_norm_sq.sqrt()
        );
        Ok(())
    }

    pub fn zero_grad(&self, engine: &Engine) -> Result<()> {
        for &param in &self.params {
            engine.set_gradient(param, 0.0)?;
        }
        Ok(())
    }
}

fn validate_lr(lr: f64) -> Result<()> {
    if !lr.is_finite() || lr <= 0.0 {
        return Err(EngineError::InvalidConfig(format!(
            "learning rate must be positive and finite, got {}",
            lr
        )));
    }
    Ok(())
}

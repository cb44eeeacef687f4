use crate::error::Result;
use crate::graph::{Engine, NodeId};

/// The base trait for all neural network modules.
///
/// Parameters are leaf nodes of an [`Engine`]; a module only remembers their
/// ids. `forward` appends the computation for one sample to the same engine.
pub trait Module {
    /// Performs the forward pass of the module.
    ///
    /// # Arguments
    ///
    /// * `engine` - The computation graph engine holding the parameters
    /// * `inputs` - One node per input feature
    ///
    /// # Returns
    ///
    /// One node per output feature
    fn forward(&self, engine: &Engine, inputs: &[NodeId]) -> Result<Vec<NodeId>>;

    /// Returns all parameters of this module, submodules included.
    fn parameters(&self) -> Vec<NodeId> {
        Vec::new()
    }

    /// Resets the gradient of every parameter to zero.
    fn zero_grad(&self, engine: &Engine) -> Result<()> {
        for param in self.parameters() {
            engine.set_gradient(param, 0.0)?;
        }
        Ok(())
    }

    /// Returns the number of parameters in this module.
    fn num_parameters(&self) -> usize {
        self.parameters().len()
    }

    /// Creates input leaves for `values` and runs the forward pass on them.
    fn forward_values(&self, engine: &Engine, values: &[f64]) -> Result<Vec<NodeId>> {
        let inputs: Vec<NodeId> = values.iter().map(|&v| engine.create_variable(v)).collect();
        self.forward(engine, &inputs)
    }
}

// src/nn/layers.rs
// Neuron, Layer and MLP built directly out of scalar engine nodes.

use crate::config::MlpConfig;
use crate::error::{EngineError, Result};
use crate::graph::{Engine, NodeId};
use crate::nn::Module;
use crate::nn::initializers::{BIAS_RANGE, WEIGHT_RANGE, uniform};
use rand::Rng;
use rand_distr::Distribution;

/// A single unit: `relu(w . x + b)`, or just `w . x + b` when linear.
#[derive(Debug, Clone)]
pub struct Neuron {
    weights: Vec<NodeId>,
    bias: NodeId,
    nonlin: bool,
}

impl Neuron {
    /// Creates a neuron with `nin` weights drawn from `U(-1, 1)` and a bias
    /// drawn from `U(-5, 5)`.
    pub fn new<R: Rng + ?Sized>(
        engine: &Engine,
        nin: usize,
        nonlin: bool,
        rng: &mut R,
    ) -> Result<Self> {
        let weight_dist = uniform(WEIGHT_RANGE.0, WEIGHT_RANGE.1)?;
        let bias_dist = uniform(BIAS_RANGE.0, BIAS_RANGE.1)?;

        let weights = (0..nin)
            .map(|_| engine.create_variable(weight_dist.sample(rng)))
            .collect();
        let bias = engine.create_variable(bias_dist.sample(rng));

        Ok(Self {
            weights,
            bias,
            nonlin,
        })
    }

    /// Creates a neuron with the given parameter values.
    pub fn from_values(engine: &Engine, weights: &[f64], bias: f64, nonlin: bool) -> Self {
        Self {
            weights: weights.iter().map(|&w| engine.create_variable(w)).collect(),
            bias: engine.create_variable(bias),
            nonlin,
        }
    }

    pub fn nin(&self) -> usize {
        self.weights.len()
    }

    pub fn is_nonlinear(&self) -> bool {
        self.nonlin
    }

    pub fn weights(&self) -> &[NodeId] {
        &self.weights
    }

    pub fn bias(&self) -> NodeId {
        self.bias
    }

    /// Output node for one sample.
    pub fn activate(&self, engine: &Engine, inputs: &[NodeId]) -> Result<NodeId> {
        if inputs.len() != self.weights.len() {
            return Err(EngineError::DimensionMismatch {
                expected: self.weights.len(),
                actual: inputs.len(),
            });
        }

        let products = self
            .weights
            .iter()
            .zip(inputs)
            .map(|(&w, &x)| engine.mul(w, x))
            .collect::<Result<Vec<_>>>()?;
        let act = engine.sum(self.bias, products)?;

        if self.nonlin {
            engine.relu(act)
        } else {
            Ok(act)
        }
    }
}

impl Module for Neuron {
    fn forward(&self, engine: &Engine, inputs: &[NodeId]) -> Result<Vec<NodeId>> {
        Ok(vec![self.activate(engine, inputs)?])
    }

    fn parameters(&self) -> Vec<NodeId> {
        let mut params = self.weights.clone();
        params.push(self.bias);
        params
    }
}

impl std::fmt::Display for Neuron {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.nonlin { "ReLU" } else { "Linear" };
        write!(f, "{} neuron ({})", kind, self.weights.len())
    }
}

/// A set of neurons sharing the same inputs.
#[derive(Debug, Clone)]
pub struct Layer {
    neurons: Vec<Neuron>,
}

impl Layer {
    pub fn new<R: Rng + ?Sized>(
        engine: &Engine,
        nin: usize,
        nout: usize,
        nonlin: bool,
        rng: &mut R,
    ) -> Result<Self> {
        let neurons = (0..nout)
            .map(|_| Neuron::new(engine, nin, nonlin, rng))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { neurons })
    }

    pub fn from_neurons(neurons: Vec<Neuron>) -> Self {
        Self { neurons }
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn nout(&self) -> usize {
        self.neurons.len()
    }
}

impl Module for Layer {
    fn forward(&self, engine: &Engine, inputs: &[NodeId]) -> Result<Vec<NodeId>> {
        self.neurons
            .iter()
            .map(|neuron| neuron.activate(engine, inputs))
            .collect()
    }

    fn parameters(&self) -> Vec<NodeId> {
        self.neurons
            .iter()
            .flat_map(|neuron| neuron.parameters())
            .collect()
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let neurons: Vec<String> = self.neurons.iter().map(|n| n.to_string()).collect();
        write!(f, "Layer of [{}]", neurons.join(", "))
    }
}

/// Multi-layer perceptron. Every layer but the last applies ReLU.
#[derive(Debug, Clone)]
pub struct Mlp {
    layers: Vec<Layer>,
}

impl Mlp {
    pub fn new<R: Rng + ?Sized>(engine: &Engine, config: &MlpConfig, rng: &mut R) -> Result<Self> {
        config.validate()?;

        let sizes = config.sizes();
        let last = sizes.len() - 2;
        let layers = sizes
            .windows(2)
            .enumerate()
            .map(|(i, pair)| Layer::new(engine, pair[0], pair[1], i != last, rng))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { layers })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }
}

impl Module for Mlp {
    fn forward(&self, engine: &Engine, inputs: &[NodeId]) -> Result<Vec<NodeId>> {
        let mut x = inputs.to_vec();
        for layer in &self.layers {
            x = layer.forward(engine, &x)?;
        }
        Ok(x)
    }

    fn parameters(&self) -> Vec<NodeId> {
        self.layers
            .iter()
            .flat_map(|layer| layer.parameters())
            .collect()
    }
}

impl std::fmt::Display for Mlp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let layers: Vec<String> = self.layers.iter().map(|l| l.to_string()).collect();
        write!(f, "MLP of [{}]", layers.join(", "))
    }
}

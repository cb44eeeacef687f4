// Neural Network Module for Nanograd
// High-level building blocks for constructing small networks on top of the
// scalar automatic differentiation engine.

pub mod initializers;
pub mod layers;
pub mod loss;
pub mod module;
pub mod optim;
// Re-export the main types and traits for convenience
pub use layers::{Layer, Mlp, Neuron};
pub use loss::mse_loss;
pub use module::Module;
pub use optim::Sgd;

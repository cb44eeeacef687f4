//! # Nanograd
//!
//! Nanograd is a tiny scalar reverse-mode automatic differentiation engine
//! written in Rust, with a toy multi-layer perceptron built on top of it.
//!
//! ## Features
//!
//! - Reverse-mode automatic differentiation (backpropagation) over scalars
//! - Dynamic computation graph stored in an append-only arena
//! - Operator overloading for intuitive expressions
//! - Gradient accumulation and finite-difference gradient checking
//! - Graph visualization (rendering requires GraphViz installed)
//! - Neuron / Layer / MLP modules with plain SGD
//!
//! ```rust
//! use nanograd::Engine;
//!
//! let engine = Engine::new();
//! let a = engine.value(2.0);
//! let b = engine.value(-3.0);
//! let c = engine.value(10.0);
//! let d = a * b + c;
//! d.backward();
//! assert_eq!(d.data(), 4.0);
//! assert_eq!(a.grad(), -3.0);
//! assert_eq!(b.grad(), 2.0);
//! assert_eq!(c.grad(), 1.0);
//! ```
pub mod config;
pub mod error;
pub mod graph;
pub mod nn;

// Re-export commonly used types for convenience
pub use config::{MlpConfig, TrainingConfig};
pub use error::{EngineError, Result};
pub use graph::{Engine, NodeId, Value};
pub use nn::{Layer, Mlp, Module, Neuron};

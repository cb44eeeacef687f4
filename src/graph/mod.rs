pub mod engine;
pub mod grad_check;
pub mod node;
pub mod op;
pub mod plot;
pub mod value;

pub use op::{Op, Operand};

pub use engine::{Checkpoint, Engine};
pub use grad_check::{GradCheckError, check_grad};
pub use node::{Node, NodeId};
pub use plot::{EngineVisualization, GraphVisualizer, RankDir, VisualizationConfig};
pub use value::Value;

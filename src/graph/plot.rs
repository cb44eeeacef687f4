use std::collections::HashSet;
use std::fmt::Write;
use std::fs::File;
use std::io::Write as IoWrite;
use std::path::Path;
use std::process::Command;

use log::debug;

use super::engine::Engine;
use super::node::{Node, NodeId};
use crate::error::{EngineError, Result};

/// Direction in which Graphviz lays out the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankDir {
    /// Left to right
    LR,
    /// Top to bottom
    TB,
}

impl std::fmt::Display for RankDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RankDir::LR => write!(f, "LR"),
            RankDir::TB => write!(f, "TB"),
        }
    }
}

/// Configuration for graph visualization
#[derive(Debug, Clone)]
pub struct VisualizationConfig {
    pub rankdir: RankDir,
    /// Output format handed to `dot -T`, e.g. `svg` or `png`.
    pub format: String,
    /// Decimal places for data and grad in node labels.
    pub precision: usize,
    pub show_gradients: bool,
}

impl Default for VisualizationConfig {
    fn default() -> Self {
        Self {
            rankdir: RankDir::LR,
            format: "svg".to_string(),
            precision: 4,
            show_gradients: true,
        }
    }
}

/// Graph visualization for the computational graph engine
pub struct GraphVisualizer {
    pub config: VisualizationConfig,
}

impl Default for GraphVisualizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Nodes and predecessor -> consumer edges reachable from a root.
pub type Trace = (Vec<NodeId>, Vec<(NodeId, NodeId)>);

impl GraphVisualizer {
    pub fn new() -> Self {
        Self {
            config: VisualizationConfig::default(),
        }
    }

    pub fn with_config(config: VisualizationConfig) -> Self {
        Self { config }
    }

    /// Collects every node reachable from `root` and the edges between them.
    ///
    /// Walks the graph on its own instead of reusing the engine's topological
    /// sort; only reads the nodes.
    pub fn trace(&self, engine: &Engine, root: NodeId) -> Result<Trace> {
        let mut visited = HashSet::new();
        let mut nodes = Vec::new();
        let mut edges = Vec::new();
        let mut stack = vec![root];

        while let Some(node_id) = stack.pop() {
            if !visited.insert(node_id) {
                continue;
            }
            nodes.push(node_id);

            let predecessors = engine
                .get_predecessors(node_id)
                .ok_or(EngineError::NodeNotFound(node_id))?;
            for input_id in predecessors {
                edges.push((input_id, node_id));
                stack.push(input_id);
            }
        }

        Ok((nodes, edges))
    }

    /// Generate DOT format representation of the computational graph
    pub fn to_dot(&self, engine: &Engine, root: NodeId) -> Result<String> {
        let (nodes, edges) = self.trace(engine, root)?;
        let mut dot = String::new();

        writeln!(dot, "digraph G {{")?;
        writeln!(dot, "    rankdir={};", self.config.rankdir)?;

        for &node_id in &nodes {
            let node = engine
                .get_node(node_id)
                .ok_or(EngineError::NodeNotFound(node_id))?;
            writeln!(
                dot,
                "    {} [shape=record, label=\"{}\"];",
                Self::node_name(node_id),
                self.create_node_label(&node)
            )?;

            // Operator tags get their own small node feeding the result.
            let tag = node.tag();
            if !tag.is_empty() {
                writeln!(
                    dot,
                    "    {} [label=\"{}\"];",
                    Self::op_name(node_id),
                    tag
                )?;
                writeln!(
                    dot,
                    "    {} -> {};",
                    Self::op_name(node_id),
                    Self::node_name(node_id)
                )?;
            }
        }

        for &(input_id, node_id) in &edges {
            writeln!(
                dot,
                "    {} -> {};",
                Self::node_name(input_id),
                Self::op_name(node_id)
            )?;
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }

    fn node_name(node_id: NodeId) -> String {
        format!("node{}", node_id.index())
    }

    fn op_name(node_id: NodeId) -> String {
        format!("node{}_op", node_id.index())
    }

    /// Create a descriptive label for a node
    fn create_node_label(&self, node: &Node) -> String {
        let precision = self.config.precision;
        if self.config.show_gradients {
            format!(
                "{{ data {:.*} | grad {:.*} }}",
                precision, node.value, precision, node.grad
            )
        } else {
            format!("{{ data {:.*} }}", precision, node.value)
        }
    }

    /// Save the graph as a DOT file
    pub fn save_dot(&self, engine: &Engine, root: NodeId, filename: impl AsRef<Path>) -> Result<()> {
        let dot_content = self.to_dot(engine, root)?;
        let mut file = File::create(filename.as_ref())?;
        file.write_all(dot_content.as_bytes())?;
        debug!("graph written to {}", filename.as_ref().display());
        Ok(())
    }

    /// Render the graph with Graphviz in the configured format. `filename` is
    /// the output path without extension; returns the path written. The
    /// intermediate `.dot` file is removed whether or not `dot` succeeds.
    pub fn save_image(&self, engine: &Engine, root: NodeId, filename: &str) -> Result<String> {
        let dot_path = format!("{}.dot", filename);
        self.save_dot(engine, root, &dot_path)?;

        let output_path = format!("{}.{}", filename, self.config.format);
        let output = Command::new("dot")
            .arg(format!("-T{}", self.config.format))
            .arg(&dot_path)
            .arg("-o")
            .arg(&output_path)
            .output();
        let cleanup = std::fs::remove_file(&dot_path);

        let output = output?;
        if !output.status.success() {
            return Err(EngineError::Graphviz(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }
        cleanup?;

        debug!("graph rendered to {}", output_path);
        Ok(output_path)
    }

    /// Print the graph to console (simple text representation)
    pub fn print_graph(&self, engine: &Engine, root: NodeId) -> Result<()> {
        println!("Computational Graph:");
        println!("===================");

        for node_id in engine.topological_order(root)? {
            let node = engine
                .get_node(node_id)
                .ok_or(EngineError::NodeNotFound(node_id))?;
            let tag = node.tag();
            let kind = if tag.is_empty() { "Leaf" } else { tag.as_str() };

            print!("Node {}: {} data={:.*}", node_id.index(), kind, self.config.precision, node.value);
            if self.config.show_gradients {
                print!(" grad={:.*}", self.config.precision, node.grad);
            }
            if !node.inputs.is_empty() {
                let inputs: Vec<usize> = node.inputs.iter().map(|id| id.index()).collect();
                print!(" <- {:?}", inputs);
            }
            println!();
        }
        Ok(())
    }
}

// Extension trait to add visualization methods directly to Engine
pub trait EngineVisualization {
    fn plot_graph(&self, root: NodeId) -> Result<()>;
    fn save_graph_dot(&self, root: NodeId, filename: &str) -> Result<()>;
    fn save_graph_image(&self, root: NodeId, filename: &str) -> Result<String>;
}

impl EngineVisualization for Engine {
    fn plot_graph(&self, root: NodeId) -> Result<()> {
        GraphVisualizer::new().print_graph(self, root)
    }

    fn save_graph_dot(&self, root: NodeId, filename: &str) -> Result<()> {
        GraphVisualizer::new().save_dot(self, root, filename)
    }

    fn save_graph_image(&self, root: NodeId, filename: &str) -> Result<String> {
        GraphVisualizer::new().save_image(self, root, filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_dedups_shared_nodes() {
        let engine = Engine::new();
        let a = engine.value(2.0);
        let b = a * a;
        let c = b + a;

        let (nodes, edges) = GraphVisualizer::new().trace(&engine, c.id()).unwrap();
        assert_eq!(nodes.len(), 3);
        assert!(edges.contains(&(a.id(), b.id())));
        assert!(edges.contains(&(a.id(), c.id())));
        assert!(edges.contains(&(b.id(), c.id())));
        assert_eq!(edges.len(), 3);
    }

    #[test]
    fn test_dot_contains_records_and_tags() {
        let engine = Engine::new();
        let a = engine.value(2.0);
        let b = engine.value(-3.0);
        let d = (a * b).relu();
        d.backward();

        let dot = GraphVisualizer::new().to_dot(&engine, d.id()).unwrap();
        assert!(dot.starts_with("digraph G {"));
        assert!(dot.contains("rankdir=LR;"));
        assert!(dot.contains("{ data 2.0000 | grad 0.0000 }"));
        assert!(dot.contains("{ data -6.0000 | grad 0.0000 }"));
        assert!(dot.contains("label=\"*\""));
        assert!(dot.contains("label=\"ReLU\""));
        assert!(dot.contains(&format!("node{} -> node{}_op;", a.id().index(), a.id().index() + 2)));
    }

    #[test]
    fn test_dot_without_gradients_top_to_bottom() {
        let engine = Engine::new();
        let a = engine.value(1.0);
        let config = VisualizationConfig {
            rankdir: RankDir::TB,
            show_gradients: false,
            precision: 1,
            ..Default::default()
        };
        let dot = GraphVisualizer::with_config(config).to_dot(&engine, a.id()).unwrap();
        assert!(dot.contains("rankdir=TB;"));
        assert!(dot.contains("{ data 1.0 }"));
        assert!(!dot.contains("grad"));
        // Leaves have no operator node.
        assert!(!dot.contains("_op"));
    }

    #[test]
    fn test_trace_unknown_root() {
        let engine = Engine::new();
        let other = Engine::new();
        let stray = other.create_variable(1.0);
        assert!(matches!(
            GraphVisualizer::new().trace(&engine, stray),
            Err(EngineError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_failed_render_leaves_no_dot_file() {
        let engine = Engine::new();
        let a = engine.value(1.0);
        let y = (a * 2.0).relu();

        let base = std::env::temp_dir().join(format!("nanograd_render_{}", std::process::id()));
        let base = base.to_string_lossy().into_owned();
        let config = VisualizationConfig {
            format: "no-such-format".to_string(),
            ..Default::default()
        };

        // Fails either because `dot` is missing or because it rejects the format.
        let result = GraphVisualizer::with_config(config).save_image(&engine, y.id(), &base);
        assert!(matches!(
            result,
            Err(EngineError::Io(_)) | Err(EngineError::Graphviz(_))
        ));
        assert!(!Path::new(&format!("{}.dot", base)).exists());
    }
}

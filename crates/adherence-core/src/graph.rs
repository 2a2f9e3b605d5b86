use std::collections::HashMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::types::{Edge, FileNode, Node, Relation, SymbolNode};

/// Node weight: a known node, or a placeholder for an id only seen as an edge endpoint.
#[derive(Debug, Clone)]
enum Slot {
    Known(Node),
    Unresolved(String),
}

/// Directed multigraph of files and symbols. Parallel edges are kept;
/// edge endpoints need not resolve to known nodes.
pub struct ArchitectureGraph {
    graph: DiGraph<Slot, Relation>,
    index: HashMap<String, NodeIndex>,
}

impl ArchitectureGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
        }
    }

    /// Add a node. Returns false if a known node with the same id already exists.
    pub fn add_node(&mut self, node: Node) -> bool {
        match self.index.get(node.id()) {
            Some(&idx) => {
                if matches!(self.graph[idx], Slot::Known(_)) {
                    return false;
                }
                self.graph[idx] = Slot::Known(node);
                true
            }
            None => {
                let id = node.id().to_string();
                let idx = self.graph.add_node(Slot::Known(node));
                self.index.insert(id, idx);
                true
            }
        }
    }

    pub fn add_file(&mut self, file: FileNode) -> bool {
        self.add_node(Node::File(file))
    }

    pub fn add_symbol(&mut self, symbol: SymbolNode) -> bool {
        self.add_node(Node::Symbol(symbol))
    }

    fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(Slot::Unresolved(id.to_string()));
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// Add an edge. Duplicates are kept.
    pub fn add_edge(&mut self, edge: &Edge) {
        let from = self.ensure_node(&edge.source);
        let to = self.ensure_node(&edge.target);
        self.graph.add_edge(from, to, edge.relation);
    }

    /// Known nodes in insertion order.
    pub fn nodes(&self) -> Vec<&Node> {
        self.graph
            .node_weights()
            .filter_map(|slot| match slot {
                Slot::Known(node) => Some(node),
                Slot::Unresolved(_) => None,
            })
            .collect()
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> Vec<Edge> {
        self.graph
            .edge_references()
            .map(|e| Edge {
                source: self.slot_id(e.source()).to_string(),
                target: self.slot_id(e.target()).to_string(),
                relation: *e.weight(),
            })
            .collect()
    }

    /// Number of edges whose target has no known node.
    pub fn dangling_edge_count(&self) -> usize {
        self.graph
            .edge_references()
            .filter(|e| matches!(self.graph[e.target()], Slot::Unresolved(_)))
            .count()
    }

    pub fn node_count(&self) -> usize {
        self.nodes().len()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    fn slot_id(&self, idx: NodeIndex) -> &str {
        match &self.graph[idx] {
            Slot::Known(node) => node.id(),
            Slot::Unresolved(id) => id,
        }
    }
}

impl Default for ArchitectureGraph {
    fn default() -> Self {
        Self::new()
    }
}

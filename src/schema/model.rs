//! Typed workflow model
//!
//! Contains the bound Rust types of a workflow definition:
//! - `WorkflowDef`: id, name, optional entry graph, graphs, parameters
//! - `GraphDef`: id, name, nodes, edges
//! - `NodeDef`: id, name, type, optional action and sub-graph
//! - `EdgeDef`: connection between two nodes of one graph
//!
//! These types represent the "what" - static structure parsed from text.

use serde::Serialize;
use serde_json::Value;

/// Free-form `with:` parameters; scalars are always JSON strings
pub type Parameters = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowDef {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_graph_id: Option<String>,
    pub graphs: Vec<GraphDef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with: Option<Parameters>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphDef {
    pub id: String,
    pub name: String,
    pub nodes: Vec<NodeDef>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<EdgeDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeDef {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_graph_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with: Option<Parameters>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeDef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_port: Option<String>,
}

impl WorkflowDef {
    pub fn graph(&self, id: &str) -> Option<&GraphDef> {
        self.graphs.iter().find(|g| g.id == id)
    }

    /// The declared entry graph, or the first graph when none is declared
    pub fn entry_graph(&self) -> Option<&GraphDef> {
        match &self.entry_graph_id {
            Some(id) => self.graph(id),
            None => self.graphs.first(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graphs.iter().map(|g| g.nodes.len()).sum()
    }

    pub fn edge_count(&self) -> usize {
        self.graphs.iter().map(|g| g.edges.len()).sum()
    }
}

impl GraphDef {
    pub fn node(&self, id: &str) -> Option<&NodeDef> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

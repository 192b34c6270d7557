//! Cross-reference checks on a bound workflow
//!
//! Validates:
//! - entry_graph_id names a declared graph
//! - edge endpoints name nodes of the edge's own graph
//! - sub_graph_id names a declared graph

use rustc_hash::FxHashSet;

use super::model::{GraphDef, WorkflowDef};
use super::path::KeyPath;
use crate::error::{ParseError, Result};

const DECLARED_GRAPH: &str = "id of a declared graph";

/// Check the references between graphs and nodes of `workflow`
pub fn check_invariants(workflow: &WorkflowDef) -> Result<()> {
    let graph_ids: FxHashSet<&str> = workflow.graphs.iter().map(|g| g.id.as_str()).collect();
    let root = KeyPath::root();

    if let Some(ref entry) = workflow.entry_graph_id {
        if !graph_ids.contains(entry.as_str()) {
            return Err(ParseError::schema(
                &root.key("entry_graph_id"),
                DECLARED_GRAPH,
                format!("'{}'", entry),
            ));
        }
    }

    for (i, graph) in workflow.graphs.iter().enumerate() {
        let graph_path = root.key("graphs").index(i);
        check_graph(graph, &graph_path, &graph_ids)?;
    }

    Ok(())
}

fn check_graph(graph: &GraphDef, path: &KeyPath, graph_ids: &FxHashSet<&str>) -> Result<()> {
    for (i, node) in graph.nodes.iter().enumerate() {
        if let Some(ref sub) = node.sub_graph_id {
            if !graph_ids.contains(sub.as_str()) {
                return Err(ParseError::schema(
                    &path.key("nodes").index(i).key("sub_graph_id"),
                    DECLARED_GRAPH,
                    format!("'{}'", sub),
                ));
            }
        }
    }

    let node_ids: FxHashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    for (i, edge) in graph.edges.iter().enumerate() {
        for (field, endpoint) in [("from", &edge.from), ("to", &edge.to)] {
            if !node_ids.contains(endpoint.as_str()) {
                return Err(ParseError::schema(
                    &path.key("edges").index(i).key(field),
                    format!("id of a node in graph '{}'", graph.id),
                    format!("'{}'", endpoint),
                ));
            }
        }
    }

    Ok(())
}

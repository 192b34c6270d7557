//! Schema binding: resolved document tree to typed workflow model
//!
//! Binding is structural only. Required keys are checked in declaration
//! order, unknown keys are ignored and node types are not interpreted.
//! Errors raised inside content spliced from another file are wrapped in
//! `IncludeParseError` once per inclusion level.

use serde_json::Value;

use super::model::{EdgeDef, GraphDef, NodeDef, Parameters, WorkflowDef};
use super::path::KeyPath;
use crate::error::{ParseError, Result};
use crate::include::ResolvedNode;
use crate::syntax::Scalar;

type Entries = [(String, ResolvedNode)];

const ABSENT: &str = "<absent>";

/// Bind a fully resolved tree to a `WorkflowDef`
pub fn bind(root: &ResolvedNode) -> Result<WorkflowDef> {
    within(root, |node| workflow(node, &KeyPath::root()))
}

/// Run `f` on `node` with its `Spliced` layers peeled off, attributing any
/// failure to the spliced files
fn within<'a, T>(
    node: &'a ResolvedNode,
    f: impl FnOnce(&'a ResolvedNode) -> Result<T>,
) -> Result<T> {
    match node {
        ResolvedNode::Spliced { source, node } => {
            within(node, f).map_err(|cause| ParseError::IncludeParseError {
                path: source.clone(),
                cause: Box::new(cause),
            })
        }
        other => f(other),
    }
}

fn workflow(node: &ResolvedNode, path: &KeyPath) -> Result<WorkflowDef> {
    let entries = mapping(node, path)?;
    let id = required_id(entries, path, "id")?;
    let name = required_scalar(entries, path, "name")?;

    let graphs_path = path.key("graphs");
    let graphs = within(required(entries, path, "graphs")?, |node| {
        let graphs = sequence(node, &graphs_path)?
            .iter()
            .enumerate()
            .map(|(i, item)| within(item, |item| graph(item, &graphs_path.index(i))))
            .collect::<Result<Vec<_>>>()?;
        if graphs.is_empty() {
            return Err(ParseError::schema(&graphs_path, "at least one graph", "empty sequence"));
        }
        Ok(graphs)
    })?;

    Ok(WorkflowDef {
        id,
        name,
        entry_graph_id: optional_scalar(entries, path, &["entry_graph_id", "entryGraphId"])?,
        graphs,
        with: parameters(entries, path)?,
    })
}

fn graph(node: &ResolvedNode, path: &KeyPath) -> Result<GraphDef> {
    let entries = mapping(node, path)?;
    let id = required_id(entries, path, "id")?;
    let name = required_scalar(entries, path, "name")?;

    let nodes_path = path.key("nodes");
    let nodes = within(required(entries, path, "nodes")?, |node| {
        sequence(node, &nodes_path)?
            .iter()
            .enumerate()
            .map(|(i, item)| within(item, |item| workflow_node(item, &nodes_path.index(i))))
            .collect::<Result<Vec<_>>>()
    })?;

    let edges_path = path.key("edges");
    let edges = match lookup(entries, &["edges"]) {
        Some((_, value)) if !is_blank(value) => within(value, |node| {
            sequence(node, &edges_path)?
                .iter()
                .enumerate()
                .map(|(i, item)| within(item, |item| edge(item, &edges_path.index(i))))
                .collect::<Result<Vec<_>>>()
        })?,
        _ => Vec::new(),
    };

    Ok(GraphDef {
        id,
        name,
        nodes,
        edges,
    })
}

fn workflow_node(node: &ResolvedNode, path: &KeyPath) -> Result<NodeDef> {
    let entries = mapping(node, path)?;
    Ok(NodeDef {
        id: required_id(entries, path, "id")?,
        name: required_scalar(entries, path, "name")?,
        node_type: required_scalar(entries, path, "type")?,
        action: optional_scalar(entries, path, &["action"])?,
        sub_graph_id: optional_scalar(entries, path, &["sub_graph_id", "subGraphId"])?,
        with: parameters(entries, path)?,
    })
}

fn edge(node: &ResolvedNode, path: &KeyPath) -> Result<EdgeDef> {
    let entries = mapping(node, path)?;
    Ok(EdgeDef {
        id: optional_scalar(entries, path, &["id"])?,
        from: required_id(entries, path, "from")?,
        to: required_id(entries, path, "to")?,
        from_port: optional_scalar(entries, path, &["from_port", "fromPort"])?,
        to_port: optional_scalar(entries, path, &["to_port", "toPort"])?,
    })
}

fn parameters(entries: &Entries, path: &KeyPath) -> Result<Option<Parameters>> {
    let value = match lookup(entries, &["with"]) {
        Some((_, value)) if !is_blank(value) => value,
        _ => return Ok(None),
    };
    let with_path = path.key("with");
    within(value, |node| match node {
        ResolvedNode::Mapping(entries) => Ok(Some(to_object(entries))),
        other => Err(ParseError::schema(&with_path, "mapping", other.kind())),
    })
}

fn to_object(entries: &Entries) -> Parameters {
    entries
        .iter()
        .map(|(key, value)| (key.clone(), to_json(value)))
        .collect()
}

fn to_json(node: &ResolvedNode) -> Value {
    match node.content() {
        ResolvedNode::Mapping(entries) => Value::Object(to_object(entries)),
        ResolvedNode::Sequence(items) => Value::Array(items.iter().map(to_json).collect()),
        ResolvedNode::Scalar(scalar) => Value::String(scalar.value.clone()),
        ResolvedNode::Spliced { node, .. } => to_json(node),
    }
}

// ─────────────────────────────────────────────────────────────
// Shape helpers
// ─────────────────────────────────────────────────────────────

fn lookup<'a>(entries: &'a Entries, names: &[&'static str]) -> Option<(&'static str, &'a ResolvedNode)> {
    names.iter().find_map(|name| {
        entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| (*name, value))
    })
}

fn required<'a>(entries: &'a Entries, path: &KeyPath, key: &str) -> Result<&'a ResolvedNode> {
    entries
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, value)| value)
        .ok_or_else(|| ParseError::schema(path, key, ABSENT))
}

fn required_scalar(entries: &Entries, path: &KeyPath, key: &str) -> Result<String> {
    let value = required(entries, path, key)?;
    scalar(value, &path.key(key)).map(|s| s.value.clone())
}

fn required_id(entries: &Entries, path: &KeyPath, key: &str) -> Result<String> {
    let value = required(entries, path, key)?;
    let key_path = path.key(key);
    within(value, |node| {
        let id = scalar(node, &key_path)?;
        if id.value.is_empty() {
            return Err(ParseError::schema(&key_path, "non-empty id", "empty string"));
        }
        Ok(id.value.clone())
    })
}

/// An absent key and a blank value both bind to `None`
fn optional_scalar(entries: &Entries, path: &KeyPath, names: &[&'static str]) -> Result<Option<String>> {
    match lookup(entries, names) {
        Some((key, value)) => {
            let scalar = scalar(value, &path.key(key))?;
            Ok((!scalar.is_blank()).then(|| scalar.value.clone()))
        }
        None => Ok(None),
    }
}

fn scalar<'a>(node: &'a ResolvedNode, path: &KeyPath) -> Result<&'a Scalar> {
    within(node, |node| match node {
        ResolvedNode::Scalar(scalar) => Ok(scalar),
        other => Err(ParseError::schema(path, "scalar", other.kind())),
    })
}

fn mapping<'a>(node: &'a ResolvedNode, path: &KeyPath) -> Result<&'a Entries> {
    within(node, |node| match node {
        ResolvedNode::Mapping(entries) => Ok(entries.as_slice()),
        other => Err(ParseError::schema(path, "mapping", other.kind())),
    })
}

fn sequence<'a>(node: &'a ResolvedNode, path: &KeyPath) -> Result<&'a [ResolvedNode]> {
    within(node, |node| match node {
        ResolvedNode::Sequence(items) => Ok(items.as_slice()),
        other => Err(ParseError::schema(path, "sequence", other.kind())),
    })
}

fn is_blank(node: &ResolvedNode) -> bool {
    node.as_scalar().is_some_and(Scalar::is_blank)
}

//! Parse pipeline entry points
//!
//! One call runs Scanning → Structuring → Resolving → Binding → Done.
//! Resolving re-enters Scanning and Structuring for every included file;
//! Binding starts only once every include is spliced. Any failure aborts
//! the call, so a partial `WorkflowDef` is never returned.

use std::fmt;
use std::path::Path;

use tracing::{debug, trace};

use crate::error::{ParseError, Result};
use crate::include::{normalize, resolve, LoadError, Loader};
use crate::options::ParseOptions;
use crate::schema::{bind, check_invariants, WorkflowDef};
use crate::syntax::{parse_document_with, tokenize};

/// Source identity used by `parse_str`
pub const INLINE_SOURCE: &str = "<inline>";

/// Pipeline stage of a parse call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseStage {
    Scanning,
    Structuring,
    Resolving,
    Binding,
    Done,
}

impl fmt::Display for ParseStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParseStage::Scanning => "scanning",
            ParseStage::Structuring => "structuring",
            ParseStage::Resolving => "resolving",
            ParseStage::Binding => "binding",
            ParseStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Parse the workflow at `source`, loading it and its includes via `loader`
pub fn parse_workflow<L>(source: impl AsRef<Path>, loader: &L) -> Result<WorkflowDef>
where
    L: Loader + ?Sized,
{
    parse_workflow_with(source, loader, &ParseOptions::default())
}

/// `parse_workflow` with explicit limits
pub fn parse_workflow_with<L>(
    source: impl AsRef<Path>,
    loader: &L,
    options: &ParseOptions,
) -> Result<WorkflowDef>
where
    L: Loader + ?Sized,
{
    let source = normalize(source.as_ref());
    let text = loader
        .load(&source)
        .map_err(|e| ParseError::IncludeNotFound {
            path: source.clone(),
            reason: e.to_string(),
        })?;
    parse_text(&text, &source, loader, options)
}

/// Parse a self-contained workflow from text
///
/// There is no loader behind inline text, so any `!include` fails with
/// `IncludeNotFound`.
pub fn parse_str(text: &str) -> Result<WorkflowDef> {
    parse_text(
        text,
        Path::new(INLINE_SOURCE),
        &reject_includes,
        &ParseOptions::default(),
    )
}

fn reject_includes(path: &Path) -> std::result::Result<String, LoadError> {
    Err(LoadError::Unavailable {
        path: path.to_path_buf(),
        reason: "includes are not available for inline sources".to_string(),
    })
}

fn parse_text<L>(text: &str, source: &Path, loader: &L, options: &ParseOptions) -> Result<WorkflowDef>
where
    L: Loader + ?Sized,
{
    enter(ParseStage::Scanning, source);
    let tokens = tokenize(text)?;

    enter(ParseStage::Structuring, source);
    let document = parse_document_with(tokens.into_iter().map(Ok), options)?;

    enter(ParseStage::Resolving, source);
    let resolved = resolve(document, source, loader, options)?;

    enter(ParseStage::Binding, source);
    let workflow = bind(&resolved)?;
    check_invariants(&workflow)?;

    enter(ParseStage::Done, source);
    debug!(
        source = %source.display(),
        workflow = %workflow.id,
        graphs = workflow.graphs.len(),
        nodes = workflow.node_count(),
        "parsed workflow"
    );
    Ok(workflow)
}

fn enter(stage: ParseStage, source: &Path) {
    trace!(stage = %stage, source = %source.display(), "entering stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::include::MemoryLoader;
    use crate::schema::{GraphDef, NodeDef};

    #[test]
    fn test_parse_str() {
        let wf = parse_str("id: w1\nname: Demo\ngraphs:\n  - id: g1\n    name: G\n    nodes:\n      - id: n1\n        name: N\n        type: action\n").unwrap();
        assert_eq!(wf.id, "w1");
        assert_eq!(wf.node_count(), 1);
    }

    #[test]
    fn test_parse_str_rejects_includes() {
        let err = parse_str("id: w1\nname: W\ngraphs:\n  - !include g1.yml\n").unwrap_err();
        assert!(matches!(
            err,
            ParseError::IncludeNotFound { ref path, ref reason }
                if path == Path::new("g1.yml") && reason.contains("inline")
        ));
        assert_eq!(err.stage(), ParseStage::Resolving);
    }

    #[test]
    fn test_end_to_end_with_include() {
        let loader = MemoryLoader::new()
            .with_source("wf.yml", "id: w1\nname: Demo\ngraphs:\n  - !include g1.yml\n")
            .with_source(
                "g1.yml",
                "id: g1\nname: Graph1\nnodes:\n  - id: n1\n    name: Node1\n    type: action\n",
            );

        let wf = parse_workflow("wf.yml", &loader).unwrap();
        assert_eq!(
            wf,
            WorkflowDef {
                id: "w1".into(),
                name: "Demo".into(),
                entry_graph_id: None,
                graphs: vec![GraphDef {
                    id: "g1".into(),
                    name: "Graph1".into(),
                    nodes: vec![NodeDef {
                        id: "n1".into(),
                        name: "Node1".into(),
                        node_type: "action".into(),
                        action: None,
                        sub_graph_id: None,
                        with: None,
                    }],
                    edges: vec![],
                }],
                with: None,
            }
        );
    }

    #[test]
    fn test_missing_root() {
        let err = parse_workflow("wf.yml", &MemoryLoader::new()).unwrap_err();
        assert_eq!(
            err,
            ParseError::IncludeNotFound {
                path: "wf.yml".into(),
                reason: "no such file".into()
            }
        );
    }

    #[test]
    fn test_invariant_errors_are_not_attributed_to_includes() {
        let loader = MemoryLoader::new()
            .with_source(
                "wf.yml",
                "id: w1\nname: Demo\nentry_graph_id: nope\ngraphs:\n  - !include g1.yml\n",
            )
            .with_source(
                "g1.yml",
                "id: g1\nname: G\nnodes:\n  - id: n1\n    name: N\n    type: action\n",
            );

        let err = parse_workflow("wf.yml", &loader).unwrap_err();
        assert!(err.include_chain().is_empty());
        assert_eq!(err.stage(), ParseStage::Binding);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(ParseStage::Structuring.to_string(), "structuring");
        assert_eq!(ParseStage::Done.to_string(), "done");
    }
}

//! Include resolution
//!
//! Replaces every `Include` node with the scanned, structured and resolved
//! content of the file it names. Resolution is depth-first and sequential;
//! the chain of files from the root to the current include is tracked
//! explicitly for cycle detection and error reporting.
//!
//! An included file is parsed with the nesting budget left at its include
//! site, so splicing never produces a tree deeper than the root parse
//! would have accepted.

use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::loader::Loader;
use super::path::{base_dir, normalize, resolve_include_path};
use crate::error::{ParseError, Result};
use crate::options::ParseOptions;
use crate::syntax::{parse_source_with, DocumentNode, Scalar};

/// Document tree with every include replaced by its content
///
/// `Spliced` marks the root of content that came from another file. It is
/// transparent for shape queries (`kind`, `get`, `as_scalar`) and only used
/// to attribute later errors to the file they occurred in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedNode {
    Mapping(Vec<(String, ResolvedNode)>),
    Sequence(Vec<ResolvedNode>),
    Scalar(Scalar),
    Spliced {
        source: PathBuf,
        node: Box<ResolvedNode>,
    },
}

impl ResolvedNode {
    /// The node with all `Spliced` layers removed
    pub fn content(&self) -> &ResolvedNode {
        match self {
            ResolvedNode::Spliced { node, .. } => node.content(),
            other => other,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self.content() {
            ResolvedNode::Mapping(_) => "mapping",
            ResolvedNode::Sequence(_) => "sequence",
            ResolvedNode::Scalar(scalar) if scalar.is_blank() => "empty value",
            _ => "scalar",
        }
    }

    pub fn get(&self, key: &str) -> Option<&ResolvedNode> {
        match self.content() {
            ResolvedNode::Mapping(entries) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self.content() {
            ResolvedNode::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Files spliced anywhere in this tree, in document order
    pub fn sources(&self) -> Vec<&Path> {
        let mut sources = Vec::new();
        self.collect_sources(&mut sources);
        sources
    }

    fn collect_sources<'a>(&'a self, out: &mut Vec<&'a Path>) {
        match self {
            ResolvedNode::Mapping(entries) => {
                entries.iter().for_each(|(_, v)| v.collect_sources(out))
            }
            ResolvedNode::Sequence(items) => items.iter().for_each(|v| v.collect_sources(out)),
            ResolvedNode::Scalar(_) => {}
            ResolvedNode::Spliced { source, node } => {
                out.push(source);
                node.collect_sources(out);
            }
        }
    }
}

impl From<ResolvedNode> for DocumentNode {
    fn from(node: ResolvedNode) -> Self {
        match node {
            ResolvedNode::Mapping(entries) => DocumentNode::Mapping(
                entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
            ResolvedNode::Sequence(items) => {
                DocumentNode::Sequence(items.into_iter().map(Into::into).collect())
            }
            ResolvedNode::Scalar(scalar) => DocumentNode::Scalar(scalar),
            ResolvedNode::Spliced { node, .. } => (*node).into(),
        }
    }
}

/// Resolve every include in `doc`, which was read from `source`
///
/// Relative include paths are taken relative to the directory of the file
/// containing them.
pub fn resolve<L>(
    doc: DocumentNode,
    source: &Path,
    loader: &L,
    options: &ParseOptions,
) -> Result<ResolvedNode>
where
    L: Loader + ?Sized,
{
    let root = normalize(source);
    let mut resolver = Resolver {
        loader,
        options,
        chain: vec![root.clone()],
    };
    resolver.resolve_node(doc, base_dir(&root), 0)
}

struct Resolver<'a, L: ?Sized> {
    loader: &'a L,
    options: &'a ParseOptions,
    chain: Vec<PathBuf>,
}

impl<L> Resolver<'_, L>
where
    L: Loader + ?Sized,
{
    /// `depth` counts the containers enclosing `node`, across files
    fn resolve_node(
        &mut self,
        node: DocumentNode,
        dir: &Path,
        depth: usize,
    ) -> Result<ResolvedNode> {
        match node {
            DocumentNode::Mapping(entries) => entries
                .into_iter()
                .map(|(key, value)| Ok((key, self.resolve_node(value, dir, depth + 1)?)))
                .collect::<Result<Vec<_>>>()
                .map(ResolvedNode::Mapping),
            DocumentNode::Sequence(items) => items
                .into_iter()
                .map(|item| self.resolve_node(item, dir, depth + 1))
                .collect::<Result<Vec<_>>>()
                .map(ResolvedNode::Sequence),
            DocumentNode::Scalar(scalar) => Ok(ResolvedNode::Scalar(scalar)),
            DocumentNode::Include(raw) => self.include(&raw, dir, depth),
        }
    }

    fn include(&mut self, raw: &str, dir: &Path, depth: usize) -> Result<ResolvedNode> {
        let target = resolve_include_path(dir, raw);

        if self.chain.contains(&target) {
            let mut chain = self.chain.clone();
            chain.push(target);
            return Err(ParseError::CircularInclude { chain });
        }
        if self.chain.len() >= self.options.max_include_depth {
            let mut chain = self.chain.clone();
            chain.push(target);
            return Err(ParseError::IncludeDepthExceeded {
                limit: self.options.max_include_depth,
                chain,
            });
        }

        debug!(path = %target.display(), depth = self.chain.len(), "loading include");
        let text = self
            .loader
            .load(&target)
            .map_err(|e| ParseError::IncludeNotFound {
                path: target.clone(),
                reason: e.to_string(),
            })?;

        self.chain.push(target.clone());
        let result = self.splice(&text, &target, depth);
        self.chain.pop();

        match result {
            Ok(node) => Ok(ResolvedNode::Spliced {
                source: target,
                node: Box::new(node),
            }),
            Err(err @ ParseError::CircularInclude { .. })
            | Err(err @ ParseError::IncludeDepthExceeded { .. }) => Err(err),
            Err(cause) => Err(ParseError::IncludeParseError {
                path: target,
                cause: Box::new(cause),
            }),
        }
    }

    fn splice(&mut self, text: &str, target: &Path, depth: usize) -> Result<ResolvedNode> {
        trace!(path = %target.display(), depth, "scanning included file");
        let budget = self.options.max_nesting_depth.saturating_sub(depth);
        let doc = parse_source_with(text, &self.options.with_max_nesting_depth(budget))?;
        self.resolve_node(doc, base_dir(target), depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::include::MemoryLoader;
    use crate::syntax::parse_source;

    fn resolve_with(loader: &MemoryLoader, root: &str) -> Result<ResolvedNode> {
        let text = loader.load(Path::new(root)).unwrap();
        resolve(
            parse_source(&text)?,
            Path::new(root),
            loader,
            &ParseOptions::default(),
        )
    }

    #[test]
    fn test_no_include_identity() {
        let doc = parse_source("id: w1\ngraphs:\n  - id: g1\n    nodes:\n      -\n").unwrap();
        let resolved = resolve(
            doc.clone(),
            Path::new("wf.yml"),
            &MemoryLoader::new(),
            &ParseOptions::default(),
        )
        .unwrap();
        assert!(resolved.sources().is_empty());
        assert_eq!(DocumentNode::from(resolved), doc);
    }

    #[test]
    fn test_splices_in_place() {
        let loader = MemoryLoader::new()
            .with_source("wf.yml", "graphs:\n  - !include graphs/g1.yml\n")
            .with_source("graphs/g1.yml", "id: g1\nnodes: !include nodes.yml\n")
            .with_source("graphs/nodes.yml", "- id: n1\n- id: n2\n");

        let resolved = resolve_with(&loader, "wf.yml").unwrap();
        assert_eq!(
            resolved.sources(),
            vec![Path::new("graphs/g1.yml"), Path::new("graphs/nodes.yml")]
        );

        let graph = match resolved.get("graphs").map(ResolvedNode::content) {
            Some(ResolvedNode::Sequence(items)) => &items[0],
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(graph.kind(), "mapping");
        assert_eq!(graph.get("nodes").map(ResolvedNode::kind), Some("sequence"));

        let expected = parse_source(
            "graphs:\n  - id: g1\n    nodes:\n      - id: n1\n      - id: n2\n",
        )
        .unwrap();
        assert_eq!(DocumentNode::from(resolved), expected);
    }

    #[test]
    fn test_circular_include() {
        let loader = MemoryLoader::new()
            .with_source("a.yml", "x: !include b.yml\n")
            .with_source("b.yml", "y: !include a.yml\n");

        let err = resolve_with(&loader, "a.yml").unwrap_err();
        assert_eq!(
            err,
            ParseError::CircularInclude {
                chain: vec!["a.yml".into(), "b.yml".into(), "a.yml".into()]
            }
        );
    }

    #[test]
    fn test_self_include() {
        let loader = MemoryLoader::new().with_source("a.yml", "- !include ./a.yml\n");
        let err = resolve_with(&loader, "a.yml").unwrap_err();
        assert_eq!(
            err,
            ParseError::CircularInclude {
                chain: vec!["a.yml".into(), "a.yml".into()]
            }
        );
    }

    #[test]
    fn test_diamond_is_not_a_cycle() {
        let loader = MemoryLoader::new()
            .with_source("wf.yml", "left: !include l.yml\nright: !include r.yml\n")
            .with_source("l.yml", "common: !include common.yml\n")
            .with_source("r.yml", "common: !include common.yml\n")
            .with_source("common.yml", "value: 1\n");

        let resolved = resolve_with(&loader, "wf.yml").unwrap();
        assert_eq!(resolved.sources().len(), 4);
    }

    #[test]
    fn test_depth_limit() {
        let loader = MemoryLoader::new()
            .with_source("0.yml", "next: !include 1.yml\n")
            .with_source("1.yml", "next: !include 2.yml\n")
            .with_source("2.yml", "next: !include 3.yml\n")
            .with_source("3.yml", "end: true\n");

        let doc = parse_source("next: !include 1.yml\n").unwrap();
        let options = ParseOptions::default().with_max_include_depth(3);
        let err = resolve(doc.clone(), Path::new("0.yml"), &loader, &options).unwrap_err();
        assert_eq!(
            err,
            ParseError::IncludeDepthExceeded {
                limit: 3,
                chain: vec![
                    "0.yml".into(),
                    "1.yml".into(),
                    "2.yml".into(),
                    "3.yml".into()
                ]
            }
        );

        let options = options.with_max_include_depth(4);
        assert!(resolve(doc, Path::new("0.yml"), &loader, &options).is_ok());
    }

    #[test]
    fn test_missing_include() {
        let loader = MemoryLoader::new().with_source("wf.yml", "graphs:\n  - !include gone.yml\n");
        let err = resolve_with(&loader, "wf.yml").unwrap_err();
        assert_eq!(
            err,
            ParseError::IncludeNotFound {
                path: "gone.yml".into(),
                reason: "no such file".into()
            }
        );
    }

    #[test]
    fn test_nested_failures_are_wrapped_per_level() {
        let loader = MemoryLoader::new()
            .with_source("wf.yml", "g: !include g1.yml\n")
            .with_source("g1.yml", "n: !include sub/n.yml\n")
            .with_source("sub/n.yml", "id: 'broken\n");

        let err = resolve_with(&loader, "wf.yml").unwrap_err();
        assert_eq!(
            err.include_chain(),
            vec![Path::new("g1.yml"), Path::new("sub/n.yml")]
        );
        assert!(matches!(err.root_cause(), ParseError::UnterminatedQuote { .. }));
    }

    #[test]
    fn test_missing_include_inside_include_is_wrapped() {
        let loader = MemoryLoader::new()
            .with_source("wf.yml", "g: !include g1.yml\n")
            .with_source("g1.yml", "n: !include gone.yml\n");

        let err = resolve_with(&loader, "wf.yml").unwrap_err();
        assert_eq!(err.include_chain(), vec![Path::new("g1.yml")]);
        assert!(matches!(err.root_cause(), ParseError::IncludeNotFound { .. }));
    }

    #[test]
    fn test_cycle_deep_in_chain_is_not_wrapped() {
        let loader = MemoryLoader::new()
            .with_source("wf.yml", "g: !include a.yml\n")
            .with_source("a.yml", "g: !include b.yml\n")
            .with_source("b.yml", "g: !include a.yml\n");

        let err = resolve_with(&loader, "wf.yml").unwrap_err();
        assert_eq!(
            err,
            ParseError::CircularInclude {
                chain: vec![
                    "wf.yml".into(),
                    "a.yml".into(),
                    "b.yml".into(),
                    "a.yml".into()
                ]
            }
        );
    }

    #[test]
    fn test_nesting_budget_spans_includes() {
        let loader = MemoryLoader::new()
            .with_source("wf.yml", "a:\n  b: !include x.yml\n")
            .with_source("x.yml", "c: d\n");
        let options = ParseOptions::default().with_max_nesting_depth(3);
        let doc = parse_source("a:\n  b: !include x.yml\n").unwrap();
        assert!(resolve(doc.clone(), Path::new("wf.yml"), &loader, &options).is_ok());

        let loader = loader.with_source("x.yml", "c:\n  d: e\n");
        let err = resolve(doc, Path::new("wf.yml"), &loader, &options).unwrap_err();
        assert_eq!(err.include_chain(), vec![Path::new("x.yml")]);
        assert!(matches!(
            err.root_cause(),
            ParseError::SyntaxError { position, ref expected, .. }
                if position.line == 2 && expected == "nesting depth <= 1"
        ));
    }

    #[test]
    fn test_nested_include_chain_cannot_exceed_nesting_limit() {
        // Two levels per file, well inside the include limit
        let mut loader = MemoryLoader::new();
        for i in 0..20 {
            loader.insert(format!("{i}.yml"), format!("k:\n  v: !include {}.yml\n", i + 1));
        }
        loader.insert("20.yml", "end: true\n");

        let options = ParseOptions::default().with_max_nesting_depth(10);
        let doc = parse_source(&loader.load(Path::new("0.yml")).unwrap()).unwrap();
        let err = resolve(doc, Path::new("0.yml"), &loader, &options).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            ParseError::SyntaxError { ref expected, .. } if expected.starts_with("nesting depth")
        ));
        assert_eq!(err.include_chain().len(), 5);
    }
}

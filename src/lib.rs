//! flowdef - workflow definition parser with `!include` composition

pub mod error;
pub mod include;
pub mod options;
pub mod schema;
pub mod syntax;
pub mod variables;
pub mod workflow;

pub use error::{FixSuggestion, ParseError, Result};
pub use include::{resolve, CachingLoader, FsLoader, LoadError, Loader, MemoryLoader, ResolvedNode};
pub use options::{ParseOptions, DEFAULT_MAX_INCLUDE_DEPTH, DEFAULT_MAX_NESTING_DEPTH};
pub use schema::{bind, check_invariants, EdgeDef, GraphDef, KeyPath, NodeDef, Parameters, PathSegment, WorkflowDef};
pub use syntax::{
    parse_document, parse_document_with, parse_source, parse_source_with, scan, tokenize,
    DocumentNode, Position, Scalar, Token, TokenKind,
};
pub use variables::{apply_env_overrides, apply_overrides, DEFAULT_ENV_PREFIX};
pub use workflow::{parse_str, parse_workflow, parse_workflow_with, ParseStage};

//! Error types with fix suggestions
//!
//! Error code ranges:
//! - FLOW-001-009: Lexical errors (scanner, value parser)
//! - FLOW-010-019: Structural errors
//! - FLOW-020-029: Include errors
//! - FLOW-030-039: Schema errors

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::schema::KeyPath;
use crate::syntax::Position;
use crate::workflow::ParseStage;

pub type Result<T> = std::result::Result<T, ParseError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

fn quote_name(quote: &char) -> &'static str {
    if *quote == '\'' {
        "single"
    } else {
        "double"
    }
}

/// Every failure of a parse call
///
/// Failures inside included files are wrapped in `IncludeParseError` once
/// per inclusion level, so reading the error outward-in walks the chain of
/// files that led to it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    // ─────────────────────────────────────────────────────────────
    // Lexical errors (FLOW-001 to FLOW-003)
    // ─────────────────────────────────────────────────────────────
    #[error("[FLOW-001] Unexpected character {character:?} at {position}")]
    UnexpectedCharacter { position: Position, character: char },

    #[error("[FLOW-002] Malformed indentation at {position}: {reason}")]
    MalformedIndentation { position: Position, reason: String },

    #[error("[FLOW-003] Unterminated {} quote opened at {position}", quote_name(.quote))]
    UnterminatedQuote { position: Position, quote: char },

    // ─────────────────────────────────────────────────────────────
    // Structural errors (FLOW-010)
    // ─────────────────────────────────────────────────────────────
    #[error("[FLOW-010] Syntax error at {position}: expected {expected}, found {found}")]
    SyntaxError {
        position: Position,
        expected: String,
        found: String,
    },

    // ─────────────────────────────────────────────────────────────
    // Include errors (FLOW-020 to FLOW-023)
    // ─────────────────────────────────────────────────────────────
    #[error("[FLOW-020] Circular include: {}", format_chain(.chain))]
    CircularInclude { chain: Vec<PathBuf> },

    #[error("[FLOW-021] Cannot load '{}': {reason}", .path.display())]
    IncludeNotFound { path: PathBuf, reason: String },

    #[error("[FLOW-022] In included file '{}': {cause}", .path.display())]
    IncludeParseError { path: PathBuf, cause: Box<ParseError> },

    #[error("[FLOW-023] Include depth limit of {limit} exceeded: {}", format_chain(.chain))]
    IncludeDepthExceeded { limit: usize, chain: Vec<PathBuf> },

    // ─────────────────────────────────────────────────────────────
    // Schema errors (FLOW-030)
    // ─────────────────────────────────────────────────────────────
    #[error("[FLOW-030] Schema error at {path}: expected {expected}, found {found}")]
    SchemaError {
        path: KeyPath,
        expected: String,
        found: String,
    },
}

impl ParseError {
    /// Stage of the pipeline the innermost failure happened in
    pub fn stage(&self) -> ParseStage {
        match self {
            ParseError::UnexpectedCharacter { .. }
            | ParseError::MalformedIndentation { .. }
            | ParseError::UnterminatedQuote { .. } => ParseStage::Scanning,
            ParseError::SyntaxError { .. } => ParseStage::Structuring,
            ParseError::CircularInclude { .. }
            | ParseError::IncludeNotFound { .. }
            | ParseError::IncludeDepthExceeded { .. } => ParseStage::Resolving,
            ParseError::IncludeParseError { cause, .. } => cause.stage(),
            ParseError::SchemaError { .. } => ParseStage::Binding,
        }
    }

    /// Files the failure was nested in, outermost first
    pub fn include_chain(&self) -> Vec<&Path> {
        let mut chain = Vec::new();
        let mut current = self;
        while let ParseError::IncludeParseError { path, cause } = current {
            chain.push(path.as_path());
            current = cause.as_ref();
        }
        chain
    }

    /// The failure with every `IncludeParseError` layer removed
    pub fn root_cause(&self) -> &ParseError {
        match self {
            ParseError::IncludeParseError { cause, .. } => cause.root_cause(),
            other => other,
        }
    }

    /// Source position, for errors that have one
    pub fn position(&self) -> Option<Position> {
        match self.root_cause() {
            ParseError::UnexpectedCharacter { position, .. }
            | ParseError::MalformedIndentation { position, .. }
            | ParseError::UnterminatedQuote { position, .. }
            | ParseError::SyntaxError { position, .. } => Some(*position),
            _ => None,
        }
    }

    pub(crate) fn schema(path: &KeyPath, expected: impl Into<String>, found: impl Into<String>) -> Self {
        ParseError::SchemaError {
            path: path.clone(),
            expected: expected.into(),
            found: found.into(),
        }
    }
}

impl FixSuggestion for ParseError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            ParseError::UnexpectedCharacter { .. } => {
                Some("Quote the value; flow collections, anchors, block scalars and tags other than !include are not supported")
            }
            ParseError::MalformedIndentation { .. } => {
                Some("Indent with spaces only and align each line with an enclosing block")
            }
            ParseError::UnterminatedQuote { .. } => {
                Some("Close the quote on the same line")
            }
            ParseError::SyntaxError { expected, .. } if expected.starts_with("nesting depth") => {
                Some("Flatten the structure or raise --max-nesting-depth")
            }
            ParseError::SyntaxError { .. } => {
                Some("Check indentation: keys and '-' items cannot share one level")
            }
            ParseError::CircularInclude { .. } => {
                Some("Remove one of the !include directives forming the cycle")
            }
            ParseError::IncludeNotFound { .. } => {
                Some("Check the path; relative paths resolve against the including file's directory")
            }
            ParseError::IncludeParseError { cause, .. } => cause.fix_suggestion(),
            ParseError::IncludeDepthExceeded { .. } => {
                Some("Flatten the include hierarchy or raise --max-include-depth")
            }
            ParseError::SchemaError { .. } => {
                Some("Workflows need id, name, graphs; graphs need id, name, nodes; nodes need id, name, type")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_error() -> ParseError {
        ParseError::schema(&KeyPath::root().key("graphs"), "sequence", "scalar")
    }

    #[test]
    fn test_messages_carry_codes() {
        let err = ParseError::UnterminatedQuote {
            position: Position::new(2, 7, 12),
            quote: '\'',
        };
        assert_eq!(
            err.to_string(),
            "[FLOW-003] Unterminated single quote opened at line 2, column 7"
        );

        let err = ParseError::CircularInclude {
            chain: vec!["a.yml".into(), "b.yml".into(), "a.yml".into()],
        };
        assert_eq!(
            err.to_string(),
            "[FLOW-020] Circular include: a.yml -> b.yml -> a.yml"
        );

        assert_eq!(
            schema_error().to_string(),
            "[FLOW-030] Schema error at graphs: expected sequence, found scalar"
        );
    }

    #[test]
    fn test_nested_include_error() {
        let err = ParseError::IncludeParseError {
            path: "graphs/g1.yml".into(),
            cause: Box::new(ParseError::IncludeParseError {
                path: "graphs/nodes.yml".into(),
                cause: Box::new(ParseError::SyntaxError {
                    position: Position::new(4, 3, 30),
                    expected: "mapping key".to_string(),
                    found: "list marker '-'".to_string(),
                }),
            }),
        };

        assert_eq!(
            err.include_chain(),
            vec![Path::new("graphs/g1.yml"), Path::new("graphs/nodes.yml")]
        );
        assert!(matches!(err.root_cause(), ParseError::SyntaxError { .. }));
        assert_eq!(err.stage(), ParseStage::Structuring);
        assert_eq!(err.position(), Some(Position::new(4, 3, 30)));
        assert!(err.to_string().starts_with(
            "[FLOW-022] In included file 'graphs/g1.yml': [FLOW-022] In included file 'graphs/nodes.yml': [FLOW-010]"
        ));
        assert_eq!(
            err.fix_suggestion(),
            Some("Check indentation: keys and '-' items cannot share one level")
        );
    }

    #[test]
    fn test_nesting_limit_suggestion() {
        let err = ParseError::SyntaxError {
            position: Position::new(65, 65, 2144),
            expected: "nesting depth <= 64".to_string(),
            found: "block at depth 65".to_string(),
        };
        assert_eq!(
            err.fix_suggestion(),
            Some("Flatten the structure or raise --max-nesting-depth")
        );
    }

    #[test]
    fn test_stages() {
        assert_eq!(schema_error().stage(), ParseStage::Binding);
        assert_eq!(
            ParseError::IncludeNotFound {
                path: "x.yml".into(),
                reason: "missing".into()
            }
            .stage(),
            ParseStage::Resolving
        );
        assert_eq!(
            ParseError::MalformedIndentation {
                position: Position::start(),
                reason: "tab".into()
            }
            .stage(),
            ParseStage::Scanning
        );
    }

    #[test]
    fn test_errors_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ParseError>();
    }
}

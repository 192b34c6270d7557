//! Lexical tokens produced by the scanner

use std::fmt;

use super::document::Scalar;

/// Location in a source text
///
/// `line` and `column` are 1-based (column counts chars), `offset` is the
/// 0-based byte offset into the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    /// Position of the first byte of a source
    pub fn start() -> Self {
        Self::new(1, 1, 0)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Token kinds for the indentation-aware scanner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `name:` at the start of a line or list item
    Key(String),
    /// A quoted or unquoted value
    Scalar(Scalar),
    /// `-` opening a sequence element
    ListMarker,
    /// `!include <path>`, path already unquoted and trimmed
    IncludeTag(String),
    Indent,
    Dedent,
    Newline,
    EndOfInput,
}

impl TokenKind {
    /// Short human description, used in syntax error messages
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Key(key) => format!("key '{}'", key),
            TokenKind::Scalar(scalar) => format!("value '{}'", scalar.value),
            TokenKind::ListMarker => "list marker '-'".to_string(),
            TokenKind::IncludeTag(path) => format!("!include '{}'", path),
            TokenKind::Indent => "indented block".to_string(),
            TokenKind::Dedent => "end of block".to_string(),
            TokenKind::Newline => "end of line".to_string(),
            TokenKind::EndOfInput => "end of input".to_string(),
        }
    }
}

/// A token with the position of its first character
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Self {
        Self { kind, position }
    }
}

//! Syntax layer: text to generic document tree
//!
//! - `scanner`: indentation-aware tokens
//! - `value`: quoted and bare scalars
//! - `parser`: recursive descent into `DocumentNode`

pub mod document;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod value;

pub use document::{DocumentNode, Scalar};
pub use parser::{
    parse_document, parse_document_with, parse_source, parse_source_with, parse_tokens,
};
pub use scanner::{scan, tokenize, Scanner};
pub use token::{Position, Token, TokenKind};

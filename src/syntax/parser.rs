//! Structural parser: tokens to a `DocumentNode` tree
//!
//! Recursive descent over indentation levels. The first token of a line
//! decides whether it is a mapping entry (`Key`) or a sequence element
//! (`ListMarker`); one level never mixes both, except that a sequence may
//! start at its key's own column right after a bare `key:`.
//!
//! Every nested block counts against `ParseOptions::max_nesting_depth`; a
//! block past the limit is a `SyntaxError`, raised before recursing.

use super::document::DocumentNode;
use super::scanner::tokenize;
use super::token::{Position, Token, TokenKind};
use crate::error::{ParseError, Result};
use crate::options::ParseOptions;

/// Parse a complete document from a token stream
///
/// Lexical errors inside the stream surface as soon as the parser reaches
/// them, so a lazy `Scanner` can be passed directly.
pub fn parse_document<I>(tokens: I) -> Result<DocumentNode>
where
    I: IntoIterator<Item = Result<Token>>,
{
    parse_document_with(tokens, &ParseOptions::default())
}

/// `parse_document` with explicit limits
pub fn parse_document_with<I>(tokens: I, options: &ParseOptions) -> Result<DocumentNode>
where
    I: IntoIterator<Item = Result<Token>>,
{
    Parser::new(tokens.into_iter(), options.max_nesting_depth).document()
}

/// Parse an already scanned token list
pub fn parse_tokens(tokens: Vec<Token>) -> Result<DocumentNode> {
    parse_document(tokens.into_iter().map(Ok))
}

/// Scan then parse, as two complete passes
pub fn parse_source(src: &str) -> Result<DocumentNode> {
    parse_source_with(src, &ParseOptions::default())
}

/// `parse_source` with explicit limits
pub fn parse_source_with(src: &str, options: &ParseOptions) -> Result<DocumentNode> {
    parse_document_with(tokenize(src)?.into_iter().map(Ok), options)
}

struct Parser<I> {
    tokens: I,
    lookahead: Option<Token>,
    last_position: Position,
    depth: usize,
    max_depth: usize,
}

impl<I> Parser<I>
where
    I: Iterator<Item = Result<Token>>,
{
    fn new(tokens: I, max_depth: usize) -> Self {
        Self {
            tokens,
            lookahead: None,
            last_position: Position::start(),
            depth: 0,
            max_depth,
        }
    }

    fn fetch(&mut self) -> Result<Token> {
        let token = match self.tokens.next() {
            Some(token) => token?,
            // A stream that ends early behaves as if it were terminated
            None => Token::new(TokenKind::EndOfInput, self.last_position),
        };
        self.last_position = token.position;
        Ok(token)
    }

    fn peek(&mut self) -> Result<&Token> {
        let token = match self.lookahead.take() {
            Some(token) => token,
            None => self.fetch()?,
        };
        Ok(self.lookahead.insert(token))
    }

    fn peek_kind(&mut self) -> Result<&TokenKind> {
        self.peek().map(|token| &token.kind)
    }

    fn bump(&mut self) -> Result<Token> {
        match self.lookahead.take() {
            Some(token) => Ok(token),
            None => self.fetch(),
        }
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= self.max_depth {
            let position = self.peek()?.position;
            return Err(ParseError::SyntaxError {
                position,
                expected: format!("nesting depth <= {}", self.max_depth),
                found: format!("block at depth {}", self.depth + 1),
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn document(&mut self) -> Result<DocumentNode> {
        let node = match self.peek_kind()? {
            TokenKind::EndOfInput => DocumentNode::blank(),
            TokenKind::Indent => {
                self.bump()?;
                let node = self.block()?;
                self.expect_dedent()?;
                node
            }
            _ => self.block()?,
        };

        let token = self.bump()?;
        match token.kind {
            TokenKind::EndOfInput => Ok(node),
            other => Err(syntax_error(token.position, "end of input", &other)),
        }
    }

    /// Mapping, sequence, or a single value on its own line
    fn block(&mut self) -> Result<DocumentNode> {
        self.nested(Self::block_content)
    }

    fn block_content(&mut self) -> Result<DocumentNode> {
        match self.peek_kind()? {
            TokenKind::Key(_) => self.mapping(),
            TokenKind::ListMarker => self.sequence(),
            _ => {
                let token = self.bump()?;
                let node = match token.kind {
                    TokenKind::Scalar(scalar) => DocumentNode::Scalar(scalar),
                    TokenKind::IncludeTag(path) => include(path, token.position)?,
                    other => {
                        return Err(syntax_error(
                            token.position,
                            "mapping, sequence or value",
                            &other,
                        ))
                    }
                };
                self.expect_newline()?;
                Ok(node)
            }
        }
    }

    fn mapping(&mut self) -> Result<DocumentNode> {
        let mut entries: Vec<(String, DocumentNode)> = Vec::new();
        loop {
            let token = self.bump()?;
            let key = match token.kind {
                TokenKind::Key(key) => key,
                other => return Err(syntax_error(token.position, "mapping key", &other)),
            };
            if entries.iter().any(|(existing, _)| *existing == key) {
                return Err(ParseError::SyntaxError {
                    position: token.position,
                    expected: "unique key".to_string(),
                    found: format!("duplicate key '{}'", key),
                });
            }

            let value = self.entry_value()?;
            entries.push((key, value));

            match self.peek_kind()? {
                TokenKind::Key(_) => continue,
                TokenKind::Dedent | TokenKind::EndOfInput => break,
                _ => {
                    let token = self.bump()?;
                    return Err(syntax_error(token.position, "mapping key", &token.kind));
                }
            }
        }
        Ok(DocumentNode::Mapping(entries))
    }

    /// Whatever follows `key:`
    fn entry_value(&mut self) -> Result<DocumentNode> {
        let token = self.bump()?;
        match token.kind {
            TokenKind::Scalar(scalar) => {
                self.expect_newline()?;
                Ok(DocumentNode::Scalar(scalar))
            }
            TokenKind::IncludeTag(path) => {
                let node = include(path, token.position)?;
                self.expect_newline()?;
                Ok(node)
            }
            TokenKind::Newline => match self.peek_kind()? {
                TokenKind::ListMarker => self.nested(Self::compact_sequence),
                _ => self.nested_or_blank(),
            },
            other => Err(syntax_error(token.position, "value", &other)),
        }
    }

    /// Sequence written at its key's column: `key:` then `- item` lines.
    /// The next key at that column closes it.
    fn compact_sequence(&mut self) -> Result<DocumentNode> {
        let mut items = Vec::new();
        loop {
            items.push(self.sequence_item()?);
            match self.peek_kind()? {
                TokenKind::ListMarker => continue,
                TokenKind::Key(_) | TokenKind::Dedent | TokenKind::EndOfInput => break,
                _ => {
                    let token = self.bump()?;
                    return Err(syntax_error(token.position, "list marker '-'", &token.kind));
                }
            }
        }
        Ok(DocumentNode::Sequence(items))
    }

    fn sequence(&mut self) -> Result<DocumentNode> {
        let mut items = Vec::new();
        loop {
            items.push(self.sequence_item()?);

            match self.peek_kind()? {
                TokenKind::ListMarker => continue,
                TokenKind::Dedent | TokenKind::EndOfInput => break,
                _ => {
                    let token = self.bump()?;
                    return Err(syntax_error(token.position, "list marker '-'", &token.kind));
                }
            }
        }
        Ok(DocumentNode::Sequence(items))
    }

    /// `-` and the item it introduces
    fn sequence_item(&mut self) -> Result<DocumentNode> {
        let token = self.bump()?;
        if token.kind != TokenKind::ListMarker {
            return Err(syntax_error(token.position, "list marker '-'", &token.kind));
        }

        match self.peek_kind()? {
            TokenKind::Indent => {
                self.bump()?;
                let node = self.block()?;
                self.expect_dedent()?;
                Ok(node)
            }
            TokenKind::Newline => {
                self.bump()?;
                self.nested_or_blank()
            }
            _ => {
                let token = self.bump()?;
                Err(syntax_error(token.position, "sequence item", &token.kind))
            }
        }
    }

    /// After a line break: an indented block, or nothing at all
    fn nested_or_blank(&mut self) -> Result<DocumentNode> {
        if *self.peek_kind()? != TokenKind::Indent {
            return Ok(DocumentNode::blank());
        }
        self.bump()?;
        let node = self.block()?;
        self.expect_dedent()?;
        Ok(node)
    }

    fn expect_newline(&mut self) -> Result<()> {
        let token = self.bump()?;
        match token.kind {
            TokenKind::Newline => Ok(()),
            other => Err(syntax_error(token.position, "end of line", &other)),
        }
    }

    fn expect_dedent(&mut self) -> Result<()> {
        let token = self.bump()?;
        match token.kind {
            TokenKind::Dedent => Ok(()),
            other => Err(syntax_error(token.position, "end of block", &other)),
        }
    }
}

fn include(path: String, position: Position) -> Result<DocumentNode> {
    if path.is_empty() {
        return Err(ParseError::SyntaxError {
            position,
            expected: "include path".to_string(),
            found: "end of line".to_string(),
        });
    }
    Ok(DocumentNode::Include(path))
}

fn syntax_error(position: Position, expected: &str, found: &TokenKind) -> ParseError {
    ParseError::SyntaxError {
        position,
        expected: expected.to_string(),
        found: found.describe(),
    }
}

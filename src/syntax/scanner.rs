//! Indentation-aware scanner
//!
//! Produces tokens lazily, one source line at a time. Leading spaces are
//! compared against an indentation stack: deeper lines push one `Indent`,
//! shallower lines pop one `Dedent` per closed level. Content after a list
//! marker opens a level at its own column, so
//!
//! ```yaml
//! - id: n1
//!   name: Node1
//! ```
//!
//! scans as `ListMarker Indent Key Scalar Newline Key Scalar Newline Dedent`.

use std::collections::VecDeque;

use super::token::{Position, Token, TokenKind};
use super::value::{parse_bare, parse_quoted, parse_value, SourceLine};
use crate::error::{ParseError, Result};

const INCLUDE_TAG: &str = "!include";

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Characters that start YAML constructs outside the supported subset
const UNSUPPORTED: &[char] = &['[', ']', '{', '}', '&', '*', '|', '>', '%', '@', '`'];

/// Lazy token stream over a source text
///
/// Yields `Err` at most once; the stream is fused afterwards.
pub struct Scanner<'a> {
    src: &'a str,
    /// Byte offset of the next unscanned line
    offset: usize,
    /// Number of the next unscanned line
    line: usize,
    indents: Vec<usize>,
    pending: VecDeque<Token>,
    finished: bool,
}

/// Start scanning `src`
pub fn scan(src: &str) -> Scanner<'_> {
    Scanner::new(src)
}

/// Scan `src` completely
pub fn tokenize(src: &str) -> Result<Vec<Token>> {
    scan(src).collect()
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            offset: content_start(src),
            line: 1,
            indents: vec![0],
            pending: VecDeque::new(),
            finished: false,
        }
    }

    fn emit(&mut self, kind: TokenKind, position: Position) {
        self.pending.push_back(Token::new(kind, position));
    }

    /// Scan the next line, or close all levels at end of input
    fn fill(&mut self) -> Result<()> {
        if self.offset >= self.src.len() {
            let position = self.end_position();
            while self.indents.len() > 1 {
                self.indents.pop();
                self.emit(TokenKind::Dedent, position);
            }
            self.emit(TokenKind::EndOfInput, position);
            self.finished = true;
            return Ok(());
        }

        let start = self.offset;
        let (end, next) = match self.src[start..].find('\n') {
            Some(len) => (start + len, start + len + 1),
            None => (self.src.len(), self.src.len()),
        };
        let end = if self.src[start..end].ends_with('\r') {
            end - 1
        } else {
            end
        };
        let line = SourceLine {
            src: self.src,
            number: self.line,
            start,
            end,
        };
        self.offset = next;
        self.line += 1;

        self.scan_line(&line)
    }

    fn end_position(&self) -> Position {
        let line_start = self
            .src
            .rfind('\n')
            .map_or(content_start(self.src), |i| i + 1);
        let last = SourceLine {
            src: self.src,
            number: self.src.matches('\n').count() + 1,
            start: line_start,
            end: self.src.len(),
        };
        last.position(self.src.len())
    }

    fn scan_line(&mut self, line: &SourceLine<'a>) -> Result<()> {
        // Blank and comment-only lines carry no structure
        if line.is_exhausted(line.start) {
            return Ok(());
        }

        let text = line.text();
        let spaces = text.len() - text.trim_start_matches(' ').len();
        if text[spaces..].starts_with('\t') {
            return Err(ParseError::MalformedIndentation {
                position: line.position(line.start + spaces),
                reason: "tab character in indentation".to_string(),
            });
        }

        let content = line.start + spaces;
        self.indent_to(spaces, line.position(content))?;
        self.scan_content(line, content)?;
        self.emit(TokenKind::Newline, line.position(line.end));
        Ok(())
    }

    fn indent_to(&mut self, column: usize, position: Position) -> Result<()> {
        let top = self.current_indent();
        if column > top {
            self.indents.push(column);
            self.emit(TokenKind::Indent, position);
            return Ok(());
        }

        while column < self.current_indent() {
            self.indents.pop();
            self.emit(TokenKind::Dedent, position);
        }
        if column != self.current_indent() {
            return Err(ParseError::MalformedIndentation {
                position,
                reason: format!(
                    "dedent to column {} matches no enclosing block (expected column {})",
                    column + 1,
                    self.current_indent() + 1
                ),
            });
        }
        Ok(())
    }

    fn current_indent(&self) -> usize {
        self.indents.last().copied().unwrap_or(0)
    }

    /// List markers, then one entry
    fn scan_content(&mut self, line: &SourceLine<'a>, mut at: usize) -> Result<()> {
        while is_list_marker(line.rest(at)) {
            self.emit(TokenKind::ListMarker, line.position(at));

            let after = at + 1;
            let item = line.skip_blanks(after);
            if let Some(tab) = line.src[after..item].find('\t') {
                return Err(ParseError::MalformedIndentation {
                    position: line.position(after + tab),
                    reason: "tab character after list marker".to_string(),
                });
            }
            if line.is_exhausted(item) {
                // Item body follows on the next lines
                return Ok(());
            }

            self.indents.push(item - line.start);
            self.emit(TokenKind::Indent, line.position(item));
            at = item;
        }

        self.scan_entry(line, at)
    }

    /// `key: value`, a bare value, or `!include path`
    fn scan_entry(&mut self, line: &SourceLine<'a>, at: usize) -> Result<()> {
        let first = line.rest(at).chars().next().unwrap_or('\n');
        match first {
            '"' | '\'' => {
                let (scalar, end) = parse_quoted(line, at, first)?;
                match key_colon(line, end) {
                    Some(colon) if line.skip_blanks(end) == colon => {
                        if scalar.value.is_empty() {
                            return Err(unexpected(line, at));
                        }
                        self.emit(TokenKind::Key(scalar.value), line.position(at));
                        self.scan_value(line, colon + 1)
                    }
                    _ => {
                        expect_line_end(line, end)?;
                        self.emit(TokenKind::Scalar(scalar), line.position(at));
                        Ok(())
                    }
                }
            }
            '!' => self.scan_include(line, at),
            c if UNSUPPORTED.contains(&c) => Err(unexpected(line, at)),
            _ => match key_colon(line, at) {
                Some(colon) => {
                    let key = line.src[at..colon].trim_end();
                    if key.is_empty() {
                        return Err(unexpected(line, colon));
                    }
                    self.emit(TokenKind::Key(key.to_string()), line.position(at));
                    self.scan_value(line, colon + 1)
                }
                None => {
                    let (scalar, _) = parse_bare(line, at);
                    self.emit(TokenKind::Scalar(scalar), line.position(at));
                    Ok(())
                }
            },
        }
    }

    /// Value after `key:`; nothing is emitted for an empty value
    fn scan_value(&mut self, line: &SourceLine<'a>, after_colon: usize) -> Result<()> {
        let at = line.skip_blanks(after_colon);
        if line.is_exhausted(at) {
            return Ok(());
        }

        let first = line.rest(at).chars().next().unwrap_or('\n');
        match first {
            '!' => self.scan_include(line, at),
            c if UNSUPPORTED.contains(&c) => Err(unexpected(line, at)),
            _ => {
                let (scalar, end) = parse_value(line, at)?;
                expect_line_end(line, end)?;
                self.emit(TokenKind::Scalar(scalar), line.position(at));
                Ok(())
            }
        }
    }

    /// `!include` followed by a bare or quoted path up to end of line
    fn scan_include(&mut self, line: &SourceLine<'a>, at: usize) -> Result<()> {
        let rest = line.rest(at);
        let tagged = rest
            .strip_prefix(INCLUDE_TAG)
            .is_some_and(|tail| tail.is_empty() || tail.starts_with(&[' ', '\t', '#'][..]));
        if !tagged {
            return Err(unexpected(line, at));
        }

        let path_at = line.skip_blanks(at + INCLUDE_TAG.len());
        let path = if line.is_exhausted(path_at) {
            String::new()
        } else {
            let (scalar, end) = parse_value(line, path_at)?;
            expect_line_end(line, end)?;
            scalar.value.trim().to_string()
        };
        self.emit(TokenKind::IncludeTag(path), line.position(at));
        Ok(())
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Some(Ok(token));
            }
            if self.finished {
                return None;
            }
            if let Err(err) = self.fill() {
                self.finished = true;
                self.pending.clear();
                return Some(Err(err));
            }
        }
    }
}

fn is_list_marker(rest: &str) -> bool {
    match rest.strip_prefix('-') {
        Some(tail) => tail.is_empty() || tail.starts_with(&[' ', '\t'][..]),
        None => false,
    }
}

/// Offset of the first `:` that ends a key (followed by blank, `#` or end of
/// line), searching from `from` and stopping at a comment
fn key_colon(line: &SourceLine<'_>, from: usize) -> Option<usize> {
    let bytes = line.src.as_bytes();
    let mut i = from;
    while i < line.end {
        match bytes[i] {
            b'#' => return None,
            b':' => {
                let ends_key = i + 1 >= line.end || matches!(bytes[i + 1], b' ' | b'\t' | b'#');
                if ends_key {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Only blanks or a comment may follow a complete value
fn expect_line_end(line: &SourceLine<'_>, end: usize) -> Result<()> {
    if line.is_exhausted(end) {
        Ok(())
    } else {
        Err(unexpected(line, line.skip_blanks(end)))
    }
}

/// Offset of the first line, past a leading byte order mark
fn content_start(src: &str) -> usize {
    if src.starts_with(BYTE_ORDER_MARK) {
        BYTE_ORDER_MARK.len_utf8()
    } else {
        0
    }
}

fn unexpected(line: &SourceLine<'_>, at: usize) -> ParseError {
    ParseError::UnexpectedCharacter {
        position: line.position(at),
        character: line.rest(at).chars().next().unwrap_or('\n'),
    }
}

//! Scalar value parser
//!
//! Resolution order, first match wins:
//! - `"double quoted"`: literal content, no escape processing
//! - `'single quoted'`: same rule
//! - unquoted: everything up to `#` or end of line, trimmed
//!
//! Values never span lines.

use super::document::Scalar;
use super::token::Position;
use crate::error::{ParseError, Result};

/// One line of source text, `end` excludes the line terminator
#[derive(Debug, Clone, Copy)]
pub struct SourceLine<'a> {
    pub src: &'a str,
    pub number: usize,
    pub start: usize,
    pub end: usize,
}

impl<'a> SourceLine<'a> {
    pub fn text(&self) -> &'a str {
        &self.src[self.start..self.end]
    }

    /// Position of a byte offset on this line
    pub fn position(&self, offset: usize) -> Position {
        let column = self.src[self.start..offset].chars().count() + 1;
        Position::new(self.number, column, offset)
    }

    /// Rest of the line from `offset`
    pub fn rest(&self, offset: usize) -> &'a str {
        &self.src[offset..self.end]
    }

    /// Offset of the first non-blank byte at or after `offset`
    pub fn skip_blanks(&self, offset: usize) -> usize {
        let rest = self.rest(offset);
        offset + (rest.len() - rest.trim_start_matches(&[' ', '\t'][..]).len())
    }

    /// True when nothing but blanks or a comment follows `offset`
    pub fn is_exhausted(&self, offset: usize) -> bool {
        let at = self.skip_blanks(offset);
        at >= self.end || self.src.as_bytes()[at] == b'#'
    }
}

/// Parse a value starting at `offset`, returning it with the offset just past it
pub fn parse_value(line: &SourceLine<'_>, offset: usize) -> Result<(Scalar, usize)> {
    match line.rest(offset).chars().next() {
        Some(quote @ ('"' | '\'')) => parse_quoted(line, offset, quote),
        _ => Ok(parse_bare(line, offset)),
    }
}

/// Parse a quoted string whose opening quote sits at `offset`
pub fn parse_quoted(line: &SourceLine<'_>, offset: usize, quote: char) -> Result<(Scalar, usize)> {
    let body_start = offset + quote.len_utf8();
    match line.rest(body_start).find(quote) {
        Some(len) => {
            let close = body_start + len;
            let value = &line.src[body_start..close];
            Ok((Scalar::quoted(value), close + quote.len_utf8()))
        }
        None => Err(ParseError::UnterminatedQuote {
            position: line.position(offset),
            quote,
        }),
    }
}

/// Unquoted value: maximal run up to `#` or end of line, blanks trimmed
pub fn parse_bare(line: &SourceLine<'_>, offset: usize) -> (Scalar, usize) {
    let rest = line.rest(offset);
    let run = match rest.find('#') {
        Some(hash) => &rest[..hash],
        None => rest,
    };
    let leading = run.len() - run.trim_start_matches(&[' ', '\t'][..]).len();
    let value = run.trim_matches(&[' ', '\t'][..]);
    (Scalar::plain(value), offset + leading + value.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(src: &str) -> SourceLine<'_> {
        SourceLine {
            src,
            number: 1,
            start: 0,
            end: src.len(),
        }
    }

    #[test]
    fn test_double_quoted_keeps_hash_and_spaces() {
        let src = r#""hello # not a comment"  "#;
        let (scalar, end) = parse_value(&line(src), 0).unwrap();
        assert_eq!(scalar, Scalar::quoted("hello # not a comment"));
        assert_eq!(end, 23);
    }

    #[test]
    fn test_single_quoted() {
        let src = "'  padded  '";
        let (scalar, end) = parse_value(&line(src), 0).unwrap();
        assert_eq!(scalar, Scalar::quoted("  padded  "));
        assert_eq!(end, src.len());
    }

    #[test]
    fn test_no_escape_processing() {
        let src = r#""a\nb""#;
        let (scalar, _) = parse_value(&line(src), 0).unwrap();
        assert_eq!(scalar.value, r"a\nb");
    }

    #[test]
    fn test_bare_stops_at_comment() {
        let src = "hello # a comment";
        let (scalar, end) = parse_value(&line(src), 0).unwrap();
        assert_eq!(scalar, Scalar::plain("hello"));
        assert_eq!(end, 5);
    }

    #[test]
    fn test_bare_trims_whitespace() {
        let src = "key:   spaced value   ";
        let (scalar, end) = parse_value(&line(src), 4).unwrap();
        assert_eq!(scalar.value, "spaced value");
        assert_eq!(&src[..end], "key:   spaced value");
    }

    #[test]
    fn test_unterminated_quote() {
        let src = "name: \"open";
        let err = parse_value(&line(src), 6).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnterminatedQuote {
                position: Position::new(1, 7, 6),
                quote: '"',
            }
        );
    }

    #[test]
    fn test_quote_does_not_cross_line_end() {
        // Only the first line is visible to the value parser
        let src = "'open\nclosed'";
        let first = SourceLine {
            src,
            number: 1,
            start: 0,
            end: 5,
        };
        assert!(matches!(
            parse_value(&first, 0),
            Err(ParseError::UnterminatedQuote { quote: '\'', .. })
        ));
    }

    #[test]
    fn test_line_helpers() {
        let l = line("a:   # note");
        assert_eq!(l.skip_blanks(2), 5);
        assert!(l.is_exhausted(2));
        assert!(!line("a: b").is_exhausted(2));
        assert_eq!(line("héllo").position(3), Position::new(1, 3, 3));
    }
}

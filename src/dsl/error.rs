//! Syntax errors reported by the filter parser.

use std::fmt;
use thiserror::Error;

/// Something the parser would have accepted at the failure position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expectation {
    /// A literal terminal such as `AND` or `>=`.
    Literal(&'static str),
    /// A named token rule such as `word` or `number`.
    Named(&'static str),
    /// The input should have ended here.
    EndOfInput,
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expectation::Literal(text) => write!(f, "{:?}", text),
            Expectation::Named(name) => write!(f, "{}", name),
            Expectation::EndOfInput => write!(f, "end of input"),
        }
    }
}

/// A point in the filter text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    /// 0-based byte offset.
    pub offset: usize,
    /// 1-based line.
    pub line: usize,
    /// 1-based column, in characters.
    pub column: usize,
}

impl Position {
    pub(crate) fn at(input: &str, offset: usize) -> Self {
        let before = &input[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
        let column = before[line_start..].chars().count() + 1;
        Position {
            offset,
            line,
            column,
        }
    }
}

/// Span of the offending input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub start: Position,
    pub end: Position,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start.line, self.start.column)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Syntax error at {location}: {message}")]
pub struct SyntaxError {
    pub message: String,
    /// Sorted and de-duplicated.
    pub expected: Vec<Expectation>,
    /// Offending character, `None` at end of input.
    pub found: Option<char>,
    pub location: Location,
}

impl SyntaxError {
    /// Build the error for a parse that got no further than `offset`.
    pub(crate) fn expected_at(input: &str, offset: usize, mut expected: Vec<Expectation>) -> Self {
        expected.sort_by_cached_key(|e| e.to_string());
        expected.dedup();

        let found = input[offset..].chars().next();
        let message = format!(
            "Expected {} but {} found.",
            describe_expected(&expected),
            describe_found(found)
        );

        SyntaxError {
            message,
            expected,
            found,
            location: span(input, offset, found),
        }
    }

    /// Build an error with a custom message and no expectations.
    pub(crate) fn custom(input: &str, offset: usize, message: String) -> Self {
        let found = input[offset..].chars().next();
        SyntaxError {
            message,
            expected: Vec::new(),
            found,
            location: span(input, offset, found),
        }
    }

    /// True when the parser ran out of input.
    pub fn at_end_of_input(&self) -> bool {
        self.found.is_none()
    }
}

fn span(input: &str, offset: usize, found: Option<char>) -> Location {
    let end = offset + found.map_or(0, char::len_utf8);
    Location {
        start: Position::at(input, offset),
        end: Position::at(input, end),
    }
}

fn describe_expected(expected: &[Expectation]) -> String {
    let descriptions: Vec<String> = expected.iter().map(|e| e.to_string()).collect();
    match descriptions.as_slice() {
        [] => "nothing".to_string(),
        [only] => only.clone(),
        [first, second] => format!("{} or {}", first, second),
        [init @ .., last] => format!("{}, or {}", init.join(", "), last),
    }
}

fn describe_found(found: Option<char>) -> String {
    match found {
        Some(c) => format!("{:?}", c.to_string()),
        None => "end of input".to_string(),
    }
}

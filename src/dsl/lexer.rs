//! Token scanners for the filter DSL.
//!
//! Each scanner recognizes one lexical rule at the head of the input and
//! advances past it. They never record expectations; the parser does that
//! for the rule as a whole.

use winnow::ascii::digit1;
use winnow::combinator::{alt, delimited};
use winnow::prelude::*;
use winnow::token::take_while;

// Manually define PResult for resilience against winnow version changes
pub(crate) type PResult<T> = Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

/// Characters allowed in a field name.
pub fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_'
}

/// Characters allowed in a string value: anything but space, parens and quotes.
pub fn is_special_char(c: char) -> bool {
    !matches!(c, ' ' | '(' | ')' | '"' | '\'')
}

/// `Word := (letter | digit | "." | "_")+`
pub fn word<'i>(input: &mut &'i str) -> PResult<&'i str> {
    take_while(1.., is_word_char).parse_next(input)
}

/// `Space := " "+`
pub fn spaces<'i>(input: &mut &'i str) -> PResult<&'i str> {
    take_while(1.., |c: char| c == ' ').parse_next(input)
}

/// `Number := digit+`, rejected when it does not fit an `i64`.
pub fn number(input: &mut &str) -> PResult<i64> {
    digit1.try_map(|digits: &str| digits.parse::<i64>()).parse_next(input)
}

/// `Boolean := "true" | "false"`
pub fn boolean(input: &mut &str) -> PResult<bool> {
    alt(("true".value(true), "false".value(false))).parse_next(input)
}

/// `Null := "null"`
pub fn null(input: &mut &str) -> PResult<()> {
    "null".void().parse_next(input)
}

/// `String := '"' Special* '"' | "'" Special* "'" | Special+`
pub fn string<'i>(input: &mut &'i str) -> PResult<&'i str> {
    alt((
        delimited('"', take_while(0.., is_special_char), '"'),
        delimited('\'', take_while(0.., is_special_char), '\''),
        take_while(1.., is_special_char),
    ))
    .parse_next(input)
}

//! Filter DSL for field predicates.
//!
//! Syntax:
//!   field:value               - match
//!   field = value             - equals (same as match)
//!   field > 1, field >= 1     - ordered comparison (also <, <=)
//!   "quoted value", 'quoted'  - values with reserved characters
//!   true, false, null, 123    - typed literals
//!   expr AND expr             - conjunction
//!   expr OR expr              - disjunction
//!   NOT expr                  - negation of the rest of the statement
//!   (expr)                    - grouping
//!
//! Keyword chains associate to the right and carry no precedence:
//! `a:1 OR b:2 AND c:3` is `OR(a:1, AND(b:2, c:3))`.

mod ast;
mod error;
mod lexer;
mod parser;

pub use ast::*;
pub use error::{Expectation, Location, Position, SyntaxError};
pub use parser::{MAX_NESTING, parse_filter_expression};

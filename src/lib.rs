//! Filter expressions for search requests.
//!
//! Filter text such as `brand:acme AND price < 20` is parsed into a syntax
//! tree ([`dsl`]) and compiled into a backend-neutral [`Query`]
//! ([`query`]) built from `And`/`Or`/`Not` and field predicates.

pub mod config;
pub mod dsl;
pub mod pipeline;
pub mod query;

pub use dsl::{Node, SyntaxError, parse_filter_expression};
pub use query::{Query, QueryError, SearchRequest, Terms, compile_filter, compile_query};

//! Canonical queries and their compilation from filter text.

mod ast;
mod compile;
mod error;
mod search;
mod token;

pub use ast::{ALL_FIELDS, Query};
pub use compile::compile;
pub use error::{CompileError, QueryError};
pub use search::{
    SearchRequest, Terms, compile_filter, compile_query, filter_text, parse_filters, parse_query,
};

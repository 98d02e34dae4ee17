//! Assembly of search requests into a single query.

use serde::{Deserialize, Serialize};

use crate::dsl::parse_filter_expression;

use super::ast::Query;
use super::compile::compile;
use super::error::QueryError;

/// One value or a list of alternatives, as search parameters arrive.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Terms {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for Terms {
    fn from(value: &str) -> Self {
        Terms::One(value.to_string())
    }
}

impl From<Vec<String>> for Terms {
    fn from(values: Vec<String>) -> Self {
        Terms::Many(values)
    }
}

/// A full-text query and/or a filter expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub query: Option<Terms>,
    #[serde(default)]
    pub filters: Option<Terms>,
}

impl SearchRequest {
    pub fn with_query(mut self, query: impl Into<Terms>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_filters(mut self, filters: impl Into<Terms>) -> Self {
        self.filters = Some(filters.into());
        self
    }
}

/// Combine the request's query text and filters into one query.
///
/// A missing query and missing filters give [`Query::Wildcard`]; when both
/// are present they are joined with `And`.
pub fn compile_query(request: &SearchRequest) -> Result<Query, QueryError> {
    let mut parts: Vec<Query> = Vec::with_capacity(2);

    if let Some(query) = request.query.as_ref().map(parse_query) {
        parts.push(query);
    }
    if let Some(filters) = request.filters.as_ref() {
        parts.extend(parse_filters(filters)?);
    }

    tracing::trace!("Compiled request into {} part(s)", parts.len());
    Ok(match parts.len() {
        0 => Query::Wildcard,
        1 => parts.remove(0),
        _ => Query::And { queries: parts },
    })
}

/// Parse and compile one filter string; an unconstrained filter gives
/// [`Query::Wildcard`].
pub fn compile_filter(filter: &str) -> Result<Query, QueryError> {
    let node = parse_filter_expression(filter)?;
    Ok(compile(&node)?.unwrap_or(Query::Wildcard))
}

/// Query text: alternatives are joined with a space; empty text matches all.
///
/// A single query string is kept verbatim.
pub fn parse_query(terms: &Terms) -> Query {
    let text = match terms {
        Terms::One(text) => text.clone(),
        Terms::Many(texts) => join_non_empty(texts, " ", |t| t.to_string()),
    };

    if text.is_empty() {
        Query::Wildcard
    } else {
        Query::text(text)
    }
}

/// Filters: alternatives are parenthesized and joined with `OR`.
///
/// Returns `Ok(None)` for blank filters and for filters that constrain nothing.
pub fn parse_filters(terms: &Terms) -> Result<Option<Query>, QueryError> {
    let filter = filter_text(terms);
    if filter.trim().is_empty() {
        return Ok(None);
    }

    let node = parse_filter_expression(&filter)?;
    Ok(compile(&node)?)
}

/// The single filter string a set of filter alternatives stands for.
///
/// A single filter is handed to the parser untouched, so error locations
/// refer to the caller's text.
pub fn filter_text(terms: &Terms) -> String {
    match terms {
        Terms::One(filter) => filter.clone(),
        Terms::Many(filters) => join_non_empty(filters, " OR ", |f| format!("({})", f)),
    }
}

fn join_non_empty(values: &[String], separator: &str, wrap: impl Fn(&str) -> String) -> String {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(wrap)
        .collect::<Vec<_>>()
        .join(separator)
}

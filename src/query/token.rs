//! Rendering of canonical queries as search-index tokens.
//!
//! The token shape is what the inverted-index backend consumes:
//!
//! ```text
//! {"FIELD": "brand", "VALUE": "acme"}
//! {"FIELD": "price", "VALUE": {"GTE": "10", "LTE": "20"}}
//! {"AND": [...]}  {"OR": [...]}
//! {"NOT": {"EXCLUDE": ..., "INCLUDE": {"FIELD": "_all"}}}
//! "free text"
//! ```

use serde_json::{Map, Value, json};

use super::ast::{ALL_FIELDS, Query};

impl Query {
    /// Render this query as a search-index token.
    pub fn to_token(&self) -> Value {
        match self {
            Query::And { queries } => json!({ "AND": tokens(queries) }),
            Query::Or { queries } => json!({ "OR": tokens(queries) }),
            Query::Not { exclude, include } => json!({
                "NOT": {
                    "EXCLUDE": exclude.to_token(),
                    "INCLUDE": include.to_token(),
                }
            }),
            Query::FieldEquals { field, value } => json!({ "FIELD": field, "VALUE": value }),
            Query::FieldRange {
                field,
                lower_inclusive,
                upper_inclusive,
            } => {
                let mut range = Map::new();
                if let Some(lower) = lower_inclusive {
                    range.insert("GTE".to_string(), Value::String(lower.clone()));
                }
                if let Some(upper) = upper_inclusive {
                    range.insert("LTE".to_string(), Value::String(upper.clone()));
                }
                json!({ "FIELD": field, "VALUE": range })
            }
            Query::Text { text } => Value::String(text.clone()),
            Query::Wildcard => json!({ "FIELD": ALL_FIELDS }),
        }
    }
}

fn tokens(queries: &[Query]) -> Vec<Value> {
    queries.iter().map(Query::to_token).collect()
}

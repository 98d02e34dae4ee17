//! Canonical query tree handed to search backends.

use serde::{Deserialize, Serialize};

/// Field name that matches every document.
pub const ALL_FIELDS: &str = "_all";

/// Backend-neutral boolean composition of field predicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Query {
    /// All sub-queries must match.
    And { queries: Vec<Query> },

    /// At least one sub-query must match.
    Or { queries: Vec<Query> },

    /// Documents matching `include` but not `exclude`.
    ///
    /// `include` is always [`Query::Wildcard`] when built by the compiler,
    /// since backends have no standalone negation.
    Not {
        exclude: Box<Query>,
        include: Box<Query>,
    },

    /// `field` equals `value`.
    FieldEquals { field: String, value: String },

    /// `field` falls within inclusive bounds; at least one bound is set.
    FieldRange {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lower_inclusive: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        upper_inclusive: Option<String>,
    },

    /// Uninterpreted full-text query.
    Text { text: String },

    /// Matches every document.
    Wildcard,
}

impl Query {
    pub fn field_equals(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::FieldEquals {
            field: field.into(),
            value: value.into(),
        }
    }

    /// `field >= value`
    pub fn at_least(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::FieldRange {
            field: field.into(),
            lower_inclusive: Some(value.into()),
            upper_inclusive: None,
        }
    }

    /// `field <= value`
    pub fn at_most(field: impl Into<String>, value: impl Into<String>) -> Self {
        Query::FieldRange {
            field: field.into(),
            lower_inclusive: None,
            upper_inclusive: Some(value.into()),
        }
    }

    /// Everything except what `exclude` matches.
    pub fn not(exclude: Query) -> Self {
        Query::Not {
            exclude: Box::new(exclude),
            include: Box::new(Query::Wildcard),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Query::Text { text: text.into() }
    }

    /// Flatten nested `And`/`Or` of the same kind into one n-ary node.
    ///
    /// `And([a, And([b, c])])` becomes `And([a, b, c])`. Matching semantics
    /// are unchanged.
    pub fn flatten(self) -> Self {
        match self {
            Query::And { queries } => Query::And {
                queries: flatten_into(queries, |q| match q {
                    Query::And { queries } => Ok(queries),
                    other => Err(other),
                }),
            },
            Query::Or { queries } => Query::Or {
                queries: flatten_into(queries, |q| match q {
                    Query::Or { queries } => Ok(queries),
                    other => Err(other),
                }),
            },
            Query::Not { exclude, include } => Query::Not {
                exclude: Box::new(exclude.flatten()),
                include: Box::new(include.flatten()),
            },
            other => other,
        }
    }
}

/// Flatten each child, splicing in the ones `split` recognizes as the same kind.
fn flatten_into(
    queries: Vec<Query>,
    split: impl Fn(Query) -> Result<Vec<Query>, Query>,
) -> Vec<Query> {
    let mut flat = Vec::with_capacity(queries.len());
    // Pending children in reverse, so `pop` yields them in order.
    let mut pending: Vec<Query> = queries.into_iter().rev().collect();
    while let Some(query) = pending.pop() {
        match split(query) {
            Ok(inner) => pending.extend(inner.into_iter().rev()),
            Err(other) => flat.push(other.flatten()),
        }
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_same_kind() {
        let query = Query::And {
            queries: vec![
                Query::field_equals("a", "1"),
                Query::And {
                    queries: vec![Query::field_equals("b", "2"), Query::field_equals("c", "3")],
                },
            ],
        };
        assert_eq!(
            query.flatten(),
            Query::And {
                queries: vec![
                    Query::field_equals("a", "1"),
                    Query::field_equals("b", "2"),
                    Query::field_equals("c", "3"),
                ],
            }
        );
    }

    #[test]
    fn test_flatten_long_chain() {
        let mut query = Query::field_equals("id", "999");
        for i in (0..999).rev() {
            query = Query::Or {
                queries: vec![Query::field_equals("id", i.to_string()), query],
            };
        }

        let Query::Or { queries } = query.flatten() else {
            panic!("expected Or");
        };
        assert_eq!(queries.len(), 1000);
        assert_eq!(queries[0], Query::field_equals("id", "0"));
        assert_eq!(queries[999], Query::field_equals("id", "999"));
    }

    #[test]
    fn test_flatten_keeps_mixed_kinds() {
        let inner_or = Query::Or {
            queries: vec![Query::field_equals("b", "2"), Query::field_equals("c", "3")],
        };
        let query = Query::And {
            queries: vec![Query::field_equals("a", "1"), inner_or.clone()],
        };
        assert_eq!(query.clone().flatten(), query);
    }

    #[test]
    fn test_flatten_inside_not() {
        let query = Query::not(Query::Or {
            queries: vec![
                Query::field_equals("a", "1"),
                Query::Or {
                    queries: vec![Query::field_equals("b", "2"), Query::at_most("c", "3")],
                },
            ],
        });
        let Query::Not { exclude, include } = query.flatten() else {
            panic!("expected Not");
        };
        assert_eq!(*include, Query::Wildcard);
        assert!(matches!(*exclude, Query::Or { ref queries } if queries.len() == 3));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(Query::at_least("price", "2")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"type": "field_range", "field": "price", "lower_inclusive": "2"})
        );

        let json = serde_json::to_value(Query::not(Query::field_equals("a", "b"))).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "not",
                "exclude": {"type": "field_equals", "field": "a", "value": "b"},
                "include": {"type": "wildcard"},
            })
        );
    }

    #[test]
    fn test_deserialize_round_trip() {
        let query = Query::And {
            queries: vec![Query::text("red shoes"), Query::at_most("size", "10")],
        };
        let json = serde_json::to_string(&query).unwrap();
        let back: Query = serde_json::from_str(&json).unwrap();
        assert_eq!(back, query);
    }
}

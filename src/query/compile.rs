//! Compiler from the filter syntax tree to canonical queries.

use crate::dsl::{CompareOp, Leaf, Node};

use super::ast::Query;
use super::error::CompileError;

/// Compile a syntax tree.
///
/// `Ok(None)` means the filter places no constraint, which happens when
/// every predicate in it is an ordering comparison against `null`.
pub fn compile(node: &Node) -> Result<Option<Query>, CompileError> {
    // AND/OR chains nest to the right; walk the spine instead of recursing
    // once per link.
    let mut links: Vec<(&Node, Combine)> = Vec::new();
    let mut tail = node;
    loop {
        match tail {
            Node::And { left, right } => {
                links.push((left, |queries: Vec<Query>| Query::And { queries }));
                tail = right;
            }
            Node::Or { left, right } => {
                links.push((left, |queries: Vec<Query>| Query::Or { queries }));
                tail = right;
            }
            _ => break,
        }
    }

    let mut lefts = Vec::with_capacity(links.len());
    for (left, combine) in links {
        lefts.push((compile(left)?, combine));
    }

    let mut compiled = compile_operand(tail)?;
    while let Some((left, combine)) = lefts.pop() {
        compiled = collapse(left, compiled, combine);
    }
    Ok(compiled)
}

type Combine = fn(Vec<Query>) -> Query;

fn compile_operand(node: &Node) -> Result<Option<Query>, CompileError> {
    match node {
        Node::And { .. } | Node::Or { .. } => compile(node),
        Node::Not { value } => Ok(compile(value)?.map(Query::not)),
        Node::Compare { op, key, value } => compile_comparison(*op, key, value),
        // Literals only mean something on the right of a comparison.
        Node::Leaf(_) => Ok(None),
    }
}

/// Combine both sides of a pair, collapsing absent ones.
fn collapse(left: Option<Query>, right: Option<Query>, combine: Combine) -> Option<Query> {
    match (left, right) {
        (Some(left), Some(right)) => Some(combine(vec![left, right])),
        (left, right) => left.or(right),
    }
}

fn compile_comparison(
    op: CompareOp,
    key: &str,
    value: &Node,
) -> Result<Option<Query>, CompileError> {
    let Node::Leaf(leaf) = value else {
        return Err(CompileError::ContractViolation {
            token: op.token(),
            key: key.to_string(),
            found: value.token(),
        });
    };

    let query = match op {
        CompareOp::Match | CompareOp::Equals => Some(Query::field_equals(key, leaf.to_text())),
        // Backends only offer inclusive bounds, so strict integer bounds
        // move by one. Other types have no "next value" and stay inclusive.
        CompareOp::Gt => match leaf {
            Leaf::Number(n) => {
                let bound = n.checked_add(1).unwrap_or(*n);
                Some(Query::at_least(key, bound.to_string()))
            }
            _ => bound_text(leaf).map(|text| Query::at_least(key, text)),
        },
        CompareOp::Gte => bound_text(leaf).map(|text| Query::at_least(key, text)),
        CompareOp::Lt => match leaf {
            Leaf::Number(n) => {
                let bound = n.checked_sub(1).unwrap_or(*n);
                Some(Query::at_most(key, bound.to_string()))
            }
            _ => bound_text(leaf).map(|text| Query::at_most(key, text)),
        },
        CompareOp::Lte => bound_text(leaf).map(|text| Query::at_most(key, text)),
    };

    if query.is_none() {
        tracing::debug!("Dropped {} on '{}': null has no ordering", op.token(), key);
    }
    Ok(query)
}

/// Text of a range bound; `null` cannot bound a range.
fn bound_text(leaf: &Leaf) -> Option<String> {
    match leaf {
        Leaf::Null => None,
        other => Some(other.to_text()),
    }
}

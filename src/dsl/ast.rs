//! Concrete syntax tree for the filter DSL.

use std::fmt;

/// A parsed filter statement.
///
/// Keyword chains are right-recursive: `a AND b AND c` parses as
/// `And(a, And(b, c))`. Parentheses do not produce a node of their own.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// `left AND right`
    And { left: Box<Node>, right: Box<Node> },

    /// `left OR right`
    Or { left: Box<Node>, right: Box<Node> },

    /// `NOT value`, binding to the rest of the statement.
    Not { value: Box<Node> },

    /// Field comparison: `key:value`, `key = value`, `key > value`, ...
    ///
    /// The parser always puts a [`Node::Leaf`] in `value`.
    Compare {
        op: CompareOp,
        key: String,
        value: Box<Node>,
    },

    /// Scalar literal.
    Leaf(Leaf),
}

/// Comparison operator of a [`Node::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Match,  // :
    Equals, // =
    Gt,     // >
    Gte,    // >=
    Lt,     // <
    Lte,    // <=
}

/// Scalar literal on the right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leaf {
    String(String),
    Number(i64),
    Boolean(bool),
    Null,
}

impl Node {
    pub fn and(left: Node, right: Node) -> Self {
        Node::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Node, right: Node) -> Self {
        Node::Or {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn not(value: Node) -> Self {
        Node::Not {
            value: Box::new(value),
        }
    }

    pub fn compare(op: CompareOp, key: impl Into<String>, value: Leaf) -> Self {
        Node::Compare {
            op,
            key: key.into(),
            value: Box::new(Node::Leaf(value)),
        }
    }

    /// Tag name of this node (`AND`, `MATCH`, `NUMBER`, ...).
    pub fn token(&self) -> &'static str {
        match self {
            Node::And { .. } => "AND",
            Node::Or { .. } => "OR",
            Node::Not { .. } => "NOT",
            Node::Compare { op, .. } => op.token(),
            Node::Leaf(leaf) => leaf.token(),
        }
    }
}

impl CompareOp {
    pub fn token(self) -> &'static str {
        match self {
            CompareOp::Match => "MATCH",
            CompareOp::Equals => "EQUALS",
            CompareOp::Gt => "GT",
            CompareOp::Gte => "GTE",
            CompareOp::Lt => "LT",
            CompareOp::Lte => "LTE",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareOp::Match => write!(f, ":"),
            CompareOp::Equals => write!(f, "="),
            CompareOp::Gt => write!(f, ">"),
            CompareOp::Gte => write!(f, ">="),
            CompareOp::Lt => write!(f, "<"),
            CompareOp::Lte => write!(f, "<="),
        }
    }
}

impl Leaf {
    pub fn token(&self) -> &'static str {
        match self {
            Leaf::String(_) => "STRING",
            Leaf::Number(_) => "NUMBER",
            Leaf::Boolean(_) => "BOOLEAN",
            Leaf::Null => "NULL",
        }
    }

    /// Canonical text of the literal; `null` renders as `"null"`.
    pub fn to_text(&self) -> String {
        match self {
            Leaf::String(s) => s.clone(),
            Leaf::Number(n) => n.to_string(),
            Leaf::Boolean(b) => b.to_string(),
            Leaf::Null => "null".to_string(),
        }
    }
}

impl fmt::Display for Leaf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Leaf::String(s) => write!(f, "{:?}", s),
            Leaf::Number(n) => write!(f, "{}", n),
            Leaf::Boolean(b) => write!(f, "{}", b),
            Leaf::Null => write!(f, "null"),
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::And { left, right } | Node::Or { left, right } => {
                write!(f, "{}({}, {})", self.token(), left, right)
            }
            Node::Not { value } => write!(f, "NOT({})", value),
            Node::Compare { op, key, value } => write!(f, "{}({}, {})", op.token(), key, value),
            Node::Leaf(leaf) => write!(f, "{}", leaf),
        }
    }
}

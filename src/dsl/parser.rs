//! Parser for the filter DSL.
//!
//! Grammar (PEG, alternatives tried top to bottom):
//!
//! start        = Space* Block Space*
//! Block        = Statement / "(" Space* Statement Space* ")"
//! Statement    = StatementAND / StatementOR / StatementNOT / Expression
//! StatementAND = Expression Space+ "AND" Space+ Statement
//! StatementOR  = Expression Space+ "OR" Space+ Statement
//! StatementNOT = "NOT" Space+ Statement
//! Expression   = Match / Gte / Gt / Lte / Lt / Equals / "(" Space* Statement Space* ")"
//! Match        = Word ":" Value
//! Equals       = Word Space* "=" Space* Value
//! Gte, Gt, ... = Word Space* op Space* Value
//! Value        = Number / Boolean / Null / String
//!
//! The parser backtracks freely and remembers the furthest offset at which
//! any rule failed, together with everything that was expected there. That
//! set becomes the [`SyntaxError`] when the input cannot be parsed.
//!
//! `StatementAND`/`StatementOR` chains are read in a loop, so only groups
//! and `NOT` count towards [`MAX_NESTING`].

use std::collections::HashMap;

use super::ast::{CompareOp, Leaf, Node};
use super::error::{Expectation, SyntaxError};
use super::lexer::{self, PResult};

/// Deepest statement nesting accepted before giving up.
pub const MAX_NESTING: usize = 512;

/// Comparison rules in the order they are attempted.
const COMPARISONS: [(CompareOp, &str); 5] = [
    (CompareOp::Gte, ">="),
    (CompareOp::Gt, ">"),
    (CompareOp::Lte, "<="),
    (CompareOp::Lt, "<"),
    (CompareOp::Equals, "="),
];

type Join = fn(Node, Node) -> Node;

/// Parser state.
struct Parser<'i> {
    input: &'i str,
    pos: usize,
    furthest: usize,
    expected: Vec<Expectation>,
    /// `Expression` results keyed by start offset.
    memo: HashMap<usize, Option<(Node, usize)>>,
    depth: usize,
    too_deep: Option<usize>,
}

impl<'i> Parser<'i> {
    fn new(input: &'i str) -> Self {
        Parser {
            input,
            pos: 0,
            furthest: 0,
            expected: Vec::new(),
            memo: HashMap::new(),
            depth: 0,
            too_deep: None,
        }
    }

    /// Record a failed expectation at `at`, keeping only the furthest ones.
    fn fail(&mut self, at: usize, expectation: Expectation) {
        if at < self.furthest {
            return;
        }
        if at > self.furthest {
            self.furthest = at;
            self.expected.clear();
        }
        self.expected.push(expectation);
    }

    /// Run `rule`, rewinding to the current offset if it fails.
    fn attempt<T>(&mut self, rule: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let start = self.pos;
        let result = rule(self);
        if result.is_none() {
            self.pos = start;
        }
        result
    }

    /// Run a lexical scanner; on failure record `name` at the start offset.
    fn token<O>(
        &mut self,
        name: &'static str,
        scanner: impl FnOnce(&mut &'i str) -> PResult<O>,
    ) -> Option<O> {
        let input: &'i str = self.input;
        let mut rest = &input[self.pos..];
        match scanner(&mut rest) {
            Ok(output) => {
                self.pos = self.input.len() - rest.len();
                Some(output)
            }
            Err(_) => {
                self.fail(self.pos, Expectation::Named(name));
                None
            }
        }
    }

    fn literal(&mut self, text: &'static str) -> bool {
        if self.input[self.pos..].starts_with(text) {
            self.pos += text.len();
            true
        } else {
            self.fail(self.pos, Expectation::Literal(text));
            false
        }
    }

    /// `Space*`
    fn skip_spaces(&mut self) {
        while self.token("space", lexer::spaces).is_some() {}
    }

    /// `Space+`
    fn require_spaces(&mut self) -> bool {
        if self.token("space", lexer::spaces).is_none() {
            return false;
        }
        self.skip_spaces();
        true
    }

    fn start(&mut self) -> Option<Node> {
        self.skip_spaces();
        let block = self
            .statement()
            .or_else(|| self.attempt(|p| p.group()))?;
        self.skip_spaces();
        Some(block)
    }

    /// `Statement`; only groups and `NOT` deepen the nesting.
    fn statement(&mut self) -> Option<Node> {
        if self.too_deep.is_some() {
            return None;
        }
        if self.depth >= MAX_NESTING {
            self.too_deep = Some(self.pos);
            return None;
        }

        self.depth += 1;
        let result = self
            .chain()
            .or_else(|| self.attempt(|p| p.not_statement()));
        self.depth -= 1;
        result
    }

    /// `Expression (Space+ ("AND" / "OR") Space+ (Expression / StatementNOT))*`
    ///
    /// Equivalent to the right-recursive `StatementAND`/`StatementOR` rules,
    /// folded into the same right-nested tree. A keyword with nothing
    /// parseable after it ends the chain before the keyword.
    fn chain(&mut self) -> Option<Node> {
        let mut operands = vec![self.expression()?];
        let mut joins: Vec<Join> = Vec::new();

        loop {
            let before = self.pos;
            let Some(join) = self.keyword() else {
                self.pos = before;
                break;
            };
            if let Some(next) = self.expression() {
                operands.push(next);
                joins.push(join);
                continue;
            }
            match self.attempt(|p| p.not_statement()) {
                Some(negated) => {
                    operands.push(negated);
                    joins.push(join);
                }
                None => self.pos = before,
            }
            break;
        }

        let mut node = operands.pop()?;
        while let (Some(left), Some(join)) = (operands.pop(), joins.pop()) {
            node = join(left, node);
        }
        Some(node)
    }

    /// `Space+ ("AND" / "OR") Space+`
    fn keyword(&mut self) -> Option<Join> {
        if !self.require_spaces() {
            return None;
        }
        let join: Join = if self.literal("AND") {
            Node::and
        } else if self.literal("OR") {
            Node::or
        } else {
            return None;
        };
        if !self.require_spaces() {
            return None;
        }
        Some(join)
    }

    /// `"NOT" Space+ Statement`
    fn not_statement(&mut self) -> Option<Node> {
        if !self.literal("NOT") || !self.require_spaces() {
            return None;
        }
        let value = self.statement()?;
        Some(Node::not(value))
    }

    fn expression(&mut self) -> Option<Node> {
        let start = self.pos;
        if let Some(cached) = self.memo.get(&start) {
            return cached.clone().map(|(node, end)| {
                self.pos = end;
                node
            });
        }

        let result = self.attempt(|p| p.match_expression()).or_else(|| {
            COMPARISONS
                .iter()
                .find_map(|&(op, symbol)| self.attempt(|p| p.comparison(op, symbol)))
                .or_else(|| self.attempt(|p| p.group()))
        });

        let entry = result.as_ref().map(|node| (node.clone(), self.pos));
        self.memo.insert(start, entry);
        result
    }

    /// `Word ":" Value`
    fn match_expression(&mut self) -> Option<Node> {
        let key = self.token("word", lexer::word)?;
        if !self.literal(":") {
            return None;
        }
        let value = self.value()?;
        Some(Node::compare(CompareOp::Match, key, value))
    }

    /// `Word Space* symbol Space* Value`
    fn comparison(&mut self, op: CompareOp, symbol: &'static str) -> Option<Node> {
        let key = self.token("word", lexer::word)?;
        self.skip_spaces();
        if !self.literal(symbol) {
            return None;
        }
        self.skip_spaces();
        let value = self.value()?;
        Some(Node::compare(op, key, value))
    }

    /// `"(" Space* Statement Space* ")"`
    fn group(&mut self) -> Option<Node> {
        if !self.literal("(") {
            return None;
        }
        self.skip_spaces();
        let statement = self.statement()?;
        self.skip_spaces();
        if !self.literal(")") {
            return None;
        }
        Some(statement)
    }

    /// `Number / Boolean / Null / String`
    fn value(&mut self) -> Option<Leaf> {
        if let Some(n) = self.token("number", lexer::number) {
            return Some(Leaf::Number(n));
        }
        if let Some(b) = self.token("boolean", lexer::boolean) {
            return Some(Leaf::Boolean(b));
        }
        if self.token("null", lexer::null).is_some() {
            return Some(Leaf::Null);
        }
        self.token("string", lexer::string)
            .map(|s| Leaf::String(s.to_string()))
    }

    fn into_error(self) -> SyntaxError {
        if let Some(offset) = self.too_deep {
            return SyntaxError::custom(
                self.input,
                offset,
                format!("Filter nests deeper than {} levels.", MAX_NESTING),
            );
        }
        SyntaxError::expected_at(self.input, self.furthest, self.expected)
    }
}

/// Parse a filter string into its syntax tree.
///
/// The whole input must be consumed; leading and trailing spaces are allowed.
pub fn parse_filter_expression(input: &str) -> Result<Node, SyntaxError> {
    let mut parser = Parser::new(input);
    let result = parser.start();

    match result {
        Some(node) if parser.pos == input.len() && parser.too_deep.is_none() => Ok(node),
        other => {
            if other.is_some() {
                parser.fail(parser.pos, Expectation::EndOfInput);
            }
            let err = parser.into_error();
            tracing::debug!("Rejected filter {:?}: {}", input, err);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Node {
        parse_filter_expression(input).unwrap()
    }

    fn string(s: &str) -> Leaf {
        Leaf::String(s.into())
    }

    #[test]
    fn test_match() {
        assert_eq!(
            parse("foo:bar"),
            Node::compare(CompareOp::Match, "foo", string("bar"))
        );
    }

    #[test]
    fn test_value_types() {
        assert_eq!(
            parse("foo:1"),
            Node::compare(CompareOp::Match, "foo", Leaf::Number(1))
        );
        assert_eq!(
            parse("foo:false"),
            Node::compare(CompareOp::Match, "foo", Leaf::Boolean(false))
        );
        assert_eq!(
            parse("foo:null"),
            Node::compare(CompareOp::Match, "foo", Leaf::Null)
        );
        assert_eq!(
            parse("foo:\"12\""),
            Node::compare(CompareOp::Match, "foo", string("12"))
        );
        assert_eq!(
            parse("foo:'a=b'"),
            Node::compare(CompareOp::Match, "foo", string("a=b"))
        );
        assert_eq!(
            parse("foo:-1"),
            Node::compare(CompareOp::Match, "foo", string("-1"))
        );
    }

    #[test]
    fn test_comparison_operators() {
        let cases = [
            ("foo = bar", CompareOp::Equals),
            ("foo=bar", CompareOp::Equals),
            ("foo > bar", CompareOp::Gt),
            ("foo>=bar", CompareOp::Gte),
            ("foo   >=   bar", CompareOp::Gte),
            ("foo < bar", CompareOp::Lt),
            ("foo <= bar", CompareOp::Lte),
        ];
        for (input, op) in cases {
            assert_eq!(
                parse(input),
                Node::compare(op, "foo", string("bar")),
                "input: {input}"
            );
        }
    }

    #[test]
    fn test_greater_equal_is_not_truncated() {
        // A naive ">" match would leave "=2" to be read as a string.
        assert_eq!(
            parse("n >= 2"),
            Node::compare(CompareOp::Gte, "n", Leaf::Number(2))
        );
    }

    #[test]
    fn test_and_is_right_recursive() {
        let a = Node::compare(CompareOp::Match, "a", Leaf::Number(1));
        let b = Node::compare(CompareOp::Match, "b", Leaf::Number(2));
        let c = Node::compare(CompareOp::Match, "c", Leaf::Number(3));
        assert_eq!(
            parse("a:1 AND b:2 AND c:3"),
            Node::and(a, Node::and(b, c))
        );
    }

    #[test]
    fn test_mixed_chain_keeps_written_order() {
        assert_eq!(
            parse("a:1 OR b:2 AND c:3").to_string(),
            "OR(MATCH(a, 1), AND(MATCH(b, 2), MATCH(c, 3)))"
        );
    }

    #[test]
    fn test_not_binds_rest_of_statement() {
        assert_eq!(
            parse("NOT a:1 AND b:2").to_string(),
            "NOT(AND(MATCH(a, 1), MATCH(b, 2)))"
        );
    }

    #[test]
    fn test_grouping_adds_no_node() {
        assert_eq!(parse("(foo:bar)"), parse("foo:bar"));
        assert_eq!(parse("  (  foo:bar  )  "), parse("foo:bar"));
        assert_eq!(
            parse("(a:1 OR b:2) AND c:3").to_string(),
            "AND(OR(MATCH(a, 1), MATCH(b, 2)), MATCH(c, 3))"
        );
    }

    #[test]
    fn test_complex_expression() {
        let ast = parse(" foo >   bar OR    (  foo   = baz AND   NOT   qux <=  2    ) OR hello:goodbye");
        assert_eq!(
            ast.to_string(),
            r#"OR(GT(foo, "bar"), OR(AND(EQUALS(foo, "baz"), NOT(LTE(qux, 2))), MATCH(hello, "goodbye")))"#
        );
    }

    #[test]
    fn test_keyword_prefix_in_field_name() {
        assert_eq!(
            parse("NOTE:1"),
            Node::compare(CompareOp::Match, "NOTE", Leaf::Number(1))
        );
    }

    #[test]
    fn test_missing_value() {
        let err = parse_filter_expression("foo:").unwrap_err();
        assert!(err.at_end_of_input());
        assert_eq!(err.location.start.offset, 4);
        assert_eq!(err.location.start.column, 5);
        assert_eq!(
            err.expected,
            vec![
                Expectation::Named("boolean"),
                Expectation::Named("null"),
                Expectation::Named("number"),
                Expectation::Named("string"),
            ]
        );
    }

    #[test]
    fn test_trailing_input() {
        let err = parse_filter_expression("foo:bar baz").unwrap_err();
        assert_eq!(err.found, Some('b'));
        assert_eq!(err.location.start.offset, 8);
        assert!(err.expected.contains(&Expectation::EndOfInput));
        assert!(err.expected.contains(&Expectation::Literal("AND")));
        assert!(err.expected.contains(&Expectation::Literal("OR")));
    }

    #[test]
    fn test_committed_number_leaves_garbage() {
        let err = parse_filter_expression("foo:12abc").unwrap_err();
        assert_eq!(err.found, Some('a'));
        assert_eq!(err.location.start.offset, 6);
    }

    #[test]
    fn test_unbalanced_parens() {
        let err = parse_filter_expression("(foo:bar").unwrap_err();
        assert!(err.at_end_of_input());
        assert!(err.expected.contains(&Expectation::Literal(")")));

        assert!(parse_filter_expression("foo:bar)").is_err());
    }

    #[test]
    fn test_keywords_need_spaces() {
        assert!(parse_filter_expression("a:1AND b:2").is_err());
        assert!(parse_filter_expression("NOT(a:1)").is_err());
        // Without the space the keyword is just part of a field name.
        assert_eq!(
            parse("NOTa:1"),
            Node::compare(CompareOp::Match, "NOTa", Leaf::Number(1))
        );
    }

    #[test]
    fn test_lowercase_keyword_is_not_an_operator() {
        assert!(parse_filter_expression("a:1 and b:2").is_err());
    }

    #[test]
    fn test_empty_input() {
        let err = parse_filter_expression("").unwrap_err();
        assert!(err.at_end_of_input());
        assert!(err.expected.contains(&Expectation::Literal("(")));
        assert!(err.expected.contains(&Expectation::Named("word")));
        assert!(err.expected.contains(&Expectation::Literal("NOT")));
    }

    #[test]
    fn test_error_location_on_second_line() {
        let err = parse_filter_expression("foo:bar\n)").unwrap_err();
        assert_eq!(err.found, Some(')'));
        assert_eq!(err.location.start.line, 2);
        assert_eq!(err.location.start.column, 1);
    }

    #[test]
    fn test_deep_nesting_is_linear() {
        let depth = 200;
        let input = format!("{}a:1{}", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(parse(&input), parse("a:1"));
    }

    #[test]
    fn test_long_chain_is_not_nesting() {
        let terms: Vec<String> = (0..1000).map(|i| format!("id:{i}")).collect();
        let mut node = parse(&terms.join(" OR "));
        for i in 0..999 {
            let Node::Or { left, right } = node else {
                panic!("expected OR at link {i}");
            };
            assert_eq!(
                *left,
                Node::compare(CompareOp::Match, "id", Leaf::Number(i))
            );
            node = *right;
        }
        assert_eq!(node, Node::compare(CompareOp::Match, "id", Leaf::Number(999)));
    }

    #[test]
    fn test_not_counts_as_nesting() {
        let input = format!("{}a:1", "NOT ".repeat(MAX_NESTING + 1));
        let err = parse_filter_expression(&input).unwrap_err();
        assert!(err.message.contains("512"));
    }

    #[test]
    fn test_nesting_limit() {
        let depth = MAX_NESTING + 1;
        let input = format!("{}a:1{}", "(".repeat(depth), ")".repeat(depth));
        let err = parse_filter_expression(&input).unwrap_err();
        assert!(err.expected.is_empty());
        assert!(err.message.contains("512"));
    }
}

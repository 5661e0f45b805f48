//! Tolerant PromQL parser
//!
//! The parser is built for editors: it never fails and always returns a
//! tree. Input that ends early yields [`NodeKind::Unknown`] placeholders and
//! `incomplete` nodes instead of errors, so that the cursor locator can still
//! reason about half-typed queries. Genuine syntax problems are collected as
//! [`Diagnostic`]s alongside the tree.
//!
//! Binary operators use Pratt parsing with PromQL precedence:
//! `or` < `and`/`unless` < comparisons < `+ -` < `* / % atan2` < `^`.

use crate::ast::{
    BinaryExpression, FunctionCall, Grouping, Label, LabelMap, Literal, Location, Node, NodeKind,
    Parens, Query, RangeSelector, Selector, UnaryExpression,
};
use crate::lexer::{self, Token, TokenKind as TK};
use crate::types::Diagnostic;

/// Binding power for unary `+`/`-`: tighter than `*`, looser than `^`
const UNARY_BP: u8 = 11;

const LABEL_MATCHERS: &[&str] = &["=", "!=", "=~", "!~"];

/// A parsed query together with the syntax problems found on the way
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub query: Query,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse `text` into a [`Query`]
#[must_use]
pub fn parse(text: &str) -> ParseResult {
    let mut parser = Parser::new(text);
    let expression = if parser.at_eof() {
        None
    } else {
        let expr = parser.parse_expr(0);
        while !parser.at_eof() {
            let token = parser.advance();
            parser.error("unexpected-token", "Unexpected trailing input", &token);
        }
        Some(expr)
    };
    ParseResult {
        query: Query { expression },
        diagnostics: parser.diagnostics,
    }
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    /// Offset of the last byte of the most recently consumed token
    prev_last: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        let mut tokens = lexer::tokenize(text);
        tokens.push(Token {
            kind: TK::Eof,
            start: text.len(),
            end: text.len(),
        });
        Self {
            text,
            tokens,
            pos: 0,
            prev_last: 0,
            diagnostics: Vec::new(),
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_nth(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TK::Eof
    }

    fn at(&self, kind: &TK) -> bool {
        &self.peek().kind == kind
    }

    fn at_ident(&self, word: &str) -> bool {
        matches!(&self.peek().kind, TK::Ident(name) if name.eq_ignore_ascii_case(word))
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TK::Eof {
            self.prev_last = token.last();
            self.pos += 1;
        }
        token
    }

    fn error(&mut self, code: &str, message: &str, token: &Token) {
        self.diagnostics.push(Diagnostic::error(
            self.text,
            code,
            message,
            token.start,
            token.end,
        ));
    }

    fn error_at_eof(&mut self, message: &str) {
        let eof = self.peek().clone();
        self.error("unexpected-end", message, &eof);
    }

    /// Tokens that end an expression without being part of it
    fn at_expression_end(&self) -> bool {
        matches!(
            self.peek().kind,
            TK::Eof | TK::RParen | TK::RBrace | TK::RBracket | TK::Comma
        )
    }

    fn peek_binary_op(&self) -> Option<(String, u8, u8)> {
        let op = match &self.peek().kind {
            TK::Op(op) if !LABEL_MATCHERS.contains(&op.as_str()) || op == "!=" => op.clone(),
            TK::Ident(word) => {
                let lower = word.to_ascii_lowercase();
                match lower.as_str() {
                    "and" | "or" | "unless" | "atan2" => lower,
                    _ => return None,
                }
            }
            _ => return None,
        };
        let (lbp, rbp) = match op.as_str() {
            "or" => (1, 2),
            "and" | "unless" => (3, 4),
            "==" | "!=" | ">" | "<" | ">=" | "<=" => (5, 6),
            "+" | "-" => (7, 8),
            "*" | "/" | "%" | "atan2" => (9, 10),
            "^" => (12, 11),
            _ => return None,
        };
        Some((op, lbp, rbp))
    }

    fn parse_expr(&mut self, min_bp: u8) -> Node {
        let mut lhs = self.parse_unary();

        while let Some((op, lbp, rbp)) = self.peek_binary_op() {
            if lbp < min_bp {
                break;
            }
            let op_token = self.advance();
            self.skip_binary_modifiers();

            let right = if self.at_expression_end() {
                if !self.at_eof() {
                    let token = self.peek().clone();
                    self.error("missing-operand", "Expected expression after operator", &token);
                }
                Node::unknown(self.peek().start)
            } else {
                self.parse_expr(rbp)
            };

            let incomplete = lhs.incomplete || right.incomplete;
            let location = Location::new(lhs.location.min, self.prev_last);
            lhs = Node::new(
                NodeKind::Binary(BinaryExpression {
                    operator: op,
                    operator_location: Location::new(op_token.start, op_token.last()),
                    left: Box::new(lhs),
                    right: Box::new(right),
                }),
                location,
                incomplete,
            );
        }

        lhs
    }

    /// `bool`, `on(...)`, `ignoring(...)`, `group_left(...)`, `group_right(...)`
    fn skip_binary_modifiers(&mut self) {
        if self.at_ident("bool") {
            self.advance();
        }
        for keywords in [&["on", "ignoring"][..], &["group_left", "group_right"][..]] {
            if keywords.iter().any(|k| self.at_ident(k)) {
                self.advance();
                if self.at(&TK::LParen) {
                    self.advance();
                    while !self.at(&TK::RParen) && !self.at_eof() {
                        self.advance();
                    }
                    if self.at(&TK::RParen) {
                        self.advance();
                    }
                }
            }
        }
    }

    fn parse_unary(&mut self) -> Node {
        let is_sign = matches!(&self.peek().kind, TK::Op(op) if op == "-" || op == "+");
        if !is_sign {
            let primary = self.parse_primary();
            return self.parse_postfix(primary);
        }

        let sign = self.advance();
        let operand = if self.at_expression_end() {
            if self.at_eof() {
                self.error_at_eof("Expected expression after sign");
            }
            Node::unknown(self.peek().start)
        } else {
            self.parse_expr(UNARY_BP)
        };
        let incomplete = operand.incomplete;
        let operator = match sign.kind {
            TK::Op(op) => op,
            _ => String::from("-"),
        };
        Node::new(
            NodeKind::Unary(UnaryExpression {
                operator,
                operand: Box::new(operand),
            }),
            Location::new(sign.start, self.prev_last),
            incomplete,
        )
    }

    fn parse_primary(&mut self) -> Node {
        let token = self.peek().clone();
        match &token.kind {
            TK::Number(raw) => {
                self.advance();
                let value = raw.parse::<f64>().unwrap_or(f64::NAN);
                Node::new(
                    NodeKind::Literal(Literal::Number(value)),
                    Location::new(token.start, token.last()),
                    false,
                )
            }
            TK::Duration(raw) => {
                self.advance();
                Node::new(
                    NodeKind::Literal(Literal::Duration(raw.clone())),
                    Location::new(token.start, token.last()),
                    false,
                )
            }
            TK::Str { .. } => self.parse_string(),
            TK::LParen => self.parse_parens(),
            TK::LBrace => self.parse_selector(None, token.start),
            TK::Ident(name) => {
                let name = name.clone();
                let next = &self.peek_nth(1).kind;
                let grouping_follows = matches!(next, TK::Ident(word)
                    if word.eq_ignore_ascii_case("by") || word.eq_ignore_ascii_case("without"));
                if *next == TK::LParen || grouping_follows {
                    self.parse_function(name)
                } else {
                    self.advance();
                    let metric =
                        Node::identifier(name, Location::new(token.start, token.last()));
                    self.parse_selector(Some(metric), token.start)
                }
            }
            TK::Eof => {
                self.error_at_eof("Expected expression");
                Node::unknown(token.start)
            }
            TK::RParen | TK::RBrace | TK::RBracket | TK::Comma => {
                self.error("unexpected-token", "Expected expression", &token);
                Node::unknown(token.start)
            }
            _ => {
                self.advance();
                self.error("unexpected-token", "Expected expression", &token);
                Node::unknown(token.start)
            }
        }
    }

    fn parse_string(&mut self) -> Node {
        let token = self.advance();
        if matches!(token.kind, TK::Str { terminated: false, .. }) {
            self.error("unterminated-string", "Unterminated string", &token);
        }
        let location = Location::new(token.start, token.last());
        let TK::Str { value, terminated } = token.kind else {
            return Node::unknown(token.start);
        };
        Node::new(
            NodeKind::Literal(Literal::String { value, terminated }),
            location,
            !terminated,
        )
    }

    fn parse_parens(&mut self) -> Node {
        let open = self.advance();
        let child = if self.at_eof() {
            Node::unknown(self.peek().start)
        } else {
            self.parse_expr(0)
        };
        let closed = self.expect_close(&TK::RParen, "Expected `)`");
        let incomplete = child.incomplete || !closed;
        let node = Node::new(
            NodeKind::Parens(Parens {
                child: Box::new(child),
            }),
            Location::new(open.start, self.prev_last),
            incomplete,
        );
        self.parse_postfix(node)
    }

    /// Consume `close` if present; report and return false otherwise
    fn expect_close(&mut self, close: &TK, message: &str) -> bool {
        if self.at(close) {
            self.advance();
            return true;
        }
        if self.at_eof() {
            self.error_at_eof(message);
        } else {
            let token = self.peek().clone();
            self.error("unexpected-token", message, &token);
        }
        false
    }

    fn parse_function(&mut self, name: String) -> Node {
        let name_token = self.advance();
        let name_location = Location::new(name_token.start, name_token.last());

        let mut grouping = None;
        let mut incomplete = false;
        if self.at_ident("by") || self.at_ident("without") {
            let node = self.parse_grouping();
            incomplete |= node.incomplete;
            grouping = Some(Box::new(node));
        }

        let mut args = Vec::new();
        let mut open_paren = None;
        let mut close_paren = None;
        if self.at(&TK::LParen) {
            open_paren = Some(self.advance().start);
            loop {
                let token = self.peek().clone();
                match token.kind {
                    TK::RParen => {
                        close_paren = Some(self.advance().start);
                        break;
                    }
                    TK::Eof => {
                        self.error_at_eof("Expected `)` to close the argument list");
                        incomplete = true;
                        break;
                    }
                    TK::Comma | TK::RBrace | TK::RBracket => {
                        self.advance();
                        self.error("unexpected-token", "Expected argument", &token);
                        continue;
                    }
                    _ => {}
                }

                let arg = self.parse_expr(0);
                incomplete |= arg.incomplete;
                args.push(arg);

                if self.at(&TK::Comma) {
                    self.advance();
                } else if !self.at(&TK::RParen) && !self.at_eof() {
                    let token = self.advance();
                    self.error("unexpected-token", "Expected `,` or `)`", &token);
                }
            }
        } else {
            // `sum by (job)` with the argument list not typed yet
            if self.at_eof() {
                self.error_at_eof("Expected `(`");
            } else {
                let token = self.peek().clone();
                self.error("unexpected-token", "Expected `(`", &token);
            }
            incomplete = true;
        }

        if close_paren.is_some()
            && grouping.is_none()
            && (self.at_ident("by") || self.at_ident("without"))
        {
            let node = self.parse_grouping();
            incomplete |= node.incomplete;
            grouping = Some(Box::new(node));
        }

        let node = Node::new(
            NodeKind::Function(FunctionCall {
                name,
                name_location,
                open_paren,
                close_paren,
                args,
                grouping,
            }),
            Location::new(name_location.min, self.prev_last),
            incomplete,
        );
        self.parse_postfix(node)
    }

    fn parse_grouping(&mut self) -> Node {
        let keyword = self.advance();
        let name = match &keyword.kind {
            TK::Ident(word) => word.to_ascii_lowercase(),
            _ => String::from("by"),
        };

        let mut args = Vec::new();
        let mut open_paren = None;
        let mut close_paren = None;
        if self.at(&TK::LParen) {
            open_paren = Some(self.advance().start);
            loop {
                let token = self.peek().clone();
                match &token.kind {
                    TK::RParen => {
                        close_paren = Some(self.advance().start);
                        break;
                    }
                    TK::Eof => {
                        self.error_at_eof("Expected `)` to close the grouping");
                        break;
                    }
                    TK::Comma => {
                        self.advance();
                    }
                    TK::Ident(label) => {
                        self.advance();
                        args.push(Node::identifier(
                            label.clone(),
                            Location::new(token.start, token.last()),
                        ));
                    }
                    _ => {
                        self.advance();
                        self.error("unexpected-token", "Expected label name", &token);
                    }
                }
            }
        } else if self.at_eof() {
            self.error_at_eof("Expected `(` after grouping keyword");
        }

        let incomplete = close_paren.is_none();
        Node::new(
            NodeKind::Grouping(Grouping {
                name,
                open_paren,
                close_paren,
                args,
            }),
            Location::new(keyword.start, self.prev_last),
            incomplete,
        )
    }

    fn parse_selector(&mut self, metric: Option<Node>, start: usize) -> Node {
        let mut incomplete = false;

        let label_map = if self.at(&TK::LBrace) {
            let map = self.parse_label_map();
            incomplete |= map.incomplete;
            Some(Box::new(map))
        } else {
            None
        };

        let duration = if self.at(&TK::LBracket) {
            let range = self.parse_range();
            incomplete |= range.close.is_none() && self.at_eof();
            Some(range)
        } else {
            None
        };

        if self.at_ident("offset") {
            self.advance();
            if matches!(self.peek().kind, TK::Duration(_)) {
                self.advance();
            } else if self.at_eof() {
                incomplete = true;
            }
        }

        Node::new(
            NodeKind::Selector(Selector {
                metric: metric.map(Box::new),
                label_map,
                duration,
            }),
            Location::new(start, self.prev_last),
            incomplete,
        )
    }

    fn parse_range(&mut self) -> RangeSelector {
        let open = self.advance().start;
        let mut value = None;
        let token = self.peek().clone();
        if let TK::Duration(raw) = &token.kind {
            self.advance();
            value = Some(Box::new(Node::new(
                NodeKind::Literal(Literal::Duration(raw.clone())),
                Location::new(token.start, token.last()),
                false,
            )));
        }
        // subquery resolution `[30m:1m]`
        if self.at(&TK::Colon) {
            self.advance();
            if matches!(self.peek().kind, TK::Duration(_)) {
                self.advance();
            }
        }
        let close = if self.at(&TK::RBracket) {
            Some(self.advance().start)
        } else {
            self.expect_close(&TK::RBracket, "Expected `]`");
            None
        };
        RangeSelector { open, close, value }
    }

    fn parse_label_map(&mut self) -> Node {
        let open = self.advance();
        let mut args = Vec::new();
        let mut close = None;
        let mut incomplete = false;

        loop {
            let token = self.peek().clone();
            match &token.kind {
                TK::RBrace => {
                    close = Some(self.advance().start);
                    break;
                }
                TK::Eof => {
                    self.error_at_eof("Expected `}` to close the label matchers");
                    incomplete = true;
                    break;
                }
                TK::Ident(_) => {
                    let label = self.parse_label();
                    incomplete |= label.incomplete;
                    args.push(label);
                    if self.at(&TK::Comma) {
                        self.advance();
                    } else if !self.at(&TK::RBrace) && !self.at_eof() {
                        let token = self.advance();
                        self.error("unexpected-token", "Expected `,` or `}`", &token);
                    }
                }
                _ => {
                    self.advance();
                    self.error("unexpected-token", "Expected label name", &token);
                }
            }
        }

        Node::new(
            NodeKind::LabelMap(LabelMap { args, close }),
            Location::new(open.start, self.prev_last),
            incomplete,
        )
    }

    fn parse_label(&mut self) -> Node {
        let name_token = self.advance();
        let label_name = match &name_token.kind {
            TK::Ident(name) => name.clone(),
            _ => String::new(),
        };
        let name = Node::identifier(
            label_name,
            Location::new(name_token.start, name_token.last()),
        );

        let mut operator = None;
        let mut operator_location = None;
        let mut value = None;
        let mut incomplete = false;

        let matcher = match &self.peek().kind {
            TK::Op(op) if LABEL_MATCHERS.contains(&op.as_str()) => Some(op.clone()),
            _ => None,
        };
        if let Some(op) = matcher {
            let op_token = self.advance();
            operator = Some(op);
            operator_location = Some(Location::new(op_token.start, op_token.last()));
            if matches!(self.peek().kind, TK::Str { .. }) {
                let literal = self.parse_string();
                incomplete |= literal.incomplete;
                value = Some(Box::new(literal));
            } else if self.at_eof() {
                self.error_at_eof("Expected label value");
                incomplete = true;
            } else {
                let token = self.peek().clone();
                self.error("unexpected-token", "Expected quoted label value", &token);
            }
        } else if self.at_eof() {
            self.error_at_eof("Expected label matcher");
            incomplete = true;
        } else {
            let token = self.peek().clone();
            self.error("unexpected-token", "Expected label matcher", &token);
        }

        Node::new(
            NodeKind::Label(Label {
                name: Box::new(name),
                operator,
                operator_location,
                value,
            }),
            Location::new(name_token.start, self.prev_last),
            incomplete,
        )
    }

    /// Range or subquery brackets after a non-selector expression
    fn parse_postfix(&mut self, mut node: Node) -> Node {
        if node.as_selector().is_none() && self.at(&TK::LBracket) {
            let range = self.parse_range();
            node.incomplete |= range.close.is_none() && self.at_eof();
            node.location = Location::new(node.location.min, self.prev_last);
        }
        node
    }
}

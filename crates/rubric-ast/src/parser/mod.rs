// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Recursive-descent parser for the supported Ruby subset.
//!
//! Covers what the built-in cops need to see: method calls with and without
//! parentheses, string/symbol/numeric literals with interpolation, arrays,
//! hashes and keyword arguments, the usual binary operators, assignments,
//! `if`/`unless`/ternaries, `begin`/`rescue`/`else`/`ensure`, and
//! `def`/`class`/`module` bodies. Anything else is a [`ParseError`] with a
//! line and column, never a partial tree.
//!
//! Local variables are tracked per scope so `x` after `x = 1` (or after
//! `rescue => x`) becomes `(lvar :x)` while an unknown `x` stays a
//! receiverless `(send nil :x)`.

use std::collections::HashSet;

pub mod errors;


pub use errors::{ParseError, ParseResult};

use crate::nodes::{Child, Node, NodeKind, SourceMap, Span};
use crate::tokenizer::{find_interpolation_end, tokenize, tokenize_range, TokType, Token};

/// Keywords that close a body which may carry `rescue` clauses.
const BODY_END: &[&str] = &["rescue", "else", "ensure", "end"];

/// Parse a whole source file. Returns `None` when it holds no statements.
pub fn parse(source: &str) -> ParseResult<Option<Node>> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        scopes: vec![HashSet::new()],
    };
    parser.program()
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token<'a>>,
    pos: usize,
    scopes: Vec<HashSet<String>>,
}

fn sym(name: &str) -> Child {
    Child::Symbol(name.to_string())
}

fn send(receiver: Option<Node>, method: &str, args: Vec<Node>, span: Span, loc: SourceMap) -> Node {
    let mut children = Vec::with_capacity(args.len() + 2);
    children.push(Child::from(receiver));
    children.push(sym(method));
    children.extend(args.into_iter().map(Child::Node));
    Node::new(NodeKind::Send, children, span).with_loc(loc)
}

/// Collapse a statement list: nothing, the lone statement, or an implicit `begin`.
fn sequence(mut stmts: Vec<Node>) -> Option<Node> {
    match stmts.len() {
        0 => None,
        1 => stmts.pop(),
        _ => {
            let span = stmts[0].span().join(&stmts[stmts.len() - 1].span());
            Some(Node::new(
                NodeKind::Begin,
                stmts.into_iter().map(Child::Node).collect(),
                span,
            ))
        }
    }
}

/// Children for a node that holds statements directly (`kwbegin`, `(...)`, `#{...}`).
fn body_children(body: Option<Node>) -> Vec<Child> {
    match body {
        None => Vec::new(),
        Some(node) if node.kind() == NodeKind::Begin && node.loc().begin.is_none() => {
            node.into_children()
        }
        Some(node) => vec![Child::Node(node)],
    }
}

fn push_keyword_hash(args: &mut Vec<Node>, pairs: Vec<Node>) {
    let span = match (pairs.first(), pairs.last()) {
        (Some(first), Some(last)) => first.span().join(&last.span()),
        _ => return,
    };
    args.push(Node::new(
        NodeKind::Hash,
        pairs.into_iter().map(Child::Node).collect(),
        span,
    ));
}

fn delimiters(open: Span, close: Span) -> SourceMap {
    SourceMap {
        begin: Some(open),
        end: Some(close),
        ..SourceMap::default()
    }
}

impl<'a> Parser<'a> {
    // ------------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------------

    fn peek(&self) -> &Token<'a> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> &Token<'a> {
        // The stream always ends with an EndMarker.
        let i = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[i]
    }

    fn advance(&mut self) -> Token<'a> {
        let tok = *self.peek();
        if tok.kind != TokType::EndMarker {
            self.pos += 1;
        }
        tok
    }

    fn at_op(&self, op: &str) -> bool {
        self.peek().is_op(op)
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        self.peek().is_keyword(keyword)
    }

    fn at_eof(&self) -> bool {
        self.peek().kind == TokType::EndMarker
    }

    fn at_newline(&self) -> bool {
        self.peek().kind == TokType::Newline
    }

    fn at_terminator(&self, terminators: &[&str]) -> bool {
        let tok = self.peek();
        matches!(tok.kind, TokType::Keyword | TokType::Op) && terminators.contains(&tok.text)
    }

    /// Nothing more belongs to the current expression.
    fn at_expression_end(&self) -> bool {
        let tok = self.peek();
        match tok.kind {
            TokType::Newline | TokType::EndMarker => true,
            TokType::Keyword => matches!(
                tok.text,
                "end" | "if" | "unless" | "rescue" | "else" | "elsif" | "ensure" | "then"
            ),
            TokType::Op => matches!(tok.text, ")" | "]" | "}" | ","),
            _ => false,
        }
    }

    fn skip_newlines(&mut self) {
        while self.at_newline() {
            self.advance();
        }
    }

    fn expect_op(&mut self, op: &str) -> ParseResult<Token<'a>> {
        if self.at_op(op) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("'{}'", op)))
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> ParseResult<Token<'a>> {
        if self.at_keyword(keyword) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("'{}'", keyword)))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let tok = self.peek();
        let found = match tok.kind {
            TokType::EndMarker => "end of input".to_string(),
            TokType::Newline => "newline".to_string(),
            _ => format!("'{}'", tok.text),
        };
        ParseError::at(
            self.source,
            tok.span.start,
            format!("unexpected {}, expected {}", found, expected),
        )
    }

    fn error_at(&self, tok: &Token<'a>, message: &str) -> ParseError {
        ParseError::at(self.source, tok.span.start, message)
    }

    // ------------------------------------------------------------------------
    // Local variable scopes
    // ------------------------------------------------------------------------

    fn is_local(&self, name: &str) -> bool {
        self.scopes.last().is_some_and(|scope| scope.contains(name))
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string());
        }
    }

    fn in_new_scope<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        self.scopes.push(HashSet::new());
        let result = f(self);
        self.scopes.pop();
        result
    }

    // ------------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------------

    fn program(&mut self) -> ParseResult<Option<Node>> {
        let body = self.statements(&[])?;
        if !self.at_eof() {
            return Err(self.unexpected("end of input"));
        }
        Ok(body)
    }

    fn statements(&mut self, terminators: &[&str]) -> ParseResult<Option<Node>> {
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            if self.at_eof() || self.at_terminator(terminators) {
                break;
            }
            stmts.push(self.statement()?);
            if !(self.at_newline() || self.at_eof() || self.at_terminator(terminators)) {
                return Err(self.unexpected("end of statement"));
            }
        }
        Ok(sequence(stmts))
    }

    /// An expression with optional `if`/`unless` modifiers.
    fn statement(&mut self) -> ParseResult<Node> {
        let mut node = self.expression()?;
        loop {
            let kw = *self.peek();
            if !(kw.is_keyword("if") || kw.is_keyword("unless")) {
                break;
            }
            self.advance();
            let cond = self.expression()?;
            let span = node.span().join(&cond.span());
            let (then_branch, else_branch) = if kw.text == "if" {
                (Child::Node(node), Child::Absent)
            } else {
                (Child::Absent, Child::Node(node))
            };
            node = Node::new(NodeKind::If, vec![cond.into(), then_branch, else_branch], span)
                .with_loc(SourceMap {
                    keyword: Some(kw.span),
                    ..SourceMap::default()
                });
        }
        Ok(node)
    }

    fn expression(&mut self) -> ParseResult<Node> {
        let tok = *self.peek();
        if matches!(tok.kind, TokType::Ident | TokType::IVar) && self.peek_nth(1).is_op("=") {
            return self.assignment();
        }
        if tok.is_keyword("return") {
            return self.return_expr();
        }
        self.ternary()
    }

    fn assignment(&mut self) -> ParseResult<Node> {
        let name = self.advance();
        let op = self.advance();
        self.skip_newlines();
        let kind = if name.kind == TokType::IVar {
            NodeKind::Ivasgn
        } else {
            // Declared before the value is parsed: `x = x` reads the new local.
            self.declare(name.text);
            NodeKind::Lvasgn
        };
        let value = self.expression()?;
        let span = name.span.join(&value.span());
        Ok(
            Node::new(kind, vec![sym(name.text), value.into()], span).with_loc(SourceMap {
                selector: Some(name.span),
                operator: Some(op.span),
                ..SourceMap::default()
            }),
        )
    }

    fn return_expr(&mut self) -> ParseResult<Node> {
        let kw = self.advance();
        let loc = SourceMap {
            keyword: Some(kw.span),
            ..SourceMap::default()
        };
        if self.at_expression_end() {
            return Ok(Node::new(NodeKind::Return, vec![Child::Absent], kw.span).with_loc(loc));
        }
        let value = self.ternary()?;
        let span = kw.span.join(&value.span());
        Ok(Node::new(NodeKind::Return, vec![value.into()], span).with_loc(loc))
    }

    // ------------------------------------------------------------------------
    // Operators
    // ------------------------------------------------------------------------

    fn ternary(&mut self) -> ParseResult<Node> {
        let cond = self.or_expr()?;
        if !self.at_op("?") {
            return Ok(cond);
        }
        let question = self.advance();
        self.skip_newlines();
        let then_branch = self.ternary()?;
        self.skip_newlines();
        self.expect_op(":")?;
        self.skip_newlines();
        let else_branch = self.ternary()?;
        let span = cond.span().join(&else_branch.span());
        Ok(Node::new(
            NodeKind::If,
            vec![cond.into(), then_branch.into(), else_branch.into()],
            span,
        )
        .with_loc(SourceMap {
            operator: Some(question.span),
            ..SourceMap::default()
        }))
    }

    fn or_expr(&mut self) -> ParseResult<Node> {
        self.logical("||", NodeKind::Or, Self::and_expr)
    }

    fn and_expr(&mut self) -> ParseResult<Node> {
        self.logical("&&", NodeKind::And, Self::equality)
    }

    fn equality(&mut self) -> ParseResult<Node> {
        self.binary(&["==", "!=", "=~"], Self::comparison)
    }

    fn comparison(&mut self) -> ParseResult<Node> {
        self.binary(&["<", "<=", ">", ">="], Self::additive)
    }

    fn additive(&mut self) -> ParseResult<Node> {
        self.binary(&["+", "-"], Self::multiplicative)
    }

    fn multiplicative(&mut self) -> ParseResult<Node> {
        self.binary(&["*", "/", "%"], Self::unary)
    }

    fn logical(
        &mut self,
        op: &str,
        kind: NodeKind,
        next: fn(&mut Self) -> ParseResult<Node>,
    ) -> ParseResult<Node> {
        let mut lhs = next(self)?;
        while self.at_op(op) {
            let tok = self.advance();
            self.skip_newlines();
            let rhs = next(self)?;
            let span = lhs.span().join(&rhs.span());
            lhs = Node::new(kind, vec![lhs.into(), rhs.into()], span).with_loc(SourceMap {
                operator: Some(tok.span),
                ..SourceMap::default()
            });
        }
        Ok(lhs)
    }

    /// Left-associative infix operators, each becoming a send.
    fn binary(
        &mut self,
        ops: &[&str],
        next: fn(&mut Self) -> ParseResult<Node>,
    ) -> ParseResult<Node> {
        let mut lhs = next(self)?;
        loop {
            let tok = *self.peek();
            if tok.kind != TokType::Op || !ops.contains(&tok.text) {
                break;
            }
            self.advance();
            self.skip_newlines();
            let rhs = next(self)?;
            let span = lhs.span().join(&rhs.span());
            lhs = send(
                Some(lhs),
                tok.text,
                vec![rhs],
                span,
                SourceMap {
                    selector: Some(tok.span),
                    ..SourceMap::default()
                },
            );
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> ParseResult<Node> {
        let tok = *self.peek();
        let selector = SourceMap {
            selector: Some(tok.span),
            ..SourceMap::default()
        };
        if tok.is_op("!") {
            self.advance();
            let operand = self.unary()?;
            let span = tok.span.join(&operand.span());
            return Ok(send(Some(operand), "!", Vec::new(), span, selector));
        }
        if tok.is_op("-") {
            let next = *self.peek_nth(1);
            if matches!(next.kind, TokType::Integer | TokType::Float) && !next.space_before {
                self.advance();
                self.advance();
                let kind = if next.kind == TokType::Integer {
                    NodeKind::Int
                } else {
                    NodeKind::Float
                };
                let literal = Node::new(
                    kind,
                    vec![Child::Value(format!("-{}", next.text))],
                    tok.span.join(&next.span),
                );
                return self.postfix(literal);
            }
            self.advance();
            let operand = self.unary()?;
            let span = tok.span.join(&operand.span());
            return Ok(send(Some(operand), "-@", Vec::new(), span, selector));
        }
        let primary = self.primary()?;
        self.postfix(primary)
    }

    /// Method calls with `.`, scoped constants with `::`, and `recv[index]`.
    fn postfix(&mut self, mut node: Node) -> ParseResult<Node> {
        loop {
            let tok = *self.peek();
            if tok.is_op(".") {
                self.advance();
                self.skip_newlines();
                let name = self.advance();
                if !matches!(
                    name.kind,
                    TokType::Ident | TokType::Constant | TokType::Keyword
                ) {
                    return Err(self.error_at(&name, "expected method name after '.'"));
                }
                node = self.call(Some(node), name)?;
            } else if tok.is_op("::") {
                self.advance();
                let name = self.advance();
                match name.kind {
                    TokType::Constant if !self.at_op("(") => {
                        let span = node.span().join(&name.span);
                        node = Node::new(NodeKind::Const, vec![node.into(), sym(name.text)], span)
                            .with_loc(SourceMap {
                                selector: Some(name.span),
                                ..SourceMap::default()
                            });
                    }
                    TokType::Constant | TokType::Ident => node = self.call(Some(node), name)?,
                    _ => return Err(self.error_at(&name, "expected name after '::'")),
                }
            } else if tok.is_op("[") && !tok.space_before {
                let open = self.advance();
                let (args, close) = self.list_args("]")?;
                let span = node.span().join(&close.span);
                node = send(
                    Some(node),
                    "[]",
                    args,
                    span,
                    SourceMap {
                        selector: Some(open.span.join(&close.span)),
                        begin: Some(open.span),
                        end: Some(close.span),
                        ..SourceMap::default()
                    },
                );
            } else {
                break;
            }
        }
        Ok(node)
    }

    // ------------------------------------------------------------------------
    // Calls and arguments
    // ------------------------------------------------------------------------

    /// A method call whose name token has just been consumed.
    fn call(&mut self, receiver: Option<Node>, name: Token<'a>) -> ParseResult<Node> {
        let start = receiver.as_ref().map_or(name.span, Node::span);
        let mut loc = SourceMap {
            selector: Some(name.span),
            ..SourceMap::default()
        };
        let next = *self.peek();
        let (args, end) = if next.is_op("(") && !next.space_before {
            self.advance();
            let (args, close) = self.list_args(")")?;
            loc.begin = Some(next.span);
            loc.end = Some(close.span);
            (args, close.span)
        } else if self.can_start_command_arg() {
            let args = self.command_args()?;
            let end = args.last().map_or(name.span, Node::span);
            (args, end)
        } else {
            (Vec::new(), name.span)
        };
        Ok(send(receiver, name.text, args, start.join(&end), loc))
    }

    /// Whether the next token begins an argument of a parenthesis-free call.
    fn can_start_command_arg(&self) -> bool {
        let tok = self.peek();
        if !tok.space_before {
            return false;
        }
        match tok.kind {
            TokType::Ident
            | TokType::Constant
            | TokType::IVar
            | TokType::Integer
            | TokType::Float
            | TokType::SingleQuoted
            | TokType::DoubleQuoted
            | TokType::Symbol
            | TokType::Label => true,
            TokType::Keyword => matches!(tok.text, "true" | "false" | "nil" | "self"),
            TokType::Op => match tok.text {
                "[" | "(" | "!" => true,
                "-" => {
                    let next = self.peek_nth(1);
                    matches!(next.kind, TokType::Integer | TokType::Float) && !next.space_before
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn command_args(&mut self) -> ParseResult<Vec<Node>> {
        let mut args = Vec::new();
        let mut pairs = Vec::new();
        loop {
            self.argument(&mut args, &mut pairs)?;
            if !self.at_op(",") {
                break;
            }
            self.advance();
            self.skip_newlines();
        }
        push_keyword_hash(&mut args, pairs);
        Ok(args)
    }

    /// Comma-separated arguments up to `close`, which is consumed and returned.
    fn list_args(&mut self, close: &str) -> ParseResult<(Vec<Node>, Token<'a>)> {
        let mut args = Vec::new();
        let mut pairs = Vec::new();
        self.skip_newlines();
        while !self.at_op(close) {
            self.argument(&mut args, &mut pairs)?;
            self.skip_newlines();
            if !self.at_op(",") {
                break;
            }
            self.advance();
            self.skip_newlines();
        }
        let close = self.expect_op(close)?;
        push_keyword_hash(&mut args, pairs);
        Ok((args, close))
    }

    /// One positional argument, or one `key: value` / `key => value` pair.
    fn argument(&mut self, args: &mut Vec<Node>, pairs: &mut Vec<Node>) -> ParseResult<()> {
        if self.peek().kind == TokType::Label {
            pairs.push(self.label_pair()?);
            return Ok(());
        }
        let value = self.ternary()?;
        if self.at_op("=>") {
            pairs.push(self.rocket_pair(value)?);
        } else if !pairs.is_empty() {
            return Err(ParseError::at(
                self.source,
                value.span().start,
                "positional argument after keyword arguments",
            ));
        } else {
            args.push(value);
        }
        Ok(())
    }

    fn label_pair(&mut self) -> ParseResult<Node> {
        let label = self.advance();
        let colon = Span::new(label.span.end - 1, label.span.end);
        let key = Node::new(
            NodeKind::Sym,
            vec![sym(&label.text[..label.text.len() - 1])],
            Span::new(label.span.start, colon.start),
        );
        self.skip_newlines();
        let value = self.ternary()?;
        let span = label.span.join(&value.span());
        Ok(
            Node::new(NodeKind::Pair, vec![key.into(), value.into()], span).with_loc(SourceMap {
                operator: Some(colon),
                ..SourceMap::default()
            }),
        )
    }

    fn rocket_pair(&mut self, key: Node) -> ParseResult<Node> {
        let op = self.advance();
        self.skip_newlines();
        let value = self.ternary()?;
        let span = key.span().join(&value.span());
        Ok(
            Node::new(NodeKind::Pair, vec![key.into(), value.into()], span).with_loc(SourceMap {
                operator: Some(op.span),
                ..SourceMap::default()
            }),
        )
    }

    // ------------------------------------------------------------------------
    // Primaries
    // ------------------------------------------------------------------------

    fn primary(&mut self) -> ParseResult<Node> {
        let tok = *self.peek();
        match tok.kind {
            TokType::Integer | TokType::Float => {
                self.advance();
                let kind = if tok.kind == TokType::Integer {
                    NodeKind::Int
                } else {
                    NodeKind::Float
                };
                Ok(Node::new(kind, vec![Child::Value(tok.text.to_string())], tok.span))
            }
            TokType::SingleQuoted => {
                self.advance();
                let inner = &tok.text[1..tok.text.len() - 1];
                Ok(
                    Node::new(NodeKind::Str, vec![Child::Value(inner.to_string())], tok.span)
                        .with_loc(delimiters(
                            Span::new(tok.span.start, tok.span.start + 1),
                            Span::new(tok.span.end - 1, tok.span.end),
                        )),
                )
            }
            TokType::DoubleQuoted => {
                self.advance();
                self.double_quoted(tok)
            }
            TokType::Symbol => {
                self.advance();
                Ok(Node::new(NodeKind::Sym, vec![sym(&tok.text[1..])], tok.span))
            }
            TokType::IVar => {
                self.advance();
                Ok(Node::new(NodeKind::Ivar, vec![sym(tok.text)], tok.span))
            }
            TokType::Constant => {
                self.advance();
                let next = self.peek();
                if next.is_op("(") && !next.space_before {
                    return self.call(None, tok);
                }
                Ok(Node::new(NodeKind::Const, vec![Child::Absent, sym(tok.text)], tok.span))
            }
            TokType::Ident => {
                self.advance();
                let next = self.peek();
                let paren_call = next.is_op("(") && !next.space_before;
                if !paren_call && self.is_local(tok.text) {
                    return Ok(Node::new(NodeKind::Lvar, vec![sym(tok.text)], tok.span));
                }
                self.call(None, tok)
            }
            TokType::Keyword => self.keyword(tok),
            TokType::Op if tok.text == "(" => self.parenthesized(),
            TokType::Op if tok.text == "[" => {
                let open = self.advance();
                let (elements, close) = self.list_args("]")?;
                Ok(Node::new(
                    NodeKind::Array,
                    elements.into_iter().map(Child::Node).collect(),
                    open.span.join(&close.span),
                )
                .with_loc(delimiters(open.span, close.span)))
            }
            TokType::Op if tok.text == "{" => self.hash_literal(),
            _ => Err(self.unexpected("expression")),
        }
    }

    fn keyword(&mut self, tok: Token<'a>) -> ParseResult<Node> {
        let literal = match tok.text {
            "true" => Some(NodeKind::True),
            "false" => Some(NodeKind::False),
            "nil" => Some(NodeKind::Nil),
            "self" => Some(NodeKind::SelfRef),
            _ => None,
        };
        if let Some(kind) = literal {
            self.advance();
            return Ok(Node::new(kind, Vec::new(), tok.span));
        }
        match tok.text {
            "begin" => self.kwbegin(),
            "if" | "unless" => self.conditional(),
            "def" => self.def(),
            "class" => self.class(),
            "module" => self.module(),
            _ => Err(self.error_at(&tok, &format!("unsupported keyword '{}'", tok.text))),
        }
    }

    fn parenthesized(&mut self) -> ParseResult<Node> {
        let open = self.advance();
        let body = self.statements(&[")"])?;
        let close = self.expect_op(")")?;
        Ok(Node::new(
            NodeKind::Begin,
            body_children(body),
            open.span.join(&close.span),
        )
        .with_loc(delimiters(open.span, close.span)))
    }

    fn hash_literal(&mut self) -> ParseResult<Node> {
        let open = self.advance();
        let mut pairs = Vec::new();
        self.skip_newlines();
        while !self.at_op("}") {
            if self.peek().kind == TokType::Label {
                pairs.push(self.label_pair()?);
            } else {
                let key = self.ternary()?;
                if !self.at_op("=>") {
                    return Err(self.unexpected("'=>'"));
                }
                pairs.push(self.rocket_pair(key)?);
            }
            self.skip_newlines();
            if !self.at_op(",") {
                break;
            }
            self.advance();
            self.skip_newlines();
        }
        let close = self.expect_op("}")?;
        Ok(Node::new(
            NodeKind::Hash,
            pairs.into_iter().map(Child::Node).collect(),
            open.span.join(&close.span),
        )
        .with_loc(delimiters(open.span, close.span)))
    }

    // ------------------------------------------------------------------------
    // Strings
    // ------------------------------------------------------------------------

    /// `"..."` becomes `str`, or `dstr` when it has interpolations.
    fn double_quoted(&mut self, tok: Token<'a>) -> ParseResult<Node> {
        let source = self.source;
        let bytes = source.as_bytes();
        let inner_start = tok.span.start + 1;
        let inner_end = tok.span.end - 1;
        let loc = delimiters(
            Span::new(tok.span.start, inner_start),
            Span::new(inner_end, tok.span.end),
        );

        let mut parts = Vec::new();
        let mut interpolated = false;
        let mut segment_start = inner_start;
        let mut i = inner_start;
        while i < inner_end {
            match bytes[i] {
                b'\\' => i += 2,
                b'#' if i + 1 < inner_end && bytes[i + 1] == b'{' => {
                    interpolated = true;
                    if segment_start < i {
                        parts.push(self.str_part(segment_start, i));
                    }
                    let Some(close) = find_interpolation_end(bytes, i + 2, inner_end) else {
                        return Err(ParseError::at(self.source, i, "unterminated interpolation"));
                    };
                    parts.push(self.interpolation(i, close)?);
                    i = close + 1;
                    segment_start = i;
                }
                _ => i += 1,
            }
        }

        if !interpolated {
            let contents = source[inner_start..inner_end].to_string();
            return Ok(Node::new(NodeKind::Str, vec![Child::Value(contents)], tok.span).with_loc(loc));
        }
        if segment_start < inner_end {
            parts.push(self.str_part(segment_start, inner_end));
        }
        Ok(Node::new(
            NodeKind::Dstr,
            parts.into_iter().map(Child::Node).collect(),
            tok.span,
        )
        .with_loc(loc))
    }

    fn str_part(&self, start: usize, end: usize) -> Node {
        Node::new(
            NodeKind::Str,
            vec![Child::Value(self.source[start..end].to_string())],
            Span::new(start, end),
        )
    }

    /// `#{...}` from the `#` at `open` to the `}` at `close`.
    fn interpolation(&self, open: usize, close: usize) -> ParseResult<Node> {
        let tokens = tokenize_range(self.source, open + 2, close)?;
        let mut inner = Parser {
            source: self.source,
            tokens,
            pos: 0,
            scopes: vec![self.scopes.last().cloned().unwrap_or_default()],
        };
        let body = inner.program()?;
        Ok(
            Node::new(NodeKind::Begin, body_children(body), Span::new(open, close + 1)).with_loc(
                delimiters(Span::new(open, open + 2), Span::new(close, close + 1)),
            ),
        )
    }

    // ------------------------------------------------------------------------
    // Compound statements
    // ------------------------------------------------------------------------

    fn kwbegin(&mut self) -> ParseResult<Node> {
        let kw = self.advance();
        let body = self.body_with_rescue()?;
        let end = self.expect_keyword("end")?;
        Ok(
            Node::new(NodeKind::Kwbegin, body_children(body), kw.span.join(&end.span)).with_loc(
                SourceMap {
                    keyword: Some(kw.span),
                    end: Some(end.span),
                    ..SourceMap::default()
                },
            ),
        )
    }

    /// Statements optionally followed by `rescue` clauses, `else` and `ensure`.
    fn body_with_rescue(&mut self) -> ParseResult<Option<Node>> {
        let mut node = self.statements(BODY_END)?;

        let mut resbodies = Vec::new();
        while self.at_keyword("rescue") {
            resbodies.push(self.resbody()?);
        }

        let mut else_kw = None;
        let mut else_body = None;
        if self.at_keyword("else") {
            if resbodies.is_empty() {
                return Err(self.error_at(self.peek(), "'else' without 'rescue'"));
            }
            else_kw = Some(self.advance());
            else_body = self.statements(&["ensure", "end"])?;
        }

        if !resbodies.is_empty() {
            let first = resbodies[0].span();
            let last = resbodies[resbodies.len() - 1].span();
            let start = node.as_ref().map_or(first, Node::span);
            let end = else_body
                .as_ref()
                .map(Node::span)
                .or(else_kw.map(|kw| kw.span))
                .unwrap_or(last);
            let mut children = vec![Child::from(node)];
            children.extend(resbodies.into_iter().map(Child::Node));
            children.push(Child::from(else_body));
            node = Some(
                Node::new(NodeKind::Rescue, children, start.join(&end)).with_loc(SourceMap {
                    keyword: else_kw.map(|kw| kw.span),
                    ..SourceMap::default()
                }),
            );
        }

        if self.at_keyword("ensure") {
            let kw = self.advance();
            let ensure_body = self.statements(&["end"])?;
            let start = node.as_ref().map_or(kw.span, Node::span);
            let end = ensure_body.as_ref().map_or(kw.span, Node::span);
            node = Some(
                Node::new(
                    NodeKind::Ensure,
                    vec![Child::from(node), Child::from(ensure_body)],
                    start.join(&end),
                )
                .with_loc(SourceMap {
                    keyword: Some(kw.span),
                    ..SourceMap::default()
                }),
            );
        }

        Ok(node)
    }

    /// `rescue [Exc, ...] [=> var] [then] body`
    fn resbody(&mut self) -> ParseResult<Node> {
        let kw = self.advance();

        let mut exceptions = Vec::new();
        if !(self.at_op("=>") || self.at_newline() || self.at_keyword("then") || self.at_eof()) {
            exceptions.push(self.ternary()?);
            while self.at_op(",") {
                self.advance();
                self.skip_newlines();
                exceptions.push(self.ternary()?);
            }
        }
        let exception_list = if exceptions.is_empty() {
            None
        } else {
            let span = exceptions[0]
                .span()
                .join(&exceptions[exceptions.len() - 1].span());
            Some(Node::new(
                NodeKind::Array,
                exceptions.into_iter().map(Child::Node).collect(),
                span,
            ))
        };

        let mut assoc = None;
        let binding = if self.at_op("=>") {
            assoc = Some(self.advance().span);
            let name = self.advance();
            let kind = match name.kind {
                TokType::Ident => {
                    self.declare(name.text);
                    NodeKind::Lvasgn
                }
                TokType::IVar => NodeKind::Ivasgn,
                _ => return Err(self.error_at(&name, "expected variable name after '=>'")),
            };
            Some(
                Node::new(kind, vec![sym(name.text)], name.span).with_loc(SourceMap {
                    selector: Some(name.span),
                    ..SourceMap::default()
                }),
            )
        } else {
            None
        };

        if self.at_keyword("then") {
            self.advance();
        }
        let body = self.statements(BODY_END)?;

        let end = body
            .as_ref()
            .or(binding.as_ref())
            .or(exception_list.as_ref())
            .map_or(kw.span, Node::span);
        Ok(Node::new(
            NodeKind::Resbody,
            vec![
                Child::from(exception_list),
                Child::from(binding),
                Child::from(body),
            ],
            kw.span.join(&end),
        )
        .with_loc(SourceMap {
            keyword: Some(kw.span),
            operator: assoc,
            ..SourceMap::default()
        }))
    }

    /// `if`/`unless`/`elsif`. An `elsif` chain nests as the else-branch and
    /// only the outermost conditional consumes `end`.
    fn conditional(&mut self) -> ParseResult<Node> {
        let kw = self.advance();
        let cond = self.expression()?;
        if self.at_keyword("then") {
            self.advance();
        }
        let then_body = self.statements(&["elsif", "else", "end"])?;
        let else_body = if self.at_keyword("elsif") {
            if kw.text == "unless" {
                return Err(self.error_at(self.peek(), "'elsif' after 'unless'"));
            }
            Some(self.conditional()?)
        } else if self.at_keyword("else") {
            self.advance();
            self.statements(&["end"])?
        } else {
            None
        };

        let (end, end_loc) = if kw.text == "elsif" {
            let end = else_body
                .as_ref()
                .or(then_body.as_ref())
                .map_or(cond.span(), Node::span);
            (end, None)
        } else {
            let end_kw = self.expect_keyword("end")?;
            (end_kw.span, Some(end_kw.span))
        };

        let (then_branch, else_branch) = if kw.text == "unless" {
            (else_body, then_body)
        } else {
            (then_body, else_body)
        };
        Ok(Node::new(
            NodeKind::If,
            vec![cond.into(), then_branch.into(), else_branch.into()],
            kw.span.join(&end),
        )
        .with_loc(SourceMap {
            keyword: Some(kw.span),
            end: end_loc,
            ..SourceMap::default()
        }))
    }

    fn def(&mut self) -> ParseResult<Node> {
        let kw = self.advance();
        let name = self.advance();
        if !matches!(
            name.kind,
            TokType::Ident | TokType::Constant | TokType::Keyword
        ) {
            return Err(self.error_at(&name, "expected method name after 'def'"));
        }
        self.in_new_scope(|parser| {
            let args = parser.params(&name)?;
            let body = parser.body_with_rescue()?;
            let end = parser.expect_keyword("end")?;
            Ok(Node::new(
                NodeKind::Def,
                vec![sym(name.text), args.into(), Child::from(body)],
                kw.span.join(&end.span),
            )
            .with_loc(SourceMap {
                keyword: Some(kw.span),
                selector: Some(name.span),
                end: Some(end.span),
                ..SourceMap::default()
            }))
        })
    }

    /// Parameter list, with or without parentheses.
    fn params(&mut self, name: &Token<'a>) -> ParseResult<Node> {
        let mut params = Vec::new();
        if self.at_op("(") {
            let open = self.advance();
            self.skip_newlines();
            while !self.at_op(")") {
                params.push(self.param()?);
                self.skip_newlines();
                if !self.at_op(",") {
                    break;
                }
                self.advance();
                self.skip_newlines();
            }
            let close = self.expect_op(")")?;
            return Ok(Node::new(
                NodeKind::Args,
                params.into_iter().map(Child::Node).collect(),
                open.span.join(&close.span),
            )
            .with_loc(delimiters(open.span, close.span)));
        }

        if self.peek().kind == TokType::Ident {
            params.push(self.param()?);
            while self.at_op(",") {
                self.advance();
                params.push(self.param()?);
            }
        }
        let span = match (params.first(), params.last()) {
            (Some(first), Some(last)) => first.span().join(&last.span()),
            _ => Span::empty_at(name.span.end),
        };
        Ok(Node::new(
            NodeKind::Args,
            params.into_iter().map(Child::Node).collect(),
            span,
        ))
    }

    fn param(&mut self) -> ParseResult<Node> {
        let tok = self.advance();
        if tok.kind != TokType::Ident {
            return Err(self.error_at(&tok, "expected parameter name"));
        }
        self.declare(tok.text);
        Ok(Node::new(NodeKind::Arg, vec![sym(tok.text)], tok.span))
    }

    fn class(&mut self) -> ParseResult<Node> {
        let kw = self.advance();
        let name = self.const_path()?;
        let superclass = if self.at_op("<") {
            self.advance();
            Some(self.ternary()?)
        } else {
            None
        };
        let body = self.in_new_scope(Self::body_with_rescue)?;
        let end = self.expect_keyword("end")?;
        Ok(Node::new(
            NodeKind::Class,
            vec![name.into(), Child::from(superclass), Child::from(body)],
            kw.span.join(&end.span),
        )
        .with_loc(SourceMap {
            keyword: Some(kw.span),
            end: Some(end.span),
            ..SourceMap::default()
        }))
    }

    fn module(&mut self) -> ParseResult<Node> {
        let kw = self.advance();
        let name = self.const_path()?;
        let body = self.in_new_scope(Self::body_with_rescue)?;
        let end = self.expect_keyword("end")?;
        Ok(Node::new(
            NodeKind::Module,
            vec![name.into(), Child::from(body)],
            kw.span.join(&end.span),
        )
        .with_loc(SourceMap {
            keyword: Some(kw.span),
            end: Some(end.span),
            ..SourceMap::default()
        }))
    }

    /// `Name` or `Outer::Inner` after `class`/`module`.
    fn const_path(&mut self) -> ParseResult<Node> {
        let tok = self.advance();
        if tok.kind != TokType::Constant {
            return Err(self.error_at(&tok, "expected constant name"));
        }
        let mut node = Node::new(NodeKind::Const, vec![Child::Absent, sym(tok.text)], tok.span);
        while self.at_op("::") {
            self.advance();
            let name = self.advance();
            if name.kind != TokType::Constant {
                return Err(self.error_at(&name, "expected constant name after '::'"));
            }
            let span = node.span().join(&name.span);
            node = Node::new(NodeKind::Const, vec![node.into(), sym(name.text)], span);
        }
        Ok(node)
    }
}

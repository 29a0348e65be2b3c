// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! AST node model.
//!
//! Every node is a [`NodeKind`] tag, an ordered list of [`Child`] values and a
//! byte [`Span`] into the original source. The layout follows the s-expression
//! shape of the Ruby `parser` gem so node patterns read the same way:
//!
//! | Kind | Children |
//! |------|----------|
//! | `send` | receiver or absent, `:method`, arguments... |
//! | `str` | raw contents |
//! | `dstr` | `str` and `begin` parts |
//! | `sym` | `:name` |
//! | `int`, `float` | literal text |
//! | `array`, `hash` | elements / `pair`s |
//! | `pair` | key, value |
//! | `if` | condition, then-branch or absent, else-branch or absent |
//! | `const` | scope or absent, `:Name` |
//! | `lvar`, `ivar` | `:name` |
//! | `lvasgn`, `ivasgn` | `:name`, value (absent in a rescue binding) |
//! | `begin`, `kwbegin` | statements... |
//! | `rescue` | body or absent, `resbody`..., else-body or absent |
//! | `resbody` | exception list (`array`) or absent, binding or absent, body or absent |
//! | `ensure` | body or absent, ensure-body or absent |
//! | `def` | `:name`, `args`, body or absent |
//! | `class` | `const`, superclass or absent, body or absent |
//! | `module` | `const`, body or absent |
//! | `and`, `or` | lhs, rhs |
//! | `return` | value or absent |
//!
//! Nodes are immutable once built. Edits are expressed out of band as
//! `rubric_core::patch::Rewrite` values keyed by span.

use std::fmt;

pub use rubric_core::patch::Span;

// ============================================================================
// Node Kind
// ============================================================================

/// The closed set of node tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NodeKind {
    Send,
    Str,
    Dstr,
    Sym,
    Int,
    Float,
    Array,
    Hash,
    Pair,
    True,
    False,
    Nil,
    SelfRef,
    If,
    Const,
    Lvar,
    Ivar,
    Lvasgn,
    Ivasgn,
    Begin,
    Kwbegin,
    Rescue,
    Resbody,
    Ensure,
    Def,
    Args,
    Arg,
    Class,
    Module,
    And,
    Or,
    Return,
}

impl NodeKind {
    /// Every kind, in declaration order.
    pub const ALL: &'static [NodeKind] = &[
        NodeKind::Send,
        NodeKind::Str,
        NodeKind::Dstr,
        NodeKind::Sym,
        NodeKind::Int,
        NodeKind::Float,
        NodeKind::Array,
        NodeKind::Hash,
        NodeKind::Pair,
        NodeKind::True,
        NodeKind::False,
        NodeKind::Nil,
        NodeKind::SelfRef,
        NodeKind::If,
        NodeKind::Const,
        NodeKind::Lvar,
        NodeKind::Ivar,
        NodeKind::Lvasgn,
        NodeKind::Ivasgn,
        NodeKind::Begin,
        NodeKind::Kwbegin,
        NodeKind::Rescue,
        NodeKind::Resbody,
        NodeKind::Ensure,
        NodeKind::Def,
        NodeKind::Args,
        NodeKind::Arg,
        NodeKind::Class,
        NodeKind::Module,
        NodeKind::And,
        NodeKind::Or,
        NodeKind::Return,
    ];

    /// The s-expression tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Send => "send",
            NodeKind::Str => "str",
            NodeKind::Dstr => "dstr",
            NodeKind::Sym => "sym",
            NodeKind::Int => "int",
            NodeKind::Float => "float",
            NodeKind::Array => "array",
            NodeKind::Hash => "hash",
            NodeKind::Pair => "pair",
            NodeKind::True => "true",
            NodeKind::False => "false",
            NodeKind::Nil => "nil",
            NodeKind::SelfRef => "self",
            NodeKind::If => "if",
            NodeKind::Const => "const",
            NodeKind::Lvar => "lvar",
            NodeKind::Ivar => "ivar",
            NodeKind::Lvasgn => "lvasgn",
            NodeKind::Ivasgn => "ivasgn",
            NodeKind::Begin => "begin",
            NodeKind::Kwbegin => "kwbegin",
            NodeKind::Rescue => "rescue",
            NodeKind::Resbody => "resbody",
            NodeKind::Ensure => "ensure",
            NodeKind::Def => "def",
            NodeKind::Args => "args",
            NodeKind::Arg => "arg",
            NodeKind::Class => "class",
            NodeKind::Module => "module",
            NodeKind::And => "and",
            NodeKind::Or => "or",
            NodeKind::Return => "return",
        }
    }

    /// Look up a kind by its s-expression tag.
    pub fn from_name(name: &str) -> Option<NodeKind> {
        NodeKind::ALL.iter().copied().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Children
// ============================================================================

/// One slot in a node's child list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    /// A nested node.
    Node(Node),
    /// A method selector or identifier (`:puts`, `:@ivar`, `:Const`).
    Symbol(String),
    /// Raw literal text (string contents, numeric literal).
    Value(String),
    /// An optional slot with nothing in it, e.g. a send without receiver.
    Absent,
}

impl Child {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Child::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&str> {
        match self {
            Child::Symbol(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<&str> {
        match self {
            Child::Value(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Child::Absent)
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(node)
    }
}

impl From<Option<Node>> for Child {
    fn from(node: Option<Node>) -> Self {
        match node {
            Some(node) => Child::Node(node),
            None => Child::Absent,
        }
    }
}

// ============================================================================
// Source Map
// ============================================================================

/// Sub-ranges of a node that matter for reporting and rewriting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SourceMap {
    /// Method name of a send (`format`, `%`), or the name a def or assignment binds.
    pub selector: Option<Span>,
    /// Leading keyword (`if`, `rescue`, `def`, ...).
    pub keyword: Option<Span>,
    /// Operator token (`=`, `=>`, `?`, `&&`, the `:` of a label pair).
    pub operator: Option<Span>,
    /// Opening delimiter (`(`, `[`, `{`, quote, `#{`).
    pub begin: Option<Span>,
    /// Closing delimiter.
    pub end: Option<Span>,
}

// ============================================================================
// Node
// ============================================================================

/// Method names that are operators rather than identifiers.
pub const OPERATOR_METHODS: &[&str] = &[
    "+", "-", "*", "/", "%", "**", "==", "!=", "<", "<=", ">", ">=", "<=>", "=~", "!", "-@",
    "+@", "[]", "<<", ">>", "&", "|", "^",
];

/// A typed, immutable tree element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    children: Vec<Child>,
    span: Span,
    loc: SourceMap,
}

impl Node {
    /// Create a node with an empty source map.
    pub fn new(kind: NodeKind, children: Vec<Child>, span: Span) -> Self {
        Node {
            kind,
            children,
            span,
            loc: SourceMap::default(),
        }
    }

    /// Attach sub-range locations.
    pub fn with_loc(mut self, loc: SourceMap) -> Self {
        self.loc = loc;
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn children(&self) -> &[Child] {
        &self.children
    }

    pub fn into_children(self) -> Vec<Child> {
        self.children
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn loc(&self) -> &SourceMap {
        &self.loc
    }

    /// The source text covered by this node.
    pub fn source<'s>(&self, source: &'s str) -> &'s str {
        self.span.slice(source).unwrap_or("")
    }

    pub fn child(&self, index: usize) -> Option<&Child> {
        self.children.get(index)
    }

    pub fn child_node(&self, index: usize) -> Option<&Node> {
        self.child(index).and_then(Child::as_node)
    }

    pub fn child_symbol(&self, index: usize) -> Option<&str> {
        self.child(index).and_then(Child::as_symbol)
    }

    pub fn child_value(&self, index: usize) -> Option<&str> {
        self.child(index).and_then(Child::as_value)
    }

    /// Direct children that are nodes, skipping symbols, values and absent slots.
    pub fn node_children(&self) -> impl Iterator<Item = &Node> {
        self.children.iter().filter_map(Child::as_node)
    }

    // ------------------------------------------------------------------------
    // Kind predicates
    // ------------------------------------------------------------------------

    pub fn is(&self, kind: NodeKind) -> bool {
        self.kind == kind
    }

    /// `str` or `dstr`.
    pub fn is_string_literal(&self) -> bool {
        matches!(self.kind, NodeKind::Str | NodeKind::Dstr)
    }

    pub fn is_constant(&self) -> bool {
        self.kind == NodeKind::Const
    }

    pub fn is_array(&self) -> bool {
        self.kind == NodeKind::Array
    }

    pub fn is_hash(&self) -> bool {
        self.kind == NodeKind::Hash
    }

    pub fn is_send(&self) -> bool {
        self.kind == NodeKind::Send
    }

    pub fn is_true(&self) -> bool {
        self.kind == NodeKind::True
    }

    pub fn is_false(&self) -> bool {
        self.kind == NodeKind::False
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self.kind, NodeKind::True | NodeKind::False)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, NodeKind::Int | NodeKind::Float)
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, NodeKind::Lvar | NodeKind::Lvasgn | NodeKind::Arg)
    }

    // ------------------------------------------------------------------------
    // send accessors
    // ------------------------------------------------------------------------

    /// Receiver of a send, `None` for receiverless calls and non-sends.
    pub fn receiver(&self) -> Option<&Node> {
        if self.kind != NodeKind::Send {
            return None;
        }
        self.child_node(0)
    }

    /// Method name of a send.
    pub fn method_name(&self) -> Option<&str> {
        if self.kind != NodeKind::Send {
            return None;
        }
        self.child_symbol(1)
    }

    /// Arguments of a send, in order.
    pub fn arguments(&self) -> Vec<&Node> {
        if self.kind != NodeKind::Send {
            return Vec::new();
        }
        self.children
            .iter()
            .skip(2)
            .filter_map(Child::as_node)
            .collect()
    }

    /// True for operator sends like `a % b`, `!x`, `a[1]`.
    pub fn is_operator_method(&self) -> bool {
        self.method_name()
            .is_some_and(|name| OPERATOR_METHODS.contains(&name))
    }

    /// True for infix operator sends with a receiver and one argument (`a + b`).
    pub fn is_binary_operation(&self) -> bool {
        self.receiver().is_some()
            && self.children.len() == 3
            && self
                .method_name()
                .is_some_and(|name| OPERATOR_METHODS.contains(&name) && name != "[]")
    }

    // ------------------------------------------------------------------------
    // if accessors
    // ------------------------------------------------------------------------

    pub fn condition(&self) -> Option<&Node> {
        if self.kind != NodeKind::If {
            return None;
        }
        self.child_node(0)
    }

    pub fn if_branch(&self) -> Option<&Node> {
        if self.kind != NodeKind::If {
            return None;
        }
        self.child_node(1)
    }

    pub fn else_branch(&self) -> Option<&Node> {
        if self.kind != NodeKind::If {
            return None;
        }
        self.child_node(2)
    }

    /// A hash literal written with `{ }`. Keyword arguments have no braces.
    pub fn has_braces(&self) -> bool {
        self.loc.begin.is_some() && self.loc.end.is_some()
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    /// Render as an s-expression, e.g. `(send nil :puts (int 1))`.
    pub fn to_sexp(&self) -> String {
        let mut out = String::new();
        self.write_sexp(&mut out);
        out
    }

    fn write_sexp(&self, out: &mut String) {
        out.push('(');
        out.push_str(self.kind.as_str());
        for child in &self.children {
            out.push(' ');
            match child {
                Child::Node(node) => node.write_sexp(out),
                Child::Symbol(name) => {
                    out.push(':');
                    out.push_str(name);
                }
                Child::Value(text) if self.is_numeric() => out.push_str(text),
                Child::Value(text) => out.push_str(&format!("{:?}", text)),
                Child::Absent => out.push_str("nil"),
            }
        }
        out.push(')');
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sexp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(text: &str, start: usize) -> Node {
        Node::new(
            NodeKind::Int,
            vec![Child::Value(text.to_string())],
            Span::new(start, start + text.len()),
        )
    }

    fn percent(lhs: Node, rhs: Node) -> Node {
        let span = lhs.span().join(&rhs.span());
        Node::new(
            NodeKind::Send,
            vec![lhs.into(), Child::Symbol("%".to_string()), rhs.into()],
            span,
        )
    }

    #[test]
    fn kind_names_roundtrip() {
        for kind in NodeKind::ALL {
            assert_eq!(NodeKind::from_name(kind.as_str()), Some(*kind));
        }
        assert_eq!(NodeKind::from_name("csend"), None);
    }

    #[test]
    fn send_accessors() {
        // 10 % 4
        let node = percent(int("10", 0), int("4", 5));
        assert_eq!(node.method_name(), Some("%"));
        assert_eq!(node.receiver().map(Node::kind), Some(NodeKind::Int));
        assert_eq!(node.arguments().len(), 1);
        assert!(node.is_operator_method());
        assert!(node.is_binary_operation());
        assert_eq!(node.source("10 % 4"), "10 % 4");
    }

    #[test]
    fn non_send_accessors_are_empty() {
        let node = int("1", 0);
        assert!(node.receiver().is_none());
        assert!(node.method_name().is_none());
        assert!(node.arguments().is_empty());
        assert!(node.condition().is_none());
    }

    #[test]
    fn sexp_rendering() {
        let node = percent(int("10", 0), int("4", 5));
        assert_eq!(node.to_sexp(), "(send (int 10) :% (int 4))");

        let call = Node::new(
            NodeKind::Send,
            vec![
                Child::Absent,
                Child::Symbol("puts".to_string()),
                Node::new(
                    NodeKind::Str,
                    vec![Child::Value("%d".to_string())],
                    Span::new(5, 9),
                )
                .into(),
            ],
            Span::new(0, 9),
        );
        assert_eq!(call.to_sexp(), r#"(send nil :puts (str "%d"))"#);
    }

    #[test]
    fn braces_come_from_source_map() {
        let bare = Node::new(NodeKind::Hash, vec![], Span::new(0, 0));
        assert!(!bare.has_braces());
        let braced = bare.with_loc(SourceMap {
            begin: Some(Span::new(0, 1)),
            end: Some(Span::new(1, 2)),
            ..SourceMap::default()
        });
        assert!(braced.has_braces());
    }
}

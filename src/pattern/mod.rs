//! Node pattern language.
//!
//! A small structural DSL for describing AST shapes, in the style of the
//! RuboCop node pattern language. Patterns are compiled once and matched
//! against any number of nodes; they never hold on to matched nodes.
//!
//! ## Grammar
//!
//! ```text
//! <pattern>   := "$" <pattern>                 capture
//!              | "!" <pattern>                 negation
//!              | "(" <head> <pattern>* ")"      node with children
//!              | "{" <pattern>+ "}"             any of
//!              | "[" <pattern>+ "]"             all of
//!              | "..."                          any run of children
//!              | "_"                            any single child
//!              | "nil"                          absent slot or nil literal
//!              | ":" symbol | "\"" text "\"" | integer
//!              | kind                           node of that kind
//! <head>      := kind | "_" | "{" kind+ "}"
//! ```
//!
//! ## Examples
//!
//! ```text
//! (send nil ${:sprintf :format} _ _ ...)   # receiverless format call, 2+ args
//! (send {str dstr} $:% ...)                 # string literal % anything
//! (resbody _ $(lvasgn _) _)                 # rescue clause with a local binding
//! (if $_ true false)                        # if-expression returning booleans
//! ```

mod matcher;
mod parser;

use std::fmt;
use std::str::FromStr;

use rubric_ast::{Child, Node, NodeKind};
use rubric_core::RubricError;
use thiserror::Error;
use winnow::Parser;

/// Error type for pattern compilation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid node pattern '{pattern}': {message}")]
pub struct PatternError {
    pub pattern: String,
    pub message: String,
}

impl From<PatternError> for RubricError {
    fn from(err: PatternError) -> Self {
        RubricError::InvalidPattern {
            pattern: err.pattern,
            message: err.message,
        }
    }
}

// ============================================================================
// Pattern Tree
// ============================================================================

/// One compiled pattern element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    /// `_`
    Wildcard,
    /// `...`
    Rest,
    /// `nil`
    Nil,
    /// `:name`
    Symbol(String),
    /// `"text"` or an integer, compared against raw literal children.
    Literal(String),
    /// A bare kind word such as `str` or `const`.
    Kind(NodeKind),
    /// `(head children...)`. A `None` head accepts any kind.
    Sequence {
        kinds: Option<Vec<NodeKind>>,
        children: Vec<Pattern>,
    },
    /// `{a b}`
    Any(Vec<Pattern>),
    /// `[a b]`
    All(Vec<Pattern>),
    /// `!p`
    Not(Box<Pattern>),
    /// `$p`
    Capture(Box<Pattern>),
}

// ============================================================================
// Matched Values
// ============================================================================

/// A borrowed view of one child slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
    Node(&'a Node),
    Symbol(&'a str),
    Literal(&'a str),
    Absent,
}

impl<'a> Value<'a> {
    pub fn as_node(&self) -> Option<&'a Node> {
        match *self {
            Value::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&'a str> {
        match *self {
            Value::Symbol(name) => Some(name),
            _ => None,
        }
    }
}

impl<'a> From<&'a Child> for Value<'a> {
    fn from(child: &'a Child) -> Self {
        match child {
            Child::Node(node) => Value::Node(node),
            Child::Symbol(name) => Value::Symbol(name),
            Child::Value(text) => Value::Literal(text),
            Child::Absent => Value::Absent,
        }
    }
}

/// A single capture: one value for `$x`, a run of values for `$...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Captured<'a> {
    One(Value<'a>),
    Many(Vec<Value<'a>>),
}

/// Values captured by a successful match, in left-to-right order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captures<'a> {
    items: Vec<Captured<'a>>,
}

impl<'a> Captures<'a> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Captured<'a>> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Captured<'a>> {
        self.items.iter()
    }

    /// The single value at `index`.
    pub fn value(&self, index: usize) -> Option<Value<'a>> {
        match self.items.get(index)? {
            Captured::One(value) => Some(*value),
            Captured::Many(_) => None,
        }
    }

    /// The node at `index`, if that capture is a single node.
    pub fn node(&self, index: usize) -> Option<&'a Node> {
        self.value(index)?.as_node()
    }

    /// The symbol at `index`, if that capture is a single symbol.
    pub fn symbol(&self, index: usize) -> Option<&'a str> {
        self.value(index)?.as_symbol()
    }

    /// The run of values captured by `$...` at `index`.
    pub fn sequence(&self, index: usize) -> Option<&[Value<'a>]> {
        match self.items.get(index)? {
            Captured::Many(values) => Some(values),
            Captured::One(_) => None,
        }
    }
}

// ============================================================================
// Compiled Pattern
// ============================================================================

/// A compiled node pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePattern {
    source: String,
    root: Pattern,
}

impl NodePattern {
    /// Compile a pattern.
    ///
    /// # Examples
    ///
    /// ```
    /// use rubric::pattern::NodePattern;
    ///
    /// let pattern = NodePattern::parse("(send nil :puts _)").unwrap();
    /// let node = rubric_ast::parse("puts 1").unwrap().unwrap();
    /// assert!(pattern.matches(&node));
    /// ```
    pub fn parse(source: &str) -> Result<NodePattern, PatternError> {
        if source.trim().is_empty() {
            return Err(PatternError {
                pattern: source.to_string(),
                message: "empty pattern".to_string(),
            });
        }

        parser::parse_root
            .parse(source)
            .map(|root| NodePattern {
                source: source.to_string(),
                root,
            })
            .map_err(|e| PatternError {
                pattern: source.to_string(),
                message: format!("unexpected input at offset {}", e.offset()),
            })
    }

    /// The text this pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Pattern {
        &self.root
    }

    /// Match against `node`, returning the captures on success.
    pub fn match_node<'a>(&self, node: &'a Node) -> Option<Captures<'a>> {
        let mut items = Vec::new();
        if matcher::match_value(&self.root, Value::Node(node), &mut items) {
            Some(Captures { items })
        } else {
            None
        }
    }

    pub fn matches(&self, node: &Node) -> bool {
        self.match_node(node).is_some()
    }
}

impl FromStr for NodePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodePattern::parse(s)
    }
}

impl fmt::Display for NodePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Match `pattern` against `node`.
pub fn match_pattern<'a>(pattern: &NodePattern, node: &'a Node) -> Option<Captures<'a>> {
    pattern.match_node(node)
}

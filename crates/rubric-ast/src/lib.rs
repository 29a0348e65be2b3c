// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Ruby-subset parser and AST for rubric.
//!
//! [`parse`] turns source text into an immutable [`Node`] tree whose spans
//! are byte offsets into that text. Trees are read-only; corrections are
//! computed as `rubric_core::patch::Rewrite` values against the source.
//!
//! ```
//! use rubric_ast::parse;
//!
//! let root = parse(r#"puts "%d" % 10"#).unwrap().unwrap();
//! assert_eq!(root.to_sexp(), r#"(send nil :puts (send (str "%d") :% (int 10)))"#);
//! ```

pub mod nodes;
pub mod parser;
pub mod tokenizer;
pub mod visitor;

pub use nodes::{Child, Node, NodeKind, SourceMap, Span};
pub use parser::{parse, ParseError, ParseResult};
pub use visitor::{descendants, walk, VisitResult, Visitor};

// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only traversal over [`Node`] trees.
//!
//! # Traversal Order
//!
//! - **Depth-first, pre-order** for [`Visitor::visit_node`]
//! - **Post-order** for [`Visitor::leave_node`]
//! - Children are visited in source order
//!
//! ```
//! use rubric_ast::visitor::{walk, VisitResult, Visitor};
//! use rubric_ast::{parse, Node, NodeKind};
//!
//! struct SendCounter(usize);
//!
//! impl<'a> Visitor<'a> for SendCounter {
//!     fn visit_node(&mut self, node: &'a Node) -> VisitResult {
//!         if node.kind() == NodeKind::Send {
//!             self.0 += 1;
//!         }
//!         VisitResult::Continue
//!     }
//! }
//!
//! let root = parse("puts format('%d', 1)").unwrap().unwrap();
//! let mut counter = SendCounter(0);
//! walk(&mut counter, &root);
//! assert_eq!(counter.0, 2);
//! ```

use crate::nodes::Node;

/// Controls traversal after a node is visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VisitResult {
    /// Descend into children.
    #[default]
    Continue,
    /// Skip this node's children, keep going with siblings.
    SkipChildren,
    /// Abort the whole traversal.
    Stop,
}

pub trait Visitor<'a> {
    fn visit_node(&mut self, _node: &'a Node) -> VisitResult {
        VisitResult::Continue
    }

    fn leave_node(&mut self, _node: &'a Node) {}
}

/// Walk `node` and its descendants. Returns [`VisitResult::Stop`] if the
/// visitor aborted the walk.
pub fn walk<'a, V: Visitor<'a>>(visitor: &mut V, node: &'a Node) -> VisitResult {
    match visitor.visit_node(node) {
        VisitResult::Stop => return VisitResult::Stop,
        VisitResult::SkipChildren => {}
        VisitResult::Continue => {
            for child in node.node_children() {
                if walk(visitor, child) == VisitResult::Stop {
                    return VisitResult::Stop;
                }
            }
        }
    }
    visitor.leave_node(node);
    VisitResult::Continue
}

/// Every node in the tree, pre-order.
pub fn descendants(root: &Node) -> Vec<&Node> {
    struct Collector<'a>(Vec<&'a Node>);

    impl<'a> Visitor<'a> for Collector<'a> {
        fn visit_node(&mut self, node: &'a Node) -> VisitResult {
            self.0.push(node);
            VisitResult::Continue
        }
    }

    let mut collector = Collector(Vec::new());
    walk(&mut collector, root);
    collector.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::NodeKind;
    use crate::parse;

    fn root(source: &str) -> Node {
        parse(source).unwrap().unwrap()
    }

    #[test]
    fn preorder_and_postorder() {
        struct Trace(Vec<String>);

        impl<'a> Visitor<'a> for Trace {
            fn visit_node(&mut self, node: &'a Node) -> VisitResult {
                self.0.push(format!("enter {}", node.kind()));
                VisitResult::Continue
            }

            fn leave_node(&mut self, node: &'a Node) {
                self.0.push(format!("leave {}", node.kind()));
            }
        }

        let tree = root("x % 1");
        let mut trace = Trace(Vec::new());
        walk(&mut trace, &tree);
        assert_eq!(
            trace.0,
            vec![
                "enter send",
                "enter send",
                "leave send",
                "enter int",
                "leave int",
                "leave send",
            ]
        );
    }

    #[test]
    fn skip_children() {
        struct SkipSends(Vec<NodeKind>);

        impl<'a> Visitor<'a> for SkipSends {
            fn visit_node(&mut self, node: &'a Node) -> VisitResult {
                self.0.push(node.kind());
                if node.kind() == NodeKind::Send {
                    VisitResult::SkipChildren
                } else {
                    VisitResult::Continue
                }
            }
        }

        let tree = root("a = [format(x), 1]");
        let mut visitor = SkipSends(Vec::new());
        walk(&mut visitor, &tree);
        assert_eq!(
            visitor.0,
            vec![NodeKind::Lvasgn, NodeKind::Array, NodeKind::Send, NodeKind::Int]
        );
    }

    #[test]
    fn stop_aborts_walk() {
        struct FirstInt(Option<String>);

        impl<'a> Visitor<'a> for FirstInt {
            fn visit_node(&mut self, node: &'a Node) -> VisitResult {
                if node.kind() == NodeKind::Int {
                    self.0 = node.child_value(0).map(str::to_string);
                    return VisitResult::Stop;
                }
                VisitResult::Continue
            }
        }

        let tree = root("foo(1, 2, 3)");
        let mut visitor = FirstInt(None);
        assert_eq!(walk(&mut visitor, &tree), VisitResult::Stop);
        assert_eq!(visitor.0.as_deref(), Some("1"));
    }

    #[test]
    fn descendants_in_source_order() {
        let tree = root("a = 1\nb = 2\n");
        let kinds: Vec<NodeKind> = descendants(&tree).iter().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::Begin,
                NodeKind::Lvasgn,
                NodeKind::Int,
                NodeKind::Lvasgn,
                NodeKind::Int,
            ]
        );
    }
}

// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Structural checks over a small corpus of supported Ruby.

use rubric_ast::{descendants, parse, Node, NodeKind};

const CORPUS: &[&str] = &[
    r#"puts "%d" % 10"#,
    "puts x % [10, 11]",
    "puts x % { a: 10, b: 11 }",
    "format(something, a, b)",
    "sprintf(something, a: 10, b: 11)",
    r##"puts "#{x * 5} %d #{@test}" % 10"##,
    "format :xml",
    "class MyController < ApplicationController
  def create
    # some code here
  rescue MyException => exception
    render_my_exception(exception)
  rescue MyAnotherException => exception
    render_an_another_exception(exception)
  end
end
",
    "begin
  something
rescue StandardError => e
  log(e)
else
  fine
ensure
  cleanup
end
",
    "if foo == bar\n  true\nelse\n  false\nend\n",
    "value = cond ? 'a' : \"b#{c}\"",
    "module Outer::Inner\n  def run(a, b)\n    return a unless b\n    a.send(:%, b)\n  end\nend\n",
];

fn check_containment(node: &Node, source: &str) {
    assert!(
        node.span().slice(source).is_some(),
        "span {} of {} is not a valid slice",
        node.span(),
        node.kind()
    );
    for child in node.node_children() {
        assert!(
            node.span().contains(&child.span()),
            "child {} {} escapes parent {} {}",
            child.kind(),
            child.span(),
            node.kind(),
            node.span()
        );
        check_containment(child, source);
    }
}

/// Siblings never share bytes. Modifier `if` puts the condition first even
/// though it follows the body in the source, so only disjointness is checked.
fn children_disjoint(node: &Node) {
    let mut spans: Vec<_> = node.node_children().map(Node::span).collect();
    spans.sort();
    for pair in spans.windows(2) {
        assert!(
            pair[0].end <= pair[1].start,
            "children of {} overlap: {} then {}",
            node.kind(),
            pair[0],
            pair[1]
        );
    }
}

#[test]
fn every_child_span_is_inside_its_parent() {
    for source in CORPUS {
        let root = parse(source)
            .unwrap_or_else(|e| panic!("{}: {}", source, e))
            .expect("non-empty");
        check_containment(&root, source);
    }
}

#[test]
fn sibling_spans_do_not_overlap() {
    for source in CORPUS {
        let root = parse(source).expect("parse").expect("non-empty");
        for node in descendants(&root) {
            children_disjoint(node);
        }
    }
}

#[test]
fn parsing_is_deterministic() {
    for source in CORPUS {
        let first = parse(source).expect("parse");
        let second = parse(source).expect("parse");
        assert_eq!(first, second);
    }
}

#[test]
fn selectors_point_at_method_names() {
    for source in CORPUS {
        let root = parse(source).expect("parse").expect("non-empty");
        for node in descendants(&root) {
            if node.kind() != NodeKind::Send || node.method_name() == Some("[]") {
                continue;
            }
            let selector = node.loc().selector.expect("send has a selector");
            assert_eq!(selector.slice(source), node.method_name());
        }
    }
}

//! Structural matching of compiled patterns against nodes.
//!
//! Every entry point leaves `captures` untouched when it returns `false`, so
//! alternatives and backtracking never observe captures from a failed branch.

use super::{Captured, Pattern, Value};

type CaptureStack<'a> = Vec<Captured<'a>>;

/// Match one pattern element against one child value.
pub(super) fn match_value<'a>(
    pattern: &Pattern,
    value: Value<'a>,
    captures: &mut CaptureStack<'a>,
) -> bool {
    attempt(captures, |captures| match_value_inner(pattern, value, captures))
}

fn match_value_inner<'a>(
    pattern: &Pattern,
    value: Value<'a>,
    captures: &mut CaptureStack<'a>,
) -> bool {
    match pattern {
        Pattern::Wildcard | Pattern::Rest => true,
        Pattern::Nil => match value {
            Value::Absent => true,
            Value::Node(node) => node.kind() == rubric_ast::NodeKind::Nil,
            _ => false,
        },
        Pattern::Symbol(name) => value.as_symbol() == Some(name.as_str()),
        Pattern::Literal(text) => {
            matches!(value, Value::Literal(literal) if literal == text.as_str())
        }
        Pattern::Kind(kind) => value.as_node().is_some_and(|node| node.kind() == *kind),
        Pattern::Sequence { kinds, children } => {
            let Some(node) = value.as_node() else {
                return false;
            };
            if let Some(kinds) = kinds {
                if !kinds.contains(&node.kind()) {
                    return false;
                }
            }
            let values: Vec<Value<'a>> = node.children().iter().map(Value::from).collect();
            match_sequence(children, &values, captures)
        }
        Pattern::Any(alternatives) => alternatives
            .iter()
            .any(|alternative| match_value(alternative, value, captures)),
        Pattern::All(parts) => parts.iter().all(|part| match_value(part, value, captures)),
        Pattern::Not(inner) => {
            let mark = captures.len();
            let matched = match_value(inner, value, captures);
            captures.truncate(mark);
            !matched
        }
        Pattern::Capture(inner) => {
            if matches!(**inner, Pattern::Rest) {
                captures.push(Captured::Many(vec![value]));
                return true;
            }
            captures.push(Captured::One(value));
            match_value(inner, value, captures)
        }
    }
}

/// Match a child pattern list against a node's children.
///
/// `...` and `$...` may appear anywhere; they try the longest run first and
/// backtrack toward shorter ones.
fn match_sequence<'a>(
    patterns: &[Pattern],
    values: &[Value<'a>],
    captures: &mut CaptureStack<'a>,
) -> bool {
    let Some((first, rest)) = patterns.split_first() else {
        return values.is_empty();
    };

    match first {
        Pattern::Rest => (0..=values.len())
            .rev()
            .any(|take| attempt(captures, |c| match_sequence(rest, &values[take..], c))),
        Pattern::Capture(inner) if matches!(**inner, Pattern::Rest) => {
            (0..=values.len()).rev().any(|take| {
                attempt(captures, |c| {
                    c.push(Captured::Many(values[..take].to_vec()));
                    match_sequence(rest, &values[take..], c)
                })
            })
        }
        _ => match values.split_first() {
            Some((value, tail)) => attempt(captures, |c| {
                match_value(first, *value, c) && match_sequence(rest, tail, c)
            }),
            None => false,
        },
    }
}

/// Run `f`, rolling captures back if it fails.
fn attempt<'a>(
    captures: &mut CaptureStack<'a>,
    f: impl FnOnce(&mut CaptureStack<'a>) -> bool,
) -> bool {
    let mark = captures.len();
    if f(captures) {
        true
    } else {
        captures.truncate(mark);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::NodePattern;
    use rubric_ast::Node;

    fn root(source: &str) -> Node {
        rubric_ast::parse(source).unwrap().unwrap()
    }

    fn captures_of(pattern: &str, source: &str) -> Option<usize> {
        let node = root(source);
        NodePattern::parse(pattern)
            .unwrap()
            .match_node(&node)
            .map(|c| c.len())
    }

    #[test]
    fn rest_is_greedy_and_backtracks() {
        let p = NodePattern::parse("(array $... $_)").unwrap();
        let node = root("[1, 2, 3]");
        let captures = p.match_node(&node).unwrap();
        assert_eq!(captures.sequence(0).map(|run| run.len()), Some(2));
        assert_eq!(captures.node(1).and_then(|n| n.child_value(0)), Some("3"));
    }

    #[test]
    fn two_rests_in_one_sequence() {
        assert_eq!(captures_of("(array ... (str _) ...)", "[1, 'a', 2]"), Some(0));
        assert_eq!(captures_of("(array ... (str _) ...)", "[1, 2]"), None);
    }

    #[test]
    fn failed_sequence_leaves_no_captures() {
        let mut captures = Vec::new();
        let node = root("f(1)");
        let p = NodePattern::parse("(send $_ :f $_ $_)").unwrap();
        assert!(!match_value(p.root(), Value::Node(&node), &mut captures));
        assert!(captures.is_empty());
    }

    #[test]
    fn nil_pattern_matches_nil_literal() {
        assert_eq!(captures_of("(send nil :f nil)", "f(nil)"), Some(0));
        assert_eq!(captures_of("(send nil :f nil)", "f(1)"), None);
    }

    #[test]
    fn capture_of_absent_slot() {
        let node = root("format(a, b)");
        let p = NodePattern::parse("(send $_ ...)").unwrap();
        let captures = p.match_node(&node).unwrap();
        assert_eq!(captures.value(0), Some(Value::Absent));
        assert_eq!(captures.node(0), None);
    }
}

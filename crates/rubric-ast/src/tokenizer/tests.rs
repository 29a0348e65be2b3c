// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use super::{tokenize, tokenize_range, TokType};

fn tokenize_all(text: &str) -> Vec<(TokType, &str)> {
    let mut result: Vec<(TokType, &str)> = tokenize(text)
        .expect("tokenize")
        .into_iter()
        .map(|tok| (tok.kind, tok.text))
        .collect();
    assert_eq!(result.pop().expect("EndMarker").0, TokType::EndMarker);
    result
}

#[test]
fn test_identifiers_and_keywords() {
    assert_eq!(
        tokenize_all("foo if Bar empty? save!"),
        vec![
            (TokType::Ident, "foo"),
            (TokType::Keyword, "if"),
            (TokType::Constant, "Bar"),
            (TokType::Ident, "empty?"),
            (TokType::Ident, "save!"),
        ]
    );
}

#[test]
fn test_not_equal_is_not_a_bang_method() {
    assert_eq!(
        tokenize_all("a!=b"),
        vec![
            (TokType::Ident, "a"),
            (TokType::Op, "!="),
            (TokType::Ident, "b"),
        ]
    );
}

#[test]
fn test_numbers() {
    assert_eq!(
        tokenize_all("10 1_000 3.14 1.foo"),
        vec![
            (TokType::Integer, "10"),
            (TokType::Integer, "1_000"),
            (TokType::Float, "3.14"),
            (TokType::Integer, "1"),
            (TokType::Op, "."),
            (TokType::Ident, "foo"),
        ]
    );
}

#[test]
fn test_strings() {
    assert_eq!(
        tokenize_all(r#"'it\'s' "a \"b\"" "%d""#),
        vec![
            (TokType::SingleQuoted, r"'it\'s'"),
            (TokType::DoubleQuoted, r#""a \"b\"""#),
            (TokType::DoubleQuoted, r#""%d""#),
        ]
    );
}

#[test]
fn test_interpolation_is_one_token() {
    assert_eq!(
        tokenize_all(r##""#{x * 5} %d #{h["}"]}" % 10"##),
        vec![
            (TokType::DoubleQuoted, r##""#{x * 5} %d #{h["}"]}""##),
            (TokType::Op, "%"),
            (TokType::Integer, "10"),
        ]
    );
}

#[test]
fn test_symbols_labels_and_colons() {
    assert_eq!(
        tokenize_all("format :xml, a: 1, Foo::Bar, c ? d : e, :%"),
        vec![
            (TokType::Ident, "format"),
            (TokType::Symbol, ":xml"),
            (TokType::Op, ","),
            (TokType::Label, "a:"),
            (TokType::Integer, "1"),
            (TokType::Op, ","),
            (TokType::Constant, "Foo"),
            (TokType::Op, "::"),
            (TokType::Constant, "Bar"),
            (TokType::Op, ","),
            (TokType::Ident, "c"),
            (TokType::Op, "?"),
            (TokType::Ident, "d"),
            (TokType::Op, ":"),
            (TokType::Ident, "e"),
            (TokType::Op, ","),
            (TokType::Symbol, ":%"),
        ]
    );
}

#[test]
fn test_symbol_before_rocket() {
    assert_eq!(
        tokenize_all("{:a=>1}"),
        vec![
            (TokType::Op, "{"),
            (TokType::Symbol, ":a"),
            (TokType::Op, "=>"),
            (TokType::Integer, "1"),
            (TokType::Op, "}"),
        ]
    );
}

#[test]
fn test_instance_variables() {
    assert_eq!(
        tokenize_all("@test = 1"),
        vec![
            (TokType::IVar, "@test"),
            (TokType::Op, "="),
            (TokType::Integer, "1"),
        ]
    );
}

#[test]
fn test_comments_and_separators() {
    assert_eq!(
        tokenize_all("a # trailing\nb; c\n=begin\nignored\n=end\nd"),
        vec![
            (TokType::Ident, "a"),
            (TokType::Newline, "\n"),
            (TokType::Ident, "b"),
            (TokType::Newline, ";"),
            (TokType::Ident, "c"),
            (TokType::Newline, "\n"),
            (TokType::Newline, "\n"),
            (TokType::Ident, "d"),
        ]
    );
}

#[test]
fn test_line_continuation() {
    assert_eq!(
        tokenize_all("a + \\\n  b"),
        vec![
            (TokType::Ident, "a"),
            (TokType::Op, "+"),
            (TokType::Ident, "b"),
        ]
    );
}

#[test]
fn test_space_before() {
    let tokens = tokenize("foo [1]\nfoo[1]").expect("tokenize");
    let brackets: Vec<bool> = tokens
        .iter()
        .filter(|t| t.text == "[")
        .map(|t| t.space_before)
        .collect();
    assert_eq!(brackets, vec![true, false]);
}

#[test]
fn test_spans_are_absolute_in_ranges() {
    let source = r##""#{x * 5}""##;
    let tokens = tokenize_range(source, 3, 8).expect("tokenize");
    assert_eq!(tokens[0].text, "x");
    assert_eq!(tokens[0].span.start, 3);
    assert_eq!(tokens[2].text, "5");
    assert_eq!(tokens[2].span.start, 7);
}

#[test]
fn test_errors() {
    let err = tokenize("puts 'open").unwrap_err();
    assert_eq!(err.line, 1);
    assert_eq!(err.column, 6);
    assert!(err.message.contains("unterminated"));

    let err = tokenize("x = 1\n$stdout").unwrap_err();
    assert_eq!((err.line, err.column), (2, 1));

    assert!(tokenize("@@count").is_err());
    assert!(tokenize("=begin\nnever closed").is_err());
}

//! Pattern DSL parser built on winnow.

use rubric_ast::NodeKind;
use winnow::ascii::multispace0;
use winnow::combinator::{alt, delimited, opt, preceded, repeat};
use winnow::error::{ErrMode, ParserError};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};
use winnow::ModalResult;

use super::Pattern;

/// Parse a whole pattern, allowing surrounding whitespace.
pub(super) fn parse_root(input: &mut &str) -> ModalResult<Pattern> {
    let pattern = parse_pattern(input)?;
    let _ = multispace0.parse_next(input)?;
    Ok(pattern)
}

fn parse_pattern(input: &mut &str) -> ModalResult<Pattern> {
    let _ = multispace0.parse_next(input)?;

    alt((
        parse_capture,
        parse_negation,
        parse_sequence,
        parse_union,
        parse_intersection,
        "...".map(|_| Pattern::Rest),
        parse_symbol,
        parse_string,
        parse_integer,
        parse_word,
    ))
    .parse_next(input)
}

fn parse_capture(input: &mut &str) -> ModalResult<Pattern> {
    preceded('$', parse_pattern)
        .map(|inner| Pattern::Capture(Box::new(inner)))
        .parse_next(input)
}

fn parse_negation(input: &mut &str) -> ModalResult<Pattern> {
    preceded('!', parse_pattern)
        .map(|inner| Pattern::Not(Box::new(inner)))
        .parse_next(input)
}

/// `(head children...)`
fn parse_sequence(input: &mut &str) -> ModalResult<Pattern> {
    let _ = ('(', multispace0).parse_next(input)?;
    let kinds = parse_head(input)?;
    let children: Vec<Pattern> = repeat(0.., parse_pattern).parse_next(input)?;
    let _ = (multispace0, ')').parse_next(input)?;
    Ok(Pattern::Sequence { kinds, children })
}

fn parse_head(input: &mut &str) -> ModalResult<Option<Vec<NodeKind>>> {
    if opt('{').parse_next(input)?.is_some() {
        let kinds: Vec<NodeKind> =
            repeat(1.., preceded(multispace0, parse_kind)).parse_next(input)?;
        let _ = (multispace0, '}').parse_next(input)?;
        return Ok(Some(kinds));
    }

    let word = parse_word_text(input)?;
    if word == "_" {
        return Ok(None);
    }
    NodeKind::from_name(word)
        .map(|kind| Some(vec![kind]))
        .ok_or_else(|| ErrMode::from_input(input))
}

fn parse_union(input: &mut &str) -> ModalResult<Pattern> {
    let alternatives: Vec<Pattern> =
        delimited('{', repeat(1.., parse_pattern), (multispace0, '}')).parse_next(input)?;
    Ok(Pattern::Any(alternatives))
}

fn parse_intersection(input: &mut &str) -> ModalResult<Pattern> {
    let parts: Vec<Pattern> =
        delimited('[', repeat(1.., parse_pattern), (multispace0, ']')).parse_next(input)?;
    Ok(Pattern::All(parts))
}

fn parse_symbol(input: &mut &str) -> ModalResult<Pattern> {
    preceded(':', take_while(1.., is_symbol_char))
        .map(|name: &str| Pattern::Symbol(name.to_string()))
        .parse_next(input)
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_?!=%+-*/<>[]~^&|@".contains(c)
}

fn parse_string(input: &mut &str) -> ModalResult<Pattern> {
    delimited('"', take_till(0.., |c| c == '"'), '"')
        .map(|text: &str| Pattern::Literal(text.to_string()))
        .parse_next(input)
}

fn parse_integer(input: &mut &str) -> ModalResult<Pattern> {
    let negative = opt('-').parse_next(input)?.is_some();
    let digits: &str = take_while(1.., |c: char| c.is_ascii_digit()).parse_next(input)?;
    let text = if negative {
        format!("-{}", digits)
    } else {
        digits.to_string()
    };
    Ok(Pattern::Literal(text))
}

/// `_`, `nil`, or a node kind.
fn parse_word(input: &mut &str) -> ModalResult<Pattern> {
    let checkpoint = *input;
    let word = parse_word_text(input)?;

    match word {
        "_" => Ok(Pattern::Wildcard),
        "nil" => Ok(Pattern::Nil),
        _ => match NodeKind::from_name(word) {
            Some(kind) => Ok(Pattern::Kind(kind)),
            None => {
                *input = checkpoint;
                Err(ErrMode::from_input(input))
            }
        },
    }
}

fn parse_kind(input: &mut &str) -> ModalResult<NodeKind> {
    let checkpoint = *input;
    let word = parse_word_text(input)?;

    match NodeKind::from_name(word) {
        Some(kind) => Ok(kind),
        None => {
            *input = checkpoint;
            Err(ErrMode::from_input(input))
        }
    }
}

fn parse_word_text<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Pattern {
        parse_root.parse(text).unwrap()
    }

    #[test]
    fn test_parse_atoms() {
        assert_eq!(parse("_"), Pattern::Wildcard);
        assert_eq!(parse("..."), Pattern::Rest);
        assert_eq!(parse("nil"), Pattern::Nil);
        assert_eq!(parse(":%"), Pattern::Symbol("%".to_string()));
        assert_eq!(parse(":empty?"), Pattern::Symbol("empty?".to_string()));
        assert_eq!(parse(r#""%d""#), Pattern::Literal("%d".to_string()));
        assert_eq!(parse("-12"), Pattern::Literal("-12".to_string()));
        assert_eq!(parse("str"), Pattern::Kind(NodeKind::Str));
        assert_eq!(parse("self"), Pattern::Kind(NodeKind::SelfRef));
        assert_eq!(parse("  true  "), Pattern::Kind(NodeKind::True));
    }

    #[test]
    fn test_parse_sequence() {
        assert_eq!(
            parse("(send nil ${:sprintf :format} _ _ ...)"),
            Pattern::Sequence {
                kinds: Some(vec![NodeKind::Send]),
                children: vec![
                    Pattern::Nil,
                    Pattern::Capture(Box::new(Pattern::Any(vec![
                        Pattern::Symbol("sprintf".to_string()),
                        Pattern::Symbol("format".to_string()),
                    ]))),
                    Pattern::Wildcard,
                    Pattern::Wildcard,
                    Pattern::Rest,
                ],
            }
        );
    }

    #[test]
    fn test_parse_heads() {
        assert_eq!(
            parse("(_)"),
            Pattern::Sequence {
                kinds: None,
                children: vec![],
            }
        );
        assert_eq!(
            parse("({str dstr} ...)"),
            Pattern::Sequence {
                kinds: Some(vec![NodeKind::Str, NodeKind::Dstr]),
                children: vec![Pattern::Rest],
            }
        );
    }

    #[test]
    fn test_parse_negation_and_intersection() {
        assert_eq!(
            parse("[!nil $const]"),
            Pattern::All(vec![
                Pattern::Not(Box::new(Pattern::Nil)),
                Pattern::Capture(Box::new(Pattern::Kind(NodeKind::Const))),
            ])
        );
    }

    #[test]
    fn test_parse_capture_rest() {
        assert_eq!(parse("$..."), Pattern::Capture(Box::new(Pattern::Rest)));
    }

    #[test]
    fn test_multiline_pattern() {
        let text = "(send\n  nil\n  :format\n  ...)";
        assert!(matches!(parse(text), Pattern::Sequence { .. }));
    }

    #[test]
    fn test_rejects_unknown_kinds() {
        assert!(parse_root.parse("(widget _)").is_err());
        assert!(parse_root.parse("widget").is_err());
        assert!(parse_root.parse("{str widget}").is_err());
    }
}

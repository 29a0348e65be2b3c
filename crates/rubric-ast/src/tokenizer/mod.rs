// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

//! Tokenizer for the supported Ruby subset.
//!
//! Tokens borrow their text from the source and carry absolute byte spans,
//! so a sub-range (the inside of a `#{...}` interpolation) can be tokenized
//! in place and its nodes still point into the original file.
//!
//! Whitespace is not a token. Instead each token records whether whitespace
//! preceded it, which the parser needs to tell `foo [1]` (command call with
//! an array argument) from `foo[1]` (index).

use rubric_core::patch::Span;

use crate::parser::errors::{ParseError, ParseResult};

#[cfg(test)]
mod tests;

/// Reserved words. Identifiers spelled like these become [`TokType::Keyword`].
pub const KEYWORDS: &[&str] = &[
    "alias", "and", "begin", "break", "case", "class", "def", "defined?", "do", "else", "elsif",
    "end", "ensure", "false", "for", "if", "in", "module", "next", "nil", "not", "or", "redo",
    "rescue", "retry", "return", "self", "super", "then", "true", "undef", "unless", "until",
    "when", "while", "yield",
];

const TWO_CHAR_OPS: &[&str] = &[
    "::", "=>", "==", "!=", "<=", ">=", "&&", "||", "=~", "**", "<<", ">>", "+=", "-=", "*=",
    "/=", "&.",
];

const ONE_CHAR_OPS: &[u8] = b"()[]{},.=<>+-*/%!?&|^~:";

/// Operator method names accepted after `:` as symbol literals (`:%`, `:[]`).
const OPERATOR_SYMBOLS: &[&str] = &[
    "[]=", "[]", "<=>", "===", "==", "!=", "<=", ">=", "<<", ">>", "**", "=~", "+", "-", "*",
    "/", "%", "<", ">", "!", "&", "|", "^",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokType {
    /// Lowercase identifier or method name, possibly ending in `?` or `!`.
    Ident,
    /// Capitalized identifier.
    Constant,
    /// `@name`.
    IVar,
    Integer,
    Float,
    /// `'...'`, including quotes.
    SingleQuoted,
    /// `"..."`, including quotes and any `#{...}` interpolations.
    DoubleQuoted,
    /// `:name` or `:%`.
    Symbol,
    /// `name:` in a hash or keyword argument.
    Label,
    Keyword,
    Op,
    /// Statement separator: a newline or `;`.
    Newline,
    EndMarker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokType,
    pub text: &'a str,
    pub span: Span,
    /// Whitespace (or a line start) directly precedes this token.
    pub space_before: bool,
}

impl<'a> Token<'a> {
    pub fn is(&self, kind: TokType, text: &str) -> bool {
        self.kind == kind && self.text == text
    }

    pub fn is_op(&self, text: &str) -> bool {
        self.is(TokType::Op, text)
    }

    pub fn is_keyword(&self, text: &str) -> bool {
        self.is(TokType::Keyword, text)
    }
}

/// Tokenize a whole source file.
pub fn tokenize(source: &str) -> ParseResult<Vec<Token<'_>>> {
    tokenize_range(source, 0, source.len())
}

/// Tokenize `source[start..end]`, producing spans relative to the whole of `source`.
pub fn tokenize_range(source: &str, start: usize, end: usize) -> ParseResult<Vec<Token<'_>>> {
    let mut state = TokState {
        source,
        bytes: source.as_bytes(),
        pos: start,
        end,
        space_before: true,
        tokens: Vec::new(),
    };
    state.run()?;
    Ok(state.tokens)
}

struct TokState<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    end: usize,
    space_before: bool,
    tokens: Vec<Token<'a>>,
}

impl<'a> TokState<'a> {
    fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        let i = self.pos + ahead;
        if i < self.end {
            Some(self.bytes[i])
        } else {
            None
        }
    }

    fn push(&mut self, kind: TokType, start: usize) {
        self.tokens.push(Token {
            kind,
            text: &self.source[start..self.pos],
            span: Span::new(start, self.pos),
            space_before: self.space_before,
        });
        self.space_before = false;
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> ParseError {
        ParseError::at(self.source, offset, message)
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.bytes[self.pos - 1] == b'\n'
    }

    fn run(&mut self) -> ParseResult<()> {
        while let Some(c) = self.peek() {
            let start = self.pos;
            match c {
                b' ' | b'\t' | b'\r' => {
                    self.pos += 1;
                    self.space_before = true;
                }
                b'\\' if self.peek_at(1) == Some(b'\n') => {
                    self.pos += 2;
                    self.space_before = true;
                }
                b'\n' | b';' => {
                    self.pos += 1;
                    self.push(TokType::Newline, start);
                    self.space_before = true;
                }
                b'#' => self.skip_comment(),
                b'=' if self.at_line_start() && self.source[start..].starts_with("=begin") => {
                    self.skip_embedded_doc()?;
                }
                b'0'..=b'9' => self.number(),
                b'"' => {
                    let Some(end) = scan_double_quoted(self.bytes, start, self.end) else {
                        return Err(self.error(start, "unterminated string"));
                    };
                    self.pos = end;
                    self.push(TokType::DoubleQuoted, start);
                }
                b'\'' => {
                    let Some(end) = scan_single_quoted(self.bytes, start, self.end) else {
                        return Err(self.error(start, "unterminated string"));
                    };
                    self.pos = end;
                    self.push(TokType::SingleQuoted, start);
                }
                b'@' => self.instance_variable()?,
                b':' => self.colon(),
                c if is_ident_start(c) => self.identifier(),
                _ => self.operator()?,
            }
        }
        self.push(TokType::EndMarker, self.pos);
        Ok(())
    }

    fn skip_comment(&mut self) {
        while let Some(c) = self.peek() {
            if c == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn skip_embedded_doc(&mut self) -> ParseResult<()> {
        let start = self.pos;
        let rest = &self.source[start..self.end];
        let Some(found) = rest.find("\n=end") else {
            return Err(self.error(start, "embedded document meets end of file"));
        };
        self.pos = start + found + "\n=end".len();
        self.skip_comment();
        Ok(())
    }

    fn number(&mut self) {
        let start = self.pos;
        self.take_digits();
        let mut kind = TokType::Integer;
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
            self.take_digits();
            kind = TokType::Float;
        }
        self.push(kind, start);
    }

    fn take_digits(&mut self) {
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_digit() || c == b'_')
        {
            self.pos += 1;
        }
    }

    fn take_ident_chars(&mut self) {
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
    }

    fn instance_variable(&mut self) -> ParseResult<()> {
        let start = self.pos;
        if self.peek_at(1) == Some(b'@') {
            return Err(self.error(start, "class variables are not supported"));
        }
        self.pos += 1;
        if !self.peek().is_some_and(is_ident_start) {
            return Err(self.error(start, "'@' without identifier"));
        }
        self.take_ident_chars();
        self.push(TokType::IVar, start);
        Ok(())
    }

    fn colon(&mut self) {
        let start = self.pos;
        if self.peek_at(1) == Some(b':') {
            self.pos += 2;
            self.push(TokType::Op, start);
            return;
        }
        if self.peek_at(1).is_some_and(is_ident_start) {
            self.pos += 1;
            self.take_ident_chars();
            match self.peek() {
                Some(b'?') | Some(b'!') => self.pos += 1,
                // `:name=` is a setter symbol, but `:a=>1` is a symbol and a rocket.
                Some(b'=') if !matches!(self.peek_at(1), Some(b'>') | Some(b'=') | Some(b'~')) => {
                    self.pos += 1
                }
                _ => {}
            }
            self.push(TokType::Symbol, start);
            return;
        }
        let rest = &self.source[start + 1..self.end];
        if let Some(op) = OPERATOR_SYMBOLS.iter().find(|op| rest.starts_with(**op)) {
            self.pos += 1 + op.len();
            self.push(TokType::Symbol, start);
            return;
        }
        self.pos += 1;
        self.push(TokType::Op, start);
    }

    fn identifier(&mut self) {
        let start = self.pos;
        self.take_ident_chars();

        // `name:` is a label unless it is the first half of `::`.
        if self.peek() == Some(b':') && self.peek_at(1) != Some(b':') {
            self.pos += 1;
            self.push(TokType::Label, start);
            return;
        }

        // Method names may end in `?` or `!`, but `x!=` and `x?=` stay operators.
        if matches!(self.peek(), Some(b'?') | Some(b'!')) && self.peek_at(1) != Some(b'=') {
            self.pos += 1;
        }

        let text = &self.source[start..self.pos];
        let kind = if KEYWORDS.contains(&text) {
            TokType::Keyword
        } else if text.as_bytes()[0].is_ascii_uppercase() {
            TokType::Constant
        } else {
            TokType::Ident
        };
        self.push(kind, start);
    }

    fn operator(&mut self) -> ParseResult<()> {
        let start = self.pos;
        let rest = &self.source[start..self.end];
        if let Some(op) = TWO_CHAR_OPS.iter().find(|op| rest.starts_with(**op)) {
            self.pos += op.len();
        } else if self.peek().is_some_and(|c| ONE_CHAR_OPS.contains(&c)) {
            self.pos += 1;
        } else {
            let ch = rest.chars().next().unwrap_or('?');
            return Err(self.error(start, format!("unexpected character '{}'", ch)));
        }
        self.push(TokType::Op, start);
        Ok(())
    }
}

fn is_ident_start(c: u8) -> bool {
    c.is_ascii_alphabetic() || c == b'_' || c >= 0x80
}

fn is_ident_char(c: u8) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

/// Scan a single-quoted string starting at `start` (the opening quote).
/// Returns the offset just past the closing quote.
pub(crate) fn scan_single_quoted(bytes: &[u8], start: usize, end: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < end {
        match bytes[i] {
            b'\\' => i += 2,
            b'\'' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

/// Scan a double-quoted string starting at `start` (the opening quote),
/// stepping over escapes and `#{...}` interpolations.
/// Returns the offset just past the closing quote.
pub(crate) fn scan_double_quoted(bytes: &[u8], start: usize, end: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < end {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i + 1),
            b'#' if i + 1 < end && bytes[i + 1] == b'{' => {
                i = find_interpolation_end(bytes, i + 2, end)? + 1;
            }
            _ => i += 1,
        }
    }
    None
}

/// Given the offset just past a `#{`, find the offset of the matching `}`.
pub(crate) fn find_interpolation_end(bytes: &[u8], start: usize, end: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut i = start;
    while i < end {
        match bytes[i] {
            b'{' => {
                depth += 1;
                i += 1;
            }
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
                i += 1;
            }
            b'"' => i = scan_double_quoted(bytes, i, end)?,
            b'\'' => i = scan_single_quoted(bytes, i, end)?,
            _ => i += 1,
        }
    }
    None
}

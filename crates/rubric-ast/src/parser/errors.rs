// Copyright (c) Ken Kocienda and other contributors.
//
// This source code is licensed under the MIT license found in the
// LICENSE file in the root directory of this source tree.

use rubric_core::text::byte_offset_to_position;
use thiserror::Error;

/// A tokenizer or parser failure, located in the source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{line}:{column}: {message}")]
pub struct ParseError {
    pub message: String,
    /// Byte offset of the offending input.
    pub offset: usize,
    /// 1-indexed.
    pub line: u32,
    /// 1-indexed, in characters.
    pub column: u32,
}

impl ParseError {
    /// Build an error at `offset`, resolving line and column against `source`.
    pub fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let position = byte_offset_to_position(source, offset);
        ParseError {
            message: message.into(),
            offset,
            line: position.line,
            column: position.column,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

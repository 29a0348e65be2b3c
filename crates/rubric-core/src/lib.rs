//! Core infrastructure for rubric.
//!
//! This crate provides the language-agnostic pieces shared by the parser,
//! the cops and the CLI:
//! - Byte spans and rewrite values, plus conflict-checked rewrite application
//! - Byte offset to line:column conversions
//! - The unified error type and its exit codes

pub mod error;
pub mod patch;
pub mod text;

pub use error::{OutputErrorCode, RubricError};
pub use patch::{apply_rewrites, PatchError, Rewrite, Span};

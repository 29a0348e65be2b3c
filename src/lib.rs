//! Rubric: structural lint and autocorrect for Ruby source.
//!
//! Cops describe the code they look for with node patterns, a small
//! s-expression DSL matched against the parsed tree. The engine walks the
//! tree once, dispatches each node to the cops interested in its kind, and
//! applies the non-overlapping rewrites of a pass in a single edit.
//!
//! ```
//! use rubric::{Config, Engine};
//!
//! let engine = Engine::from_config(&Config::builtin()).unwrap();
//! let report = engine.inspect_source("puts sprintf('%d', 1)", true).unwrap();
//! assert_eq!(report.corrected_source(), Some("puts format('%d', 1)"));
//! ```

pub mod cli;
pub mod config;
pub mod cop;
pub mod engine;
pub mod offense;
pub mod output;
pub mod pattern;

pub use config::{Config, CopConfig};
pub use cop::{build_cops, Cop, CopInfo, REGISTRY};
pub use engine::{Engine, Report};
pub use offense::{Finding, Offense, Severity};
pub use pattern::{match_pattern, Captures, NodePattern, PatternError};
pub use rubric_core::RubricError;

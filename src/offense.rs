//! Offenses reported by cops.

use std::fmt;

use rubric_core::patch::{Rewrite, Span};
use rubric_core::text::{byte_offset_to_position, Position};
use serde::{Deserialize, Serialize};

// ============================================================================
// Severity
// ============================================================================

/// How serious an offense is. Ordered from least to most severe.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Refactor,
    #[default]
    Convention,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    pub const ALL: &'static [Severity] = &[
        Severity::Refactor,
        Severity::Convention,
        Severity::Warning,
        Severity::Error,
        Severity::Fatal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Refactor => "refactor",
            Severity::Convention => "convention",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    /// One-letter code used in text reports.
    pub fn code(&self) -> char {
        match self {
            Severity::Refactor => 'R',
            Severity::Convention => 'C',
            Severity::Warning => 'W',
            Severity::Error => 'E',
            Severity::Fatal => 'F',
        }
    }

    pub fn parse(name: &str) -> Option<Severity> {
        Severity::ALL.iter().copied().find(|s| s.as_str() == name)
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Findings and Offenses
// ============================================================================

/// What a cop reports for one node: the message, where, and how to fix it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub message: String,
    pub span: Span,
    pub rewrite: Option<Rewrite>,
}

impl Finding {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Finding {
            message: message.into(),
            span,
            rewrite: None,
        }
    }

    pub fn with_rewrite(mut self, rewrite: Option<Rewrite>) -> Self {
        self.rewrite = rewrite;
        self
    }
}

/// A reported offense, located in the source it was found in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Offense {
    pub cop_name: String,
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    /// 1-based line and column of `span.start`.
    pub location: Position,
    pub correctable: bool,
    /// Set once the rewrite has been applied to the corrected text.
    pub corrected: bool,
    #[serde(skip)]
    pub rewrite: Option<Rewrite>,
}

impl Offense {
    pub fn new(cop_name: &str, severity: Severity, finding: Finding, source: &str) -> Self {
        Offense {
            cop_name: cop_name.to_string(),
            severity,
            location: byte_offset_to_position(source, finding.span.start),
            correctable: finding.rewrite.is_some(),
            corrected: false,
            message: finding.message,
            span: finding.span,
            rewrite: finding.rewrite,
        }
    }

    pub fn line(&self) -> u32 {
        self.location.line
    }

    pub fn column(&self) -> u32 {
        self.location.column
    }
}

impl fmt::Display for Offense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}{}: {}",
            self.location,
            self.severity.code(),
            if self.corrected {
                "[Corrected] "
            } else if self.correctable {
                "[Correctable] "
            } else {
                ""
            },
            self.cop_name,
            self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_codes_and_order() {
        assert_eq!(Severity::default(), Severity::Convention);
        assert_eq!(Severity::Convention.code(), 'C');
        assert_eq!(Severity::Fatal.code(), 'F');
        assert!(Severity::Refactor < Severity::Warning);
        assert_eq!(Severity::parse("warning"), Some(Severity::Warning));
        assert_eq!(Severity::parse("loud"), None);
    }

    #[test]
    fn offense_location_is_one_based() {
        let source = "x = 1\nputs \"%d\" % 10\n";
        let finding = Finding::new("Favor `format` over `String#%`.", Span::new(16, 17));
        let offense = Offense::new("Style/FormatString", Severity::Convention, finding, source);
        assert_eq!(offense.line(), 2);
        assert_eq!(offense.column(), 11);
        assert!(!offense.correctable);
    }

    #[test]
    fn display_marks_correctable() {
        let finding = Finding::new("Use `e` instead of `ex`.", Span::new(0, 2))
            .with_rewrite(Some(Rewrite::new(Span::new(0, 2), "e")));
        let offense = Offense::new(
            "Naming/RescuedExceptionsVariableName",
            Severity::Convention,
            finding,
            "ex",
        );
        assert_eq!(
            offense.to_string(),
            "1:1: C: [Correctable] Naming/RescuedExceptionsVariableName: Use `e` instead of `ex`."
        );
    }

    #[test]
    fn json_shape() {
        let offense = Offense::new(
            "Style/SimpleIfClause",
            Severity::Warning,
            Finding::new("msg", Span::new(0, 1)),
            "x",
        );
        let value = serde_json::to_value(&offense).unwrap();
        assert_eq!(value["severity"], "warning");
        assert_eq!(value["location"]["line"], 1);
        assert_eq!(value["span"]["start"], 0);
        assert!(value.get("rewrite").is_none());
    }
}

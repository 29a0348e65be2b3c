//! Report types and rendering for the CLI.
//!
//! Two formats are supported:
//!
//! - **JSON**: one document per run, `{ status, schema_version, files, summary }`.
//!   Field order and offense order are deterministic.
//! - **Text**: one line per offense in `path:line:col: C: [Correctable] Cop: message`
//!   form, followed by a summary line.

use std::io::{self, Write};

use rubric_core::{OutputErrorCode, RubricError};
use serde::Serialize;

use crate::offense::Offense;

/// Current schema version for JSON reports.
pub const SCHEMA_VERSION: &str = "1";

// ============================================================================
// Report Types
// ============================================================================

/// Error information attached to a file or a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    /// Exit-code family of the error.
    pub code: u8,
    pub message: String,
}

impl ErrorInfo {
    pub fn from_error(err: &RubricError) -> Self {
        ErrorInfo {
            code: OutputErrorCode::from(err).code(),
            message: err.to_string(),
        }
    }
}

/// Results for one inspected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub path: String,
    pub offenses: Vec<Offense>,
    /// Set when the file could not be read, parsed or corrected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl FileReport {
    pub fn new(path: impl Into<String>, offenses: Vec<Offense>) -> Self {
        FileReport {
            path: path.into(),
            offenses,
            error: None,
        }
    }

    pub fn failed(path: impl Into<String>, err: &RubricError) -> Self {
        FileReport {
            path: path.into(),
            offenses: Vec::new(),
            error: Some(ErrorInfo::from_error(err)),
        }
    }

    pub fn with_error(mut self, err: &RubricError) -> Self {
        self.error = Some(ErrorInfo::from_error(err));
        self
    }
}

/// Totals over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub files_inspected: usize,
    pub offenses: usize,
    pub correctable: usize,
    pub corrected: usize,
    pub errors: usize,
}

impl Summary {
    pub fn from_files(files: &[FileReport]) -> Self {
        let offenses = || files.iter().flat_map(|f| f.offenses.iter());
        Summary {
            files_inspected: files.len(),
            offenses: offenses().count(),
            correctable: offenses().filter(|o| o.correctable).count(),
            corrected: offenses().filter(|o| o.corrected).count(),
            errors: files.iter().filter(|f| f.error.is_some()).count(),
        }
    }
}

/// The whole-run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectResponse {
    pub status: String,
    pub schema_version: String,
    pub files: Vec<FileReport>,
    pub summary: Summary,
}

impl InspectResponse {
    pub fn new(files: Vec<FileReport>) -> Self {
        let summary = Summary::from_files(&files);
        InspectResponse {
            status: "ok".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            files,
            summary,
        }
    }
}

/// Report for a run that failed before any file was inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub schema_version: String,
    pub error: ErrorInfo,
}

impl ErrorResponse {
    pub fn new(err: &RubricError) -> Self {
        ErrorResponse {
            status: "error".to_string(),
            schema_version: SCHEMA_VERSION.to_string(),
            error: ErrorInfo::from_error(err),
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Emit a response as pretty JSON to a writer.
pub fn emit_response<T: Serialize>(response: &T, writer: &mut impl Write) -> io::Result<()> {
    let json = serde_json::to_string_pretty(response)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(writer, "{}", json)
}

/// Render one offense as a text line.
pub fn format_offense(path: &str, offense: &Offense) -> String {
    format!("{}:{}", path, offense)
}

/// Emit a response as text to a writer.
pub fn emit_text(response: &InspectResponse, writer: &mut impl Write) -> io::Result<()> {
    for file in &response.files {
        for offense in &file.offenses {
            writeln!(writer, "{}", format_offense(&file.path, offense))?;
        }
        if let Some(error) = &file.error {
            writeln!(writer, "{}: error: {}", file.path, error.message)?;
        }
    }

    let summary = &response.summary;
    write!(
        writer,
        "\n{} {} inspected, {} {} detected",
        summary.files_inspected,
        plural(summary.files_inspected, "file", "files"),
        summary.offenses,
        plural(summary.offenses, "offense", "offenses"),
    )?;
    if summary.corrected > 0 {
        write!(writer, ", {} corrected", summary.corrected)?;
    } else if summary.correctable > 0 {
        write!(writer, ", {} autocorrectable", summary.correctable)?;
    }
    writeln!(writer)
}

fn plural<'a>(count: usize, one: &'a str, many: &'a str) -> &'a str {
    if count == 1 {
        one
    } else {
        many
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::offense::{Finding, Severity};
    use rubric_core::patch::{Rewrite, Span};

    fn offense(correctable: bool) -> Offense {
        let source = "puts \"%d\" % 10";
        let rewrite = Rewrite::new(Span::new(5, 14), "format(\"%d\", 10)");
        let finding = Finding::new("Favor `format` over `String#%`.", Span::new(10, 11))
            .with_rewrite(correctable.then_some(rewrite));
        Offense::new("Style/FormatString", Severity::Convention, finding, source)
    }

    #[test]
    fn text_lines() {
        let response = InspectResponse::new(vec![FileReport::new("a.rb", vec![offense(true)])]);
        let mut out = Vec::new();
        emit_text(&response, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "a.rb:1:11: C: [Correctable] Style/FormatString: Favor `format` over `String#%`.\n\
             \n1 file inspected, 1 offense detected, 1 autocorrectable\n"
        );
    }

    #[test]
    fn text_reports_file_errors() {
        let err = RubricError::Parse {
            path: "b.rb".to_string(),
            line: 1,
            column: 5,
            message: "expected ')'".to_string(),
        };
        let response = InspectResponse::new(vec![FileReport::failed("b.rb", &err)]);
        let mut out = Vec::new();
        emit_text(&response, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("b.rb: error: b.rb:1:5: parse error: expected ')'\n"));
        assert!(text.contains("1 file inspected, 0 offenses detected"));
    }

    #[test]
    fn json_shape() {
        let mut corrected = offense(true);
        corrected.corrected = true;
        let response = InspectResponse::new(vec![
            FileReport::new("a.rb", vec![corrected, offense(false)]),
            FileReport::new("b.rb", vec![]),
        ]);
        let mut out = Vec::new();
        emit_response(&response, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(value["status"], "ok");
        assert_eq!(value["schema_version"], SCHEMA_VERSION);
        assert_eq!(value["files"][0]["path"], "a.rb");
        assert_eq!(value["files"][0]["offenses"][0]["cop_name"], "Style/FormatString");
        assert_eq!(value["files"][0]["offenses"][0]["location"]["column"], 11);
        assert!(value["files"][1].get("error").is_none());
        assert_eq!(value["summary"]["files_inspected"], 2);
        assert_eq!(value["summary"]["offenses"], 2);
        assert_eq!(value["summary"]["correctable"], 1);
        assert_eq!(value["summary"]["corrected"], 1);
    }

    #[test]
    fn error_response() {
        let err = RubricError::config_missing("Style/FormatString", "EnforcedStyle");
        let value = serde_json::to_value(ErrorResponse::new(&err)).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["code"], 2);
    }
}

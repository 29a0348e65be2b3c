//! Command-line driver: argument definitions, file discovery, and the
//! inspect / correct / report loop.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use rubric_core::RubricError;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::Config;
use crate::cop::{build_cops, REGISTRY};
use crate::engine::Engine;
use crate::output::{emit_response, emit_text, FileReport, InspectResponse};

/// Exit status when offenses remain after the run.
pub const EXIT_OFFENSES: u8 = 1;

// ============================================================================
// CLI Structure
// ============================================================================

/// Structural lint and autocorrect for Ruby source.
#[derive(Parser, Debug)]
#[command(name = "rubric", version, about = "Structural lint and autocorrect for Ruby source")]
pub struct Cli {
    /// Files or directories to inspect (default: current directory).
    pub paths: Vec<PathBuf>,

    /// Configuration file (default: .rubric.toml in the current directory).
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Apply corrections and write the files back.
    #[arg(long, short = 'a')]
    pub autocorrect: bool,

    /// Report format.
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Run only these cops (comma separated).
    #[arg(long, value_delimiter = ',')]
    pub only: Vec<String>,

    /// List the available cops and exit.
    #[arg(long)]
    pub list_cops: bool,

    /// Print the parsed AST of each file as an s-expression and exit.
    #[arg(long)]
    pub dump_ast: bool,

    /// Log level for tracing output.
    #[arg(long, value_enum, default_value = "warn")]
    pub log_level: LogLevel,
}

/// Report format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per offense plus a summary (default).
    #[default]
    Text,
    /// A single JSON document.
    Json,
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

// ============================================================================
// Execution
// ============================================================================

/// Run the CLI, writing the report to `out`. Returns the process exit status.
pub fn run(cli: &Cli, out: &mut impl Write) -> Result<u8, RubricError> {
    if cli.list_cops {
        return list_cops(cli, out);
    }

    let files = collect_files(&cli.paths)?;
    if cli.dump_ast {
        return dump_ast(&files, out);
    }

    let config = load_config(cli)?;
    let only = (!cli.only.is_empty()).then_some(cli.only.as_slice());
    let engine = Engine::new(build_cops(&config, only)?);
    info!(files = files.len(), autocorrect = cli.autocorrect, "inspecting");

    let reports: Vec<FileReport> = files
        .iter()
        .map(|path| inspect_file(&engine, path, cli.autocorrect))
        .collect();
    let status = exit_status(&reports);
    let response = InspectResponse::new(reports);

    match cli.format {
        OutputFormat::Json => emit_response(&response, out),
        OutputFormat::Text => emit_text(&response, out),
    }
    .map_err(|e| RubricError::io("<stdout>", &e))?;
    Ok(status)
}

/// Configuration for this run: built-in defaults overlaid with the user file.
pub fn load_config(cli: &Cli) -> Result<Config, RubricError> {
    match &cli.config {
        Some(path) => {
            let mut config = Config::builtin();
            config.merge(Config::load(path)?);
            Ok(config)
        }
        None => Config::load_from_project(Path::new(".")),
    }
}

fn list_cops(cli: &Cli, out: &mut impl Write) -> Result<u8, RubricError> {
    let config = load_config(cli)?;
    for info in REGISTRY {
        let state = if config.is_enabled(info.name) {
            "enabled"
        } else {
            "disabled"
        };
        writeln!(out, "{:<40} {:<9} {}", info.name, state, info.description)
            .map_err(|e| RubricError::io("<stdout>", &e))?;
    }
    Ok(0)
}

fn dump_ast(files: &[PathBuf], out: &mut impl Write) -> Result<u8, RubricError> {
    for path in files {
        let source = read_source(path)?;
        let root = parse_source(path, &source)?;
        let sexp = root.map(|node| node.to_sexp()).unwrap_or_default();
        writeln!(out, "# {}\n{}", path.display(), sexp)
            .map_err(|e| RubricError::io("<stdout>", &e))?;
    }
    Ok(0)
}

/// Expand the command-line paths into a sorted list of Ruby files.
pub fn collect_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>, RubricError> {
    let default = [PathBuf::from(".")];
    let roots = if paths.is_empty() { &default[..] } else { paths };

    let mut files = Vec::new();
    for root in roots {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        if !root.is_dir() {
            return Err(RubricError::invalid_args(format!(
                "no such file or directory: {}",
                root.display()
            )));
        }
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| RubricError::Io {
                path: root.display().to_string(),
                message: e.to_string(),
            })?;
            if entry.file_type().is_file() && is_ruby_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }
    Ok(files)
}

fn is_ruby_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "rb")
}

fn read_source(path: &Path) -> Result<String, RubricError> {
    fs::read_to_string(path).map_err(|e| RubricError::io(path.display().to_string(), &e))
}

fn parse_source(path: &Path, source: &str) -> Result<Option<rubric_ast::Node>, RubricError> {
    rubric_ast::parse(source).map_err(|e| RubricError::Parse {
        path: path.display().to_string(),
        line: e.line,
        column: e.column,
        message: e.message,
    })
}

/// Inspect one file and, when asked, write the corrected text back.
fn inspect_file(engine: &Engine, path: &Path, autocorrect: bool) -> FileReport {
    let shown = path.display().to_string();
    debug!(path = %shown, "inspecting file");

    let source = match read_source(path) {
        Ok(source) => source,
        Err(err) => return FileReport::failed(shown, &err),
    };
    let root = match parse_source(path, &source) {
        Ok(root) => root,
        Err(err) => return FileReport::failed(shown, &err),
    };

    let report = engine.run(&source, root.as_ref(), autocorrect);
    let file_report = FileReport::new(shown.clone(), report.offenses);
    match report.correction {
        Some(Ok(corrected)) if corrected != source => {
            if let Err(e) = fs::write(path, corrected) {
                return file_report.with_error(&RubricError::io(shown, &e));
            }
            info!(path = %shown, "wrote corrections");
            file_report
        }
        Some(Err(err)) => file_report.with_error(&RubricError::from(err)),
        _ => file_report,
    }
}

/// Worst file error wins; otherwise 1 if any offense is left uncorrected.
fn exit_status(reports: &[FileReport]) -> u8 {
    let worst_error = reports
        .iter()
        .filter_map(|report| report.error.as_ref().map(|error| error.code))
        .max();
    if let Some(code) = worst_error {
        return code;
    }
    let remaining = reports
        .iter()
        .flat_map(|report| report.offenses.iter())
        .any(|offense| !offense.corrected);
    if remaining {
        EXIT_OFFENSES
    } else {
        0
    }
}

/// Exit code for an error that aborted the whole run.
pub fn error_exit_code(err: &RubricError) -> u8 {
    err.error_code().code()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("rubric").chain(args.iter().copied()))
    }

    #[test]
    fn parses_flags() {
        let cli = cli(&[
            "-a",
            "--format",
            "json",
            "--only",
            "Style/FormatString,Style/SimpleIfClause",
            "lib",
        ]);
        assert!(cli.autocorrect);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.only.len(), 2);
        assert_eq!(cli.paths, vec![PathBuf::from("lib")]);
    }

    #[test]
    fn collects_ruby_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.rb"), "").unwrap();
        fs::write(dir.path().join("a.rb"), "").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::write(dir.path().join("sub").join("c.rb"), "").unwrap();

        let files = collect_files(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.rb"),
                PathBuf::from("b.rb"),
                PathBuf::from("sub").join("c.rb")
            ]
        );
    }

    #[test]
    fn missing_path_is_invalid_arguments() {
        let err = collect_files(&[PathBuf::from("/definitely/not/here")]).unwrap_err();
        assert_eq!(error_exit_code(&err), 2);
    }

    #[test]
    fn autocorrect_rewrites_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("x.rb");
        fs::write(&file, "puts sprintf('%d', 1)\n").unwrap();

        let engine = Engine::from_config(&Config::builtin()).unwrap();
        let report = inspect_file(&engine, &file, true);
        assert_eq!(report.offenses.len(), 1);
        assert!(report.offenses[0].corrected);
        assert_eq!(fs::read_to_string(&file).unwrap(), "puts format('%d', 1)\n");
        assert_eq!(exit_status(&[report]), 0);
    }

    #[test]
    fn parse_failure_is_a_file_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bad.rb");
        fs::write(&file, "foo(\n").unwrap();

        let engine = Engine::from_config(&Config::builtin()).unwrap();
        let report = inspect_file(&engine, &file, false);
        assert_eq!(report.error.as_ref().map(|e| e.code), Some(3));
        assert_eq!(exit_status(&[report]), 3);
    }
}

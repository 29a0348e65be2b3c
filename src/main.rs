//! rubric CLI binary entry point.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use rubric::cli::{self, Cli, LogLevel, OutputFormat};
use rubric::output::{emit_response, ErrorResponse};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let code = match cli::run(&cli, &mut out) {
        Ok(code) => code,
        Err(err) => {
            match cli.format {
                OutputFormat::Json => {
                    let _ = emit_response(&ErrorResponse::new(&err), &mut out);
                }
                OutputFormat::Text => eprintln!("rubric: {}", err),
            }
            cli::error_exit_code(&err)
        }
    };
    let _ = out.flush();
    ExitCode::from(code)
}

/// Logs go to stderr so stdout stays reserved for reports.
fn init_tracing(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

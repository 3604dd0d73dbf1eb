//! Femto compiler CLI.
//!
//! Runs the front-end over an entry source file and reports diagnostics.
//! Code generation hangs off the analyzed AST in later stages; this binary
//! is the front half only.

use clap::Parser;
use femto_compiler::{compile_front, CompileConfig, FsReader};
use femto_diagnostic::{Reporter, StderrSink};
use std::process::ExitCode;
use tracing::info;

#[derive(Parser)]
#[command(name = "femtoc", about = "Femto compiler front-end", version)]
struct Cli {
    /// Entry source file.
    input: String,

    /// Pointer width in bytes (4 or 8).
    #[arg(long, default_value_t = 8)]
    arch: i64,

    /// Maximum basename length for module unique names.
    #[arg(long, default_value_t = 12)]
    name_cut: usize,

    /// Analyzer worker budget; 0 runs single-threaded.
    #[arg(short = 'j', long, default_value_t = 0)]
    jobs: usize,

    /// Diagnostic verbosity 1..=5; lower is noisier.
    #[arg(short, long, default_value_t = 4)]
    level: u8,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let sink = StderrSink;
    let reporter = Reporter::new(cli.level, &sink);
    let config = CompileConfig {
        arch: cli.arch,
        name_cut: cli.name_cut,
        mt_cfg: cli.jobs,
    };

    let reader = FsReader;
    let output = compile_front(&cli.input, &config, &reader, &reporter);
    if output.err_count > 0 {
        eprintln!("compilation failed with {} error(s)", output.err_count);
        return ExitCode::FAILURE;
    }
    info!(
        modules = output.modules.len(),
        "front-end finished without errors"
    );
    ExitCode::SUCCESS
}

/// objv - OBJ model inspector
///
/// Loads a Wavefront OBJ file through the objv-core pipeline and prints the
/// geometry a viewer would receive: vertex, face, edge and triangle counts
/// plus the centered bounding box.
///
/// Usage: objv [-v] [--index-base running|total] [--skip-bad-lines] <model.obj>
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use objv_core::record::{MAX_FACE_REFS, MAX_LINE_LEN};
use objv_cli::{parse_options, run, IndexBaseArg};
use tracing::debug;

#[derive(Parser)]
#[command(name = "objv")]
#[command(about = "Inspect the render-ready geometry of a Wavefront OBJ model")]
#[command(version)]
struct Cli {
    /// OBJ file to load
    path: PathBuf,

    /// Element count negative references are relative to
    #[arg(long, value_enum, default_value = "running")]
    index_base: IndexBaseArg,

    /// Warn and skip malformed lines instead of failing the load
    #[arg(long)]
    skip_bad_lines: bool,

    /// Longest accepted line, in bytes
    #[arg(long, default_value_t = MAX_LINE_LEN)]
    max_line_len: usize,

    /// Most vertex references accepted on one face
    #[arg(long, default_value_t = MAX_FACE_REFS)]
    max_face_refs: usize,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = parse_options(
        cli.index_base,
        cli.skip_bad_lines,
        cli.max_line_len,
        cli.max_face_refs,
    );
    debug!("Parse options: {:?}", options);

    let mut stdout = std::io::stdout();
    match run(&mut stdout, &cli.path, options) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Failed to write report: {}", e);
            ExitCode::FAILURE
        }
    }
}

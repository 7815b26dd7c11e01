use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use heatmapify::parse::Y_BUCKETS;
use heatmapify::{HeatmapBuilder, HeatmapError, HeatmapResult, ParseMode};
use tracing::{info, Level};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// Read the numeric prefix of each field, zero if there is none
    Permissive,
    /// Reject rows whose fields are missing or not numbers
    Strict,
}

impl From<Mode> for ParseMode {
    fn from(m: Mode) -> Self {
        match m {
            Mode::Permissive => ParseMode::Permissive,
            Mode::Strict => ParseMode::Strict,
        }
    }
}

/// Bucket scatter samples into a column-normalized heatmap grid.
#[derive(clap::Parser)]
#[command(version, about)]
struct ClArgs {
    /// Sample files: a header line, then `<x bucket> <y>` rows
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// How to treat fields that are not clean numbers
    #[arg(long, value_enum, default_value_t = Mode::Permissive)]
    parse_mode: Mode,

    /// Write the grid to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbosity: u8,
}

fn main() -> ExitCode {
    let args = ClArgs::parse();
    init_logging(args.verbosity);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &ClArgs) -> HeatmapResult<()> {
    let mut builder = HeatmapBuilder::new(args.parse_mode.into());
    builder.ingest(&args.inputs)?;
    let sums = builder.compute_column_sums()?;
    info!(
        "{} samples from {} files, grid {}x{}",
        builder.samples(),
        args.inputs.len(),
        sums.len(),
        Y_BUCKETS + 1
    );

    // Nothing is written until every input has been read and validated.
    match &args.output {
        Some(path) => {
            let file = File::create(path).map_err(|e| HeatmapError::io(path, e))?;
            write_grid(&builder, &sums, BufWriter::new(file)).map_err(|e| HeatmapError::io(path, e))?;
            info!("grid written to {}", path.display());
        }
        None => {
            let stdout = io::stdout().lock();
            write_grid(&builder, &sums, BufWriter::new(stdout)).map_err(|e| HeatmapError::io("<stdout>", e))?;
        }
    }
    Ok(())
}

fn write_grid<W: Write>(builder: &HeatmapBuilder, sums: &[u64], mut out: W) -> io::Result<()> {
    builder.emit_grid(sums, &mut out)?;
    out.flush()
}

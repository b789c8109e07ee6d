use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use spiral::consts::{DEFAULT_CANVAS_PX, DEFAULT_FILL_MARGIN, MAX_EXACT_TERMS};
use spiral::{FibonacciSequence, RenderOptions, SpiralGeometry, decode_geometry, encode_geometry, render_png};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("terms must be at most {MAX_EXACT_TERMS}, got {0}")]
    TooManyTerms(usize),
    #[error("canvas must be at least 1x1, got {width}x{height}")]
    EmptyCanvas { width: u32, height: u32 },
    #[error("fill margin must be in (0, 1], got {0}")]
    Margin(f64),
    #[error("io failed for {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("stdout write failed: {0}")]
    Stdout(#[from] io::Error),
    #[error("invalid geometry: {0}")]
    Geometry(#[from] spiral::CodecError),
    #[error("render failed: {0}")]
    Render(#[from] spiral::RenderError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "spiral-cli", about = "Offline Fibonacci spiral geometry and renderer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print spiral geometry as interchange text.
    Geometry(TermsArgs),
    /// Render a spiral to a PNG file.
    Render(RenderArgs),
    /// Print the Fibonacci numbers behind a spiral as JSON.
    Sequence(TermsArgs),
}

#[derive(Args, Debug)]
struct TermsArgs {
    #[arg(long, env = "SPIRAL_DEFAULT_TERMS", default_value_t = 8)]
    terms: usize,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(long, env = "SPIRAL_DEFAULT_TERMS", default_value_t = 8)]
    terms: usize,

    /// Interchange file to render; takes precedence over `--terms`.
    #[arg(long)]
    from: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_CANVAS_PX)]
    width: u32,

    #[arg(long, default_value_t = DEFAULT_CANVAS_PX)]
    height: u32,

    #[arg(long, env = "SPIRAL_FILL_MARGIN", default_value_t = DEFAULT_FILL_MARGIN)]
    margin: f64,

    #[arg(long)]
    grid: bool,

    #[arg(long)]
    out: PathBuf,
}

fn main() {
    let cli = Cli::parse();
    let mut stdout = io::stdout().lock();
    if let Err(e) = run(cli.command, &mut stdout) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(command: Command, out: &mut impl Write) -> Result<(), CliError> {
    match command {
        Command::Geometry(args) => {
            let geometry = SpiralGeometry::from_terms(checked_terms(args.terms)?);
            writeln!(out, "{}", encode_geometry(&geometry))?;
        }
        Command::Sequence(args) => {
            let seq = FibonacciSequence::generate(checked_terms(args.terms)?);
            let json = serde_json::json!({ "terms": args.terms, "sequence": seq.as_slice() });
            writeln!(out, "{}", serde_json::to_string(&json)?)?;
        }
        Command::Render(args) => {
            let bytes = render_file(&args)?;
            fs::write(&args.out, bytes).map_err(|source| CliError::File { path: args.out.clone(), source })?;
            writeln!(out, "wrote {}", args.out.display())?;
        }
    }
    Ok(())
}

fn render_file(args: &RenderArgs) -> Result<Vec<u8>, CliError> {
    if args.width == 0 || args.height == 0 {
        return Err(CliError::EmptyCanvas { width: args.width, height: args.height });
    }
    if !(args.margin > 0.0 && args.margin <= 1.0) {
        return Err(CliError::Margin(args.margin));
    }

    let geometry = match &args.from {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| CliError::File { path: path.clone(), source })?;
            decode_geometry(text.trim_end())?
        }
        None => SpiralGeometry::from_terms(checked_terms(args.terms)?),
    };

    let options = RenderOptions {
        width: args.width,
        height: args.height,
        fill_margin: args.margin,
        grid: args.grid,
        ..RenderOptions::default()
    };
    Ok(render_png(&geometry, &options)?)
}

fn checked_terms(terms: usize) -> Result<usize, CliError> {
    if terms > MAX_EXACT_TERMS {
        return Err(CliError::TooManyTerms(terms));
    }
    Ok(terms)
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser as ClapParser};
use log::{info, LevelFilter};
use std::fs;
use std::io::Read;
use std::path::PathBuf;
use viztruct::report::{to_json, SuggestedCode, TextReport};
use viztruct::svg::render_svg;
use viztruct::{Analyzer, Options, SizingModel};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_output_format(s: &str) -> Result<OutputFormat, &'static str> {
    match s {
        "txt" | "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        _ => Err("Invalid output format, expected txt or json"),
    }
}

/// Shows how the fields of Go structs are laid out in memory and suggests an
/// order that wastes less space on padding. Reads stdin when neither --struct
/// nor --file is given.
#[derive(ClapParser, Debug)]
#[command(version, about)]
struct Args {
    /// Go source with one or more struct definitions
    #[arg(short, long = "struct", value_name = "SOURCE", conflicts_with = "file")]
    source: Option<String>,

    /// File containing the struct definitions
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// txt or json
    #[arg(long, value_parser = parse_output_format, default_value = "txt")]
    format: OutputFormat,

    /// Write an SVG diagram of every layout to this path
    #[arg(long, value_name = "PATH")]
    svg: Option<PathBuf>,

    /// Print the structs again with their fields in the optimized order
    #[arg(long, default_value_t = false)]
    suggest: bool,

    #[arg(long, default_value_t = SizingModel::DEFAULT_WORD_SIZE)]
    word_size: u64,

    #[arg(long, default_value_t = SizingModel::DEFAULT_MAX_ALIGN)]
    max_align: u64,

    /// More output on stderr, repeat for more detail
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn read_input(args: &Args) -> Result<String> {
    if let Some(path) = &args.file {
        return fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()));
    }

    if let Some(source) = &args.source {
        return Ok(source.clone());
    }

    let mut source = String::new();
    std::io::stdin()
        .read_to_string(&mut source)
        .context("failed to read struct definitions from stdin")?;

    Ok(source)
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let source = read_input(&args)?;
    if source.trim().is_empty() {
        bail!("no struct definitions given, use --struct, --file or stdin");
    }

    let sizing = SizingModel::new(args.word_size, args.max_align)?;
    let analyzer = Analyzer::new(Options { sizing });

    let results = analyzer
        .analyze(&source)
        .context("failed to analyze struct layouts")?;

    info!("analyzed {} structs", results.len());

    if let Some(path) = &args.svg {
        fs::write(path, render_svg(&results))
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("SVG visualization saved to {}", path.display());
    }

    match args.format {
        OutputFormat::Text => print!("{}", TextReport(&results)),
        OutputFormat::Json => println!("{}", to_json(&results)?),
    }

    if args.suggest {
        print!("{}", SuggestedCode(&results));
    }

    Ok(())
}

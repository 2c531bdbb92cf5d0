//! CLI tool for checking numeric notation consistency in PowerPoint files.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use deckcheck_core::{PresentationFormat, Progress, Report, RuleKind, Validator};
use deckcheck_pptx::PptxDocument;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// Rules selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RuleArg {
    /// Mixed decimal precision, e.g. "1.5" next to "1,50"
    Decimal,
    /// Mixed million notation, e.g. "5M" next to "5 Million"
    Million,
    /// Run every rule, one report each
    All,
}

impl RuleArg {
    fn kinds(self) -> Vec<RuleKind> {
        match self {
            RuleArg::Decimal => vec![RuleKind::Decimal],
            RuleArg::Million => vec![RuleKind::Million],
            RuleArg::All => RuleKind::ALL.to_vec(),
        }
    }
}

/// Check slide decks for inconsistent decimal and million notation.
#[derive(Parser, Debug)]
#[command(name = "deckcheck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file(s) (.pptx)
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Rule to run
    #[arg(short, long, value_enum, default_value_t = RuleArg::All)]
    rule: RuleArg,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print reports to stdout instead of writing files
    #[arg(short, long)]
    print: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let mut failed = 0;

    for input_path in &args.input {
        if args.verbose {
            eprintln!("Processing: {}", input_path.display());
        }

        for kind in args.rule.kinds() {
            match validate_file(input_path, kind, args.verbose) {
                Ok(report) => {
                    if args.print {
                        report
                            .write_csv(std::io::stdout().lock())
                            .context("Failed to write report to stdout")?;
                    } else {
                        let output_path = get_output_path(
                            input_path,
                            args.output.as_ref(),
                            &report,
                            args.input.len() > 1,
                        )?;
                        write_output(&output_path, &report)?;
                        if args.verbose {
                            eprintln!("Written to: {}", output_path.display());
                        }
                    }
                    eprintln!(
                        "{}: {} {} issue(s)",
                        input_path.display(),
                        report.issues.len(),
                        kind
                    );
                }
                Err(e) => {
                    failed += 1;
                    eprintln!("Error processing {}: {:#}", input_path.display(), e);
                }
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} validation run(s) failed", failed);
    }

    Ok(())
}

/// Run one rule over a single PowerPoint file.
fn validate_file(input_path: &Path, kind: RuleKind, verbose: bool) -> Result<Report> {
    let file = File::open(input_path)
        .with_context(|| format!("Failed to open {}", input_path.display()))?;
    let mut reader = BufReader::new(file);

    // Read magic bytes to detect format
    let mut magic = [0u8; 4];
    reader
        .read_exact(&mut magic)
        .with_context(|| "Failed to read file header")?;

    let format = detect_format(input_path, &magic)?;
    log::debug!("Detected {:?} format for {}", format, input_path.display());

    // Re-open file for parsing from the start
    let file = File::open(input_path)?;
    let mut document = PptxDocument::open(BufReader::new(file))
        .with_context(|| format!("Failed to read {}", input_path.display()))?;

    log::debug!("Running {} validation", kind);
    let report = Validator::for_kind(kind).validate(&mut document, |progress: Progress| {
        if verbose {
            eprintln!("  Progress: {}%", progress.percent);
        }
    })?;

    Ok(report)
}

/// Accept only files whose extension and header both identify a PPTX deck.
fn detect_format(input_path: &Path, magic: &[u8]) -> Result<PresentationFormat> {
    let format = input_path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(PresentationFormat::from_extension)
        .ok_or_else(|| anyhow::anyhow!("Only .pptx files are accepted: {}", input_path.display()))?;

    if PresentationFormat::from_magic(magic) != Some(format) {
        anyhow::bail!("{} is not a valid PPTX archive", input_path.display());
    }

    Ok(format)
}

/// Determine the output path for a report.
///
/// With several inputs the report name is prefixed with the deck's stem so
/// reports sharing an output directory do not overwrite each other.
fn get_output_path(
    input_path: &Path,
    output_dir: Option<&PathBuf>,
    report: &Report,
    prefix_stem: bool,
) -> Result<PathBuf> {
    let output_filename = if prefix_stem {
        let stem = input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        format!("{}_{}", stem, report.filename())
    } else {
        report.filename()
    };

    let output_path = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.join(output_filename)
        }
        None => {
            if let Some(parent) = input_path.parent() {
                parent.join(output_filename)
            } else {
                PathBuf::from(output_filename)
            }
        }
    };

    Ok(output_path)
}

/// Write a report to a file.
fn write_output(path: &Path, report: &Report) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;

    report
        .write_csv(&mut file)
        .with_context(|| format!("Failed to write to {}", path.display()))?;
    file.flush()?;

    Ok(())
}

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use epispan::{format_score, Epitope, Extractor, Reader, Writer, DEFAULT_THRESHOLD, HEADER};

#[derive(Parser)]
#[command(name = "epispan")]
#[command(about = "Extract linear B-cell epitopes from per-residue prediction scores", long_about = None)]
#[command(version)]
struct Cli {
    /// Per-residue prediction table (comma, tab, semicolon or pipe separated)
    #[arg(short = 'i', long, value_name = "FILE", default_value = "result/raw_output.csv")]
    input: PathBuf,

    /// Output CSV of epitopes
    #[arg(
        short = 'o',
        long,
        value_name = "FILE",
        default_value = "result/bcell_linear_epitopes.csv"
    )]
    output: PathBuf,

    /// Minimum linear epitope score for a residue to be part of an epitope
    #[arg(short = 't', long, value_name = "FLOAT", default_value_t = DEFAULT_THRESHOLD)]
    threshold: f64,

    /// Field delimiter of the input (detected if not given)
    #[arg(short = 'd', long, value_name = "CHAR", value_parser = parse_delimiter)]
    delimiter: Option<char>,

    /// Number of epitopes to print after the run
    #[arg(short = 'n', long, value_name = "INT", default_value = "10")]
    preview: usize,

    /// Verbosity level: 1=error, 2=warning, 3=message, 4=debug, 5+=trace
    #[arg(short = 'v', long, value_name = "INT", default_value = "3")]
    verbosity: i32,
}

/// Parse a delimiter given as a single character, `\t` or `tab`
fn parse_delimiter(s: &str) -> Result<char, String> {
    match s {
        "\\t" | "tab" | "TAB" => Ok('\t'),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => Err(format!("Delimiter must be a single character: {}", s)),
            }
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbosity {
        v if v <= 1 => log::LevelFilter::Error,
        2 => log::LevelFilter::Warn,
        3 => log::LevelFilter::Info,
        4 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    if let Err(e) = run(&cli) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    let reader = Reader::from_path(&cli.input, cli.delimiter)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    let columns = reader.columns();
    log::info!(
        "Detected columns -> Residue: {}, Score: {}",
        columns.residue_name(),
        columns.score_name()
    );
    match columns.accession_name() {
        Some(name) => log::info!("Grouping by accession column: {}", name),
        None => log::warn!("No accession column, treating all rows as one sequence"),
    }

    let extractor = Extractor::new(cli.threshold);
    let epitopes = epispan::extract_epitopes(reader, &extractor)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    if let Some(parent) = cli.output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
    }

    let mut writer = Writer::from_path(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;
    writer.write_all(&epitopes)?;
    writer
        .flush()
        .with_context(|| format!("failed to write {}", cli.output.display()))?;

    log::info!(
        "Done! Found {} linear epitopes (score \u{2265} {}).",
        epitopes.len(),
        extractor.threshold()
    );
    log::info!("Results saved to: {}", cli.output.display());

    print_preview(&epitopes, cli.preview);
    Ok(())
}

/// Print the first `n` epitopes as an aligned table
fn print_preview(epitopes: &[Epitope], n: usize) {
    if n == 0 || epitopes.is_empty() {
        return;
    }

    let rows: Vec<[String; 6]> = epitopes
        .iter()
        .take(n)
        .map(|e| {
            [
                e.accession.clone(),
                e.sequence.clone(),
                e.start.to_string(),
                e.end.to_string(),
                e.len().to_string(),
                format_score(e.mean_score),
            ]
        })
        .collect();

    let mut widths = HEADER.map(str::len);
    for row in &rows {
        for (w, field) in widths.iter_mut().zip(row) {
            *w = (*w).max(field.chars().count());
        }
    }

    let header: Vec<String> = HEADER
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{:>w$}", h, w = *w))
        .collect();
    println!("{}", header.join("  "));
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(f, w)| format!("{:>w$}", f, w = *w))
            .collect();
        println!("{}", line.join("  "));
    }
}

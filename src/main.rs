//! tabular-scan CLI - single-pass analyzer for tabular text files

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tabular::{scan, stats, to_abridged, to_exhaustive, StatClass, TableDescription};

/// Single-pass streaming analyzer for tabular text files.
///
/// Infers UTF-8 validity, line termination, table structure (metadata
/// prefix, column separator, column count), and per-column statistics
/// and classification, in one pass over the input.
#[derive(Parser, Debug)]
#[command(name = "tabular-scan")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input files to scan. Reads stdin if none are given.
    files: Vec<PathBuf>,

    /// Output format.
    #[arg(short = 'f', long, default_value = "text")]
    format: OutputFormat,

    /// Emit the abridged JSON shape (label-set hash instead of labels).
    #[arg(long, requires = "format")]
    abridged: bool,

    /// Show per-column detail and enable debug logging.
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Additionally compute distributional summaries (quantile, bandwidth,
    /// robust bounds, KDE) for each quantitative/ordinal column.
    #[arg(long)]
    stats: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let args = Args::parse();
    install_logging(args.verbose);

    if args.files.is_empty() {
        return run_one(None, &args);
    }

    let mut exit_code = ExitCode::SUCCESS;
    for file in &args.files {
        let code = run_one(Some(file), &args);
        if code != ExitCode::SUCCESS {
            exit_code = code;
        }
    }
    exit_code
}

fn install_logging(verbose: bool) {
    let filter = if verbose {
        "tabular=debug,tabular_scan=debug"
    } else {
        "tabular=warn,tabular_scan=warn"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .try_init();
}

fn run_one(path: Option<&PathBuf>, args: &Args) -> ExitCode {
    let table = match path {
        Some(p) => match tabular::open_transparent(p) {
            Ok(mut reader) => scan(&mut reader),
            Err(e) => {
                eprintln!("Error opening {}: {e}", p.display());
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut buf = Vec::new();
            if let Err(e) = std::io::stdin().read_to_end(&mut buf) {
                eprintln!("Error reading stdin: {e}");
                return ExitCode::FAILURE;
            }
            scan(buf.as_slice())
        }
    };

    if !table.status().is_success() {
        eprintln!(
            "Error processing {}: {:?} at byte {}",
            path.map(|p| p.display().to_string()).unwrap_or_else(|| "<stdin>".to_string()),
            table.status(),
            table.ordinal()
        );
        return ExitCode::FAILURE;
    }

    match args.format {
        OutputFormat::Text => print_text(path, &table, args.verbose),
        OutputFormat::Json => print_json(&table, args.abridged),
    }

    if args.stats {
        if let Some(p) = path {
            print_stats(p, &table);
        } else {
            eprintln!("--stats requires a file path (stdin cannot be re-read)");
        }
    }

    ExitCode::SUCCESS
}

fn print_text(path: Option<&PathBuf>, table: &TableDescription, verbose: bool) {
    let name = path.map(|p| p.display().to_string()).unwrap_or_else(|| "<stdin>".to_string());
    println!("{name}:");
    println!("  status: {:?}", table.status());

    match table.format() {
        Some(fmt) => {
            println!("  column separator: {:?}", String::from_utf8_lossy(&fmt.column_separator));
            println!("  columns: {}", fmt.column_count);
            let rows = table.rows();
            println!(
                "  rows: data={} meta={} empty={} aberrant={}",
                rows.data, rows.meta, rows.empty, rows.aberrant
            );
            if verbose {
                for (i, col) in table.columns().iter().enumerate() {
                    println!(
                        "    column {i}: class={:?} mean={:.4} stddev={:.4}",
                        col.stat_class,
                        col.mean,
                        col.variance.sqrt()
                    );
                }
            }
        }
        None => println!("  no table recognized"),
    }
}

fn print_json(table: &TableDescription, abridged: bool) {
    let body = if abridged { to_abridged(table) } else { to_exhaustive(table) };
    match body {
        Ok(s) => println!("{s}"),
        Err(e) => eprintln!("Error serializing JSON: {e}"),
    }
}

/// Re-reads `path` to collect raw numeric values per quantitative/ordinal
/// column; the streaming scan itself keeps only running statistics, not
/// the underlying samples, so the auxiliary numeric services operate on
/// a second, opt-in pass rather than on retained scan state.
fn print_stats(path: &PathBuf, table: &TableDescription) {
    let Some(fmt) = table.format() else { return };

    let mut samples: Vec<Vec<f64>> = vec![Vec::new(); fmt.column_count];
    let contents = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error re-reading {} for --stats: {e}", path.display());
            return;
        }
    };

    for line in contents.split(|&b| b == b'\n') {
        let line = trim_cr(line);
        if line.is_empty() || (!fmt.metadata_prefix.is_empty() && line.starts_with(fmt.metadata_prefix.as_slice())) {
            continue;
        }
        let mut idx = 0usize;
        let _ = fmt.splitter.split(line, &mut |field: &[u8]| {
            if idx < samples.len() {
                if let Ok(s) = std::str::from_utf8(field) {
                    if let Ok(v) = s.parse::<f64>() {
                        samples[idx].push(v);
                    }
                }
            }
            idx += 1;
        });
    }

    for (i, (col, values)) in table.columns().iter().zip(samples.iter()).enumerate() {
        if !matches!(col.stat_class, StatClass::Quantitative | StatClass::Ordinal) || values.is_empty() {
            continue;
        }
        let (lo, hi) = stats::robust_bounds(values);
        println!(
            "  column {i} stats: median={:.4} bandwidth={:.4} robust_bounds=({:.4}, {:.4})",
            stats::quantile(values, 0.5),
            stats::bandwidth(values),
            lo,
            hi
        );
    }
}

fn trim_cr(line: &[u8]) -> &[u8] {
    if line.last() == Some(&b'\r') {
        &line[..line.len() - 1]
    } else {
        line
    }
}

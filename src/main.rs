//! Tablix - batch front end for the table engine.
//!
//! Loads a delimited text file, optionally attaches and recalculates column
//! formulas, sorts, and writes the result back out.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tablix_core::{ImportOptions, RhaiEvaluator, SortOrder, Table};

fn print_usage() {
    eprintln!("Usage: tablix [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Delimited text file to load");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --separator <SEP>     Field separator (default: tab)");
    eprintln!("  --skip <N>                Ignore the first N lines");
    eprintln!("  --header                  Read column names from the first line");
    eprintln!("  --text                    Keep every column textual (no numeric detection)");
    eprintln!("  -f, --formula <COL=EXPR>  Attach a formula to a named column (can be repeated)");
    eprintln!("  --sort <COL[:desc]>       Sort all columns together by the named column");
    eprintln!("  --normalize               Scale every numeric column to [-1, 1]");
    eprintln!("  -o, --output <FILE>       Write the result to a file instead of stdout");
    eprintln!("  --labels                  Include header labels in the output");
    eprintln!("  -h, --help                Print help");
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut file_path: Option<PathBuf> = None;
    let mut output_file: Option<PathBuf> = None;
    let mut separator = "\t".to_string();
    let mut skip = 0usize;
    let mut header = false;
    let mut keep_text = false;
    let mut formulas: Vec<String> = Vec::new();
    let mut sort_spec: Option<String> = None;
    let mut normalize = false;
    let mut labels = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-s" | "--separator" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --separator requires a value");
                    std::process::exit(1);
                }
                separator = args[i].clone();
            }
            "--skip" => {
                i += 1;
                let parsed = args.get(i).and_then(|v| v.parse().ok());
                let Some(n) = parsed else {
                    eprintln!("Error: --skip requires a line count");
                    std::process::exit(1);
                };
                skip = n;
            }
            "--header" => header = true,
            "--text" => keep_text = true,
            "-f" | "--formula" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --formula requires COL=EXPR");
                    std::process::exit(1);
                }
                formulas.push(args[i].clone());
            }
            "--sort" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --sort requires a column name");
                    std::process::exit(1);
                }
                sort_spec = Some(args[i].clone());
            }
            "--normalize" => normalize = true,
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires a file path");
                    std::process::exit(1);
                }
                output_file = Some(PathBuf::from(&args[i]));
            }
            "--labels" => labels = true,
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if file_path.is_none() {
                    file_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Multiple input files specified");
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    let opts = ImportOptions {
        separator: separator.clone(),
        ignored_lines: skip,
        rename_cols: header,
        convert_to_numeric: !keep_text,
        ..ImportOptions::default()
    };

    if let Err(e) = run(
        file_path.as_deref(),
        &opts,
        &formulas,
        sort_spec.as_deref(),
        normalize,
        output_file.as_deref(),
        &separator,
        labels,
    ) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[allow(clippy::too_many_arguments)]
fn run(
    input: Option<&Path>,
    opts: &ImportOptions,
    formulas: &[String],
    sort_spec: Option<&str>,
    normalize: bool,
    output: Option<&Path>,
    separator: &str,
    labels: bool,
) -> Result<()> {
    let mut table = match input {
        Some(path) => Table::from_ascii_file(path, opts)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => Table::with_size(0, 0),
    };

    if !formulas.is_empty() {
        let mut evaluator = RhaiEvaluator::new();
        for spec in formulas {
            let Some((name, expr)) = spec.split_once('=') else {
                bail!("bad formula {spec:?}, expected COL=EXPR");
            };
            let col = table.col_index(name.trim())?;
            table.set_formula(col, Some(expr.trim().to_string()))?;
            table.recalculate(col, None, &mut evaluator)?;
            if let Some(msg) = table.last_error() {
                eprintln!("Warning: {msg}");
            }
        }
    }

    if let Some(spec) = sort_spec {
        let (name, order) = match spec.rsplit_once(':') {
            Some((name, "desc")) => (name, SortOrder::Descending),
            Some((name, "asc")) => (name, SortOrder::Ascending),
            _ => (spec, SortOrder::Ascending),
        };
        let leading = table.col_index(name)?;
        let all: Vec<usize> = (0..table.column_count()).collect();
        table.sort_columns(
            &all,
            tablix_core::SortType::Together,
            order,
            Some(leading),
        )?;
    }

    if normalize {
        table.normalize_all();
    }

    match output {
        Some(path) => {
            if !table.export_ascii(path, separator, labels, None) {
                bail!(
                    "failed to write {}: {}",
                    path.display(),
                    table.last_error().unwrap_or("unknown error")
                );
            }
        }
        None => {
            let stdout = std::io::stdout();
            tablix_core::storage::write_ascii(&table, stdout.lock(), separator, labels, None)?;
        }
    }
    Ok(())
}

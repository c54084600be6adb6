use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use loadshape::data::loader::{self, DEFAULT_TIMESTAMP_FORMAT};
use loadshape::{DstRules, Extractor, GroupBySpec, Loadshape, Normalize, Table};

const USAGE: &str = "\
Usage: loadshape <FILE> [options]

Compute a normalized loadshape from a CSV or JSON load dataset.

Options:
  --datecol <NAME>     timestamp column (default: first CSV column / 'datetime' for JSON)
  --format <FMT>       chrono timestamp format (default: %Y-%m-%d %H:%M:%S)
  --normalize <MODE>   max | min | range | none | <number>  (default: max)
  --hour-only          group by hour of day only, instead of daytype × hour
  --json               emit the result as JSON records instead of text
";

struct Args {
    input: PathBuf,
    datecol: Option<String>,
    format: String,
    normalize: Normalize,
    hour_only: bool,
    json: bool,
}

fn parse_args(mut argv: impl Iterator<Item = String>) -> Result<Args> {
    let mut input = None;
    let mut datecol = None;
    let mut format = DEFAULT_TIMESTAMP_FORMAT.to_string();
    let mut normalize = Normalize::Max;
    let mut hour_only = false;
    let mut json = false;

    while let Some(arg) = argv.next() {
        match arg.as_str() {
            "--datecol" => datecol = Some(argv.next().context("--datecol needs a value")?),
            "--format" => format = argv.next().context("--format needs a value")?,
            "--normalize" => {
                let mode = argv.next().context("--normalize needs a value")?;
                normalize = parse_normalize(&mode)?;
            }
            "--hour-only" => hour_only = true,
            "--json" => json = true,
            "--help" | "-h" => bail!("{USAGE}"),
            other if other.starts_with('-') => bail!("unknown option '{other}'\n\n{USAGE}"),
            other => {
                if input.replace(PathBuf::from(other)).is_some() {
                    bail!("more than one input file given\n\n{USAGE}");
                }
            }
        }
    }

    Ok(Args {
        input: input.with_context(|| format!("no input file given\n\n{USAGE}"))?,
        datecol,
        format,
        normalize,
        hour_only,
        json,
    })
}

fn parse_normalize(mode: &str) -> Result<Normalize> {
    Ok(match mode {
        "max" => Normalize::Max,
        "min" => Normalize::Min,
        "range" => Normalize::Range,
        "none" => Normalize::None,
        other => match other.parse::<f64>() {
            Ok(v) => Normalize::Value(v),
            Err(_) => bail!("unknown normalization mode '{other}'"),
        },
    })
}

fn run() -> Result<()> {
    let args = parse_args(std::env::args().skip(1))?;

    // The loader moves the date column to position 0, so the engine's
    // first-column default picks it up.
    let table = loader::load_file(&args.input, args.datecol.as_deref(), &args.format)?;
    let mut engine = Loadshape::new(table)?;
    if args.hour_only {
        let datecol = engine.datecol().to_string();
        engine.groupby =
            GroupBySpec::new().with("hour", datecol, Extractor::HourOfDay(DstRules::new()));
    }

    let shape = engine.loadshape(args.normalize)?;
    log::info!(
        "loadshape: {} groups × {} measurement columns",
        shape.row_count(),
        engine.columns().len()
    );

    if args.json {
        print_json(&shape)?;
    } else {
        print_text(&shape);
    }
    Ok(())
}

/// Fixed-width text rendering, one row per group.
fn print_text(table: &Table) {
    let names = table.column_names();
    let cells: Vec<Vec<String>> = (0..table.row_count())
        .map(|row| {
            names
                .iter()
                .map(|n| table.column(n).map_or(String::new(), |c| c[row].to_string()))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = names
        .iter()
        .enumerate()
        .map(|(i, n)| {
            cells
                .iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(n.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = names
        .iter()
        .zip(widths.iter().copied())
        .map(|(n, w)| format!("{n:>w$}"))
        .collect();
    println!("{}", header.join("  "));
    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(widths.iter().copied())
            .map(|(c, w)| format!("{c:>w$}"))
            .collect();
        println!("{}", line.join("  "));
    }
}

/// Records-oriented JSON: one object per group row.
fn print_json(table: &Table) -> Result<()> {
    let names = table.column_names();
    let rows: Vec<serde_json::Map<String, serde_json::Value>> = (0..table.row_count())
        .map(|row| {
            names
                .iter()
                .filter_map(|n| {
                    let cell = &table.column(n)?[row];
                    Some((n.clone(), serde_json::to_value(cell)))
                })
                .map(|(n, v)| Ok((n, v?)))
                .collect::<Result<_, serde_json::Error>>()
        })
        .collect::<Result<_, _>>()
        .context("serializing result rows")?;
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_modes_parse() {
        assert_eq!(parse_normalize("max").unwrap(), Normalize::Max);
        assert_eq!(parse_normalize("none").unwrap(), Normalize::None);
        assert_eq!(parse_normalize("2.5").unwrap(), Normalize::Value(2.5));
        assert!(parse_normalize("median").is_err());
    }

    #[test]
    fn args_require_an_input_file() {
        assert!(parse_args(["--json".to_string()].into_iter()).is_err());
        let args = parse_args(["data.csv".to_string(), "--hour-only".to_string()].into_iter())
            .unwrap();
        assert!(args.hour_only);
        assert_eq!(args.input, PathBuf::from("data.csv"));
    }
}

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use glob::Pattern;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use tidy_sheet::pipeline::{clean_file, export_cleaned, output_target, RunSummary};
use tidy_sheet::{Cleaner, ExportFormat, LoadOptions};

#[derive(Parser)]
#[command(name = "tidy-sheet", version, about = "Clean CSV and Excel tables: dedupe, fill N/A, trim text, standardize column names")]
struct Cli {
    #[arg(help = "Input file (.csv, .tsv, .txt, .xlsx, .xlsm)")]
    input: PathBuf,

    #[arg(
        long = "output",
        short = 'o',
        help = "Output file. Defaults to cleaned_data.csv or cleaned_data.xlsx"
    )]
    output: Option<PathBuf>,

    #[arg(
        long = "format",
        short = 'f',
        value_parser = ["csv", "xlsx"],
        help = "Output format: csv or xlsx. Defaults to the output extension, then the input format"
    )]
    format: Option<String>,

    #[arg(
        long = "sheet",
        help = "Only load worksheets whose name matches this glob pattern. Repeatable."
    )]
    sheets: Vec<String>,

    #[arg(
        long = "null",
        help = "Treat this literal as a missing value, in addition to the empty string. Repeatable."
    )]
    nulls: Vec<String>,

    #[arg(long = "encoding", help = "Encoding label of CSV input, e.g. windows-1252")]
    encoding: Option<String>,

    #[arg(long = "delimiter", help = "CSV field delimiter. Defaults to ',' (tab for .tsv)")]
    delimiter: Option<char>,

    #[arg(long = "error-as-null", default_value = "false", help = "Read Excel error cells as missing values")]
    error_as_null: bool,

    #[arg(long = "skip-empty-rows", default_value = "false", help = "Drop rows where every cell is missing")]
    skip_empty_rows: bool,

    #[arg(long = "json", default_value = "false", help = "Print the summary as JSON")]
    json: bool,
}

impl Cli {
    fn load_options(&self) -> anyhow::Result<LoadOptions> {
        let sheets = if self.sheets.is_empty() {
            None
        } else {
            let patterns = self
                .sheets
                .iter()
                .map(|sheet| Pattern::new(sheet).with_context(|| format!("Invalid sheet pattern '{sheet}'")))
                .collect::<anyhow::Result<Vec<_>>>()?;
            Some(patterns)
        };
        let delimiter = match self.delimiter {
            Some(delimiter) if delimiter.is_ascii() => Some(delimiter as u8),
            Some(delimiter) => bail!("Delimiter '{delimiter}' is not a single-byte character"),
            None => None,
        };
        let mut nulls = HashSet::from([String::new()]);
        nulls.extend(self.nulls.iter().cloned());
        Ok(LoadOptions {
            sheets,
            nulls,
            encoding: self.encoding.clone(),
            delimiter,
            error_as_null: self.error_as_null,
            skip_empty_rows: self.skip_empty_rows,
        })
    }

    fn export_format(&self) -> Option<ExportFormat> {
        match self.format.as_deref() {
            Some("csv") => Some(ExportFormat::Csv),
            Some("xlsx") => Some(ExportFormat::Xlsx),
            _ => None,
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Found {} sheet(s) in {} ({} rows, {} columns)",
        summary.found.sheets, summary.source, summary.found.rows, summary.found.columns
    );
    for sheet in &summary.sheets {
        match (&sheet.stats, &sheet.error) {
            (Some(stats), _) => println!(
                "  {}: {} -> {} rows ({} duplicates removed), {} columns",
                sheet.name, stats.rows_before, stats.rows_after, stats.duplicates_removed, stats.columns
            ),
            (None, Some(_)) => println!("  {}: failed", sheet.name),
            (None, None) => (),
        }
    }
    println!(
        "Cleaned {} sheet(s): {} rows, {} columns",
        summary.cleaned.sheets, summary.cleaned.rows, summary.cleaned.columns
    );
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let options = cli.load_options()?;
    let run = clean_file(&cli.input, &options, &Cleaner::default())
        .with_context(|| format!("Failed to load {}", cli.input.display()))?;

    let summary = run.summary();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    let failures = run.cleaned.failures().collect::<Vec<_>>();
    if !failures.is_empty() {
        for failure in &failures {
            eprintln!("{failure}");
        }
        eprintln!("Nothing was written: {} of {} sheet(s) failed", failures.len(), run.cleaned.len());
        return Ok(ExitCode::FAILURE);
    }

    let (path, format) = output_target(cli.output.as_deref(), cli.export_format(), run.format);
    let exported = export_cleaned(&run.cleaned, &path, format)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    if let Some(notice) = &exported.notice {
        eprintln!("{notice}");
    }
    info!("Cleaned data written to {}", path.display());
    if !cli.json {
        println!("Wrote {}", path.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "tidy_sheet=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_load_options() {
        let cli = Cli::try_parse_from(["tidy-sheet", "data.csv", "--null", "NA", "--delimiter", ";", "--sheet", "Q*"]).unwrap();
        let options = cli.load_options().unwrap();
        assert_eq!(options.delimiter, Some(b';'));
        assert!(options.is_null("NA"));
        assert!(options.is_null(""));
        assert!(options.accept("Q1"));
        assert!(!options.accept("Costs"));
        assert_eq!(cli.export_format(), None);

        let cli = Cli::try_parse_from(["tidy-sheet", "data.csv", "--delimiter", "é"]).unwrap();
        assert!(cli.load_options().is_err());
    }

    #[test]
    fn naming_policy_is_not_an_option() {
        assert!(Cli::try_parse_from(["tidy-sheet", "data.csv", "--strict-names"]).is_err());
    }
}

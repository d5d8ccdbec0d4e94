//! Regelleistung CLI: fetch balancing-capacity tender reports.
//!
//! Commands:
//! - `fetch`: download a date range of one report and write it as CSV or Parquet
//! - `variants`: list the known reports and whether they can be normalized

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use polars::prelude::*;
use regelleistung_core::data::{dates_between, Postprocess};
use regelleistung_core::{ClientConfig, MarketDataFetcher, Variant};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "regelleistung",
    about = "Regelleistung CLI: German balancing-capacity tender results and bids"
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download one report for a range of delivery days.
    Fetch {
        /// Report: fcr-results, fcr-bids, afrr-results, afrr-bids.
        variant: Variant,

        /// First delivery day (YYYY-MM-DD).
        #[arg(long)]
        start: String,

        /// Last delivery day (YYYY-MM-DD), inclusive. Defaults to --start.
        #[arg(long)]
        end: Option<String>,

        /// Skip postprocessing and write the tables as downloaded.
        #[arg(long, default_value_t = false)]
        raw: bool,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
        format: OutputFormat,

        /// Output file. CSV goes to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,

        /// TOML client config (base_url, timeout_secs, ambiguous_time).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Request timeout in seconds; 0 disables it. Overrides the config file.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// List the known reports.
    Variants,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Csv,
    Parquet,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "regelleistung_core=debug,regelleistung_cli=debug"
    } else {
        "regelleistung_core=info,regelleistung_cli=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Fetch {
            variant,
            start,
            end,
            raw,
            format,
            output,
            config,
            timeout_secs,
        } => run_fetch(
            variant,
            &start,
            end.as_deref(),
            raw,
            format,
            output.as_deref(),
            config.as_deref(),
            timeout_secs,
        ),
        Commands::Variants => {
            run_variants();
            Ok(())
        }
    }
}

fn parse_date(value: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .with_context(|| format!("{flag} must be YYYY-MM-DD, got '{value}'"))
}

#[allow(clippy::too_many_arguments)]
fn run_fetch(
    variant: Variant,
    start: &str,
    end: Option<&str>,
    raw: bool,
    format: OutputFormat,
    output: Option<&Path>,
    config: Option<&Path>,
    timeout_secs: Option<u64>,
) -> Result<()> {
    let start_date = parse_date(start, "--start")?;
    let end_date = end
        .map(|e| parse_date(e, "--end"))
        .transpose()?
        .unwrap_or(start_date);
    if end_date < start_date {
        bail!("--end ({end_date}) is before --start ({start_date})");
    }
    if format == OutputFormat::Parquet && output.is_none() {
        bail!("--format parquet needs --output");
    }

    let mut client = match config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(secs) = timeout_secs {
        client.timeout_secs = Some(secs);
    }

    let fetcher = MarketDataFetcher::with_client_config(variant, client)?;
    let dates = dates_between(start_date, end_date);
    info!(%variant, days = dates.len(), "fetching");

    let table = fetcher
        .fetch_range(&dates, !raw)
        .with_context(|| format!("fetching {variant} {start_date}..={end_date}"))?;
    let mut frame = text_for_null_columns(table.into_frame())?;

    match (format, output) {
        (OutputFormat::Csv, None) => write_csv(&mut frame, io::stdout().lock())?,
        (OutputFormat::Csv, Some(path)) => write_csv(&mut frame, create(path)?)?,
        (OutputFormat::Parquet, Some(path)) => {
            ParquetWriter::new(create(path)?)
                .finish(&mut frame)
                .with_context(|| format!("writing {}", path.display()))?;
        }
        (OutputFormat::Parquet, None) => bail!("--format parquet needs --output"),
    }

    if let Some(path) = output {
        info!(rows = frame.height(), path = %path.display(), "written");
    }
    Ok(())
}

fn create(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("creating {}", path.display()))
}

fn write_csv<W: io::Write>(frame: &mut DataFrame, writer: W) -> Result<()> {
    CsvWriter::new(writer)
        .include_header(true)
        .finish(frame)
        .context("writing CSV")
}

/// Columns that were empty in every workbook carry no type; write them as text.
fn text_for_null_columns(mut frame: DataFrame) -> Result<DataFrame> {
    let null_columns: Vec<PlSmallStr> = frame
        .get_columns()
        .iter()
        .filter(|c| c.dtype() == &DataType::Null)
        .map(|c| c.name().clone())
        .collect();
    for name in null_columns {
        let text = frame.column(&name)?.cast(&DataType::String)?;
        frame.with_column(text)?;
    }
    Ok(frame)
}

fn run_variants() {
    println!("{:<14} {:<34} {:<24} postprocess", "variant", "report", "request");
    for variant in Variant::ALL {
        let config = variant.config();
        let normalized = if Postprocess::for_config(&config).is_implemented() {
            "yes"
        } else {
            "not implemented"
        };
        println!(
            "{:<14} {:<34} {:<24} {normalized}",
            variant.slug(),
            variant.description(),
            config.to_string(),
        );
    }
}

//! Command-line front end: ticker in, income statement out.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use finmodel::{
    AnalysisLayout, AnalysisRenderer, CanonicalStatement, CsvRenderer, LineItemCatalog, ParquetRenderer, PeriodType,
    PipelineOptions, PolygonProvider, ProvenanceRenderer, SqliteCache, StatementError,
    StatementPipeline, StatementRenderer, Symbol,
};
use finmodel_polygon::API_KEY_ENV;

const NO_DATA_EXIT: u8 = 2;

/// Builds institutional income statements from Polygon.io financials.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Polygon.io API key
    #[arg(long, env = "POLYGON_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Reporting period
    #[arg(long, value_enum, default_value_t = Period::Quarterly, global = true)]
    period: Period,

    /// Maximum number of periods
    #[arg(long, default_value_t = finmodel_mapping::DEFAULT_PERIOD_LIMIT, global = true)]
    limit: usize,

    /// SQLite file for caching raw provider responses
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    /// Discard cached responses older than this many hours
    #[arg(long, default_value_t = 24, global = true)]
    cache_ttl_hours: u64,

    /// JSON file replacing the built-in line-item catalog
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate income statements for one or more tickers
    Generate {
        /// Ticker symbols
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Csv)]
        format: Format,

        /// Output file (single ticker) or directory (several tickers)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write a per-cell provenance CSV next to each statement
        #[arg(long)]
        provenance: bool,

        /// Also write growth, annual and key-metrics CSVs next to each statement
        #[arg(long)]
        analysis: bool,
    },
    /// Print the provider's raw field names and the resolved mapping as JSON
    Inspect {
        /// Ticker symbol
        ticker: String,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Period {
    Quarterly,
    Annual,
}

impl From<Period> for PeriodType {
    fn from(period: Period) -> Self {
        match period {
            Period::Quarterly => Self::Quarterly,
            Period::Annual => Self::Annual,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Csv,
    Parquet,
}

impl Format {
    fn renderer(self) -> Box<dyn StatementRenderer> {
        match self {
            Self::Csv => Box::new(CsvRenderer::new()),
            Self::Parquet => Box::new(ParquetRenderer::new()),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("finmodel=info")),
        )
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let pipeline = build_pipeline(&cli)?;

    match cli.command {
        Command::Generate {
            tickers,
            format,
            output,
            provenance,
            analysis,
        } => {
            let extras = Extras {
                provenance,
                analysis,
            };
            generate(&pipeline, &tickers, format, output.as_deref(), extras).await
        }
        Command::Inspect { ticker } => {
            let symbol = Symbol::new(&ticker);
            match pipeline.inspect(&symbol).await {
                Ok(inspection) if inspection.period_count == 0 => Ok(no_data(&symbol)),
                Ok(inspection) => {
                    let json = serde_json::to_string_pretty(&inspection)?;
                    println!("{json}");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => Err(e).with_context(|| format!("failed to inspect {symbol}")),
            }
        }
    }
}

fn build_pipeline(cli: &Cli) -> Result<StatementPipeline> {
    let Some(api_key) = cli.api_key.as_deref().filter(|key| !key.trim().is_empty()) else {
        bail!("missing API key: pass --api-key or set {API_KEY_ENV}");
    };

    let options = PipelineOptions::default()
        .with_period_type(cli.period.into())
        .with_period_limit(cli.limit)
        .with_cache_ttl(cache_ttl(cli.cache_ttl_hours));

    let mut pipeline =
        StatementPipeline::new(Arc::new(PolygonProvider::new(api_key))).with_options(options);

    if let Some(path) = &cli.catalog {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        let catalog = LineItemCatalog::from_json(&json)
            .with_context(|| format!("invalid catalog {}", path.display()))?;
        pipeline = pipeline.with_catalog(catalog);
    }

    if let Some(path) = &cli.cache {
        let cache = SqliteCache::new(path)
            .with_context(|| format!("failed to open cache {}", path.display()))?;
        pipeline = pipeline.with_cache(Arc::new(cache));
    }

    Ok(pipeline)
}

/// Cache TTL for a count of hours, saturating instead of overflowing.
fn cache_ttl(hours: u64) -> Duration {
    Duration::from_secs(hours.saturating_mul(3600))
}

/// Side files written next to each statement.
#[derive(Clone, Copy, Debug, Default)]
struct Extras {
    provenance: bool,
    analysis: bool,
}

async fn generate(
    pipeline: &StatementPipeline,
    tickers: &[String],
    format: Format,
    output: Option<&Path>,
    extras: Extras,
) -> Result<ExitCode> {
    let symbols: Vec<Symbol> = tickers.iter().map(Symbol::new).collect();
    let renderer = format.renderer();
    let mut exit = ExitCode::SUCCESS;
    let mut failures = 0;

    for (symbol, result) in pipeline.generate_many(&symbols).await {
        let report = match result {
            Ok(report) if report.statement.is_empty() => {
                exit = no_data(&symbol);
                continue;
            }
            Ok(report) => report,
            Err(StatementError::EmptyInput(_)) => {
                exit = no_data(&symbol);
                continue;
            }
            Err(e) => {
                warn!(%symbol, error = %e, "Statement generation failed");
                eprintln!("error: {symbol}: {e}");
                failures += 1;
                continue;
            }
        };

        for diagnostic in &report.diagnostics {
            eprintln!("{symbol}: {diagnostic}");
        }

        let path = output_path(output, &symbol, renderer.extension(), symbols.len() > 1);
        write_report(renderer.as_ref(), &report.statement, path.as_deref())?;

        let dir = path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();
        if extras.provenance {
            let prov_path = dir.join(format!("{symbol}_provenance.csv"));
            write_report(&ProvenanceRenderer::new(), &report.statement, Some(&prov_path))?;
        }
        if extras.analysis {
            for layout in AnalysisLayout::ALL {
                let layout_path = dir.join(format!("{symbol}_{}.csv", layout.as_str()));
                let renderer = AnalysisRenderer::new(layout);
                write_report(&renderer, &report.statement, Some(&layout_path))?;
            }
        }

        info!(
            %symbol,
            company = %report.statement.company_name,
            periods = report.statement.periods.len(),
            from_cache = report.from_cache,
            "Wrote income statement"
        );
    }

    if failures > 0 {
        bail!("{failures} of {} tickers failed", symbols.len());
    }
    Ok(exit)
}

fn no_data(symbol: &Symbol) -> ExitCode {
    eprintln!("no data found for {symbol}");
    ExitCode::from(NO_DATA_EXIT)
}

/// Resolves where a statement is written. `None` means stdout.
fn output_path(
    output: Option<&Path>,
    symbol: &Symbol,
    extension: &str,
    as_dir: bool,
) -> Option<PathBuf> {
    let file_name = format!("{symbol}_income_statement.{extension}");
    match output {
        Some(path) if as_dir || path.is_dir() => Some(path.join(file_name)),
        Some(path) => Some(path.to_path_buf()),
        None if as_dir => Some(PathBuf::from(file_name)),
        None => None,
    }
}

fn write_report(
    renderer: &dyn StatementRenderer,
    statement: &CanonicalStatement,
    path: Option<&Path>,
) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            renderer.render(statement, &mut out)?;
            out.flush()?;
            eprintln!("wrote {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            renderer.render(statement, &mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_ttl_saturates() {
        assert_eq!(cache_ttl(24), Duration::from_secs(86_400));
        assert_eq!(cache_ttl(u64::MAX), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_output_path() {
        let symbol = Symbol::new("aapl");
        assert_eq!(output_path(None, &symbol, "csv", false), None);
        assert_eq!(
            output_path(None, &symbol, "csv", true),
            Some(PathBuf::from("AAPL_income_statement.csv"))
        );
        assert_eq!(
            output_path(Some(Path::new("out")), &symbol, "parquet", true),
            Some(PathBuf::from("out/AAPL_income_statement.parquet"))
        );
    }

    #[test]
    fn test_generate_flags() {
        let cli = Cli::try_parse_from([
            "finmodel",
            "--api-key",
            "key",
            "generate",
            "AAPL",
            "--analysis",
        ])
        .unwrap();
        match cli.command {
            Command::Generate {
                analysis,
                provenance,
                ..
            } => {
                assert!(analysis);
                assert!(!provenance);
            }
            Command::Inspect { .. } => panic!("expected generate"),
        }
    }
}

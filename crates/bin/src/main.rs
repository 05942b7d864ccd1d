//! Hobart CLI binary.
//!
//! Provides command-line access to the low-volatility alpha testing pipeline.

use clap::{Parser, Subcommand, ValueEnum};
use hobart::VERSION;
use hobart_analysis::{AnalysisConfig, AnalysisContext, Pipeline};
use hobart_data::{FactorTable, FactorUnits, read_factors_path, read_membership_path, read_prices_path};
use hobart_output::{ExportFormat, Exporter, PortfolioReturnRow, Report, RunTables, export_run};
use hobart_portfolio::PortfolioId;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;
use tracing::info;

#[derive(Parser)]
#[command(name = "hobart")]
#[command(about = "Hobart: low-volatility anomaly alpha testing", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum TableFormat {
    Text,
    Json,
    Csv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FileFormat {
    Csv,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Form volatility portfolios and test their alphas
    Analyze {
        /// Daily prices CSV (symbol,date,adj_close)
        #[arg(long)]
        prices: PathBuf,

        /// Monthly factors CSV (month,mkt_rf,smb,hml,rmw,cma,rf)
        #[arg(long)]
        factors: PathBuf,

        /// Point-in-time membership CSV (month,symbol)
        #[arg(long)]
        membership: Option<PathBuf>,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Factor file is in percent rather than decimals
        #[arg(long)]
        percent: bool,

        /// Report format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Also write result tables into this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// File format for exported tables
        #[arg(long, value_enum, default_value = "csv")]
        export_format: FileFormat,
    },

    /// Form volatility portfolios and print their monthly returns
    Portfolios {
        /// Daily prices CSV (symbol,date,adj_close)
        #[arg(long)]
        prices: PathBuf,

        /// Point-in-time membership CSV (month,symbol)
        #[arg(long)]
        membership: Option<PathBuf>,

        /// JSON configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: TableFormat,
    },
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json_logging = std::env::var("HOBART_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            prices,
            factors,
            membership,
            config,
            percent,
            format,
            export_dir,
            export_format,
        } => {
            let units = if percent {
                FactorUnits::Percent
            } else {
                FactorUnits::Decimal
            };
            let config = load_config(config.as_deref())?;
            let factors = read_factors_path(&factors, units)?;
            let context = load_context(&prices, membership.as_deref(), factors)?;

            let output = Pipeline::new(config)?.run(&context)?;

            if let Some(dir) = export_dir {
                let file_format = match export_format {
                    FileFormat::Csv => ExportFormat::Csv,
                    FileFormat::Json => ExportFormat::PrettyJson,
                };
                let written = export_run(&RunTables::from_output(&output), &dir, file_format)?;
                info!(files = written.len(), dir = %dir.display(), "Exported result tables");
            }

            let report = Report::from_output(&output);
            match format {
                OutputFormat::Text => println!("{}", report.to_ascii_table()),
                OutputFormat::Markdown => println!("{}", report.to_markdown()),
                OutputFormat::Json => println!("{}", report.to_json()?),
            }
        }
        Commands::Portfolios {
            prices,
            membership,
            config,
            format,
        } => {
            let config = load_config(config.as_deref())?;
            let context = load_context(&prices, membership.as_deref(), FactorTable::default())?;
            let run = Pipeline::new(config)?.form_portfolios(&context)?;

            match format {
                TableFormat::Json => println!("{}", serde_json::to_string_pretty(&run.portfolios)?),
                TableFormat::Csv => {
                    let rows: Vec<PortfolioReturnRow> =
                        run.portfolios.iter().map(PortfolioReturnRow::from).collect();
                    print!("{}", rows.export_to_string(ExportFormat::Csv)?);
                }
                TableFormat::Text => print_portfolio_table(&run.portfolios),
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => AnalysisConfig::from_json_path(path)?,
        None => AnalysisConfig::default(),
    };
    Ok(config)
}

fn load_context(
    prices: &Path,
    membership: Option<&Path>,
    factors: FactorTable,
) -> Result<AnalysisContext, Box<dyn std::error::Error>> {
    let prices = read_prices_path(prices)?;
    info!(
        version = VERSION,
        instruments = prices.len(),
        observations = prices.observation_count(),
        factor_months = factors.len(),
        "Loaded inputs"
    );

    let context = AnalysisContext::new(prices, factors);
    Ok(match membership {
        Some(path) => context.with_universe(read_membership_path(path)?),
        None => context,
    })
}

fn print_portfolio_table(portfolios: &hobart_portfolio::PortfolioSet) {
    let ids: Vec<PortfolioId> = portfolios.ids().collect();
    let mut by_month: BTreeMap<String, BTreeMap<PortfolioId, f64>> = BTreeMap::new();
    for r in portfolios.iter() {
        by_month
            .entry(r.month.to_string())
            .or_default()
            .insert(r.portfolio, r.value);
    }

    print!("{:<8}", "Month");
    for id in &ids {
        print!(" {:>9}", id.to_string());
    }
    println!();
    println!("{}", "-".repeat(8 + 10 * ids.len()));

    for (month, values) in &by_month {
        print!("{month:<8}");
        for id in &ids {
            match values.get(id) {
                Some(v) => print!(" {:>8.2}%", v * 100.0),
                None => print!(" {:>9}", "-"),
            }
        }
        println!();
    }
}

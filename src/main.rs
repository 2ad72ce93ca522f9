// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

// Use library instead of local modules
use subscription_forecast::{analyze, load_ledger, render_text, AnalysisConfig, AnalysisReport};

#[derive(Parser)]
#[command(author, version, about = "Classify subscriptions and forecast next year's revenue", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Transactions CSV (overrides the config file)
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// First year of the revenue window
    #[arg(long, global = true)]
    start_year: Option<i32>,

    /// Last year of the revenue window
    #[arg(long, global = true)]
    end_year: Option<i32>,

    /// Number of growth/loss years to rank
    #[arg(short = 'k', long, global = true)]
    top: Option<usize>,

    /// Skip malformed records instead of aborting
    #[arg(long, global = true)]
    lenient: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the text report (default)
    Report {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Browse the report in the terminal UI
    Ui,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the terminal UI quiet unless RUST_LOG says otherwise
    let default_filter = match cli.command {
        Some(Commands::Ui) => "warn",
        _ => "info",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = resolve_config(&cli)?;
    let report = run_analysis(&config)?;

    match cli.command {
        Some(Commands::Ui) => run_ui_mode(report)?,
        Some(Commands::Report { json: true }) => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Some(Commands::Report { json: false }) | None => {
            print!("{}", render_text(&report));
        }
    }

    Ok(())
}

/// Config file first, then command-line overrides
fn resolve_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if let Some(input) = &cli.input {
        config.input = input.clone();
    }
    if let Some(start) = cli.start_year {
        config.start_year = start;
    }
    if let Some(end) = cli.end_year {
        config.end_year = end;
    }
    if let Some(k) = cli.top {
        config.top_k = k;
    }
    if cli.lenient {
        config.strict_parsing = false;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisReport> {
    let ledger = load_ledger(&config.input, config.strict_parsing)
        .with_context(|| format!("Could not read input file \"{}\"", config.input.display()))?;

    let report = analyze(&ledger, config).context("Analysis failed")?;
    info!(fingerprint = %report.fingerprint, "{}", report.summary());

    Ok(report)
}

#[cfg(feature = "tui")]
fn run_ui_mode(report: AnalysisReport) -> Result<()> {
    let mut app = ui::App::new(report);
    ui::run_ui(&mut app)?;
    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_report: AnalysisReport) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the JSON API: cargo run --bin forecast-server --features server");
    std::process::exit(1);
}

use std::fs::{self, OpenOptions};
use std::process::ExitCode;
use std::sync::Mutex;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use agilent_sorter::app::{App, RunOptions};
use agilent_sorter::config::{ConfigLoader, ConfigOverrides};
use agilent_sorter::error::SorterError;
use agilent_sorter::output::{HumanOutput, JsonOutput, OutputMode, TracingSink};

#[derive(Parser)]
#[command(name = "agilent-sorter")]
#[command(about = "Copy finished Agilent .d runs into per-researcher folders named after the sample")]
#[command(version, author)]
struct Cli {
    /// Config file (default: agilent-sorter.toml in the current directory)
    #[arg(long)]
    config: Option<String>,

    #[arg(long)]
    source: Option<Utf8PathBuf>,

    #[arg(long)]
    destination: Option<Utf8PathBuf>,

    /// Maximum directory depth below the source root
    #[arg(long)]
    depth: Option<usize>,

    #[arg(long)]
    ledger: Option<Utf8PathBuf>,

    #[arg(long)]
    log_file: Option<Utf8PathBuf>,

    /// Show where runs would go without copying or touching the ledger
    #[arg(long)]
    dry_run: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<SorterError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SorterError) -> u8 {
    match error {
        SorterError::MissingConfig
        | SorterError::ConfigRead(_)
        | SorterError::ConfigParse(_)
        | SorterError::InvalidConfig { .. } => 2,
        SorterError::SourceNotFound(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let mut config = ConfigLoader::resolve(cli.config.as_deref())?;
    config.apply(ConfigOverrides {
        source: cli.source,
        destination: cli.destination,
        search_depth: cli.depth,
        ledger_path: cli.ledger,
        log_path: cli.log_file,
    });

    init_logging(&config.log_path)?;

    let options = RunOptions {
        dry_run: cli.dry_run,
    };
    let app = App::from_config(config);
    let mut ledger = app.open_ledger(options, &TracingSink)?;
    let result = app.run(&mut ledger, options, &TracingSink)?;

    match output_mode {
        OutputMode::Json => JsonOutput::print_run(&result).into_diagnostic()?,
        OutputMode::Human => HumanOutput::print_run(&result).into_diagnostic()?,
    }
    Ok(())
}

fn init_logging(log_path: &Utf8Path) -> miette::Result<()> {
    if let Some(parent) = log_path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent.as_std_path()).into_diagnostic()?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path.as_std_path())
        .into_diagnostic()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_timer(ChronoLocal::rfc_3339())
                .with_writer(std::io::stderr),
        )
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_timer(ChronoLocal::rfc_3339())
                .with_writer(Mutex::new(log_file)),
        )
        .init();
    Ok(())
}

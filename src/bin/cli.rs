//! statpipe CLI
//!
//! Local execution entry point for the domain pipelines.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use statpipe::{
    error::{AppError, Result},
    models::{Config, DomainConfig, PeriodWindow},
    pipeline::{self, RunOptions},
    services::{IndicatorClient, WorldBankSource},
    storage::LocalStore,
    transform::IndicatorDomain,
};

/// statpipe - Public Statistics Pipelines
#[derive(Parser, Debug)]
#[command(
    name = "statpipe",
    version,
    about = "Fetch, validate and publish public statistics as static JSON"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "statpipe.toml", global = true)]
    config: PathBuf,

    /// Override the output directory from the configuration
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run domain pipelines: fetch → transform → validate → publish
    Run {
        /// Domain to run (repeatable); all configured domains when omitted
        #[arg(short, long = "domain")]
        domains: Vec<String>,

        /// Run every check but write nothing
        #[arg(long)]
        dry_run: bool,
    },

    /// Fetch one indicator and print its series as JSON
    Fetch {
        /// Remote indicator code, e.g. SP.POP.TOTL
        code: String,

        #[arg(long, default_value_t = 2000)]
        start: i32,

        #[arg(long, default_value_t = 2025)]
        end: i32,

        /// Decimal places to keep
        #[arg(long, default_value_t = 2)]
        precision: u32,
    },

    /// Validate and cross-check published union-budget files
    Check {
        /// Budget year label
        #[arg(long, default_value = "2025-26")]
        year: String,
    },

    /// Validate configuration file
    Validate,

    /// List configured domains and their indicator keys
    List,
}

/// Initialize logging based on verbosity flag and configured level.
fn init_logging(verbose: bool, level: &str) {
    let level = if verbose { "debug" } else { level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn select_domains<'a>(config: &'a Config, names: &[String]) -> Result<Vec<&'a DomainConfig>> {
    if names.is_empty() {
        return Ok(config.domains.iter().collect());
    }
    names
        .iter()
        .map(|name| {
            config
                .domain(name)
                .ok_or_else(|| AppError::config(format!("unknown domain '{name}'")))
        })
        .collect()
}

fn create_client(config: &Config) -> Result<IndicatorClient> {
    let source = WorldBankSource::new(&config.fetch)?;
    Ok(IndicatorClient::from_config(Arc::new(source), &config.fetch))
}

/// Main entry point for the CLI application.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = Config::load(&cli.config)
        .map(|c| c.logging.level)
        .unwrap_or_else(|_| "info".into());
    init_logging(cli.verbose, &level);

    let mut config = Config::load_or_default(&cli.config);
    if let Some(output) = &cli.output {
        config.paths.output_dir = output.display().to_string();
    }

    log::debug!("Loaded configuration from {}", cli.config.display());

    match cli.command {
        Command::Run { domains, dry_run } => {
            config.validate()?;
            let selected = select_domains(&config, &domains)?;

            let client = create_client(&config)?;
            let store = LocalStore::new(&config.paths.output_dir);
            let options = RunOptions { dry_run };

            let mut failed = Vec::new();
            for domain_config in selected {
                let domain = IndicatorDomain::new(domain_config.clone(), config.fetch.rounding)?;
                if let Err(e) = pipeline::run_domain(&domain, &client, &store, &options).await {
                    log::error!("{}: {}", domain_config.name, e);
                    failed.push(domain_config.name.clone());
                }
            }

            if !failed.is_empty() {
                return Err(AppError::validation(format!(
                    "{} domain(s) failed: {}",
                    failed.len(),
                    failed.join(", ")
                )));
            }
        }

        Command::Fetch {
            code,
            start,
            end,
            precision,
        } => {
            let window = PeriodWindow::new(start, end)?;
            let client = create_client(&config)?;
            let fetch = client.fetch_indicator(&code, window, precision).await;

            if let Some(failure) = fetch.failure() {
                log::warn!("{code}: {failure}");
            }
            println!("{}", serde_json::to_string_pretty(fetch.series())?);
        }

        Command::Check { year } => {
            let store = LocalStore::new(&config.paths.output_dir);
            pipeline::run_budget_check(&store, &year).await?;
        }

        Command::Validate => {
            pipeline::run_validate(&config)?;
            log::info!("All validations passed!");
        }

        Command::List => {
            for domain in &config.domains {
                let requested = if domain.keys.is_empty() {
                    "all".to_string()
                } else {
                    domain.keys.len().to_string()
                };
                log::info!(
                    "{} ({}, {}–{}, requested: {})",
                    domain.name,
                    domain.year_label,
                    domain.start_year,
                    domain.end_year,
                    requested
                );
                for (key, code) in &domain.indicators {
                    log::info!("    {key:<24} {code}");
                }
            }
        }
    }

    Ok(())
}

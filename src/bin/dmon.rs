//! dmon CLI - exchange rate cache management and conversions
//!
//! ## Example Usage
//!
//! ```bash
//! # Create the cache table
//! dmon create-table
//!
//! # Copy every snapshot from the rates repository into the cache
//! dmon import
//!
//! # Show the rates for a date, or a single currency
//! dmon rate --on 2022-07-14
//! dmon rate --on 2022-07-14 --currency EUR
//!
//! # Pre-fetch a range of dates
//! dmon fetch 2022-01-01:2022-01-31
//!
//! # Convert an amount
//! dmon convert 40 EUR --to USD --on 2022-07-14
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dated_money::config::RatesConfig;
use dated_money::rates::prefetch::{day_count, parse_range, prefetch_range, FailurePolicy};
use dated_money::rates::{parse_date, today, RateSource};
use dated_money::{Currency, FactoryConfig, MoneyFactory};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// dmon: dated money and exchange rate cache
#[derive(Parser)]
#[command(name = "dmon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Exchange rate cache management and dated currency conversion", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the rates table in the cache database
    CreateTable,

    /// Import every snapshot from the rates repository into the cache
    Import,

    /// Show exchange rates for a date
    Rate {
        /// Date (YYYY-MM-DD), today if omitted
        #[arg(long)]
        on: Option<String>,

        /// Only show this currency (code or symbol)
        #[arg(long)]
        currency: Option<String>,
    },

    /// Fetch and cache the rates for every day in FROM:TO
    Fetch {
        /// Inclusive range, e.g. 2022-01-01:2022-01-31
        #[arg(value_name = "FROM:TO")]
        range: String,

        /// Keep going when a day fails instead of stopping
        #[arg(long)]
        keep_going: bool,

        /// Pause between days in milliseconds (overrides the config)
        #[arg(long)]
        delay_ms: Option<u64>,
    },

    /// Convert an amount between currencies
    Convert {
        /// Amount, e.g. 12.34 or 1234c for minor units
        amount: String,

        /// Currency of the amount (code or symbol)
        currency: String,

        /// Target currency
        #[arg(long)]
        to: String,

        /// Date of the rates to use (YYYY-MM-DD), today if omitted
        #[arg(long)]
        on: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = RatesConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if cli.verbose {
        println!("  {} {}", "Cache:".bold(), config.cache_path().display());
        if let Some(repo) = &config.repo_dir {
            println!("  {} {}", "Repository:".bold(), repo.display());
        }
    }

    match cli.command {
        Commands::CreateTable => create_table(&config),
        Commands::Import => import(&config),
        Commands::Rate { on, currency } => show_rates(&config, on.as_deref(), currency.as_deref()),
        Commands::Fetch {
            range,
            keep_going,
            delay_ms,
        } => fetch(&config, &range, keep_going, delay_ms),
        Commands::Convert {
            amount,
            currency,
            to,
            on,
        } => convert(&config, &amount, &currency, &to, on.as_deref()),
    }
}

fn date_or_today(on: Option<&str>) -> Result<chrono::NaiveDate> {
    Ok(match on {
        Some(text) => parse_date(text)?,
        None => today(),
    })
}

fn create_table(config: &RatesConfig) -> Result<()> {
    config.open_store()?;
    println!(
        "{} Rate table ready in {}",
        "✓".green().bold(),
        config.cache_path().display()
    );
    Ok(())
}

fn import(config: &RatesConfig) -> Result<()> {
    if config.repo_dir.is_none() {
        bail!("no rates repository configured (set DMON_RATES_REPO or repo_dir)");
    }
    let source = config.build_source()?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Importing snapshots...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    let imported = source.import_snapshots();
    spinner.finish_and_clear();

    println!(
        "{} Imported {} snapshots into {}",
        "✓".green().bold(),
        imported?,
        config.cache_path().display()
    );
    Ok(())
}

fn show_rates(config: &RatesConfig, on: Option<&str>, currency: Option<&str>) -> Result<()> {
    let date = date_or_today(on)?;
    let source = config.build_source()?;

    match currency {
        Some(token) => {
            let currency = Currency::parse(token)?;
            match source.get_rate(date, currency)? {
                Some(rate) => println!("{} {} {}", date, currency.code().bold(), rate),
                None => bail!("no {} rate stored for {}", currency, date),
            }
        }
        None => {
            let (table, tier) = source.resolve(date)?;
            println!(
                "{}",
                format!("Rates for {} against {} ({})", date, table.base(), tier)
                    .cyan()
                    .bold()
            );
            for (currency, rate) in table.iter() {
                println!("  {:<4} {:>6} {}", currency.code(), currency.symbol(), rate);
            }
        }
    }
    Ok(())
}

fn fetch(config: &RatesConfig, range: &str, keep_going: bool, delay_ms: Option<u64>) -> Result<()> {
    let (from, to) = parse_range(range)?;
    let mut options = config.prefetch_options();
    if let Some(ms) = delay_ms {
        options.delay = std::time::Duration::from_millis(ms);
    }
    if keep_going {
        options.policy = FailurePolicy::Continue;
    }
    let source = config.build_source()?;

    println!(
        "{}",
        format!("Fetching rates from {} to {}", from, to).cyan().bold()
    );

    let pb = ProgressBar::new(day_count(from, to) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓▒░ "),
    );

    let result = prefetch_range(&source, from, to, &options, None, |date, err| {
        match err {
            Some(e) => pb.println(format!("  {} {}: {}", "✗".red(), date, e)),
            None => pb.set_message(date.to_string()),
        }
        pb.inc(1);
    });
    pb.finish_and_clear();
    let report = result?;

    println!("{}", "Fetch Summary".green().bold());
    println!("{}", "=============".green());
    println!("  {} {}", "Fetched:".bold(), report.fetched.len());
    println!("  {} {}", "Failed:".bold(), report.failed.len());
    for (date, e) in &report.failed {
        println!("    {} {}", date, e.to_string().dimmed());
    }
    Ok(())
}

fn convert(
    config: &RatesConfig,
    amount: &str,
    currency: &str,
    to: &str,
    on: Option<&str>,
) -> Result<()> {
    let date = date_or_today(on)?;
    let target = Currency::parse(to)?;
    let source: Arc<dyn RateSource> = Arc::new(config.build_source()?);

    let money = MoneyFactory::create(FactoryConfig::new(target).on(date), source);
    let value = money.from_parts(amount, Some(currency), None)?;
    let converted = value.convert_to(target)?;

    println!(
        "{} = {} ({})",
        value.format()?,
        converted.format()?.green().bold(),
        date
    );
    Ok(())
}

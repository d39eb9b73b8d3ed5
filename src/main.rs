// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

mod api;
mod config;
mod currencies;
mod error;
mod exchange_rates;
mod health;
mod historical_rates;
mod models;
mod settings;
mod utils;
mod viz;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use crate::currencies::{published_in, RateService};
use crate::error::{ErrorKind, RateError};
use crate::models::{missing_dates, ConversionRequest};
use crate::settings::{LastConversion, LAST_CONVERSION_FILE, SETTINGS_FILE};

#[derive(Parser)]
#[command(name = "cbr-converter", about = "Currency conversion at Central Bank of Russia rates")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check network access and the rate feed
    Status,
    /// Show each connectivity probe attempt
    Probe,
    /// Convert an amount between two currencies
    Convert {
        /// Amount to convert; defaults to the saved amount
        amount: Option<String>,
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        /// Rate date (YYYY-MM-DD); today's table when omitted
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print the rate table
    Rates {
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Also export the table to output/
        #[arg(long)]
        csv: bool,
    },
    /// Chart the rate over the last days
    Chart {
        #[arg(long)]
        from: Option<String>,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        days: Option<usize>,
        /// Most recent date of the window; today when omitted
        #[arg(long)]
        end: Option<NaiveDate>,
        #[arg(long, default_value = "output/rate_chart.svg")]
        output: PathBuf,
    },
    /// List supported currencies
    Currencies {
        /// Check which ones the feed publishes on this date
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Step the saved amount up or down
    Adjust {
        #[arg(long, default_value_t = 10.0, allow_hyphen_values = true)]
        by: f64,
    },
    /// Swap the saved source and target currencies
    Swap,
    /// Configuration file helpers
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the current configuration to the config file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = config::load_config().context("Failed to load configuration")?;

    match cli.command {
        Command::Status => show_status(&config).await?,
        Command::Probe => show_probe(&config).await?,
        Command::Convert {
            amount,
            from,
            to,
            date,
        } => convert(&config, amount, from, to, date)
            .await
            .or_else(report_rate_error)?,
        Command::Rates { date, csv } => show_rates(&config, date, csv).await?,
        Command::Chart {
            from,
            to,
            days,
            end,
            output,
        } => chart(&config, from, to, days, end, output)
            .await
            .or_else(report_rate_error)?,
        Command::Currencies { date } => list_currencies(&config, date).await?,
        Command::Adjust { by } => adjust_amount(by)?,
        Command::Swap => swap_currencies()?,
        Command::Config {
            action: ConfigAction::Init,
        } => {
            let path = config::default_config_path();
            config::save_config(&config, &path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("✅ Configuration written to {}", path.display());
        }
    }

    Ok(())
}

/// Message for a failed conversion. Input problems are shown as they are; feed
/// and network failures get an error prefix.
fn rate_error_message(err: &RateError) -> String {
    match err.kind() {
        ErrorKind::Validation => err.to_string(),
        ErrorKind::Transport => format!("❌ Error: {}", err),
        ErrorKind::Parse => format!("❌ Error: the rate feed sent an unreadable answer ({})", err),
        ErrorKind::Data => format!("❌ Error: {}", err),
    }
}

/// Print core errors for the user and exit non-zero; other errors pass through.
fn report_rate_error(err: anyhow::Error) -> Result<()> {
    match err.downcast_ref::<RateError>() {
        Some(rate_err) => {
            eprintln!("{}", rate_error_message(rate_err));
            std::process::exit(1);
        }
        None => Err(err),
    }
}

async fn show_status(config: &config::Config) -> Result<()> {
    let service = RateService::from_config(config)?;
    let status = service.check_health().await;
    println!("{}", status);
    if !status.is_available() {
        println!("Conversions may fail until the feed is reachable");
    }

    if let Some(last) = settings::load_last_conversion(&PathBuf::from(LAST_CONVERSION_FILE))? {
        println!(
            "Last conversion: {} {} = {} {}",
            utils::format_amount(last.amount),
            last.from_code,
            utils::format_amount(last.converted_amount),
            last.to_code
        );
    }
    Ok(())
}

async fn show_probe(config: &config::Config) -> Result<()> {
    let service = RateService::from_config(config)?;
    let attempts = service.probe_attempts().await;
    if attempts.is_empty() {
        println!("No probe targets configured");
        return Ok(());
    }
    for attempt in &attempts {
        let mark = if attempt.success { "✅" } else { "❌" };
        let scheme = if attempt.target.uses_tls() { "tls" } else { "tcp" };
        println!(
            "{} {}:{} ({}) {}ms{}",
            mark,
            attempt.target.host,
            attempt.target.port,
            scheme,
            attempt.elapsed.as_millis(),
            attempt
                .error
                .as_ref()
                .map(|e| format!(" - {}", e))
                .unwrap_or_default()
        );
    }
    let online = attempts.last().map(|a| a.success).unwrap_or(false);
    println!("Network: {}", if online { "online" } else { "offline" });
    Ok(())
}

async fn convert(
    config: &config::Config,
    amount: Option<String>,
    from: Option<String>,
    to: Option<String>,
    date: Option<NaiveDate>,
) -> Result<()> {
    let state_path = PathBuf::from(SETTINGS_FILE);
    let state = settings::load_state(&state_path)?;

    let text = amount
        .or_else(|| state.amount.map(|a| a.to_string()))
        .unwrap_or_default();
    let amount = utils::parse_amount(&text)?;
    let request = ConversionRequest::new(
        from.as_deref().unwrap_or(&state.from_code),
        to.as_deref().unwrap_or(&state.to_code),
        amount,
        date,
    );

    let service = RateService::from_config(config)?;
    let result = service.convert(&request).await?;

    println!(
        "{} {} = {} {}",
        utils::format_amount(request.amount),
        request.from_code,
        utils::format_amount(result.converted_amount),
        request.to_code
    );
    println!("Rate: {}", result.rate);

    settings::save_state(
        &state_path,
        &settings::PersistedState {
            from_code: request.from_code.clone(),
            to_code: request.to_code.clone(),
            amount: Some(request.amount),
        },
    )?;
    settings::save_last_conversion(
        &PathBuf::from(LAST_CONVERSION_FILE),
        &LastConversion {
            from_code: request.from_code,
            to_code: request.to_code,
            amount: request.amount,
            rate: result.rate,
            converted_amount: result.converted_amount,
            as_of: request.as_of.or_else(|| Some(Local::now().date_naive())),
        },
    )?;
    Ok(())
}

async fn show_rates(config: &config::Config, date: Option<NaiveDate>, csv: bool) -> Result<()> {
    let service = RateService::from_config(config)?;
    let table = service
        .fetch_table(date)
        .await
        .context("Failed to fetch the rate table")?;

    match table.published() {
        Some(published) => println!(
            "{} rates published {}",
            table.len(),
            published.format("%d.%m.%Y")
        ),
        None => println!("{} rates", table.len()),
    }
    for (code, factor) in table.iter() {
        println!("{:<4} {:>14.4} RUB", code, 1.0 / factor);
    }

    if csv {
        exchange_rates::export_rates_csv(&table, date, &PathBuf::from("output"))?;
    }
    Ok(())
}

async fn chart(
    config: &config::Config,
    from: Option<String>,
    to: Option<String>,
    days: Option<usize>,
    end: Option<NaiveDate>,
    output: PathBuf,
) -> Result<()> {
    let state = settings::load_state(&PathBuf::from(SETTINGS_FILE))?;
    let request = ConversionRequest::new(
        from.as_deref().unwrap_or(&state.from_code),
        to.as_deref().unwrap_or(&state.to_code),
        1.0,
        None,
    );
    request.validate()?;

    let end = end.unwrap_or_else(|| Local::now().date_naive());
    let dates = utils::trailing_dates(end, days.unwrap_or(config.history_days));
    let service = RateService::from_config(config)?;
    if !service.probe().await {
        eprintln!("⚠️  No network path, expect every date to be missing");
    }

    let progress = ProgressBar::new_spinner();
    progress.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    progress.set_message(format!(
        "Fetching {} days of {} → {} rates",
        dates.len(),
        request.from_code,
        request.to_code
    ));
    progress.enable_steady_tick(Duration::from_millis(120));
    let series = service
        .build_series(&request.from_code, &request.to_code, &dates)
        .await;
    progress.finish_and_clear();

    for point in &series {
        match point.rate {
            Some(rate) => println!("{}  {:.4}", point.date.format("%d.%m.%Y"), rate),
            None => println!("{}  -", point.date.format("%d.%m.%Y")),
        }
    }

    let missing = missing_dates(&series);
    if !missing.is_empty() {
        let listed: Vec<String> = missing
            .iter()
            .map(|d| d.format("%d.%m.%Y").to_string())
            .collect();
        eprintln!("⚠️  No rate for: {}", listed.join(", "));
    }

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    viz::create_rate_chart(&series, &request.from_code, &request.to_code, &output)?;
    println!("✅ Generated rate chart at {}", output.display());
    Ok(())
}

async fn list_currencies(config: &config::Config, date: Option<NaiveDate>) -> Result<()> {
    let Some(date) = date else {
        for code in &config.currencies {
            println!("{}", code);
        }
        return Ok(());
    };

    let service = RateService::from_config(config)?;
    let table = service
        .fetch_table(Some(date))
        .await
        .with_context(|| format!("Failed to fetch rates for {}", date))?;
    for (code, published) in published_in(&table, &config.currencies) {
        println!("{} {}", if published { "✅" } else { "❌" }, code);
    }
    Ok(())
}

fn adjust_amount(step: f64) -> Result<()> {
    let path = PathBuf::from(SETTINGS_FILE);
    let mut state = settings::load_state(&path)?;
    let amount = utils::step_amount(state.amount.unwrap_or(0.0), step)?;
    state.amount = Some(amount);
    settings::save_state(&path, &state)?;
    println!("Amount: {}", utils::format_amount(amount));
    Ok(())
}

fn swap_currencies() -> Result<()> {
    let path = PathBuf::from(SETTINGS_FILE);
    let mut state = settings::load_state(&path)?;
    let swapped =
        ConversionRequest::new(&state.from_code, &state.to_code, state.amount.unwrap_or(0.0), None)
            .swapped();
    state.from_code = swapped.from_code;
    state.to_code = swapped.to_code;
    settings::save_state(&path, &state)?;
    println!("{} → {}", state.from_code, state.to_code);
    Ok(())
}

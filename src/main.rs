//! Five-Digit Lottery Draw Engine
//!
//! Runs the minute-period draw cycle with payout-exposure control.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use lotto5_engine::{
    config::{AppConfig, ConfigHandle},
    odds::{OddsCache, OddsSource},
    rng::NumberGenerator,
    scheduler::PeriodScheduler,
    store::{DrawStore, SqliteStore},
    types::{format_digits, parse_digits},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lotto5-engine")]
#[command(about = "Five-digit lottery draw-cycle engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the period scheduler
    Run,
    /// Force a draw for a period, optionally with explicit digits
    Draw {
        /// Period id (YYYYMMDDHHMM)
        period_id: String,
        /// Explicit 5-digit outcome, e.g. 38217
        #[arg(long)]
        digits: Option<String>,
    },
    /// Show the latest draws
    Status {
        /// Number of draws to show
        #[arg(short, long, default_value = "5")]
        limit: u32,
    },
    /// Show the current odds table
    Odds,
    /// Show draw history for a date
    History {
        /// UTC date, e.g. 2025-01-01
        date: NaiveDate,
        /// Page number (0-based)
        #[arg(short, long, default_value = "0")]
        page: u32,
        /// Draws per page
        #[arg(long, default_value = "20")]
        page_size: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let app_config = AppConfig::load(&cli.config)?;
    let config = ConfigHandle::new(&cli.config, &app_config);

    let store = Arc::new(SqliteStore::connect(&app_config.database.url).await?);
    let odds = Arc::new(OddsCache::new(
        store.clone() as Arc<dyn OddsSource>,
        Duration::from_secs(app_config.odds.ttl_secs),
    ));
    let generator = Arc::new(NumberGenerator::from_os());
    let scheduler = Arc::new(PeriodScheduler::new(
        config,
        generator,
        store.clone(),
        store.clone(),
        odds.clone(),
    ));

    match cli.command {
        Commands::Run => {
            let runner = {
                let scheduler = scheduler.clone();
                tokio::spawn(async move { scheduler.run().await })
            };
            tokio::signal::ctrl_c().await?;
            tracing::info!("shutdown requested");
            scheduler.stop();
            runner.await?;
        }
        Commands::Draw { period_id, digits } => {
            let digits = digits.as_deref().map(parse_digits).transpose()?;
            let draw = scheduler.force_draw(&period_id, digits).await?;
            println!(
                "period {} drawn: {} (sum {}, {:?}, bull {:?}, poker {:?})",
                draw.period_id,
                format_digits(&draw.digits),
                draw.profile.sum,
                draw.profile.dragon_tiger,
                draw.profile.bull,
                draw.profile.poker,
            );
        }
        Commands::Status { limit } => {
            let draws = store.latest_draws(limit).await?;
            if draws.is_empty() {
                println!("no draws yet");
            }
            for draw in draws {
                println!(
                    "{}  {}  sum={:<2} {:?}",
                    draw.period_id,
                    format_digits(&draw.digits),
                    draw.profile.sum,
                    draw.profile.dragon_tiger,
                );
            }
        }
        Commands::Odds => {
            odds.refresh().await?;
            let table = odds.snapshot();
            let mut rows: Vec<_> = table.iter().collect();
            rows.sort_by_key(|((game_type, bet_type), _)| (game_type.as_str(), bet_type.clone()));
            for ((game_type, bet_type), multiplier) in rows {
                println!("{game_type:<14} {bet_type:<16} {multiplier}");
            }
        }
        Commands::History {
            date,
            page,
            page_size,
        } => {
            for draw in store.draw_history(date, page, page_size).await? {
                println!(
                    "{}  {}  drawn at {}",
                    draw.period_id,
                    format_digits(&draw.digits),
                    draw.drawn_at.format("%H:%M:%S"),
                );
            }
        }
    }

    Ok(())
}

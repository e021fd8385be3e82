use chrono::Utc;
use clap::Parser;
use newsedge::cli::commands::{resolve_since, Cli, Commands};
use newsedge::domain::entities::market::Market;
use newsedge::domain::entities::signal::Signal;
use newsedge::domain::ports::trade_repository::TradeFilter;
use newsedge::{prices_from_markets, NewsEdge};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let _ = dotenvy::dotenv();
    let db_path = std::env::var("NEWSEDGE_DB").unwrap_or_else(|_| "./newsedge.db".into());

    let engine = match NewsEdge::new(&db_path) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error initializing newsedge: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_command(engine, cli.command).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_command(engine: NewsEdge, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Match {
            signals,
            markets,
            trade,
        } => {
            let signals: Vec<Signal> = read_json(&signals)?;
            let markets: Vec<Market> = read_json(&markets)?;
            if trade {
                print_json(&engine.run_pipeline(&signals, &markets).await?)?;
            } else {
                print_json(&engine.run_matching(&signals, &markets).await?)?;
            }
        }
        Commands::Entries { markets } => {
            let markets: Vec<Market> = read_json(&markets)?;
            print_json(&engine.open_pending(&markets, Utc::now()).await?)?;
        }
        Commands::Check { prices, markets } => {
            let prices: HashMap<String, f64> = match (prices, markets) {
                (Some(path), _) => read_json(&path)?,
                (None, Some(path)) => prices_from_markets(&read_json::<Vec<Market>>(&path)?),
                (None, None) => return Err("either --prices or --markets is required".into()),
            };
            print_json(&engine.run_trade_checks(&prices, Utc::now()).await?)?;
        }
        Commands::Matches { limit, since, last } => {
            let since = resolve_since(&since, &last)?;
            print_json(&engine.list_matches(since, Some(limit))?)?;
        }
        Commands::Trades {
            limit,
            open,
            closed,
            market,
            since,
            last,
        } => {
            let filter = TradeFilter {
                limit: Some(limit),
                since: resolve_since(&since, &last)?,
                market_id: market,
                closed: match (open, closed) {
                    (true, _) => Some(false),
                    (_, true) => Some(true),
                    _ => None,
                },
            };
            print_json(&engine.list_trades(&filter)?)?;
        }
        Commands::Skipped { limit } => {
            print_json(&engine.list_skipped(Some(limit))?)?;
        }
        Commands::Evaluations { limit } => {
            print_json(&engine.list_evaluations(Some(limit))?)?;
        }
        Commands::Stats => {
            print_json(&engine.trade_stats()?)?;
        }
        Commands::Config => {
            print_json(engine.config())?;
        }
    }
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path).map_err(|e| format!("cannot read {path}: {e}"))?;
    let value = serde_json::from_str(&raw).map_err(|e| format!("invalid JSON in {path}: {e}"))?;
    Ok(value)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "newsedge", about = "Match news signals to prediction markets and paper trade them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a matching pass over a signal batch and a market snapshot
    Match {
        /// JSON file with an array of signals
        #[arg(long)]
        signals: String,
        /// JSON file with an array of markets
        #[arg(long)]
        markets: String,
        /// Also open paper trades for pending matches
        #[arg(long)]
        trade: bool,
    },
    /// Open paper trades for matches inside the entry window
    Entries {
        /// JSON file with an array of markets (order books and midpoints)
        #[arg(long)]
        markets: String,
    },
    /// Check open trades against current prices
    Check {
        /// JSON file with an object of market id to price
        #[arg(long, conflicts_with = "markets", required_unless_present = "markets")]
        prices: Option<String>,
        /// JSON file with an array of markets; midpoints are used as prices
        #[arg(long)]
        markets: Option<String>,
    },
    /// List stored matches
    Matches {
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Start of date range (ISO-8601)
        #[arg(long, conflicts_with = "last")]
        since: Option<String>,
        /// Relative time window (e.g. 24h, 7d, 30m)
        #[arg(long)]
        last: Option<String>,
    },
    /// List paper trades
    Trades {
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Only open trades
        #[arg(long, conflicts_with = "closed")]
        open: bool,
        /// Only closed trades
        #[arg(long)]
        closed: bool,
        #[arg(long)]
        market: Option<String>,
        /// Start of date range (ISO-8601)
        #[arg(long, conflicts_with = "last")]
        since: Option<String>,
        /// Relative time window (e.g. 24h, 7d, 30m)
        #[arg(long)]
        last: Option<String>,
    },
    /// List entries skipped for lack of liquidity
    Skipped {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// List evaluated signal/market pairs
    Evaluations {
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Show trade statistics
    Stats,
    /// Print the effective configuration
    Config,
}

/// Resolve `--since` / `--last` into a lower time bound.
pub fn resolve_since(since: &Option<String>, last: &Option<String>) -> Result<Option<DateTime<Utc>>, String> {
    if let Some(window) = last {
        let d = parse_relative(window)?;
        return Ok(Some(Utc::now() - d));
    }
    parse_date(since)
}

pub fn parse_date(s: &Option<String>) -> Result<Option<DateTime<Utc>>, String> {
    let Some(s) = s else {
        return Ok(None);
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    if let Some(dt) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(Some(DateTime::from_naive_utc_and_offset(dt, Utc)));
    }
    Err(format!("Invalid date format: {s}. Use YYYY-MM-DD or RFC3339"))
}

/// Parse windows such as `30m`, `24h` or `7d`.
pub fn parse_relative(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    let unit = s.chars().last().ok_or("Empty window. Use e.g. 30m, 24h, 7d")?;
    let num = &s[..s.len() - unit.len_utf8()];
    let n: i64 = num
        .parse()
        .map_err(|_| format!("Invalid window: {s}. Use e.g. 30m, 24h, 7d"))?;
    match unit {
        'm' => Ok(Duration::minutes(n)),
        'h' => Ok(Duration::hours(n)),
        'd' => Ok(Duration::days(n)),
        _ => Err(format!("Invalid window unit in {s}. Use m, h or d")),
    }
}

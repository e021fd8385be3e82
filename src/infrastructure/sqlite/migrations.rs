use crate::domain::error::DomainError;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<(), DomainError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS matches (
            id TEXT PRIMARY KEY,
            signal_id TEXT NOT NULL,
            market_id TEXT NOT NULL,
            similarity REAL NOT NULL,
            relevant INTEGER NOT NULL,
            direction TEXT NOT NULL,
            confidence REAL NOT NULL,
            reasoning TEXT,
            headline TEXT NOT NULL,
            market_question TEXT NOT NULL,
            matched_at TEXT NOT NULL,
            UNIQUE (signal_id, market_id)
        );

        CREATE TABLE IF NOT EXISTS evaluated_pairs (
            signal_id TEXT NOT NULL,
            market_id TEXT NOT NULL,
            outcome TEXT NOT NULL,
            reason TEXT,
            similarity REAL NOT NULL,
            evaluated_at TEXT NOT NULL,
            PRIMARY KEY (signal_id, market_id)
        );

        CREATE TABLE IF NOT EXISTS trades (
            id TEXT PRIMARY KEY,
            market_id TEXT NOT NULL,
            match_id TEXT NOT NULL UNIQUE,
            side TEXT NOT NULL,
            entry_price REAL NOT NULL,
            entry_time TEXT NOT NULL,
            notional REAL NOT NULL,
            shares REAL NOT NULL,
            status TEXT NOT NULL,
            close_time TEXT,
            close_reason TEXT,
            exit_price REAL,
            realized_pnl REAL
        );

        CREATE TABLE IF NOT EXISTS skipped_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            match_id TEXT NOT NULL,
            market_id TEXT NOT NULL,
            reason TEXT NOT NULL,
            skipped_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS vectors (
            id TEXT PRIMARY KEY,
            vector BLOB NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_trades_one_open_per_market
            ON trades(market_id) WHERE status = 'open';
        CREATE INDEX IF NOT EXISTS idx_trades_entry_time ON trades(entry_time);
        CREATE INDEX IF NOT EXISTS idx_matches_matched_at ON matches(matched_at);
        CREATE INDEX IF NOT EXISTS idx_skipped_match ON skipped_entries(match_id);
        "
    ).map_err(|e| DomainError::Persistence(format!("Migration failed: {e}")))
}

use crate::domain::entities::skipped_entry::SkippedEntry;
use crate::domain::entities::trade::Trade;
use crate::domain::error::DomainError;
use crate::domain::ports::trade_repository::*;
use crate::infrastructure::sqlite::{column_enum, column_time};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::sync::Mutex;

const TRADE_COLUMNS: &str = "id, market_id, match_id, side, entry_price, entry_time, notional, shares, status, close_time, close_reason, exit_price, realized_pnl";

pub struct SqliteTradeRepo {
    conn: Mutex<Connection>,
}

impl SqliteTradeRepo {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn row_to_trade(row: &rusqlite::Row) -> Result<Trade, rusqlite::Error> {
        let side: String = row.get(3)?;
        let entry_time: String = row.get(5)?;
        let status: String = row.get(8)?;
        let close_time: Option<String> = row.get(9)?;
        let close_reason: Option<String> = row.get(10)?;

        Ok(Trade {
            id: row.get(0)?,
            market_id: row.get(1)?,
            match_id: row.get(2)?,
            side: column_enum(3, &side)?,
            entry_price: row.get(4)?,
            entry_time: column_time(5, &entry_time)?,
            notional: row.get(6)?,
            shares: row.get(7)?,
            status: column_enum(8, &status)?,
            close_time: close_time.map(|s| column_time(9, &s)).transpose()?,
            close_reason: close_reason.map(|s| column_enum(10, &s)).transpose()?,
            exit_price: row.get(11)?,
            realized_pnl: row.get(12)?,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DomainError> {
        self.conn
            .lock()
            .map_err(|e| DomainError::Persistence(e.to_string()))
    }
}

impl TradeRepository for SqliteTradeRepo {
    fn add_trade(&self, trade: &Trade) -> Result<(), DomainError> {
        let conn = self.lock()?;
        let result = conn.execute(
            &format!("INSERT INTO trades ({TRADE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"),
            params![
                trade.id,
                trade.market_id,
                trade.match_id,
                trade.side.to_string(),
                trade.entry_price,
                trade.entry_time.to_rfc3339(),
                trade.notional,
                trade.shares,
                trade.status.to_string(),
                trade.close_time.map(|dt| dt.to_rfc3339()),
                trade.close_reason.map(|r| r.to_string()),
                trade.exit_price,
                trade.realized_pnl,
            ],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, msg)) if err.code == ErrorCode::ConstraintViolation => {
                let detail = msg.unwrap_or_default();
                if detail.contains("match_id") {
                    Err(DomainError::DuplicateExposure(format!(
                        "match {} already has a trade",
                        trade.match_id
                    )))
                } else {
                    Err(DomainError::DuplicateExposure(format!(
                        "market {} already has an open trade",
                        trade.market_id
                    )))
                }
            }
            Err(e) => Err(DomainError::Persistence(format!("Failed to add trade: {e}"))),
        }
    }

    fn close_trade(&self, trade: &Trade) -> Result<bool, DomainError> {
        if !trade.is_closed() {
            return Err(DomainError::InvalidInput(format!(
                "Trade {} has no terminal state to persist",
                trade.id
            )));
        }
        let conn = self.lock()?;
        let rows = conn
            .execute(
                "UPDATE trades SET status = ?1, close_time = ?2, close_reason = ?3, exit_price = ?4, realized_pnl = ?5
                 WHERE id = ?6 AND status = 'open'",
                params![
                    trade.status.to_string(),
                    trade.close_time.map(|dt| dt.to_rfc3339()),
                    trade.close_reason.map(|r| r.to_string()),
                    trade.exit_price,
                    trade.realized_pnl,
                    trade.id,
                ],
            )
            .map_err(|e| DomainError::Persistence(format!("Failed to close trade: {e}")))?;
        if rows == 1 {
            return Ok(true);
        }

        let exists: bool = conn
            .query_row("SELECT COUNT(*) FROM trades WHERE id = ?1", params![trade.id], |r| {
                r.get::<_, i64>(0)
            })
            .map(|n| n > 0)?;
        if exists {
            Ok(false)
        } else {
            Err(DomainError::NotFound(format!("Trade not found: {}", trade.id)))
        }
    }

    fn list_trades(&self, filter: &TradeFilter) -> Result<Vec<Trade>, DomainError> {
        let conn = self.lock()?;
        let mut sql = format!("SELECT {TRADE_COLUMNS} FROM trades WHERE 1=1");
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(since) = &filter.since {
            sql.push_str(&format!(" AND entry_time >= ?{}", param_values.len() + 1));
            param_values.push(Box::new(since.to_rfc3339()));
        }
        if let Some(market_id) = &filter.market_id {
            sql.push_str(&format!(" AND market_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(market_id.clone()));
        }
        match filter.closed {
            Some(true) => sql.push_str(" AND status != 'open'"),
            Some(false) => sql.push_str(" AND status = 'open'"),
            None => {}
        }
        sql.push_str(" ORDER BY entry_time DESC, id ASC");
        if let Some(limit) = filter.limit {
            sql.push_str(&format!(" LIMIT ?{}", param_values.len() + 1));
            param_values.push(Box::new(limit as i64));
        }

        let params_refs: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&sql)?;
        let trades = stmt
            .query_map(params_refs.as_slice(), Self::row_to_trade)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(trades)
    }

    fn get_trade(&self, id: &str) -> Result<Option<Trade>, DomainError> {
        let conn = self.lock()?;
        let trade = conn
            .query_row(
                &format!("SELECT {TRADE_COLUMNS} FROM trades WHERE id = ?1"),
                params![id],
                Self::row_to_trade,
            )
            .optional()?;
        Ok(trade)
    }

    fn open_trade_for_market(&self, market_id: &str) -> Result<Option<Trade>, DomainError> {
        let conn = self.lock()?;
        let trade = conn
            .query_row(
                &format!("SELECT {TRADE_COLUMNS} FROM trades WHERE market_id = ?1 AND status = 'open'"),
                params![market_id],
                Self::row_to_trade,
            )
            .optional()?;
        Ok(trade)
    }

    fn has_trade_for_match(&self, match_id: &str) -> Result<bool, DomainError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM trades WHERE match_id = ?1",
            params![match_id],
            |r| r.get(0),
        )?;
        Ok(count > 0)
    }

    fn record_skip(&self, skip: &SkippedEntry) -> Result<bool, DomainError> {
        let conn = self.lock()?;
        let written = conn.execute(
            "INSERT INTO skipped_entries (match_id, market_id, reason, skipped_at)
             SELECT ?1, ?2, ?3, ?4
             WHERE COALESCE(
                 (SELECT reason FROM skipped_entries WHERE match_id = ?1 ORDER BY id DESC LIMIT 1),
                 ''
             ) <> ?3",
            params![
                skip.match_id,
                skip.market_id,
                skip.reason.to_string(),
                skip.skipped_at.to_rfc3339(),
            ],
        )
        .map_err(|e| DomainError::Persistence(format!("Failed to record skip: {e}")))?;
        Ok(written > 0)
    }

    fn list_skipped(&self, limit: Option<usize>) -> Result<Vec<SkippedEntry>, DomainError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT match_id, market_id, reason, skipped_at FROM skipped_entries ORDER BY id DESC LIMIT ?1",
        )?;
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let skipped = stmt
            .query_map(params![limit], |row| {
                let reason: String = row.get(2)?;
                let skipped_at: String = row.get(3)?;
                Ok(SkippedEntry {
                    match_id: row.get(0)?,
                    market_id: row.get(1)?,
                    reason: column_enum(2, &reason)?,
                    skipped_at: column_time(3, &skipped_at)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(skipped)
    }
}

use crate::domain::entities::market_match::{Evaluation, EvaluationOutcome, Match};
use crate::domain::error::DomainError;
use crate::domain::ports::match_repository::MatchRepository;
use crate::domain::values::confidence::Confidence;
use crate::infrastructure::sqlite::{column_enum, column_time};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::Mutex;

const MATCH_COLUMNS: &str = "id, signal_id, market_id, similarity, relevant, direction, confidence, reasoning, headline, market_question, matched_at";

pub struct SqliteMatchRepo {
    conn: Mutex<Connection>,
}

impl SqliteMatchRepo {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn row_to_match(row: &rusqlite::Row) -> Result<Match, rusqlite::Error> {
        let direction: String = row.get(5)?;
        let confidence: f64 = row.get(6)?;
        let matched_at: String = row.get(10)?;
        Ok(Match {
            id: row.get(0)?,
            signal_id: row.get(1)?,
            market_id: row.get(2)?,
            similarity: row.get(3)?,
            relevant: row.get(4)?,
            direction: column_enum(5, &direction)?,
            confidence: Confidence::clamped(confidence),
            reasoning: row.get(7)?,
            headline: row.get(8)?,
            market_question: row.get(9)?,
            matched_at: column_time(10, &matched_at)?,
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, DomainError> {
        self.conn
            .lock()
            .map_err(|e| DomainError::Persistence(e.to_string()))
    }
}

impl MatchRepository for SqliteMatchRepo {
    fn record_evaluations(&self, evaluations: &[Evaluation]) -> Result<usize, DomainError> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::Persistence(format!("Failed to begin transaction: {e}")))?;
        let mut inserted = 0;

        for eval in evaluations {
            let rows = tx
                .execute(
                    "INSERT OR IGNORE INTO evaluated_pairs (signal_id, market_id, outcome, reason, similarity, evaluated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        eval.signal_id,
                        eval.market_id,
                        eval.outcome.to_string(),
                        eval.reason,
                        eval.similarity,
                        eval.evaluated_at.to_rfc3339(),
                    ],
                )
                .map_err(|e| DomainError::Persistence(format!("Failed to record evaluation: {e}")))?;
            if rows == 0 {
                continue;
            }
            inserted += 1;

            if let Some(m) = &eval.matched {
                tx.execute(
                    &format!("INSERT OR IGNORE INTO matches ({MATCH_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"),
                    params![
                        m.id,
                        m.signal_id,
                        m.market_id,
                        m.similarity,
                        m.relevant,
                        m.direction.to_string(),
                        m.confidence.value(),
                        m.reasoning,
                        m.headline,
                        m.market_question,
                        m.matched_at.to_rfc3339(),
                    ],
                )
                .map_err(|e| DomainError::Persistence(format!("Failed to record match: {e}")))?;
            }
        }

        tx.commit()
            .map_err(|e| DomainError::Persistence(format!("Failed to commit evaluations: {e}")))?;
        Ok(inserted)
    }

    fn evaluated_pairs(&self) -> Result<Vec<(String, String)>, DomainError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT signal_id, market_id FROM evaluated_pairs")?;
        let pairs = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(pairs)
    }

    fn list_evaluations(&self, limit: Option<usize>) -> Result<Vec<Evaluation>, DomainError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT signal_id, market_id, outcome, reason, similarity, evaluated_at
             FROM evaluated_pairs ORDER BY evaluated_at DESC, signal_id, market_id LIMIT ?1",
        )?;
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let evaluations = stmt
            .query_map(params![limit], |row| {
                let outcome: String = row.get(2)?;
                let evaluated_at: String = row.get(5)?;
                Ok(Evaluation {
                    signal_id: row.get(0)?,
                    market_id: row.get(1)?,
                    outcome: column_enum::<EvaluationOutcome>(2, &outcome)?,
                    reason: row.get(3)?,
                    similarity: row.get(4)?,
                    evaluated_at: column_time(5, &evaluated_at)?,
                    matched: None,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(evaluations)
    }

    fn list_matches(&self, since: Option<DateTime<Utc>>, limit: Option<usize>) -> Result<Vec<Match>, DomainError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MATCH_COLUMNS} FROM matches WHERE matched_at >= ?1
             ORDER BY matched_at DESC, signal_id, market_id LIMIT ?2"
        ))?;
        // RFC 3339 UTC strings sort chronologically.
        let since = since.map(|s| s.to_rfc3339()).unwrap_or_default();
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let matches = stmt
            .query_map(params![since, limit], Self::row_to_match)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(matches)
    }

    fn get_match(&self, id: &str) -> Result<Option<Match>, DomainError> {
        let conn = self.lock()?;
        let m = conn
            .query_row(
                &format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = ?1"),
                params![id],
                Self::row_to_match,
            )
            .optional()?;
        Ok(m)
    }
}

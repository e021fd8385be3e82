use crate::domain::error::DomainError;
use crate::domain::values::entry_pricing::DEFAULT_LIQUIDITY_BAND;
use crate::domain::values::exit_policy::ExitPolicy;
use chrono::Duration;
use serde::Serialize;
use std::str::FromStr;
use std::time::Duration as StdDuration;

/// Timeout and retry budget applied to every external call.
#[derive(Debug, Clone, Serialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub timeout_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_backoff_ms: 500,
            timeout_secs: 30,
        }
    }
}

impl RetryPolicy {
    pub fn timeout(&self) -> StdDuration {
        StdDuration::from_secs(self.timeout_secs)
    }

    /// Exponential backoff before retry number `attempt` (0-based).
    pub fn backoff(&self, attempt: u32) -> StdDuration {
        StdDuration::from_millis(self.base_backoff_ms.saturating_mul(2u64.saturating_pow(attempt)))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EngineConfig {
    /// Minimum cosine similarity before a pair is sent to the assessor.
    pub similarity_threshold: f64,
    /// Minimum assessor confidence for a match.
    pub confidence_threshold: f64,
    /// Candidates retrieved per signal.
    pub top_k: usize,
    /// Relevance calls in flight per matching pass.
    pub assess_concurrency: usize,
    /// Texts per embedding request.
    pub embed_batch_size: usize,
    /// Dollars committed per trade.
    pub notional: f64,
    pub liquidity_band: f64,
    pub exit: ExitPolicy,
    /// How long an untraded match stays eligible for entry.
    #[serde(serialize_with = "serialize_minutes")]
    pub entry_window: Duration,
    pub retry: RetryPolicy,
}

fn serialize_minutes<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(d.num_minutes())
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.65,
            confidence_threshold: 0.6,
            top_k: 10,
            assess_concurrency: 4,
            embed_batch_size: 32,
            notional: 25.0,
            liquidity_band: DEFAULT_LIQUIDITY_BAND,
            exit: ExitPolicy::default(),
            entry_window: Duration::hours(2),
            retry: RetryPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `NEWSEDGE_*` environment variables (after loading `.env`).
    pub fn from_env() -> Result<Self, DomainError> {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();

        if let Some(v) = env_parse("NEWSEDGE_SIMILARITY_THRESHOLD")? {
            cfg.similarity_threshold = v;
        }
        if let Some(v) = env_parse("NEWSEDGE_CONFIDENCE_THRESHOLD")? {
            cfg.confidence_threshold = v;
        }
        if let Some(v) = env_parse("NEWSEDGE_TOP_K")? {
            cfg.top_k = v;
        }
        if let Some(v) = env_parse("NEWSEDGE_ASSESS_CONCURRENCY")? {
            cfg.assess_concurrency = v;
        }
        if let Some(v) = env_parse("NEWSEDGE_EMBED_BATCH_SIZE")? {
            cfg.embed_batch_size = v;
        }
        if let Some(v) = env_parse("NEWSEDGE_NOTIONAL")? {
            cfg.notional = v;
        }
        if let Some(v) = env_parse("NEWSEDGE_LIQUIDITY_BAND")? {
            cfg.liquidity_band = v;
        }
        if let Some(v) = env_parse("NEWSEDGE_TAKE_PROFIT")? {
            cfg.exit.take_profit = v;
        }
        if let Some(v) = env_parse("NEWSEDGE_STOP_LOSS")? {
            cfg.exit.stop_loss = v;
        }
        if let Some(v) = env_parse("NEWSEDGE_MIN_HOLD_MINUTES")? {
            cfg.exit.min_hold_for_take_profit = Duration::minutes(v);
        }
        if let Some(v) = env_parse("NEWSEDGE_MAX_HOLD_MINUTES")? {
            cfg.exit.max_hold = Duration::minutes(v);
        }
        if let Some(v) = env_parse("NEWSEDGE_ENTRY_WINDOW_MINUTES")? {
            cfg.entry_window = Duration::minutes(v);
        }
        if let Some(v) = env_parse("NEWSEDGE_MAX_RETRIES")? {
            cfg.retry.max_retries = v;
        }
        if let Some(v) = env_parse("NEWSEDGE_TIMEOUT_SECS")? {
            cfg.retry.timeout_secs = v;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(DomainError::Config(format!(
                "similarity_threshold must be within [-1, 1], got {}",
                self.similarity_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(DomainError::Config(format!(
                "confidence_threshold must be within [0, 1], got {}",
                self.confidence_threshold
            )));
        }
        if self.notional <= 0.0 {
            return Err(DomainError::Config("notional must be positive".into()));
        }
        if !(self.liquidity_band > 0.0 && self.liquidity_band < 1.0) {
            return Err(DomainError::Config(format!(
                "liquidity_band must be within (0, 1), got {}",
                self.liquidity_band
            )));
        }
        if !(self.exit.take_profit > 0.0 && self.exit.stop_loss > 0.0 && self.exit.stop_loss < 1.0) {
            return Err(DomainError::Config(format!(
                "take_profit must be positive and stop_loss within (0, 1), got {} and {}",
                self.exit.take_profit, self.exit.stop_loss
            )));
        }
        if self.exit.min_hold_for_take_profit < Duration::zero()
            || self.exit.max_hold <= Duration::zero()
            || self.entry_window <= Duration::zero()
        {
            return Err(DomainError::Config(
                "hold times must be non-negative and max_hold and entry_window positive".into(),
            ));
        }
        if self.top_k == 0 || self.assess_concurrency == 0 || self.embed_batch_size == 0 {
            return Err(DomainError::Config(
                "top_k, assess_concurrency and embed_batch_size must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: FromStr>(key: &str) -> Result<Option<T>, DomainError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| DomainError::Config(format!("{key}: cannot parse {raw:?}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = EngineConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.similarity_threshold, 0.65);
        assert_eq!(cfg.confidence_threshold, 0.6);
        assert_eq!(cfg.notional, 25.0);
    }

    #[test]
    fn test_backoff_doubles() {
        let p = RetryPolicy::default();
        assert_eq!(p.backoff(0), StdDuration::from_millis(500));
        assert_eq!(p.backoff(1), StdDuration::from_millis(1000));
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let cfg = EngineConfig {
            confidence_threshold: 1.5,
            ..EngineConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(DomainError::Config(_))));
    }

    #[test]
    fn test_invalid_band_and_exit_rules_rejected() {
        let negative_band = EngineConfig {
            liquidity_band: -0.05,
            ..EngineConfig::default()
        };
        assert!(matches!(negative_band.validate(), Err(DomainError::Config(_))));

        let mut bad_exit = EngineConfig::default();
        bad_exit.exit.stop_loss = 0.0;
        assert!(matches!(bad_exit.validate(), Err(DomainError::Config(_))));

        let mut bad_tp = EngineConfig::default();
        bad_tp.exit.take_profit = -0.03;
        assert!(matches!(bad_tp.validate(), Err(DomainError::Config(_))));

        let no_window = EngineConfig {
            entry_window: Duration::zero(),
            ..EngineConfig::default()
        };
        assert!(matches!(no_window.validate(), Err(DomainError::Config(_))));
    }
}

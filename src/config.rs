use std::time::Duration;

use crate::engine::{ConflictMode, EngineError};
use crate::limits::*;
use crate::model::{parse_time_of_day, AvailabilityWindow};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub window: AvailabilityWindow,
    /// Consecutive days of candidates generated from the base date.
    pub window_days: u32,
    /// Distinct dates in a suggestion set.
    pub max_days: usize,
    pub max_per_day: usize,
    /// Quiet period for free-text inputs that trigger lookups.
    pub debounce: Duration,
    /// Upper bound on the booking snapshot query.
    pub query_timeout: Duration,
    pub conflict_mode: ConflictMode,
    /// Prometheus listener port; `None` disables the exporter.
    pub metrics_port: Option<u16>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            window: AvailabilityWindow::default(),
            window_days: 7,
            max_days: 3,
            max_per_day: 2,
            debounce: Duration::from_millis(300),
            query_timeout: Duration::from_millis(5_000),
            conflict_mode: ConflictMode::ExactStart,
            metrics_port: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Invalid { key: &'static str, value: String },
    Window(EngineError),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Invalid { key, value } => write!(f, "invalid value for {key}: {value:?}"),
            ConfigError::Window(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<EngineError> for ConfigError {
    fn from(e: EngineError) -> Self {
        ConfigError::Window(e)
    }
}

impl EngineConfig {
    /// Load from `SLOTWISE_*` environment variables, defaulting anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(v) = lookup("SLOTWISE_DAY_START") {
            cfg.window.day_start = parse_time_of_day(&v).ok_or_else(|| invalid("SLOTWISE_DAY_START", &v))?;
        }
        if let Some(v) = lookup("SLOTWISE_DAY_END") {
            cfg.window.day_end = parse_time_of_day(&v).ok_or_else(|| invalid("SLOTWISE_DAY_END", &v))?;
        }
        if let Some(v) = lookup("SLOTWISE_GRANULARITY_MINUTES") {
            cfg.window.granularity_minutes = parse_num("SLOTWISE_GRANULARITY_MINUTES", &v)?;
        }
        if let Some(v) = lookup("SLOTWISE_WINDOW_DAYS") {
            cfg.window_days = parse_num("SLOTWISE_WINDOW_DAYS", &v)?;
        }
        if let Some(v) = lookup("SLOTWISE_MAX_DAYS") {
            cfg.max_days = parse_num("SLOTWISE_MAX_DAYS", &v)?;
        }
        if let Some(v) = lookup("SLOTWISE_MAX_PER_DAY") {
            cfg.max_per_day = parse_num("SLOTWISE_MAX_PER_DAY", &v)?;
        }
        if let Some(v) = lookup("SLOTWISE_DEBOUNCE_MS") {
            cfg.debounce = Duration::from_millis(parse_num("SLOTWISE_DEBOUNCE_MS", &v)?);
        }
        if let Some(v) = lookup("SLOTWISE_QUERY_TIMEOUT_MS") {
            cfg.query_timeout = Duration::from_millis(parse_num("SLOTWISE_QUERY_TIMEOUT_MS", &v)?);
        }
        if let Some(v) = lookup("SLOTWISE_CONFLICT_MODE") {
            cfg.conflict_mode = match v.trim().to_ascii_lowercase().as_str() {
                "exact" => ConflictMode::ExactStart,
                "overlap" => ConflictMode::Overlap,
                _ => return Err(invalid("SLOTWISE_CONFLICT_MODE", &v)),
            };
        }
        if let Some(v) = lookup("SLOTWISE_METRICS_PORT") {
            cfg.metrics_port = Some(parse_num("SLOTWISE_METRICS_PORT", &v)?);
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        self.window.validate()?;
        if self.window_days == 0 || self.window_days > MAX_WINDOW_DAYS {
            return Err(EngineError::LimitExceeded("window days out of range"));
        }
        if self.max_days == 0 || self.max_days > MAX_SUGGESTION_DAYS {
            return Err(EngineError::LimitExceeded("suggestion days out of range"));
        }
        if self.max_per_day == 0 || self.max_per_day > MAX_SUGGESTIONS_PER_DAY {
            return Err(EngineError::LimitExceeded("suggestions per day out of range"));
        }
        if self.debounce > Duration::from_millis(MAX_DEBOUNCE_MS) {
            return Err(EngineError::LimitExceeded("debounce too long"));
        }
        if self.query_timeout.is_zero() || self.query_timeout > Duration::from_millis(MAX_QUERY_TIMEOUT_MS) {
            return Err(EngineError::LimitExceeded("query timeout out of range"));
        }
        Ok(())
    }
}

fn invalid(key: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        value: value.to_string(),
    }
}

fn parse_num<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::context::DEFAULT_MAX_ORDER;

const DAY_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// Key point:
// Serializable
// Partial files fall back to v0 values
// Explicit defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Initial score of a word the caller marked valid.
    pub typed_word_score: u32,
    /// Initial score of a word the caller marked invalid.
    pub unknown_word_score: u32,
    pub max_score: u32,
    /// Each reobservation closes `1 / boost_divisor` of the gap to `max_score`.
    pub boost_divisor: u32,
}

impl ScoringConfig {
    pub fn v0() -> Self {
        Self {
            typed_word_score: 64,
            unknown_word_score: 32,
            max_score: 255,
            boost_divisor: 4,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self::v0()
    }
}

/// Times are in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Entries touched within this window are never decayed or expired.
    pub short_threshold_secs: i64,
    /// Entries untouched for this long are evicted regardless of score.
    pub long_threshold_secs: i64,
    /// Score halves for every elapsed half-life past the short threshold.
    pub half_life_secs: i64,
    /// Decayed entries below this score are evicted.
    pub min_viable_score: u32,
    /// Minimum spacing between time-triggered GC runs.
    pub gc_interval_secs: i64,
}

impl DecayConfig {
    pub fn v0() -> Self {
        Self {
            short_threshold_secs: 7 * DAY_SECS,
            long_threshold_secs: 365 * DAY_SECS,
            half_life_secs: 30 * DAY_SECS,
            min_viable_score: 8,
            gc_interval_secs: 6 * 60 * 60,
        }
    }
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self::v0()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DictionaryConfig {
    /// Previous words kept in a context.
    pub max_order: usize,
    pub max_entries: usize,
    /// Longest learnable word, in chars.
    pub max_word_length: usize,
    /// Unsaved mutations that trigger a background save.
    pub autosave_after_mutations: u64,
    pub flush_timeout_ms: u64,
    pub scoring: ScoringConfig,
    pub decay: DecayConfig,
}

impl DictionaryConfig {
    pub fn v0() -> Self {
        Self {
            max_order: DEFAULT_MAX_ORDER,
            max_entries: 40_000,
            max_word_length: 48,
            autosave_after_mutations: 1_000,
            flush_timeout_ms: 30_000,
            scoring: ScoringConfig::v0(),
            decay: DecayConfig::v0(),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: DictionaryConfig = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.flush_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_order == 0 {
            return Err(ConfigError::Invalid("max_order must be at least 1".into()));
        }
        if self.max_entries == 0 {
            return Err(ConfigError::Invalid("max_entries must be positive".into()));
        }
        let scoring = &self.scoring;
        if scoring.boost_divisor == 0 {
            return Err(ConfigError::Invalid("boost_divisor must be positive".into()));
        }
        if scoring.typed_word_score > scoring.max_score
            || scoring.unknown_word_score > scoring.max_score
        {
            return Err(ConfigError::Invalid(format!(
                "initial scores must not exceed max_score {}",
                scoring.max_score
            )));
        }
        let decay = &self.decay;
        if decay.half_life_secs <= 0 {
            return Err(ConfigError::Invalid("half_life_secs must be positive".into()));
        }
        if decay.short_threshold_secs < 0
            || decay.short_threshold_secs >= decay.long_threshold_secs
        {
            return Err(ConfigError::Invalid(format!(
                "short threshold {}s must be non-negative and below long threshold {}s",
                decay.short_threshold_secs, decay.long_threshold_secs
            )));
        }
        Ok(())
    }
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self::v0()
    }
}

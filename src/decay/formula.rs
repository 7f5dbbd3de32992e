use crate::config::DecayConfig;
use crate::types::Timestamp;

/// Where an entry of a given age sits in the decay regimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecayRegime {
    /// Touched within the short threshold. Untouchable.
    Fresh,
    /// Between the thresholds. Score halves per elapsed half-life.
    Decaying,
    /// At or past the long threshold. Evicted unconditionally.
    Expired,
}

/// Elapsed time since the last touch, clamped at zero so a later timestamp
/// always wins over an earlier clock reading.
pub fn age(last_touched: Timestamp, now: Timestamp) -> i64 {
    now.saturating_sub(last_touched).max(0)
}

pub fn regime(config: &DecayConfig, age: i64) -> DecayRegime {
    if age <= config.short_threshold_secs {
        DecayRegime::Fresh
    } else if age >= config.long_threshold_secs {
        DecayRegime::Expired
    } else {
        DecayRegime::Decaying
    }
}

/// Score after `age` seconds without a touch.
///
/// ```text
/// Fresh    -> score
/// Decaying -> score >> ((age - short) / half_life)
/// Expired  -> 0
/// ```
pub fn effective_score(config: &DecayConfig, score: u32, age: i64) -> u32 {
    match regime(config, age) {
        DecayRegime::Fresh => score,
        DecayRegime::Expired => 0,
        DecayRegime::Decaying => {
            let halvings = (age - config.short_threshold_secs) / config.half_life_secs.max(1);
            if halvings >= u32::BITS as i64 {
                0
            } else {
                score >> halvings
            }
        }
    }
}

/// Whether GC removes an entry of this score and age.
pub fn should_evict(config: &DecayConfig, score: u32, age: i64) -> bool {
    match regime(config, age) {
        DecayRegime::Fresh => false,
        DecayRegime::Expired => true,
        DecayRegime::Decaying => effective_score(config, score, age) < config.min_viable_score,
    }
}

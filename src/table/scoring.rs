use crate::config::ScoringConfig;

/// Initial score of a first observation.
pub fn initial(config: &ScoringConfig, is_valid: bool) -> u32 {
    if is_valid {
        config.typed_word_score
    } else {
        config.unknown_word_score
    }
}

/// Saturating reobservation boost.
///
/// Closes a fixed fraction of the remaining gap to `max_score`, at least one
/// point, so repeated use converges on the maximum and never passes it.
pub fn boost(config: &ScoringConfig, score: u32) -> u32 {
    let score = score.min(config.max_score);
    let gap = config.max_score - score;
    if gap == 0 {
        return score;
    }
    let step = (gap / config.boost_divisor.max(1)).max(1);
    score + step
}

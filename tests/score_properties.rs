use proptest::prelude::*;
use user_history::config::{DecayConfig, ScoringConfig};
use user_history::decay::formula;
use user_history::table::scoring;

proptest! {
    #[test]
    fn boost_is_monotonic_and_bounded(score in 0u32..=255) {
        let config = ScoringConfig::v0();
        let boosted = scoring::boost(&config, score);
        prop_assert!(boosted <= config.max_score);
        prop_assert!(boosted >= score);
        if score < config.max_score {
            prop_assert!(boosted > score);
        }
    }

    #[test]
    fn repeated_boost_converges_on_max(start in 0u32..=255) {
        let config = ScoringConfig::v0();
        let mut score = start;
        for _ in 0..255 {
            score = scoring::boost(&config, score);
        }
        prop_assert_eq!(score, config.max_score);
    }

    #[test]
    fn decay_never_increases_score(
        score in 0u32..=255,
        age in 0i64..(400 * 86_400),
        extra in 0i64..(100 * 86_400),
    ) {
        let config = DecayConfig::v0();
        let now = formula::effective_score(&config, score, age);
        let later = formula::effective_score(&config, score, age + extra);
        prop_assert!(now <= score);
        prop_assert!(later <= now);
    }

    #[test]
    fn fresh_entries_are_never_evicted(score in 0u32..=255, age in 0i64..=(7 * 86_400)) {
        prop_assert!(!formula::should_evict(&DecayConfig::v0(), score, age));
    }
}

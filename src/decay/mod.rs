//! Time decay and capacity garbage collection.

pub mod formula;

use crate::config::DecayConfig;
use crate::table::FrequencyTable;
use crate::types::{EntryKey, Timestamp};

pub use formula::DecayRegime;

/// What one GC pass removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GcReport {
    /// Past the long threshold.
    pub expired: usize,
    /// Decayed below the viable minimum.
    pub decayed: usize,
    /// Removed only to get back under capacity.
    pub over_capacity: usize,
    pub removed_keys: Vec<EntryKey>,
}

impl GcReport {
    pub fn pruned(&self) -> usize {
        self.expired + self.decayed + self.over_capacity
    }
}

#[derive(Debug, Clone)]
pub struct GarbageCollector {
    config: DecayConfig,
    last_run: Option<Timestamp>,
}

impl GarbageCollector {
    pub fn new(config: DecayConfig) -> Self {
        Self {
            config,
            last_run: None,
        }
    }

    pub fn config(&self) -> &DecayConfig {
        &self.config
    }

    pub fn last_run(&self) -> Option<Timestamp> {
        self.last_run
    }

    /// Over capacity, never run, clock moved backwards, or the GC interval
    /// has elapsed.
    pub fn is_required(&self, table: &FrequencyTable, now: Timestamp) -> bool {
        if table.is_over_capacity() {
            return true;
        }
        match self.last_run {
            None => true,
            Some(last) => now < last || now.saturating_sub(last) >= self.config.gc_interval_secs,
        }
    }

    pub fn run_if_required(&mut self, table: &mut FrequencyTable, now: Timestamp) -> GcReport {
        if !self.is_required(table, now) {
            return GcReport::default();
        }
        self.run(table, now)
    }

    /// Decay pass, then capacity pass.
    pub fn run(&mut self, table: &mut FrequencyTable, now: Timestamp) -> GcReport {
        let mut report = GcReport::default();

        let doomed: Vec<(EntryKey, DecayRegime)> = table
            .iter()
            .filter_map(|entry| {
                let age = formula::age(entry.last_touched, now);
                if formula::should_evict(&self.config, entry.score, age) {
                    Some((entry.key(), formula::regime(&self.config, age)))
                } else {
                    None
                }
            })
            .collect();

        for (key, regime) in doomed {
            if table.remove(&key).is_some() {
                match regime {
                    DecayRegime::Expired => report.expired += 1,
                    _ => report.decayed += 1,
                }
                report.removed_keys.push(key);
            }
        }

        if table.is_over_capacity() {
            let excess = table.len() - table.max_entries();
            let mut ranked: Vec<(Timestamp, u32, EntryKey)> = table
                .iter()
                .map(|entry| {
                    let age = formula::age(entry.last_touched, now);
                    (
                        entry.last_touched,
                        formula::effective_score(&self.config, entry.score, age),
                        entry.key(),
                    )
                })
                .collect();
            // Least recently touched first, then lowest score, then key.
            ranked.select_nth_unstable(excess - 1);
            ranked.truncate(excess);
            for (_, _, key) in ranked {
                if table.remove(&key).is_some() {
                    report.over_capacity += 1;
                    report.removed_keys.push(key);
                }
            }
        }

        debug_assert!(!table.is_over_capacity());
        self.last_run = Some(now);
        report
    }
}

//! In-memory (context, word) -> score table.

pub mod scoring;

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::config::{DecayConfig, DictionaryConfig, ScoringConfig};
use crate::context::NgramContext;
use crate::decay::formula;
use crate::types::{EntryKey, Timestamp, WordEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    Updated,
}

/// Mutations are single-writer: callers hold the owning store's lock.
#[derive(Debug, Clone)]
pub struct FrequencyTable {
    entries: HashMap<EntryKey, WordEntry>,
    // Number of live entries per word, across all contexts.
    word_counts: HashMap<String, usize>,
    max_order: usize,
    max_entries: usize,
    scoring: ScoringConfig,
    decay: DecayConfig,
}

impl FrequencyTable {
    pub fn new(config: &DictionaryConfig) -> Self {
        Self {
            entries: HashMap::new(),
            word_counts: HashMap::new(),
            max_order: config.max_order,
            max_entries: config.max_entries,
            scoring: config.scoring.clone(),
            decay: config.decay.clone(),
        }
    }

    pub fn max_order(&self) -> usize {
        self.max_order
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_over_capacity(&self) -> bool {
        self.entries.len() > self.max_entries
    }

    /// Record one observation of `word` after `context`.
    ///
    /// Panics if `context` is longer than the configured order.
    pub fn add(
        &mut self,
        context: &NgramContext,
        word: &str,
        is_valid: bool,
        timestamp: Timestamp,
    ) -> AddOutcome {
        if let Err(e) = context.check_order(self.max_order) {
            panic!("{e}");
        }

        let key = EntryKey::new(context.clone(), word);
        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                let age = formula::age(entry.last_touched, timestamp);
                let current = formula::effective_score(&self.decay, entry.score, age);
                entry.score = scoring::boost(&self.scoring, current)
                    .max(scoring::initial(&self.scoring, is_valid));
                entry.last_touched = entry.last_touched.max(timestamp);
                AddOutcome::Updated
            }
            Entry::Vacant(vacant) => {
                vacant.insert(WordEntry {
                    word: word.to_string(),
                    context: context.clone(),
                    score: scoring::initial(&self.scoring, is_valid),
                    last_touched: timestamp,
                });
                *self.word_counts.entry(word.to_string()).or_insert(0) += 1;
                AddOutcome::Inserted
            }
        }
    }

    /// Unigram entry always, n-gram entry when the context carries words.
    pub fn learn(
        &mut self,
        context: &NgramContext,
        word: &str,
        is_valid: bool,
        timestamp: Timestamp,
    ) -> usize {
        if let Err(e) = context.check_order(self.max_order) {
            panic!("{e}");
        }
        let mut inserted = 0;
        if self.add(&NgramContext::EMPTY, word, is_valid, timestamp) == AddOutcome::Inserted {
            inserted += 1;
        }
        if !context.is_empty()
            && self.add(context, word, is_valid, timestamp) == AddOutcome::Inserted
        {
            inserted += 1;
        }
        inserted
    }

    /// Insert a persisted entry as-is. A duplicate key keeps the more
    /// recently touched entry.
    pub fn restore(&mut self, entry: WordEntry) -> bool {
        if entry.context.check_order(self.max_order).is_err() {
            return false;
        }
        let mut entry = entry;
        entry.score = entry.score.min(self.scoring.max_score);
        match self.entries.entry(entry.key()) {
            Entry::Occupied(mut occupied) => {
                if entry.last_touched >= occupied.get().last_touched {
                    occupied.insert(entry);
                }
                false
            }
            Entry::Vacant(vacant) => {
                *self.word_counts.entry(entry.word.clone()).or_insert(0) += 1;
                vacant.insert(entry);
                true
            }
        }
    }

    pub fn get(&self, key: &EntryKey) -> Option<&WordEntry> {
        self.entries.get(key)
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.word_counts.contains_key(word)
    }

    /// True iff some entry for `word` would survive decay at `now`.
    pub fn contains_live_word(&self, word: &str, now: Timestamp) -> bool {
        if !self.contains_word(word) {
            return false;
        }
        let live = |entry: &WordEntry| {
            let age = formula::age(entry.last_touched, now);
            !formula::should_evict(&self.decay, entry.score, age)
        };
        // Every learn refreshes the unigram, so it is usually the freshest.
        let unigram = EntryKey::new(NgramContext::EMPTY, word);
        if self.entries.get(&unigram).is_some_and(live) {
            return true;
        }
        self.entries
            .values()
            .any(|entry| entry.word == word && live(entry))
    }

    pub fn remove(&mut self, key: &EntryKey) -> Option<WordEntry> {
        let removed = self.entries.remove(key)?;
        if let Some(count) = self.word_counts.get_mut(&removed.word) {
            *count -= 1;
            if *count == 0 {
                self.word_counts.remove(&removed.word);
            }
        }
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.word_counts.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &WordEntry> {
        self.entries.values()
    }

    pub fn entries_for<'a>(
        &'a self,
        context: &'a NgramContext,
    ) -> impl Iterator<Item = &'a WordEntry> + 'a {
        self.entries.values().filter(move |e| &e.context == context)
    }

    pub fn snapshot(&self) -> Vec<WordEntry> {
        self.entries.values().cloned().collect()
    }
}

//! Per-locale learned dictionary: live table, decay, and ordered write-back.

mod claim;
mod writeback;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, DictionaryConfig};
use crate::context::NgramContext;
use crate::decay::{formula, GarbageCollector};
use crate::gate::DistracterFilter;
use crate::persistence::{BinaryCodec, DictionaryCodec, PipelineError, WritePipeline};
use crate::table::FrequencyTable;
use crate::types::{DictionaryId, DictionaryIdError, EntryKey, Prediction, Timestamp};

use claim::FileClaim;

#[derive(Debug, Error)]
pub enum DictionaryError {
    #[error("Dictionary file is already held by another store: {0}")]
    AlreadyOpen(PathBuf),
    #[error("Invalid dictionary id: {0}")]
    Id(#[from] DictionaryIdError),
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Collaborators a store is built with.
#[derive(Clone)]
pub struct DictionaryOptions {
    pub config: DictionaryConfig,
    pub clock: Arc<dyn Clock>,
    pub codec: Arc<dyn DictionaryCodec>,
}

impl DictionaryOptions {
    pub fn with_config(mut self, config: DictionaryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_codec(mut self, codec: Arc<dyn DictionaryCodec>) -> Self {
        self.codec = codec;
        self
    }
}

impl Default for DictionaryOptions {
    fn default() -> Self {
        Self {
            config: DictionaryConfig::v0(),
            clock: Arc::new(SystemClock),
            codec: Arc::new(BinaryCodec),
        }
    }
}

/// State guarded by the store lock.
///
/// `generation` counts mutations; the store is dirty while it differs from
/// `persisted_generation`. `removed` remembers keys evicted since the last
/// successful save so a merge with the file does not bring them back.
pub(crate) struct StoreState {
    table: Option<FrequencyTable>,
    gc: GarbageCollector,
    generation: u64,
    persisted_generation: u64,
    removed: HashMap<EntryKey, u64>,
    pending_clears: usize,
    save_queued: bool,
}

impl StoreState {
    fn is_dirty(&self) -> bool {
        self.generation != self.persisted_generation
    }
}

pub(crate) struct Shared {
    id: DictionaryId,
    path: PathBuf,
    config: DictionaryConfig,
    clock: Arc<dyn Clock>,
    codec: Arc<dyn DictionaryCodec>,
    state: Mutex<StoreState>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load_table(&self) -> FrequencyTable {
        let mut table = FrequencyTable::new(&self.config);
        match self.codec.load(&self.path) {
            Ok(entries) => {
                let total = entries.len();
                let mut skipped = 0;
                for entry in entries {
                    if !table.restore(entry) {
                        skipped += 1;
                    }
                }
                tracing::debug!(dictionary = %self.id, total, skipped, "loaded persisted entries");
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(dictionary = %self.id, "no persisted file, starting empty");
            }
            Err(e) => {
                tracing::warn!(
                    dictionary = %self.id,
                    error = %e,
                    "persisted file unreadable, starting empty"
                );
            }
        }
        table
    }

    /// Run GC on the loaded table and tombstone what it removed.
    fn collect_garbage(&self, state: &mut StoreState, now: Timestamp, force: bool) -> usize {
        let StoreState {
            table,
            gc,
            generation,
            removed,
            ..
        } = state;
        let table = table.get_or_insert_with(|| self.load_table());
        let report = if force {
            gc.run(table, now)
        } else {
            gc.run_if_required(table, now)
        };

        let pruned = report.pruned();
        if pruned > 0 {
            *generation += 1;
            for key in report.removed_keys {
                removed.insert(key, *generation);
            }
            tracing::debug!(
                dictionary = %self.id,
                expired = report.expired,
                decayed = report.decayed,
                over_capacity = report.over_capacity,
                "garbage collected"
            );
        }
        pruned
    }

    /// Claim the autosave slot when enough mutations are unsaved.
    fn wants_autosave(&self, state: &mut StoreState) -> bool {
        let unsaved = state.generation.saturating_sub(state.persisted_generation);
        if state.save_queued || unsaved < self.config.autosave_after_mutations {
            return false;
        }
        state.save_queued = true;
        true
    }
}

/// One locale's learned vocabulary.
///
/// Reads and writes go to the live in-memory table; disk is touched only by
/// the store's own write pipeline, plus the lazy load on first use.
pub struct UserHistoryDictionary {
    pipeline: WritePipeline,
    shared: Arc<Shared>,
    _claim: FileClaim,
}

impl UserHistoryDictionary {
    /// Create the store for `id` inside `dir`. Nothing is read from disk
    /// until the first operation that needs the table.
    pub fn open(
        dir: &Path,
        id: DictionaryId,
        options: DictionaryOptions,
    ) -> Result<Self, DictionaryError> {
        options.config.validate()?;

        let path = id.file_path(dir);
        let claim =
            FileClaim::acquire(&path).ok_or_else(|| DictionaryError::AlreadyOpen(path.clone()))?;
        let pipeline = WritePipeline::spawn(id.to_string())?;

        let state = StoreState {
            table: None,
            gc: GarbageCollector::new(options.config.decay.clone()),
            generation: 0,
            persisted_generation: 0,
            removed: HashMap::new(),
            pending_clears: 0,
            save_queued: false,
        };

        Ok(Self {
            pipeline,
            shared: Arc::new(Shared {
                id,
                path,
                config: options.config,
                clock: options.clock,
                codec: options.codec,
                state: Mutex::new(state),
            }),
            _claim: claim,
        })
    }

    pub fn id(&self) -> &DictionaryId {
        &self.shared.id
    }

    pub fn path(&self) -> &Path {
        &self.shared.path
    }

    pub fn config(&self) -> &DictionaryConfig {
        &self.shared.config
    }

    /// Learn `word` typed after `context`.
    ///
    /// Silently ignored when the gate vetoes the word or the word is empty
    /// or too long. Panics if `context` exceeds the configured order.
    pub fn add_to_dictionary(
        &self,
        context: &NgramContext,
        word: &str,
        is_valid: bool,
        timestamp: Timestamp,
        gate: &dyn DistracterFilter,
    ) {
        let length = word.chars().count();
        if length == 0 || length > self.shared.config.max_word_length {
            tracing::trace!(
                dictionary = %self.shared.id,
                length,
                "word length out of range, not learned"
            );
            return;
        }
        if gate.is_distracter(context, word) {
            return;
        }

        let now = self.shared.clock.now();
        let autosave = {
            let mut state = self.shared.lock();
            let table = state
                .table
                .get_or_insert_with(|| self.shared.load_table());
            table.learn(context, word, is_valid, timestamp);
            state.generation += 1;
            self.shared.collect_garbage(&mut state, now, false);
            self.shared.wants_autosave(&mut state)
        };

        if autosave {
            self.enqueue_save("autosave", false);
        }
    }

    /// True iff some context holds `word` with a score that has not decayed
    /// out. Served from memory only.
    pub fn is_in_dictionary(&self, word: &str) -> bool {
        let now = self.shared.clock.now();
        let mut state = self.shared.lock();
        state
            .table
            .get_or_insert_with(|| self.shared.load_table())
            .contains_live_word(word, now)
    }

    /// Words learned after exactly `context`, best first.
    pub fn predictions(&self, context: &NgramContext, limit: usize) -> Vec<Prediction> {
        let now = self.shared.clock.now();
        let decay = &self.shared.config.decay;
        let mut state = self.shared.lock();
        let table = state
            .table
            .get_or_insert_with(|| self.shared.load_table());

        let mut predictions: Vec<Prediction> = table
            .entries_for(context)
            .filter_map(|entry| {
                let age = formula::age(entry.last_touched, now);
                if formula::should_evict(decay, entry.score, age) {
                    return None;
                }
                Some(Prediction {
                    word: entry.word.clone(),
                    score: formula::effective_score(decay, entry.score, age),
                })
            })
            .collect();
        predictions.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.word.cmp(&b.word)));
        predictions.truncate(limit);
        predictions
    }

    /// Run decay if it is due at the clock's current time. Returns the
    /// number of entries pruned.
    pub fn run_gc_if_required(&self) -> usize {
        let now = self.shared.clock.now();
        let (pruned, autosave) = {
            let mut state = self.shared.lock();
            let pruned = self.shared.collect_garbage(&mut state, now, false);
            (pruned, self.shared.wants_autosave(&mut state))
        };
        if autosave {
            self.enqueue_save("autosave", false);
        }
        pruned
    }

    /// Drop every entry and schedule deletion of the file, in queue order
    /// with all other writes.
    pub fn clear(&self) {
        {
            let mut state = self.shared.lock();
            let config = &self.shared.config;
            state
                .table
                .get_or_insert_with(|| FrequencyTable::new(config))
                .clear();
            state.removed.clear();
            state.generation += 1;
            state.pending_clears += 1;
        }

        let shared = Arc::clone(&self.shared);
        let queued = self
            .pipeline
            .enqueue("clear", Box::new(move || writeback::delete_file(&shared)));
        if let Err(e) = queued {
            let mut state = self.shared.lock();
            state.pending_clears = state.pending_clears.saturating_sub(1);
            tracing::warn!(dictionary = %self.shared.id, error = %e, "clear not scheduled");
        }
    }

    /// Schedule a merge of the live table into the file.
    pub fn save(&self) {
        self.enqueue_save("save", false);
    }

    /// Persist and release the in-memory table. The store stays usable and
    /// reloads from disk on the next operation.
    pub fn close(&self) {
        self.enqueue_save("close", true);
    }

    /// Block until every write queued before this call has finished.
    pub fn wait_all_tasks(&self) {
        if let Err(e) = self.pipeline.wait_idle() {
            tracing::warn!(
                dictionary = %self.shared.id,
                error = %e,
                "wait for pending writes failed"
            );
        }
    }

    /// Bounded variant of [`wait_all_tasks`](Self::wait_all_tasks).
    pub fn flush_and_wait(&self, timeout: Duration) -> Result<(), PipelineError> {
        self.pipeline.flush_and_wait(timeout)
    }

    /// Uses the configured `flush_timeout_ms`.
    pub fn flush(&self) -> Result<(), PipelineError> {
        self.flush_and_wait(self.shared.config.flush_timeout())
    }

    pub fn entry_count(&self) -> usize {
        let mut state = self.shared.lock();
        state
            .table
            .get_or_insert_with(|| self.shared.load_table())
            .len()
    }

    pub fn is_loaded(&self) -> bool {
        self.shared.lock().table.is_some()
    }

    pub fn is_dirty(&self) -> bool {
        self.shared.lock().is_dirty()
    }

    pub fn pending_tasks(&self) -> usize {
        self.pipeline.pending()
    }

    fn enqueue_save(&self, name: &'static str, unload: bool) {
        let shared = Arc::clone(&self.shared);
        let queued = self
            .pipeline
            .enqueue(name, Box::new(move || writeback::persist(&shared, unload)));
        if let Err(e) = queued {
            tracing::warn!(
                dictionary = %self.shared.id,
                task = name,
                error = %e,
                "write not scheduled"
            );
        }
    }
}

impl Drop for UserHistoryDictionary {
    fn drop(&mut self) {
        if !self.pipeline.is_shut_down() {
            self.close();
            self.pipeline.shutdown();
            tracing::info!(dictionary = %self.shared.id, "dictionary closed");
        }
    }
}

//! Jobs run on the store's write pipeline.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;

use super::Shared;
use crate::persistence::PersistenceError;
use crate::types::{EntryKey, WordEntry};

struct Snapshot {
    entries: Vec<WordEntry>,
    removed: HashSet<EntryKey>,
    generation: u64,
}

/// Read-modify-write of the dictionary file, then optionally release the
/// table if nothing changed while writing.
pub(super) fn persist(shared: &Shared, unload: bool) -> Result<(), PersistenceError> {
    let snapshot = {
        let mut state = shared.lock();
        state.save_queued = false;

        // The queued clear deletes the file next; a later save writes it.
        if state.table.is_none() || state.pending_clears > 0 {
            return Ok(());
        }
        if !state.is_dirty() && shared.path.exists() {
            if unload {
                state.table = None;
                state.removed.clear();
            }
            return Ok(());
        }

        Snapshot {
            entries: state
                .table
                .as_ref()
                .map(|table| table.snapshot())
                .unwrap_or_default(),
            removed: state.removed.keys().cloned().collect(),
            generation: state.generation,
        }
    };

    let generation = snapshot.generation;
    let merged = merge(shared, snapshot);
    shared.codec.save(&shared.path, &merged)?;
    tracing::debug!(
        dictionary = %shared.id,
        entries = merged.len(),
        generation,
        "dictionary written"
    );

    let mut state = shared.lock();
    state.persisted_generation = state.persisted_generation.max(generation);
    state.removed.retain(|_, removed_at| *removed_at > generation);
    if unload && state.generation == generation && state.pending_clears == 0 {
        state.table = None;
        state.removed.clear();
    }
    Ok(())
}

/// File entries that were neither evicted nor superseded, plus the snapshot.
fn merge(shared: &Shared, snapshot: Snapshot) -> Vec<WordEntry> {
    let mut merged: HashMap<EntryKey, WordEntry> = HashMap::new();

    match shared.codec.load(&shared.path) {
        Ok(existing) => {
            for entry in existing {
                let key = entry.key();
                if !snapshot.removed.contains(&key) {
                    merged.insert(key, entry);
                }
            }
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => {
            tracing::warn!(
                dictionary = %shared.id,
                error = %e,
                "existing file unreadable, overwriting"
            );
        }
    }

    for entry in snapshot.entries {
        merged.insert(entry.key(), entry);
    }

    let mut entries: Vec<WordEntry> = merged.into_values().collect();
    entries.sort_by(|a, b| {
        a.context
            .cmp(&b.context)
            .then_with(|| a.word.cmp(&b.word))
    });
    entries
}

/// Delete the file. If it cannot be deleted, truncate it to an empty
/// dictionary instead.
pub(super) fn delete_file(shared: &Shared) -> Result<(), PersistenceError> {
    let result = match fs::remove_file(&shared.path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => {
            tracing::warn!(dictionary = %shared.id, error = %e, "delete failed, truncating");
            shared
                .codec
                .save(&shared.path, &[])
                .map_err(PersistenceError::from)
        }
    };

    let mut state = shared.lock();
    state.pending_clears = state.pending_clears.saturating_sub(1);
    result
}

use serde::{Deserialize, Serialize};

use crate::context::NgramContext;

/// Seconds since an arbitrary epoch. Only differences are meaningful.
pub type Timestamp = i64;

/// Table key: a word observed after a given context.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryKey {
    pub context: NgramContext,
    pub word: String,
}

impl EntryKey {
    pub fn new(context: NgramContext, word: impl Into<String>) -> Self {
        Self {
            context,
            word: word.into(),
        }
    }
}

/// One learned (context, word) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    pub word: String,
    pub context: NgramContext,
    pub score: u32,
    pub last_touched: Timestamp,
}

impl WordEntry {
    pub fn key(&self) -> EntryKey {
        EntryKey::new(self.context.clone(), self.word.clone())
    }
}

/// A candidate handed to the suggestion consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    pub word: String,
    pub score: u32,
}

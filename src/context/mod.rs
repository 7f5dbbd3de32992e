//! Bounded window of previously committed words.
//!
//! A context is immutable. Advancing it produces a new value; the previous
//! one stays valid and can be shared freely between threads.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Default number of previous words kept in a context (trigram model).
pub const DEFAULT_MAX_ORDER: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("Context holds {len} words but the configured order is {max_order}")]
    TooLong { len: usize, max_order: usize },
}

/// One slot in a context window.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContextWord {
    /// Start of input. Never equal to a typed word.
    BeginningOfSentence,
    Word(String),
}

/// Ordered previous words, oldest first.
///
/// The empty context is the unigram key.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NgramContext {
    words: Vec<ContextWord>,
}

impl NgramContext {
    pub const EMPTY: NgramContext = NgramContext { words: Vec::new() };

    pub fn empty() -> Self {
        Self::EMPTY
    }

    pub fn beginning_of_sentence() -> Self {
        NgramContext {
            words: vec![ContextWord::BeginningOfSentence],
        }
    }

    /// Build a context from explicit words, oldest first.
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        NgramContext {
            words: words
                .into_iter()
                .map(|w| ContextWord::Word(w.into()))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn words(&self) -> &[ContextWord] {
        &self.words
    }

    /// Most recently committed word, if it is a real word.
    pub fn last_word(&self) -> Option<&str> {
        match self.words.last() {
            Some(ContextWord::Word(w)) => Some(w),
            _ => None,
        }
    }

    /// Append `word` and keep only the newest `max_order` slots.
    pub fn next(&self, word: &str, max_order: usize) -> NgramContext {
        let mut words = Vec::with_capacity(max_order);
        let keep = max_order.saturating_sub(1);
        let skip = self.words.len().saturating_sub(keep);
        words.extend(self.words.iter().skip(skip).cloned());
        if max_order > 0 {
            words.push(ContextWord::Word(word.to_string()));
        }
        NgramContext { words }
    }

    pub fn check_order(&self, max_order: usize) -> Result<(), ContextError> {
        if self.words.len() > max_order {
            return Err(ContextError::TooLong {
                len: self.words.len(),
                max_order,
            });
        }
        Ok(())
    }
}

impl fmt::Display for NgramContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match word {
                ContextWord::BeginningOfSentence => f.write_str("<s>")?,
                ContextWord::Word(w) => f.write_str(w)?,
            }
        }
        f.write_str("]")
    }
}

/// Advances contexts with a fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextTracker {
    max_order: usize,
}

impl ContextTracker {
    pub fn new(max_order: usize) -> Self {
        Self { max_order }
    }

    pub fn max_order(&self) -> usize {
        self.max_order
    }

    pub fn next(&self, context: &NgramContext, word: &str) -> NgramContext {
        context.next(word, self.max_order)
    }
}

impl Default for ContextTracker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ORDER)
    }
}

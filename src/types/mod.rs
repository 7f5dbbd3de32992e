pub mod entry;
pub mod identifiers;

pub use entry::{EntryKey, Prediction, Timestamp, WordEntry};
pub use identifiers::{DictionaryId, DictionaryIdError, DICT_FILE_EXTENSION};

//! Per-locale self-learning user history dictionary.
//!
//! `user-history` records the words a user commits, keyed by the preceding
//! words, scores them with a saturating boost, and forgets them over time.
//! Each locale gets one [`UserHistoryDictionary`] whose table lives in
//! memory and is written back to a single binary file by a dedicated,
//! strictly ordered writer thread.

pub mod clock;
pub mod config;
pub mod context;
pub mod decay;
pub mod dictionary;
pub mod gate;
pub mod persistence;
pub mod registry;
pub mod table;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::DictionaryConfig;
pub use context::{ContextTracker, NgramContext};
pub use dictionary::{DictionaryError, DictionaryOptions, UserHistoryDictionary};
pub use gate::{DistracterFilter, EmptyDistracterFilter};
pub use registry::DictionaryRegistry;

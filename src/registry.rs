use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::dictionary::{DictionaryError, DictionaryOptions, UserHistoryDictionary};
use crate::types::DictionaryId;

/// Logical name of the user history dictionary files.
pub const USER_HISTORY_NAME: &str = "UserHistory";

/// One lazily created store per locale, all under one directory.
pub struct DictionaryRegistry {
    dir: PathBuf,
    name: String,
    suffix: Option<String>,
    options: DictionaryOptions,
    stores: Mutex<HashMap<String, Arc<UserHistoryDictionary>>>,
}

impl DictionaryRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            name: USER_HISTORY_NAME.to_string(),
            suffix: None,
            options: DictionaryOptions::default(),
            stores: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Extra file name component, for isolating test or profile files.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn with_options(mut self, options: DictionaryOptions) -> Self {
        self.options = options;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn dictionary_id(&self, locale: &str) -> Result<DictionaryId, DictionaryError> {
        Ok(DictionaryId::new(&self.name, locale, self.suffix.as_deref())?)
    }

    /// The cached store for `locale`, creating it on first request. The
    /// file is not read until the store is first used.
    pub fn get(&self, locale: &str) -> Result<Arc<UserHistoryDictionary>, DictionaryError> {
        let id = self.dictionary_id(locale)?;
        let mut stores = self.lock();
        if let Some(store) = stores.get(id.locale()) {
            return Ok(Arc::clone(store));
        }

        let store = Arc::new(UserHistoryDictionary::open(
            &self.dir,
            id.clone(),
            self.options.clone(),
        )?);
        tracing::debug!(dictionary = %id, "dictionary created");
        stores.insert(id.locale().to_string(), Arc::clone(&store));
        Ok(store)
    }

    pub fn contains(&self, locale: &str) -> bool {
        self.lock().contains_key(locale.trim())
    }

    pub fn locales(&self) -> Vec<String> {
        let mut locales: Vec<String> = self.lock().keys().cloned().collect();
        locales.sort();
        locales
    }

    /// Close and drain the store for `locale`, then forget it. Returns
    /// false if no store was cached.
    pub fn evict(&self, locale: &str) -> bool {
        let store = self.lock().remove(locale.trim());
        match store {
            Some(store) => {
                store.close();
                store.wait_all_tasks();
                true
            }
            None => false,
        }
    }

    /// Close and drain every cached store without forgetting them.
    pub fn close_all(&self) {
        let stores: Vec<Arc<UserHistoryDictionary>> = self.lock().values().cloned().collect();
        for store in &stores {
            store.close();
        }
        for store in &stores {
            store.wait_all_tasks();
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<UserHistoryDictionary>>> {
        self.stores.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for DictionaryRegistry {
    fn drop(&mut self) {
        self.close_all();
    }
}

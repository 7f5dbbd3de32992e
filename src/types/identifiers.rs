use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extension of every persisted dictionary file.
pub const DICT_FILE_EXTENSION: &str = "dict";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DictionaryIdError {
    #[error("Dictionary name must not be empty")]
    EmptyName,
    #[error("Locale must not be empty")]
    EmptyLocale,
    #[error("Component contains a path separator: {0}")]
    PathSeparator(String),
}

/// Logical identity of one persisted dictionary: name + locale (+ suffix).
///
/// Two ids compare equal iff they map to the same file name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DictionaryId {
    name: String,
    locale: String,
    suffix: Option<String>,
}

impl DictionaryId {
    pub fn new(
        name: &str,
        locale: &str,
        suffix: Option<&str>,
    ) -> Result<Self, DictionaryIdError> {
        let name = normalize_component(name)?;
        if name.is_empty() {
            return Err(DictionaryIdError::EmptyName);
        }
        let locale = normalize_component(locale)?;
        if locale.is_empty() {
            return Err(DictionaryIdError::EmptyLocale);
        }
        let suffix = match suffix {
            Some(s) => Some(normalize_component(s)?).filter(|s| !s.is_empty()),
            None => None,
        };

        Ok(DictionaryId {
            name,
            locale,
            suffix,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    /// `<name>.<locale>[.<suffix>].dict`
    pub fn file_name(&self) -> String {
        match &self.suffix {
            Some(suffix) => format!(
                "{}.{}.{}.{}",
                self.name, self.locale, suffix, DICT_FILE_EXTENSION
            ),
            None => format!("{}.{}.{}", self.name, self.locale, DICT_FILE_EXTENSION),
        }
    }

    pub fn file_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.file_name())
    }
}

impl fmt::Display for DictionaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.suffix {
            Some(suffix) => write!(f, "{}.{}.{}", self.name, self.locale, suffix),
            None => write!(f, "{}.{}", self.name, self.locale),
        }
    }
}

/// Trim surrounding whitespace and refuse anything that could escape the
/// dictionary directory.
fn normalize_component(raw: &str) -> Result<String, DictionaryIdError> {
    let trimmed = raw.trim();
    if trimmed.contains(['/', '\\']) || trimmed == ".." {
        return Err(DictionaryIdError::PathSeparator(trimmed.to_string()));
    }
    Ok(trimmed.to_string())
}

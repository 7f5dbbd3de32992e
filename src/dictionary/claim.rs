use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock, PoisonError};

static OPEN_FILES: OnceLock<Mutex<HashSet<PathBuf>>> = OnceLock::new();

fn open_files() -> &'static Mutex<HashSet<PathBuf>> {
    OPEN_FILES.get_or_init(|| Mutex::new(HashSet::new()))
}

/// Process-wide exclusive hold on one dictionary file path.
///
/// Paths are compared as given; callers are expected to use one spelling
/// per directory.
#[derive(Debug)]
pub(crate) struct FileClaim {
    path: PathBuf,
}

impl FileClaim {
    /// `None` if another live store already holds `path`.
    pub(crate) fn acquire(path: &Path) -> Option<Self> {
        let mut held = open_files().lock().unwrap_or_else(PoisonError::into_inner);
        if !held.insert(path.to_path_buf()) {
            return None;
        }
        Some(FileClaim {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for FileClaim {
    fn drop(&mut self) {
        open_files()
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.path);
    }
}

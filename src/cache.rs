//! Local cache: a small persistent key-value store used to paint the last
//! known task list before the first fetch resolves.
//!
//! Cache failures are never reported to callers. Reads that fail look like a
//! miss; writes that fail are logged and dropped.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::{fs, io};

use parking_lot::Mutex;

/// Well-known key holding the JSON task array snapshot.
pub const TASKS_KEY: &str = "tasks_local";

pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// One file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    dir: PathBuf,
}

impl FileCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }

    fn write(&self, key: &str, value: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.entry_path(key);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

impl LocalCache for FileCache {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.entry_path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = self.write(key, value) {
            tracing::debug!(key, error = %e, "cache write dropped");
        }
    }
}

/// In-process cache, lost on exit.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_cache_round_trips_values() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("cache"));
        assert_eq!(cache.get(TASKS_KEY), None);

        cache.set(TASKS_KEY, "[]");
        assert_eq!(cache.get(TASKS_KEY).as_deref(), Some("[]"));

        cache.set(TASKS_KEY, "[1]");
        assert_eq!(cache.get(TASKS_KEY).as_deref(), Some("[1]"));
    }

    #[test]
    fn file_cache_swallows_write_failures() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        let cache = FileCache::new(blocker.join("cache"));
        cache.set(TASKS_KEY, "[]");
        assert_eq!(cache.get(TASKS_KEY), None);
    }

    #[test]
    fn keys_are_sanitized_into_file_names() {
        let cache = FileCache::new("/tmp/x");
        assert_eq!(cache.entry_path("a/b c"), PathBuf::from("/tmp/x/a_b_c.json"));
    }

    #[test]
    fn memory_cache_overwrites() {
        let cache = MemoryCache::new();
        cache.set("k", "1");
        cache.set("k", "2");
        assert_eq!(cache.get("k").as_deref(), Some("2"));
    }
}

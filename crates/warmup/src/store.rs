//! Durable warm-up payload cache.
//!
//! One JSON file per job id under a cache directory. Entries are written
//! once and never updated in place: if a key exists, prefetch is skipped —
//! the destination dashboard revalidates on open, so presence is treated
//! as sufficient freshness for the entry's lifetime. Writes go through a
//! temp file and rename so a crashed write never leaves a half-entry that
//! would wrongly short-circuit future prefetches.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// File-backed key-value store, keyed by job id.
#[derive(Debug, Clone)]
pub struct WarmupStore {
    dir: PathBuf,
}

impl WarmupStore {
    /// Create a store rooted at `dir`. The directory is created lazily on
    /// first write.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Whether an entry exists for `job_id`.
    pub fn contains(&self, job_id: &str) -> bool {
        self.path_for(job_id).exists()
    }

    /// Read the cached payload, `None` when absent.
    pub fn get(&self, job_id: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let path = self.path_for(job_id);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    /// Write the payload for `job_id` atomically (temp file + rename).
    pub fn put(&self, job_id: &str, payload: &serde_json::Value) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        serde_json::to_writer(&mut tmp, payload)?;
        tmp.flush()?;
        tmp.persist(self.path_for(job_id))
            .map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    /// Remove one entry, if present.
    pub fn remove(&self, job_id: &str) -> Result<(), StoreError> {
        let path = self.path_for(job_id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Remove every entry in the store.
    pub fn clear(&self) -> Result<(), StoreError> {
        if !self.dir.exists() {
            return Ok(());
        }
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    /// Map a job id to a filesystem-safe file name.
    fn path_for(&self, job_id: &str) -> PathBuf {
        let safe: String = job_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn temp_store() -> (tempfile::TempDir, WarmupStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = WarmupStore::new(dir.path().join("warmup"));
        (dir, store)
    }

    #[test]
    fn roundtrips_a_payload() {
        let (_guard, store) = temp_store();
        let payload = serde_json::json!({"score": 87, "sections": ["seo", "perf"]});

        assert!(!store.contains("job-1"));
        store.put("job-1", &payload).unwrap();
        assert!(store.contains("job-1"));
        assert_eq!(store.get("job-1").unwrap(), Some(payload));
    }

    #[test]
    fn get_missing_is_none() {
        let (_guard, store) = temp_store();
        assert_eq!(store.get("nope").unwrap(), None);
    }

    #[test]
    fn remove_and_clear() {
        let (_guard, store) = temp_store();
        store.put("a", &serde_json::json!(1)).unwrap();
        store.put("b", &serde_json::json!(2)).unwrap();

        store.remove("a").unwrap();
        assert!(!store.contains("a"));
        assert!(store.contains("b"));

        store.clear().unwrap();
        assert!(!store.contains("b"));
    }

    #[test]
    fn hostile_job_ids_stay_inside_the_store_dir() {
        let (_guard, store) = temp_store();
        store.put("../escape", &serde_json::json!(true)).unwrap();
        assert!(store.contains("../escape"));
        assert!(store.get("../escape").unwrap().is_some());
    }
}

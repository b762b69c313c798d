//! Best-time store - a single named float, read at startup, written on a
//! new best

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed store file: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct BestTimeRecord {
    best_time: f32,
}

/// Shared handle to the persisted best time. The cached value is the source
/// of truth between writes; the file is only touched on an improvement.
#[derive(Clone)]
pub struct BestTimeStore {
    path: Arc<PathBuf>,
    cached: Arc<Mutex<Option<f32>>>,
}

impl BestTimeStore {
    /// Open the store, reading any previously persisted best. A missing
    /// file simply means no best yet; a malformed file is logged and
    /// treated the same.
    pub fn open(path: PathBuf) -> Self {
        let cached = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<BestTimeRecord>(&contents) {
                Ok(record) => {
                    info!(best_time = record.best_time, "Loaded best time");
                    Some(record.best_time)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring malformed best-time file");
                    None
                }
            },
            Err(_) => None,
        };

        Self {
            path: Arc::new(path),
            cached: Arc::new(Mutex::new(cached)),
        }
    }

    /// Current best, if any
    pub fn current(&self) -> Option<f32> {
        *self.cached.lock()
    }

    /// Record a finished time. Persists and returns `true` only when the
    /// time is strictly lower than the stored best, or no best exists.
    pub fn record(&self, elapsed: f32) -> Result<bool, StoreError> {
        let mut cached = self.cached.lock();
        let improved = match *cached {
            Some(best) => elapsed < best,
            None => true,
        };
        if !improved {
            return Ok(false);
        }

        *cached = Some(elapsed);
        let json = serde_json::to_string(&BestTimeRecord { best_time: elapsed })?;
        std::fs::write(self.path.as_ref(), json)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store(name: &str) -> BestTimeStore {
        let path = std::env::temp_dir().join(format!(
            "gapjump_best_time_{}_{}.json",
            name,
            uuid::Uuid::new_v4()
        ));
        BestTimeStore::open(path)
    }

    #[test]
    fn first_time_is_always_a_best() {
        let store = temp_store("first");
        assert_eq!(store.current(), None);
        assert!(store.record(12.5).unwrap());
        assert_eq!(store.current(), Some(12.5));
    }

    #[test]
    fn only_strictly_lower_times_persist() {
        let store = temp_store("lower");
        assert!(store.record(10.0).unwrap());
        assert!(!store.record(10.0).unwrap());
        assert!(!store.record(11.0).unwrap());
        assert!(store.record(9.9).unwrap());
        assert_eq!(store.current(), Some(9.9));
    }

    #[test]
    fn best_survives_reopen() {
        let store = temp_store("reopen");
        store.record(7.25).unwrap();
        let path = store.path.as_ref().clone();

        let reopened = BestTimeStore::open(path);
        assert_eq!(reopened.current(), Some(7.25));
    }

    #[test]
    fn malformed_file_means_no_best() {
        let path = std::env::temp_dir().join(format!(
            "gapjump_best_time_malformed_{}.json",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, "not json").unwrap();
        let store = BestTimeStore::open(path);
        assert_eq!(store.current(), None);
    }
}

//! Preference storage
//!
//! Persists implicit preference records keyed by user id. RocksDB backs the
//! server; the in-memory store serves tests and ephemeral runs.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use rocksdb::{IteratorMode, Options, DB};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{MatchError, Result};
use crate::preference::{PreferenceRecord, UserId};

const USER_PREFIX: &str = "user:";

/// Read-modify-write step applied by [`PreferenceStore::modify`]
///
/// Receives the current record (if any) and returns the record to write, or
/// `None` to leave the store untouched.
pub type RecordUpdate<'a> =
    dyn FnMut(Option<&PreferenceRecord>) -> Result<Option<PreferenceRecord>> + 'a;

/// Store of implicit preference records
///
/// Identity strings are validated here: a malformed id is reported as
/// [`MatchError::InvalidIdentity`], an unregistered one as
/// [`MatchError::UnknownUser`].
pub trait PreferenceStore: Send + Sync {
    /// Load a record by parsed id
    fn load(&self, user_id: &UserId) -> Result<Option<PreferenceRecord>>;

    /// Apply `update` to one user's record as a single step
    ///
    /// No other writer for the same store interleaves between the read handed
    /// to `update` and the write of its result.
    fn modify(&self, user_id: &UserId, update: &mut RecordUpdate<'_>) -> Result<()>;

    /// Number of stored records
    fn user_count(&self) -> usize;

    /// Get a record by raw identity string
    fn get(&self, user_id: &str) -> Result<Option<PreferenceRecord>> {
        let id: UserId = user_id.parse()?;
        self.load(&id)
    }

    /// Create an empty record; returns false if the user already exists
    fn register_user(&self, user_id: &str) -> Result<bool> {
        let id: UserId = user_id.parse()?;
        let mut created = false;
        self.modify(&id, &mut |current| {
            if current.is_some() {
                return Ok(None);
            }
            created = true;
            Ok(Some(PreferenceRecord::new(id.clone())))
        })?;
        Ok(created)
    }

    /// Overwrite the user's implicit categories
    ///
    /// Idempotent: repeating the same call leaves the stored record unchanged
    /// and succeeds again.
    fn update_implicit_categories(&self, user_id: &str, categories: &[String]) -> Result<()> {
        self.update_implicit_categories_unless(user_id, categories, &AtomicBool::new(false))
    }

    /// Overwrite the user's implicit categories unless `cancelled` is set
    ///
    /// The flag is read inside [`PreferenceStore::modify`], so a cancellation
    /// observed there guarantees nothing was written.
    fn update_implicit_categories_unless(
        &self,
        user_id: &str,
        categories: &[String],
        cancelled: &AtomicBool,
    ) -> Result<()> {
        let id: UserId = user_id.parse()?;
        self.modify(&id, &mut |current| {
            if cancelled.load(Ordering::SeqCst) {
                return Err(MatchError::persistence("update cancelled before write"));
            }
            let mut record = current
                .cloned()
                .ok_or_else(|| MatchError::UnknownUser(id.to_string()))?;
            Ok(record.set_implicit_categories(categories).then_some(record))
        })
    }
}

/// RocksDB-based preference store with a write-through cache
pub struct RocksPreferenceStore {
    db: Arc<DB>,
    cache: Arc<DashMap<UserId, PreferenceRecord>>,
    /// Held across read, `db.put` and cache insert
    write_lock: Mutex<()>,
}

impl RocksPreferenceStore {
    /// Open (or create) a store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_max_background_jobs(2);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);

        let db = DB::open(&opts, path)?;

        log::info!("PreferenceStore opened at: {}", path.display());

        let store = Self {
            db: Arc::new(db),
            cache: Arc::new(DashMap::new()),
            write_lock: Mutex::new(()),
        };

        store.load_cache()?;
        Ok(store)
    }

    /// Load existing records into cache on startup
    fn load_cache(&self) -> Result<()> {
        let mut skipped = 0;

        for item in self.db.iterator(IteratorMode::Start) {
            let (key, value) = item?;
            let key_str = String::from_utf8_lossy(&key);

            let Some(raw_id) = key_str.strip_prefix(USER_PREFIX) else {
                continue;
            };

            // Gracefully handle corrupt entries
            match bincode::deserialize::<PreferenceRecord>(&value) {
                Ok(record) => {
                    self.cache.insert(record.user_id.clone(), record);
                }
                Err(e) => {
                    log::warn!("Failed to deserialize preferences {}: {}. Skipping.", raw_id, e);
                    skipped += 1;
                }
            }
        }

        log::info!("Loaded {} preference records from disk", self.cache.len());
        if skipped > 0 {
            log::warn!("Skipped {} records due to deserialization errors", skipped);
        }
        Ok(())
    }

    fn key(user_id: &UserId) -> String {
        format!("{}{}", USER_PREFIX, user_id)
    }
}

impl PreferenceStore for RocksPreferenceStore {
    fn load(&self, user_id: &UserId) -> Result<Option<PreferenceRecord>> {
        Ok(self.cache.get(user_id).map(|e| e.clone()))
    }

    fn modify(&self, user_id: &UserId, update: &mut RecordUpdate<'_>) -> Result<()> {
        let _guard = self.write_lock.lock();

        let current = self.cache.get(user_id).map(|e| e.clone());
        let Some(record) = update(current.as_ref())? else {
            return Ok(());
        };

        let key = Self::key(user_id);
        self.db.put(key.as_bytes(), bincode::serialize(&record)?)?;
        self.db.flush()?;
        self.cache.insert(user_id.clone(), record);
        Ok(())
    }

    fn user_count(&self) -> usize {
        self.cache.len()
    }
}

/// Process-local store; contents are lost on exit
#[derive(Default)]
pub struct InMemoryPreferenceStore {
    records: DashMap<UserId, PreferenceRecord>,
}

impl InMemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for InMemoryPreferenceStore {
    fn load(&self, user_id: &UserId) -> Result<Option<PreferenceRecord>> {
        Ok(self.records.get(user_id).map(|e| e.clone()))
    }

    fn modify(&self, user_id: &UserId, update: &mut RecordUpdate<'_>) -> Result<()> {
        // The entry guard locks the shard until the write lands
        match self.records.entry(user_id.clone()) {
            Entry::Occupied(mut entry) => {
                if let Some(record) = update(Some(entry.get()))? {
                    entry.insert(record);
                }
            }
            Entry::Vacant(entry) => {
                if let Some(record) = update(None)? {
                    entry.insert(record);
                }
            }
        }
        Ok(())
    }

    fn user_count(&self) -> usize {
        self.records.len()
    }
}

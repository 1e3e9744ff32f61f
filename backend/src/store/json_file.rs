use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info};

use super::{Database, StoreError};

/// File-backed JSON record store.
///
/// The document lives in memory behind a single lock. Each [`write`](Self::write)
/// runs against a working copy which is persisted with one atomic file replace
/// and only then becomes the live state, so a failed closure or a failed write
/// leaves both memory and disk untouched. Holding the lock for the whole
/// sequence also serialises every writer.
pub struct JsonFileStore {
    path: Option<PathBuf>,
    db: Mutex<Database>,
}

impl JsonFileStore {
    /// Loads the document at `path`. When the file does not exist yet the
    /// store starts from `seed` (written out immediately) or empty.
    pub fn open(path: impl Into<PathBuf>, seed: Option<Database>) -> Result<Self, StoreError> {
        let path = path.into();
        if path.exists() {
            let bytes = fs::read(&path)?;
            let db: Database = serde_json::from_slice(&bytes)?;
            info!(
                "📂 Loaded record store from {} ({} users, {} transactions, {} investments)",
                path.display(),
                db.users.len(),
                db.transactions.len(),
                db.investments.len()
            );
            return Ok(Self { path: Some(path), db: Mutex::new(db) });
        }

        let store = Self { path: Some(path), db: Mutex::new(Database::default()) };
        if let Some(seed) = seed {
            store.persist(&seed)?;
            *store.db.lock() = seed;
            info!("🌱 Seeded new record store at {}", store.path_display());
        }
        Ok(store)
    }

    /// A store that never touches the filesystem.
    pub fn in_memory(db: Database) -> Self {
        Self { path: None, db: Mutex::new(db) }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn read<R>(&self, f: impl FnOnce(&Database) -> R) -> R {
        let db = self.db.lock();
        f(&db)
    }

    /// Applies `f` as one atomic, persisted change.
    pub fn write<R, E>(&self, f: impl FnOnce(&mut Database) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut live = self.db.lock();
        let mut working = live.clone();
        let result = f(&mut working)?;
        self.persist(&working)?;
        *live = working;
        Ok(result)
    }

    fn persist(&self, db: &Database) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let bytes = serde_json::to_vec_pretty(db)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, path)?;
        debug!("Persisted record store to {}", path.display());
        Ok(())
    }

    fn path_display(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<memory>".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use bigdecimal::BigDecimal;
    use tempfile::tempdir;

    #[test]
    fn test_committed_writes_survive_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("db.json");

        let store = JsonFileStore::open(&path, None).unwrap();
        let user = store
            .write(|db| Ok::<_, StoreError>(db.insert_user(User::new("Ana".into(), "ana@example.com", BigDecimal::from(10)))))
            .unwrap();
        assert!(path.exists());

        let reopened = JsonFileStore::open(&path, None).unwrap();
        let loaded = reopened.read(|db| db.get_user(user.id).cloned());
        assert_eq!(loaded, Some(user));
    }

    #[test]
    fn test_seed_only_applies_to_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");

        let mut seed = Database::default();
        seed.insert_user(User::new("Seed".into(), "seed@example.com", BigDecimal::from(1)));
        let store = JsonFileStore::open(&path, Some(seed.clone())).unwrap();
        assert_eq!(store.read(|db| db.users.len()), 1);

        store
            .write(|db| {
                db.users.clear();
                Ok::<_, StoreError>(())
            })
            .unwrap();

        let reopened = JsonFileStore::open(&path, Some(seed)).unwrap();
        assert!(reopened.read(|db| db.users.is_empty()));
    }

    #[test]
    fn test_failed_closure_discards_changes() {
        let store = JsonFileStore::in_memory(Database::default());
        let result: Result<(), StoreError> = store.write(|db| {
            db.insert_user(User::new("Ghost".into(), "ghost@example.com", BigDecimal::from(0)));
            Err(StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, "rejected")))
        });
        assert!(result.is_err());
        assert!(store.read(|db| db.users.is_empty()));
    }

    #[test]
    fn test_failed_persist_leaves_state_untouched() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let store = JsonFileStore::open(blocker.join("db.json"), None).unwrap();
        let result = store.write(|db| {
            Ok::<_, StoreError>(db.insert_user(User::new("Ana".into(), "ana@example.com", BigDecimal::from(0))))
        });

        assert!(matches!(result, Err(StoreError::Io(_))));
        assert!(store.read(|db| db.users.is_empty()));
    }
}

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use crate::atomic::{read_optional, write_replacing};
use crate::error::StoreError;
use crate::paths::default_credential_path;
use crate::schema::CredentialRecord;

/// Load/save seam for the single-user credential record.
pub trait CredentialStore {
    /// `Ok(None)` when nothing has been stored yet.
    fn load(&self) -> Result<Option<CredentialRecord>, StoreError>;

    /// Replaces any previously stored record.
    fn save(&self, record: &CredentialRecord) -> Result<(), StoreError>;
}

/// Credential record persisted as one JSON object on disk.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn at_default_location() -> Result<Self, StoreError> {
        Ok(Self::new(default_credential_path()?))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<CredentialRecord>, StoreError> {
        let Some(content) = read_optional(&self.path)? else {
            tracing::debug!(path = %self.path.display(), "no credential file");
            return Ok(None);
        };

        serde_json::from_str::<CredentialRecord>(&content)
            .map(Some)
            .map_err(|source| StoreError::json_parse(&self.path, source))
    }

    fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        let mut bytes = serde_json::to_vec(record)
            .map_err(|source| StoreError::json_serialize(&self.path, source))?;
        bytes.push(b'\n');
        write_replacing(&self.path, &bytes, true)?;
        tracing::info!(path = %self.path.display(), "saved credential record");
        Ok(())
    }
}

/// In-process credential store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    record: Option<CredentialRecord>,
    saves: usize,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_record(record: CredentialRecord) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                record: Some(record),
                saves: 0,
            }),
        }
    }

    #[must_use]
    pub fn record(&self) -> Option<CredentialRecord> {
        lock_unpoisoned(&self.state).record.clone()
    }

    /// Number of `save` calls observed.
    #[must_use]
    pub fn save_count(&self) -> usize {
        lock_unpoisoned(&self.state).saves
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.record())
    }

    fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        let mut state = lock_unpoisoned(&self.state);
        state.record = Some(record.clone());
        state.saves += 1;
        Ok(())
    }
}

impl<T> CredentialStore for &T
where
    T: CredentialStore + ?Sized,
{
    fn load(&self) -> Result<Option<CredentialRecord>, StoreError> {
        (**self).load()
    }

    fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        (**self).save(record)
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

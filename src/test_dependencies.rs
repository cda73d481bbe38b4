// Recording fakes for the storage, database and mail collaborators, so the
// full router can be driven in tests without Postgres or network access.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::config::CityConfig;
use crate::models::submission::SubmissionRow;
use crate::services::{
    catalog_service::JobCatalog,
    notification_service::{MailTransport, NotificationDispatcher, NotificationError, OutboundEmail},
    storage_service::{ObjectStorage, StorageError, UploadPolicy, UploadService},
    submission_store::{PersistenceError, SubmissionStore},
};
use crate::AppState;

const MIB: usize = 1024 * 1024;

// =============================================================================
// Submission store
// =============================================================================

#[derive(Default)]
pub struct SpySubmissionStore {
    rows: Mutex<Vec<SubmissionRow>>,
    fail_with: Option<String>,
}

impl SpySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every insert fails with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn rows(&self) -> Vec<SubmissionRow> {
        self.rows.lock().unwrap().clone()
    }

    pub fn insert_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl SubmissionStore for SpySubmissionStore {
    async fn insert(&self, row: &SubmissionRow) -> Result<(), PersistenceError> {
        if let Some(message) = &self.fail_with {
            return Err(PersistenceError::Rejected {
                table: row.table(),
                message: message.clone(),
            });
        }
        self.rows.lock().unwrap().push(row.clone());
        Ok(())
    }
}

// =============================================================================
// Object storage
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub mime: String,
    pub len: usize,
}

#[derive(Default)]
pub struct SpyObjectStorage {
    puts: Mutex<Vec<StoredObject>>,
    deletes: Mutex<Vec<(String, String)>>,
    fail_puts: bool,
}

impl SpyObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_puts: true,
            ..Self::default()
        }
    }

    pub fn puts(&self) -> Vec<StoredObject> {
        self.puts.lock().unwrap().clone()
    }

    pub fn deletes(&self) -> Vec<(String, String)> {
        self.deletes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorage for SpyObjectStorage {
    async fn put(&self, bucket: &str, key: &str, bytes: Bytes, mime: &str) -> Result<String, StorageError> {
        if self.fail_puts {
            return Err(StorageError::Status {
                status: 503,
                body: "storage unavailable".to_string(),
            });
        }
        self.puts.lock().unwrap().push(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            mime: mime.to_string(),
            len: bytes.len(),
        });
        Ok(format!("https://storage.test/{}/{}", bucket, key))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        self.deletes
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string()));
        Ok(())
    }
}

// =============================================================================
// Mail
// =============================================================================

#[derive(Default)]
pub struct SpyMailTransport {
    sent: Mutex<Vec<OutboundEmail>>,
}

impl SpyMailTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for SpyMailTransport {
    async fn send(&self, email: &OutboundEmail) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

// =============================================================================
// Wiring
// =============================================================================

pub struct TestDependencies {
    pub city: CityConfig,
    pub store: Arc<SpySubmissionStore>,
    pub storage: Arc<SpyObjectStorage>,
    pub mail: Option<Arc<dyn MailTransport>>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            city: CityConfig::new("Eindhoven"),
            store: Arc::new(SpySubmissionStore::new()),
            storage: Arc::new(SpyObjectStorage::new()),
            mail: None,
        }
    }

    pub fn with_store(mut self, store: SpySubmissionStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn with_storage(mut self, storage: SpyObjectStorage) -> Self {
        self.storage = Arc::new(storage);
        self
    }

    pub fn with_mail(mut self, mail: Arc<dyn MailTransport>) -> Self {
        self.mail = Some(mail);
        self
    }

    /// Bundled catalog, 5 MiB CV and 2 MiB logo ceilings.
    pub fn app_state(&self) -> AppState {
        let catalog = JobCatalog::bundled(&self.city).expect("bundled catalog is valid");
        let uploads = UploadService::new(
            self.storage.clone(),
            "job-applications",
            "employer-logos",
            UploadPolicy::cv(5 * MIB),
            UploadPolicy::logo(2 * MIB),
            Duration::from_secs(5),
        );
        let notifications = NotificationDispatcher::new(
            self.mail.clone(),
            "staff@studentjobs.test",
            true,
            self.city.clone(),
        );
        AppState::from_services(
            Arc::new(catalog),
            self.city.clone(),
            uploads,
            self.store.clone(),
            notifications,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}

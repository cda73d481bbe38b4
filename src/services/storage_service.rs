use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Serialize;

use crate::config::{Config, StorageBackend};
use crate::dto::form_dto::UploadedFile;
use crate::models::submission::StoredFile;
use crate::utils::keys::{file_extension, sanitize_name};
use crate::utils::time::monotonic_millis;

/// Failure inside a storage backend. Never shown to users verbatim.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Storage responded {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Storage call timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid object key: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadErrorReason {
    InvalidType,
    TooLarge,
    BackendFailure,
}

#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct UploadError {
    pub reason: UploadErrorReason,
    pub message: String,
    #[source]
    pub cause: Option<StorageError>,
}

impl UploadError {
    fn invalid_type(message: impl Into<String>) -> Self {
        Self {
            reason: UploadErrorReason::InvalidType,
            message: message.into(),
            cause: None,
        }
    }

    fn too_large(message: impl Into<String>) -> Self {
        Self {
            reason: UploadErrorReason::TooLarge,
            message: message.into(),
            cause: None,
        }
    }

    fn backend(message: impl Into<String>, cause: StorageError) -> Self {
        Self {
            reason: UploadErrorReason::BackendFailure,
            message: message.into(),
            cause: Some(cause),
        }
    }

    pub fn user_message(&self) -> &str {
        &self.message
    }
}

/// Object storage collaborator: write returns the public URL, delete is by key.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, bucket: &str, key: &str, bytes: Bytes, mime: &str)
        -> Result<String, StorageError>;

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError>;
}

fn check_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() || key.starts_with('/') || key.split('/').any(|part| part == ".." || part.is_empty()) {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Files under `<root>/<bucket>/<key>`, served by the static file layer.
#[derive(Debug, Clone)]
pub struct LocalDiskStorage {
    root: PathBuf,
    public_base_url: String,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl ObjectStorage for LocalDiskStorage {
    async fn put(&self, bucket: &str, key: &str, bytes: Bytes, _mime: &str) -> Result<String, StorageError> {
        check_key(key)?;
        let path = self.root.join(bucket).join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // create_new keeps an existing object from being overwritten
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        tokio::io::AsyncWriteExt::write_all(&mut file, &bytes).await?;
        tokio::io::AsyncWriteExt::flush(&mut file).await?;

        Ok(format!("{}/{}/{}", self.public_base_url, bucket, key))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        check_key(key)?;
        tokio::fs::remove_file(self.root.join(bucket).join(key)).await?;
        Ok(())
    }
}

/// Supabase Storage over its REST API.
#[derive(Clone)]
pub struct SupabaseStorage {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, service_key: String, timeout: Duration) -> Result<Self, StorageError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        })
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, key)
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{}", self.base_url, bucket, key)
    }

    async fn check_status(res: reqwest::Response) -> Result<(), StorageError> {
        let status = res.status();
        if status.is_success() {
            return Ok(());
        }
        let body = res.text().await.unwrap_or_default();
        Err(StorageError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn put(&self, bucket: &str, key: &str, bytes: Bytes, mime: &str) -> Result<String, StorageError> {
        check_key(key)?;
        let res = self
            .client
            .post(self.object_url(bucket, key))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header(reqwest::header::CONTENT_TYPE, mime)
            .header(reqwest::header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;
        Self::check_status(res).await?;
        Ok(self.public_url(bucket, key))
    }

    async fn delete(&self, bucket: &str, key: &str) -> Result<(), StorageError> {
        check_key(key)?;
        let res = self
            .client
            .delete(self.object_url(bucket, key))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .send()
            .await?;
        Self::check_status(res).await
    }
}

/// Allowed MIME types with the extensions accepted for each. The first
/// extension is the canonical one.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub label: &'static str,
    pub allowed: &'static [(&'static str, &'static [&'static str])],
    pub max_bytes: usize,
}

pub const CV_TYPES: &[(&str, &[&str])] = &[
    ("application/pdf", &["pdf"]),
    ("application/msword", &["doc"]),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        &["docx"],
    ),
];

pub const LOGO_TYPES: &[(&str, &[&str])] = &[
    ("image/jpeg", &["jpg", "jpeg"]),
    ("image/jpg", &["jpg", "jpeg"]),
    ("image/png", &["png"]),
    ("image/webp", &["webp"]),
];

impl UploadPolicy {
    pub fn cv(max_bytes: usize) -> Self {
        Self {
            label: "CV",
            allowed: CV_TYPES,
            max_bytes,
        }
    }

    pub fn logo(max_bytes: usize) -> Self {
        Self {
            label: "Logo",
            allowed: LOGO_TYPES,
            max_bytes,
        }
    }

    fn extensions_for(&self, mime: &str) -> Option<&'static [&'static str]> {
        self.allowed
            .iter()
            .find(|(allowed, _)| allowed.eq_ignore_ascii_case(mime))
            .map(|(_, exts)| *exts)
    }

    /// Type, then size, then content. Returns the extension to store under.
    pub fn check(&self, file: &UploadedFile) -> Result<String, UploadError> {
        let mime = file
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let Some(exts) = self.extensions_for(&mime) else {
            return Err(UploadError::invalid_type(format!(
                "Invalid file type. Allowed: {}",
                self.allowed
                    .iter()
                    .map(|(m, _)| *m)
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        };

        if file.bytes.len() > self.max_bytes {
            return Err(UploadError::too_large(format!(
                "{} file size must be less than {}MB",
                self.label,
                self.max_bytes / (1024 * 1024)
            )));
        }

        if !content_matches(&mime, &file.bytes) {
            return Err(UploadError::invalid_type(format!(
                "{} file content does not match its type",
                self.label
            )));
        }

        let ext = file_extension(&file.filename)
            .filter(|ext| exts.contains(&ext.as_str()))
            .unwrap_or_else(|| exts[0].to_string());
        Ok(ext)
    }
}

/// Magic-byte check for the formats that have a cheap signature.
fn content_matches(mime: &str, data: &[u8]) -> bool {
    match mime {
        "application/pdf" => data.starts_with(b"%PDF"),
        "image/png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47]),
        "image/jpeg" | "image/jpg" => data.starts_with(&[0xFF, 0xD8]),
        "image/webp" => data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP",
        _ => true,
    }
}

/// Upload adapter: policy check, key generation and the backend write.
#[derive(Clone)]
pub struct UploadService {
    storage: Arc<dyn ObjectStorage>,
    cv_bucket: String,
    logo_bucket: String,
    cv_policy: UploadPolicy,
    logo_policy: UploadPolicy,
    timeout: Duration,
}

impl UploadService {
    pub fn new(
        storage: Arc<dyn ObjectStorage>,
        cv_bucket: impl Into<String>,
        logo_bucket: impl Into<String>,
        cv_policy: UploadPolicy,
        logo_policy: UploadPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            storage,
            cv_bucket: cv_bucket.into(),
            logo_bucket: logo_bucket.into(),
            cv_policy,
            logo_policy,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, StorageError> {
        let storage: Arc<dyn ObjectStorage> = match &config.storage {
            StorageBackend::Local {
                uploads_dir,
                public_base_url,
            } => {
                tracing::info!(dir = %uploads_dir.display(), "Using local upload storage");
                Arc::new(LocalDiskStorage::new(uploads_dir.clone(), public_base_url.clone()))
            }
            StorageBackend::Supabase { url, service_key } => {
                tracing::info!(url = %url, "Using Supabase upload storage");
                Arc::new(SupabaseStorage::new(url, service_key.clone(), config.storage_timeout)?)
            }
        };
        Ok(Self::new(
            storage,
            config.cv_bucket.clone(),
            config.logo_bucket.clone(),
            UploadPolicy::cv(config.max_cv_bytes),
            UploadPolicy::logo(config.max_logo_bytes),
            config.storage_timeout,
        ))
    }

    pub fn cv_bucket(&self) -> &str {
        &self.cv_bucket
    }

    pub fn logo_bucket(&self) -> &str {
        &self.logo_bucket
    }

    pub async fn upload_cv(
        &self,
        file: &UploadedFile,
        job_slug: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<StoredFile, UploadError> {
        let ext = self.cv_policy.check(file)?;
        let key = format!(
            "{}/{}-{}.{}",
            sanitize_name(job_slug),
            sanitize_name(&format!("{}-{}", first_name, last_name)),
            monotonic_millis(),
            ext
        );
        self.put(&self.cv_bucket, key, file, "Failed to upload CV. Please try again.")
            .await
    }

    pub async fn upload_logo(&self, file: &UploadedFile, company: &str) -> Result<StoredFile, UploadError> {
        let ext = self.logo_policy.check(file)?;
        let key = format!("{}-{}.{}", sanitize_name(company), monotonic_millis(), ext);
        self.put(&self.logo_bucket, key, file, "Failed to upload logo. Please try again.")
            .await
    }

    async fn put(
        &self,
        bucket: &str,
        key: String,
        file: &UploadedFile,
        failure_message: &str,
    ) -> Result<StoredFile, UploadError> {
        let mime = file.content_type.split(';').next().unwrap_or_default().trim().to_string();
        let write = self.storage.put(bucket, &key, file.bytes.clone(), &mime);
        let result = match tokio::time::timeout(self.timeout, write).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(self.timeout)),
        };

        match result {
            Ok(public_url) => {
                tracing::info!(bucket = %bucket, key = %key, bytes = file.bytes.len(), "Upload stored");
                Ok(StoredFile {
                    path: key,
                    public_url,
                    filename: file.filename.clone(),
                    mime,
                })
            }
            Err(e) => {
                tracing::error!(tag = "storage_upload_error", bucket = %bucket, key = %key, error = %e, "Upload failed");
                Err(UploadError::backend(failure_message, e))
            }
        }
    }

    /// Best-effort removal. Failures are logged and swallowed.
    pub async fn delete(&self, bucket: &str, key: &str) {
        let result = match tokio::time::timeout(self.timeout, self.storage.delete(bucket, key)).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(self.timeout)),
        };
        match result {
            Ok(()) => tracing::info!(bucket = %bucket, key = %key, "Upload removed"),
            Err(e) => {
                tracing::error!(tag = "storage_delete_error", bucket = %bucket, key = %key, error = %e, "Failed to remove upload")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIB: usize = 1024 * 1024;

    fn png(len: usize) -> Vec<u8> {
        let mut data = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        data.resize(len.max(8), 0);
        data
    }

    #[test]
    fn logo_policy_accepts_allowed_types() {
        let policy = UploadPolicy::logo(2 * MIB);
        let file = UploadedFile::new("Logo.PNG", "image/png", png(1024));
        assert_eq!(policy.check(&file).unwrap(), "png");

        let mut webp = b"RIFF\0\0\0\0WEBP".to_vec();
        webp.extend_from_slice(&[0; 8]);
        let file = UploadedFile::new("logo.webp", "image/webp", webp);
        assert_eq!(policy.check(&file).unwrap(), "webp");
    }

    #[test]
    fn type_outside_allow_list_is_rejected() {
        let policy = UploadPolicy::logo(2 * MIB);
        let file = UploadedFile::new("logo.gif", "image/gif", b"GIF89a".to_vec());
        assert_eq!(policy.check(&file).unwrap_err().reason, UploadErrorReason::InvalidType);

        let cv = UploadPolicy::cv(5 * MIB);
        let file = UploadedFile::new("cv.exe", "application/octet-stream", b"MZ".to_vec());
        assert_eq!(cv.check(&file).unwrap_err().reason, UploadErrorReason::InvalidType);
    }

    #[test]
    fn oversize_is_too_large() {
        let policy = UploadPolicy::logo(2 * MIB);
        let file = UploadedFile::new("logo.png", "image/png", png(3 * MIB));
        let err = policy.check(&file).unwrap_err();
        assert_eq!(err.reason, UploadErrorReason::TooLarge);
        assert_eq!(err.user_message(), "Logo file size must be less than 2MB");
    }

    #[test]
    fn content_must_match_declared_type() {
        let policy = UploadPolicy::cv(5 * MIB);
        let file = UploadedFile::new("cv.pdf", "application/pdf", b"<html>".to_vec());
        assert_eq!(policy.check(&file).unwrap_err().reason, UploadErrorReason::InvalidType);
    }

    #[test]
    fn extension_falls_back_to_canonical() {
        let policy = UploadPolicy::cv(5 * MIB);
        let file = UploadedFile::new("resume", "application/pdf; charset=binary", b"%PDF-1.7".to_vec());
        assert_eq!(policy.check(&file).unwrap(), "pdf");

        let file = UploadedFile::new("resume.txt", "application/pdf", b"%PDF-1.7".to_vec());
        assert_eq!(policy.check(&file).unwrap(), "pdf");
    }

    #[test]
    fn keys_cannot_escape_the_bucket() {
        assert!(check_key("../etc/passwd").is_err());
        assert!(check_key("/abs").is_err());
        assert!(check_key("ib-tutor/anna-klein-1.pdf").is_ok());
    }

    #[tokio::test]
    async fn local_disk_round_trip() {
        let root = std::env::temp_dir().join(format!("uploads-test-{}", uuid::Uuid::new_v4()));
        let storage = LocalDiskStorage::new(&root, "/uploads/");
        let url = storage
            .put("employer-logos", "acme-1.png", Bytes::from_static(b"x"), "image/png")
            .await
            .unwrap();
        assert_eq!(url, "/uploads/employer-logos/acme-1.png");

        // same key twice never overwrites
        assert!(storage
            .put("employer-logos", "acme-1.png", Bytes::from_static(b"y"), "image/png")
            .await
            .is_err());

        storage.delete("employer-logos", "acme-1.png").await.unwrap();
        assert!(!root.join("employer-logos/acme-1.png").exists());
        let _ = std::fs::remove_dir_all(root);
    }
}

use std::collections::HashMap;

use axum::{
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Form,
};
use bytes::Bytes;

use crate::error::{Error, Result};

/// Name of the hidden field humans never fill in.
pub const HONEYPOT_FIELD: &str = "website";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Browsers send an empty part, or the literal name `undefined`, when no
    /// file was picked.
    pub fn is_placeholder(&self) -> bool {
        self.bytes.is_empty() || self.filename.trim().is_empty() || self.filename == "undefined"
    }
}

/// Form input exactly as posted: string fields plus file parts, nothing typed.
/// A repeated field keeps every value; reads see the first one.
#[derive(Debug, Clone, Default)]
pub struct RawForm {
    fields: HashMap<String, Vec<String>>,
    files: HashMap<String, UploadedFile>,
}

impl RawForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `name` to exactly `value`, replacing anything posted before.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), vec![value.into()]);
        self
    }

    fn push_field(&mut self, name: String, value: String) {
        self.fields.entry(name).or_default().push(value);
    }

    pub fn with_file(mut self, name: impl Into<String>, file: UploadedFile) -> Self {
        self.files.insert(name.into(), file);
        self
    }

    pub fn raw(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Trimmed value, `None` when absent or blank.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.raw(name).map(str::trim).filter(|v| !v.is_empty())
    }

    pub fn owned(&self, name: &str) -> Option<String> {
        self.text(name).map(str::to_string)
    }

    /// The uploaded file under `name`, skipping empty placeholders.
    pub fn file(&self, name: &str) -> Option<&UploadedFile> {
        self.files.get(name).filter(|f| !f.is_placeholder())
    }

    /// Any non-empty `website` value counts, not only the first.
    pub fn honeypot_tripped(&self) -> bool {
        self.fields
            .get(HONEYPOT_FIELD)
            .is_some_and(|values| values.iter().any(|v| !v.is_empty()))
    }

    async fn from_multipart(multipart: &mut Multipart) -> Result<Self> {
        let mut form = Self::new();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name.is_empty() {
                continue;
            }
            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let bytes = field.bytes().await?;
                    form.files
                        .entry(name)
                        .or_insert_with(|| UploadedFile::new(filename, content_type, bytes));
                }
                None => {
                    let value = field.text().await?;
                    form.push_field(name, value);
                }
            }
        }
        Ok(form)
    }
}

#[axum::async_trait]
impl<S> FromRequest<S> for RawForm
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"))
            .unwrap_or(false);

        if is_multipart {
            let mut multipart = Multipart::from_request(req, state).await.map_err(|e| {
                tracing::warn!(tag = "form_rejected", error = %e.body_text(), "Invalid multipart request");
                Error::BadRequest("Invalid form submission.".into())
            })?;
            return Self::from_multipart(&mut multipart).await;
        }

        let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
            .await
            .map_err(|e| {
                tracing::warn!(tag = "form_rejected", error = %e.body_text(), "Invalid urlencoded request");
                Error::BadRequest("Invalid form submission.".into())
            })?;

        let mut form = Self::new();
        for (name, value) in pairs {
            form.push_field(name, value);
        }
        Ok(form)
    }
}

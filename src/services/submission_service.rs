use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::CityConfig;
use crate::dto::form_dto::RawForm;
use crate::error::Result;
use crate::models::submission::{StoredFile, SubmissionRow};
use crate::services::catalog_service::JobCatalog;
use crate::services::notification_service::{NotificationDispatcher, NotificationEvent};
use crate::services::storage_service::UploadService;
use crate::services::submission_store::SubmissionStore;
use crate::services::validation_service::{
    validate_contact, validate_employer_submission, validate_job_application, validate_newsletter,
    ValidationError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted,
    /// Honeypot tripped. Callers answer exactly as for `Accepted`.
    Deflected,
}

/// Runs every form through the same steps: honeypot, validation, optional
/// upload, one insert, then detached notification.
#[derive(Clone)]
pub struct SubmissionService {
    catalog: Arc<JobCatalog>,
    city: CityConfig,
    uploads: UploadService,
    store: Arc<dyn SubmissionStore>,
    notifications: NotificationDispatcher,
}

fn log_rejected(form_name: &'static str, err: &ValidationError) {
    warn!(
        tag = "validation_failed",
        form = form_name,
        field = %err.field,
        reason = ?err.reason,
        "Submission rejected"
    );
}

impl SubmissionService {
    pub fn new(
        catalog: Arc<JobCatalog>,
        city: CityConfig,
        uploads: UploadService,
        store: Arc<dyn SubmissionStore>,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            catalog,
            city,
            uploads,
            store,
            notifications,
        }
    }

    fn deflect(form_name: &'static str) -> SubmissionOutcome {
        info!(tag = "honeypot_tripped", form = form_name, "Bot submission deflected");
        SubmissionOutcome::Deflected
    }

    /// Inserts the row. When that fails, an upload made for it is removed.
    async fn persist(
        &self,
        row: SubmissionRow,
        uploaded: Option<(&str, &StoredFile)>,
        error_tag: &'static str,
    ) -> Result<()> {
        if let Err(e) = self.store.insert(&row).await {
            error!(tag = error_tag, table = row.table(), error = %e, "Insert failed");
            if let Some((bucket, file)) = uploaded {
                self.uploads.delete(bucket, &file.path).await;
            }
            return Err(e.into());
        }
        Ok(())
    }

    pub async fn submit_job_application(
        &self,
        form: &RawForm,
        source_url: Option<String>,
    ) -> Result<SubmissionOutcome> {
        if form.honeypot_tripped() {
            return Ok(Self::deflect("job_apply"));
        }

        let application = validate_job_application(form, &self.catalog, &self.city)
            .inspect_err(|e| log_rejected("job_apply", e))?;

        let cv = match form.file("cv") {
            Some(file) => Some(
                self.uploads
                    .upload_cv(
                        file,
                        &application.job_slug,
                        &application.first_name,
                        &application.last_name,
                    )
                    .await
                    .inspect_err(|e| {
                        error!(tag = "cv_upload_error", job_slug = %application.job_slug, reason = ?e.reason, error = %e, "CV rejected")
                    })?,
            ),
            None => None,
        };

        let application = match &cv {
            Some(stored) => application.with_cv(stored),
            None => application,
        }
        .with_source_url(source_url);
        let job_slug = application.job_slug.clone();

        self.persist(
            SubmissionRow::JobApplication(application),
            cv.as_ref().map(|f| (self.uploads.cv_bucket(), f)),
            "job_apply_error",
        )
        .await?;

        info!(job_slug = %job_slug, has_cv = cv.is_some(), "Job application stored");
        Ok(SubmissionOutcome::Accepted)
    }

    pub async fn submit_employer_job(&self, form: &RawForm) -> Result<SubmissionOutcome> {
        if form.honeypot_tripped() {
            return Ok(Self::deflect("employer_job"));
        }

        let submission = validate_employer_submission(form, &self.city, Uuid::new_v4())
            .inspect_err(|e| log_rejected("employer_job", e))?;

        let logo = match form.file("logo") {
            Some(file) => Some(
                self.uploads
                    .upload_logo(file, &submission.company)
                    .await
                    .inspect_err(|e| {
                        error!(tag = "logo_upload_error", company = %submission.company, reason = ?e.reason, error = %e, "Logo rejected")
                    })?,
            ),
            None => None,
        };

        let submission = match &logo {
            Some(stored) => submission.with_logo(stored),
            None => submission,
        };

        self.persist(
            SubmissionRow::EmployerJob(submission.clone()),
            logo.as_ref().map(|f| (self.uploads.logo_bucket(), f)),
            "employer_job_error",
        )
        .await?;

        info!(id = %submission.id, company = %submission.company, plan = submission.plan.as_str(), "Employer job stored");
        self.notifications.dispatch(NotificationEvent::EmployerJobSubmitted {
            submission,
            received_at: Utc::now(),
        });
        Ok(SubmissionOutcome::Accepted)
    }

    pub async fn submit_contact(&self, form: &RawForm) -> Result<SubmissionOutcome> {
        if form.honeypot_tripped() {
            return Ok(Self::deflect("contact"));
        }

        let message = validate_contact(form, Utc::now()).inspect_err(|e| log_rejected("contact", e))?;
        self.persist(SubmissionRow::Contact(message.clone()), None, "contact_error")
            .await?;

        info!(email = %message.email, "Contact message stored");
        self.notifications
            .dispatch(NotificationEvent::ContactReceived { message });
        Ok(SubmissionOutcome::Accepted)
    }

    pub async fn subscribe_newsletter(&self, form: &RawForm) -> Result<SubmissionOutcome> {
        if form.honeypot_tripped() {
            return Ok(Self::deflect("newsletter"));
        }

        let lead = validate_newsletter(form, &self.city, Utc::now())
            .inspect_err(|e| log_rejected("newsletter", e))?;
        let city = lead.city.clone();
        self.persist(SubmissionRow::Newsletter(lead), None, "newsletter_error")
            .await?;

        info!(city = %city, "Newsletter lead stored");
        Ok(SubmissionOutcome::Accepted)
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::{Employment, JobCategory};

/// Reference to an object that has been written to storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub path: String,
    pub public_url: String,
    pub filename: String,
    pub mime: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobApplication {
    pub job_slug: String,
    pub job_title: Option<String>,
    pub org_name: Option<String>,
    pub city: String,
    pub first_name: String,
    pub last_name: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: Option<String>,
    pub consent: bool,
    pub consent_this_ad: bool,
    pub consent_similar_ads: bool,
    pub cv_path: Option<String>,
    pub cv_filename: Option<String>,
    pub cv_mime: Option<String>,
    pub source_url: Option<String>,
}

impl JobApplication {
    pub fn with_cv(self, cv: &StoredFile) -> Self {
        Self {
            cv_path: Some(cv.path.clone()),
            cv_filename: Some(cv.filename.clone()),
            cv_mime: Some(cv.mime.clone()),
            ..self
        }
    }

    pub fn with_source_url(self, source_url: Option<String>) -> Self {
        Self { source_url, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingPlan {
    #[default]
    Basic,
    Featured,
    Premium,
}

impl PricingPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingPlan::Basic => "basic",
            PricingPlan::Featured => "featured",
            PricingPlan::Premium => "premium",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "basic" => Some(PricingPlan::Basic),
            "featured" => Some(PricingPlan::Featured),
            "premium" => Some(PricingPlan::Premium),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployerJobSubmission {
    pub id: Uuid,
    pub company: String,
    pub contact_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub job_title: String,
    pub employment_type: Employment,
    pub category: JobCategory,
    pub city: String,
    pub area: Option<String>,
    pub base_salary_min: Option<Decimal>,
    pub base_salary_max: Option<Decimal>,
    pub english_friendly: bool,
    pub description: String,
    pub plan: PricingPlan,
    pub plan_price_eur: Option<Decimal>,
    pub external_url: Option<String>,
    pub logo_url: Option<String>,
    pub logo_alt: Option<String>,
    pub status: String,
}

impl EmployerJobSubmission {
    pub fn with_logo(self, logo: &StoredFile) -> Self {
        Self {
            logo_url: Some(logo.public_url.clone()),
            ..self
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactMessage {
    pub name: Option<String>,
    pub email: String,
    pub subject: Option<String>,
    pub message: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsletterLead {
    pub name: Option<String>,
    pub email: String,
    pub city: String,
    pub submitted_at: DateTime<Utc>,
}

/// One row bound for exactly one table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "table", content = "row", rename_all = "snake_case")]
pub enum SubmissionRow {
    JobApplication(JobApplication),
    EmployerJob(EmployerJobSubmission),
    Contact(ContactMessage),
    Newsletter(NewsletterLead),
}

impl SubmissionRow {
    pub fn table(&self) -> &'static str {
        match self {
            SubmissionRow::JobApplication(_) => "job_applications",
            SubmissionRow::EmployerJob(_) => "employer_job_submissions",
            SubmissionRow::Contact(_) => "contact_messages",
            SubmissionRow::Newsletter(_) => "newsletter_leads",
        }
    }
}

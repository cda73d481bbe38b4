use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::models::submission::{
    ContactMessage, EmployerJobSubmission, JobApplication, NewsletterLead, SubmissionRow,
};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("Insert into {table} failed: {source}")]
    Database {
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("Insert into {table} timed out after {timeout:?}")]
    Timeout {
        table: &'static str,
        timeout: Duration,
    },

    #[error("Insert into {table} rejected: {message}")]
    Rejected { table: &'static str, message: String },
}

impl PersistenceError {
    pub fn table(&self) -> &'static str {
        match self {
            PersistenceError::Database { table, .. }
            | PersistenceError::Timeout { table, .. }
            | PersistenceError::Rejected { table, .. } => table,
        }
    }

    /// Retry invitation for the client. Backend detail stays in the logs.
    pub fn user_message(&self) -> &'static str {
        match self.table() {
            "job_applications" => "Failed to submit application. Please try again.",
            "employer_job_submissions" => "Failed to submit your job posting. Please try again.",
            "contact_messages" => "Failed to send your message. Please try again.",
            "newsletter_leads" => "Failed to subscribe. Please try again.",
            _ => "An unexpected error occurred. Please try again later.",
        }
    }
}

/// Write-only relational store: one row into one table, no read-back.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn insert(&self, row: &SubmissionRow) -> Result<(), PersistenceError>;
}

#[derive(Clone)]
pub struct PgSubmissionStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgSubmissionStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn insert_job_application(&self, row: &JobApplication) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO job_applications (
                job_slug, job_title, org_name, city,
                first_name, last_name, name, email, phone, message,
                consent, consent_this_ad, consent_similar_ads,
                cv_path, cv_filename, cv_mime, source_url
            ) VALUES (
                $1, $2, $3, $4,
                $5, $6, $7, $8, $9, $10,
                $11, $12, $13,
                $14, $15, $16, $17
            )
            "#,
        )
        .bind(&row.job_slug)
        .bind(&row.job_title)
        .bind(&row.org_name)
        .bind(&row.city)
        .bind(&row.first_name)
        .bind(&row.last_name)
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.phone)
        .bind(&row.message)
        .bind(row.consent)
        .bind(row.consent_this_ad)
        .bind(row.consent_similar_ads)
        .bind(&row.cv_path)
        .bind(&row.cv_filename)
        .bind(&row.cv_mime)
        .bind(&row.source_url)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_employer_job(&self, row: &EmployerJobSubmission) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO employer_job_submissions (
                id, company, contact_name, email, phone,
                job_title, employment_type, category, city, area,
                base_salary_min, base_salary_max, english_friendly, description,
                plan, plan_price_eur, external_url, logo_url, logo_alt, status
            ) VALUES (
                $1, $2, $3, $4, $5,
                $6, $7, $8, $9, $10,
                $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20
            )
            "#,
        )
        .bind(row.id)
        .bind(&row.company)
        .bind(&row.contact_name)
        .bind(&row.email)
        .bind(&row.phone)
        .bind(&row.job_title)
        .bind(row.employment_type.as_str())
        .bind(row.category.as_str())
        .bind(&row.city)
        .bind(&row.area)
        .bind(row.base_salary_min)
        .bind(row.base_salary_max)
        .bind(row.english_friendly)
        .bind(&row.description)
        .bind(row.plan.as_str())
        .bind(row.plan_price_eur)
        .bind(&row.external_url)
        .bind(&row.logo_url)
        .bind(&row.logo_alt)
        .bind(&row.status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_contact(&self, row: &ContactMessage) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO contact_messages (name, email, subject, message, submitted_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.subject)
        .bind(&row.message)
        .bind(row.submitted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn insert_newsletter(&self, row: &NewsletterLead) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO newsletter_leads (name, email, city, submitted_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.city)
        .bind(row.submitted_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn insert(&self, row: &SubmissionRow) -> Result<(), PersistenceError> {
        let table = row.table();
        let insert = async {
            match row {
                SubmissionRow::JobApplication(r) => self.insert_job_application(r).await,
                SubmissionRow::EmployerJob(r) => self.insert_employer_job(r).await,
                SubmissionRow::Contact(r) => self.insert_contact(r).await,
                SubmissionRow::Newsletter(r) => self.insert_newsletter(r).await,
            }
        };

        match tokio::time::timeout(self.timeout, insert).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(PersistenceError::Database { table, source }),
            Err(_) => Err(PersistenceError::Timeout {
                table,
                timeout: self.timeout,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_hides_backend_detail() {
        let err = PersistenceError::Database {
            table: "job_applications",
            source: sqlx::Error::PoolTimedOut,
        };
        assert_eq!(err.user_message(), "Failed to submit application. Please try again.");
        assert!(err.to_string().contains("job_applications"));

        let err = PersistenceError::Timeout {
            table: "newsletter_leads",
            timeout: Duration::from_secs(5),
        };
        assert_eq!(err.user_message(), "Failed to subscribe. Please try again.");
    }
}

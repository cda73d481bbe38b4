use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::config::CityConfig;
use crate::dto::form_dto::RawForm;
use crate::models::job::{Employment, JobCategory};
use crate::models::submission::{
    ContactMessage, EmployerJobSubmission, JobApplication, NewsletterLead, PricingPlan,
};
use crate::services::catalog_service::JobCatalog;
use crate::utils::form::{is_email, to_bool};

const INVALID_EMAIL: &str = "Please enter a valid email address.";
const MONEY_SCALE: u32 = 2;

fn max_money() -> Decimal {
    Decimal::new(99_999_999_99, MONEY_SCALE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    Missing,
    InvalidFormat,
    ConsentRequired,
    UnknownJob,
    OutOfRange,
}

/// A rejected form field. `message` is safe to show to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: String,
    pub reason: ValidationReason,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &str, reason: ValidationReason, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            reason,
            message: message.into(),
        }
    }

    pub fn missing(field: &str, message: impl Into<String>) -> Self {
        Self::new(field, ValidationReason::Missing, message)
    }

    pub fn invalid_format(field: &str, message: impl Into<String>) -> Self {
        Self::new(field, ValidationReason::InvalidFormat, message)
    }
}

fn required<'a>(form: &'a RawForm, field: &str, message: &str) -> Result<&'a str, ValidationError> {
    form.text(field)
        .ok_or_else(|| ValidationError::missing(field, message))
}

fn required_email(form: &RawForm, field: &str) -> Result<String, ValidationError> {
    let email = required(form, field, INVALID_EMAIL)?;
    if !is_email(email) {
        return Err(ValidationError::invalid_format(field, INVALID_EMAIL));
    }
    Ok(email.to_string())
}

fn optional_decimal(form: &RawForm, field: &str, label: &str) -> Result<Option<Decimal>, ValidationError> {
    let Some(raw) = form.text(field) else {
        return Ok(None);
    };
    let value: Decimal = raw
        .replace(',', ".")
        .parse()
        .map_err(|_| ValidationError::invalid_format(field, format!("{} must be a number.", label)))?;
    if value.is_sign_negative() {
        return Err(ValidationError::new(
            field,
            ValidationReason::OutOfRange,
            format!("{} cannot be negative.", label),
        ));
    }
    // Stored as NUMERIC(10, 2).
    if value.normalize().scale() > MONEY_SCALE {
        return Err(ValidationError::invalid_format(
            field,
            format!("{} can have at most {} decimal places.", label, MONEY_SCALE),
        ));
    }
    if value > max_money() {
        return Err(ValidationError::new(
            field,
            ValidationReason::OutOfRange,
            format!("{} is too large.", label),
        ));
    }
    Ok(Some(value))
}

/// Parses a job application. The consent gate runs before every other check,
/// so an application without consent always fails with `consent_required`.
pub fn validate_job_application(
    form: &RawForm,
    catalog: &JobCatalog,
    city: &CityConfig,
) -> Result<JobApplication, ValidationError> {
    let consent_this_ad = to_bool(form.raw("consentThisAd"));
    if !consent_this_ad {
        return Err(ValidationError::new(
            "consentThisAd",
            ValidationReason::ConsentRequired,
            "Consent for this job application is required.",
        ));
    }

    let job_slug = required(form, "jobSlug", "Missing job slug.")?;
    let first_name = required(form, "firstName", "Missing first name.")?;
    let last_name = required(form, "familyName", "Missing family name.")?;
    let email = required_email(form, "email")?;

    let job = catalog.get_job_by_slug(job_slug).ok_or_else(|| {
        ValidationError::new(
            "jobSlug",
            ValidationReason::UnknownJob,
            "This job is no longer available.",
        )
    })?;

    let city = form
        .text("city")
        .map(str::to_lowercase)
        .unwrap_or_else(|| city.default_city.clone());

    Ok(JobApplication {
        job_slug: job_slug.to_string(),
        job_title: form
            .owned("jobTitle")
            .or_else(|| Some(job.posting().title.clone())),
        org_name: form
            .owned("orgName")
            .or_else(|| Some(job.posting().org_name.clone())),
        city,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        name: format!("{} {}", first_name, last_name).trim().to_string(),
        email,
        phone: form.owned("phone"),
        message: form.owned("message"),
        consent: consent_this_ad,
        consent_this_ad,
        consent_similar_ads: to_bool(form.raw("consentSimilarAds")),
        cv_path: None,
        cv_filename: None,
        cv_mime: None,
        source_url: None,
    })
}

#[derive(Debug, Validate)]
struct EmployerFieldLimits {
    #[validate(length(max = 200))]
    company: String,
    #[validate(length(max = 200))]
    contact_name: String,
    #[validate(length(max = 200))]
    job_title: String,
    #[validate(length(max = 120))]
    area: Option<String>,
    #[validate(length(max = 40))]
    phone: Option<String>,
    #[validate(length(max = 20000))]
    description: String,
    #[validate(url)]
    external_url: Option<String>,
}

fn form_field_name(field: &str) -> (&'static str, &'static str) {
    match field {
        "company" => ("company", "Company name"),
        "contact_name" => ("contactName", "Contact name"),
        "job_title" => ("jobTitle", "Job title"),
        "area" => ("area", "Area"),
        "phone" => ("phone", "Phone number"),
        "description" => ("description", "Description"),
        "external_url" => ("externalUrl", "External URL"),
        _ => ("form", "Field"),
    }
}

/// Deterministic pick of the first failing field.
fn first_limit_error(errors: &ValidationErrors) -> ValidationError {
    let mut fields: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .map(|(name, errs)| {
            let code = errs
                .first()
                .map(|e| e.code.to_string())
                .unwrap_or_default();
            (name.to_string(), code)
        })
        .collect();
    fields.sort();

    let Some((name, code)) = fields.into_iter().next() else {
        return ValidationError::invalid_format("form", "Invalid form submission.");
    };
    let (field, label) = form_field_name(&name);
    if code == "url" {
        ValidationError::invalid_format(field, "Please enter a valid URL (https://...).")
    } else {
        ValidationError::new(
            field,
            ValidationReason::OutOfRange,
            format!("{} is too long.", label),
        )
    }
}

/// Parses an employer's job posting. `id` is assigned by the caller so the
/// function stays deterministic.
pub fn validate_employer_submission(
    form: &RawForm,
    city: &CityConfig,
    id: Uuid,
) -> Result<EmployerJobSubmission, ValidationError> {
    let company = required(form, "company", "Missing company name.")?;
    let contact_name = required(form, "contactName", "Missing contact name.")?;
    let email = required_email(form, "email")?;
    let job_title = required(form, "jobTitle", "Missing job title.")?;
    let description = required(form, "description", "Missing job description.")?;

    let category_raw = required(form, "category", "Please choose a category.")?;
    let category = JobCategory::parse(category_raw)
        .filter(|c| city.categories.contains(c))
        .ok_or_else(|| ValidationError::invalid_format("category", "Please choose a valid category."))?;

    let employment_type = match form.text("employmentType") {
        None => Employment::default(),
        Some(raw) => Employment::parse(raw).ok_or_else(|| {
            ValidationError::invalid_format("employmentType", "Please choose a valid employment type.")
        })?,
    };

    let plan = match form.text("plan") {
        None => PricingPlan::default(),
        Some(raw) => PricingPlan::parse(raw)
            .ok_or_else(|| ValidationError::invalid_format("plan", "Please choose a valid plan."))?,
    };

    let base_salary_min = optional_decimal(form, "baseSalaryMin", "Minimum salary")?;
    let base_salary_max = optional_decimal(form, "baseSalaryMax", "Maximum salary")?;
    if let (Some(min), Some(max)) = (base_salary_min, base_salary_max) {
        if min > max {
            return Err(ValidationError::new(
                "baseSalaryMax",
                ValidationReason::OutOfRange,
                "Minimum salary cannot exceed maximum salary.",
            ));
        }
    }
    let plan_price_eur = optional_decimal(form, "planPriceEur", "Plan price")?;

    let external_url = form.owned("externalUrl");
    let limits = EmployerFieldLimits {
        company: company.to_string(),
        contact_name: contact_name.to_string(),
        job_title: job_title.to_string(),
        area: form.owned("area"),
        phone: form.owned("phone"),
        description: description.to_string(),
        external_url: external_url.clone(),
    };
    if let Err(errors) = limits.validate() {
        return Err(first_limit_error(&errors));
    }
    if let Some(ref raw) = external_url {
        let scheme_ok = url::Url::parse(raw)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !scheme_ok {
            return Err(ValidationError::invalid_format(
                "externalUrl",
                "Please enter a valid URL (https://...).",
            ));
        }
    }

    Ok(EmployerJobSubmission {
        id,
        company: limits.company,
        contact_name: limits.contact_name,
        email,
        phone: limits.phone,
        job_title: limits.job_title,
        employment_type,
        category,
        city: form
            .owned("city")
            .unwrap_or_else(|| city.city_name.clone()),
        area: limits.area,
        base_salary_min,
        base_salary_max,
        english_friendly: to_bool(form.raw("englishFriendly")),
        description: limits.description,
        plan,
        plan_price_eur,
        external_url,
        logo_url: None,
        logo_alt: form.owned("logoAlt"),
        status: "pending".to_string(),
    })
}

pub fn validate_contact(
    form: &RawForm,
    submitted_at: DateTime<Utc>,
) -> Result<ContactMessage, ValidationError> {
    let email = required_email(form, "email")?;
    let message = required(form, "message", "Please enter a message.")?;

    Ok(ContactMessage {
        name: form.owned("name"),
        email,
        subject: form.owned("subject"),
        message: message.to_string(),
        submitted_at,
    })
}

pub fn validate_newsletter(
    form: &RawForm,
    city: &CityConfig,
    submitted_at: DateTime<Utc>,
) -> Result<NewsletterLead, ValidationError> {
    let email = required_email(form, "email")?;

    Ok(NewsletterLead {
        name: form.owned("name"),
        email,
        city: form
            .owned("city")
            .unwrap_or_else(|| city.city_name.clone()),
        submitted_at,
    })
}

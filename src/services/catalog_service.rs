use std::collections::HashSet;
use std::path::Path;

use crate::config::CityConfig;
use crate::models::job::{JobCategory, JobPosting, JobRecord};
use crate::utils::html::strip_html;

const BUNDLED_JOBS: &str = include_str!("../../data/jobs.json");

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to parse job list: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to read job list: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid job '{slug}': {reason}")]
    InvalidRecord { slug: String, reason: String },
}

/// The read-only job list for one city deployment. Order is the source
/// list's insertion order.
#[derive(Debug, Clone)]
pub struct JobCatalog {
    records: Vec<JobRecord>,
}

fn invalid(posting: &JobPosting, reason: impl Into<String>) -> CatalogError {
    CatalogError::InvalidRecord {
        slug: posting.slug.clone(),
        reason: reason.into(),
    }
}

fn is_url_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn check_posting(posting: &JobPosting, city: &CityConfig) -> Result<(), CatalogError> {
    if !is_url_safe_slug(&posting.slug) {
        return Err(invalid(posting, "slug must be lowercase letters, digits and hyphens"));
    }
    if let (Some(min), Some(max)) = (posting.base_salary_min, posting.base_salary_max) {
        if min > max {
            return Err(invalid(posting, "baseSalaryMin exceeds baseSalaryMax"));
        }
    }
    if let Some(valid_through) = posting.valid_through {
        if valid_through < posting.date_posted {
            return Err(invalid(posting, "validThrough is before datePosted"));
        }
    }
    if posting.categories.is_empty() {
        return Err(invalid(posting, "at least one category is required"));
    }
    if let Some(category) = posting
        .categories
        .iter()
        .find(|c| !city.categories.contains(c))
    {
        return Err(invalid(
            posting,
            format!("category '{}' is not offered in {}", category.as_str(), city.city_name),
        ));
    }
    if !posting
        .address_locality
        .trim()
        .eq_ignore_ascii_case(&city.city_name)
    {
        return Err(invalid(
            posting,
            format!("addressLocality must be {}", city.city_name),
        ));
    }
    Ok(())
}

impl JobCatalog {
    /// Checks every posting and derives its summary. The first invalid posting
    /// aborts the build.
    pub fn build(city: &CityConfig, postings: Vec<JobPosting>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(postings.len());

        for posting in postings {
            check_posting(&posting, city)?;
            if !seen.insert(posting.slug.clone()) {
                tracing::warn!(
                    tag = "catalog_duplicate_slug",
                    slug = %posting.slug,
                    "Duplicate job slug, lookups return the first entry"
                );
            }
            records.push(JobRecord::new(posting));
        }

        Ok(Self { records })
    }

    pub fn from_json(city: &CityConfig, json: &str) -> Result<Self, CatalogError> {
        let postings: Vec<JobPosting> = serde_json::from_str(json)?;
        Self::build(city, postings)
    }

    pub fn bundled(city: &CityConfig) -> Result<Self, CatalogError> {
        Self::from_json(city, BUNDLED_JOBS)
    }

    pub fn load(city: &CityConfig, jobs_file: Option<&Path>) -> Result<Self, CatalogError> {
        let catalog = match jobs_file {
            Some(path) => {
                let json = std::fs::read_to_string(path)?;
                Self::from_json(city, &json)?
            }
            None => Self::bundled(city)?,
        };
        tracing::info!(
            jobs = catalog.records.len(),
            featured = catalog.list_featured_jobs().count(),
            source = jobs_file.map(|p| p.display().to_string()).unwrap_or_else(|| "bundled".into()),
            "Job catalog loaded"
        );
        Ok(catalog)
    }

    pub fn list_jobs(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn list_featured_jobs(&self) -> impl Iterator<Item = &JobRecord> {
        self.records.iter().filter(|r| r.posting().featured)
    }

    pub fn get_job_by_slug(&self, slug: &str) -> Option<&JobRecord> {
        self.records.iter().find(|r| r.slug() == slug)
    }

    /// Job count per category, in the deployment's category order.
    pub fn category_counts(&self, city: &CityConfig) -> Vec<(JobCategory, usize)> {
        city.categories
            .iter()
            .map(|&category| {
                let count = filter_by_category(self.records.iter(), category).count();
                (category, count)
            })
            .collect()
    }
}

pub fn filter_by_category<'a>(
    records: impl Iterator<Item = &'a JobRecord>,
    category: JobCategory,
) -> impl Iterator<Item = &'a JobRecord> {
    records.filter(move |r| r.posting().has_category(category))
}

pub fn filter_by_english_friendly<'a>(
    records: impl Iterator<Item = &'a JobRecord>,
    english_friendly: bool,
) -> impl Iterator<Item = &'a JobRecord> {
    records.filter(move |r| r.posting().english_friendly == english_friendly)
}

/// Case-insensitive match on title, organisation and the tag-free description.
/// A blank query matches everything.
pub fn search<'a>(
    records: impl Iterator<Item = &'a JobRecord>,
    text: &str,
) -> impl Iterator<Item = &'a JobRecord> {
    let needle = text.trim().to_lowercase();
    records.filter(move |r| {
        if needle.is_empty() {
            return true;
        }
        let posting = r.posting();
        posting.title.to_lowercase().contains(&needle)
            || posting.org_name.to_lowercase().contains(&needle)
            || strip_html(&posting.description_html)
                .to_lowercase()
                .contains(&needle)
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_catalog() -> JobCatalog {
        JobCatalog::bundled(&CityConfig::new("Eindhoven")).unwrap()
    }

    fn posting(slug: &str) -> JobPosting {
        serde_json::from_value(serde_json::json!({
            "slug": slug,
            "title": "Barista",
            "orgName": "Koffiehuis",
            "descriptionHtml": "<p>Make coffee.</p>",
            "addressLocality": "Eindhoven",
            "datePosted": "2026-01-10",
            "categories": ["hospitality"]
        }))
        .unwrap()
    }

    #[test]
    fn bundled_list_keeps_source_order() {
        let catalog = sample_catalog();
        let slugs: Vec<&str> = catalog.list_jobs().iter().map(|r| r.slug()).collect();
        assert_eq!(slugs[0], "domakin-agent-eindhoven");
        assert_eq!(slugs[1], "ib-tutor");
        assert_eq!(slugs.len(), 5);
    }

    #[test]
    fn featured_is_an_ordered_subsequence() {
        let catalog = sample_catalog();
        let featured: Vec<&str> = catalog.list_featured_jobs().map(|r| r.slug()).collect();
        assert!(!featured.contains(&"uber-eats-courier-eindhoven"));
        assert_eq!(featured.first(), Some(&"domakin-agent-eindhoven"));
    }

    #[test]
    fn bundled_summaries_are_derived() {
        let catalog = sample_catalog();
        let domakin = catalog.get_job_by_slug("domakin-agent-eindhoven").unwrap();
        assert_eq!(
            domakin.short_description(),
            "€30 per gig — €300 per sale — Domakin helps students in the Netherlands find housing."
        );
        let tutor = catalog.get_job_by_slug("ib-tutor").unwrap();
        assert!(tutor
            .short_description()
            .starts_with("High hourly pay depending on subject and experience — "));
    }

    #[test]
    fn lookup_returns_first_duplicate() {
        let city = CityConfig::new("Eindhoven");
        let mut second = posting("barista");
        second.title = "Second".into();
        let catalog = JobCatalog::build(&city, vec![posting("barista"), second]).unwrap();
        assert_eq!(catalog.get_job_by_slug("barista").unwrap().posting().title, "Barista");
        assert!(catalog.get_job_by_slug("missing").is_none());
    }

    #[test]
    fn rejects_inverted_salary_range() {
        let city = CityConfig::new("Eindhoven");
        let mut bad = posting("barista");
        bad.base_salary_min = Some(20.into());
        bad.base_salary_max = Some(10.into());
        let err = JobCatalog::build(&city, vec![bad]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRecord { .. }));
    }

    #[test]
    fn rejects_foreign_locality_and_bad_slug() {
        let city = CityConfig::new("Eindhoven");
        let mut foreign = posting("barista");
        foreign.address_locality = "Amsterdam".into();
        assert!(JobCatalog::build(&city, vec![foreign]).is_err());
        assert!(JobCatalog::build(&city, vec![posting("Bad Slug")]).is_err());
    }

    #[test]
    fn rejects_expiry_before_posting() {
        let city = CityConfig::new("Eindhoven");
        let mut bad = posting("barista");
        bad.valid_through = chrono::NaiveDate::from_ymd_opt(2025, 12, 31);
        assert!(JobCatalog::build(&city, vec![bad]).is_err());
    }

    #[test]
    fn filters_compose() {
        let catalog = sample_catalog();
        let delivery_english: Vec<&str> = filter_by_english_friendly(
            filter_by_category(catalog.list_jobs().iter(), JobCategory::Delivery),
            true,
        )
        .map(|r| r.slug())
        .collect();
        assert_eq!(
            delivery_english,
            vec!["thuisbezorgd-takeaway-courier-netherlands", "uber-eats-courier-eindhoven"]
        );
    }

    #[test]
    fn search_matches_description_text_case_insensitively() {
        let catalog = sample_catalog();
        let hits: Vec<&str> = search(catalog.list_jobs().iter(), "ACADEMIAAI")
            .map(|r| r.slug())
            .collect();
        assert_eq!(hits, vec!["ib-tutor"]);

        // tag names are not searchable text
        assert_eq!(search(catalog.list_jobs().iter(), "<strong>").count(), 0);
        assert_eq!(search(catalog.list_jobs().iter(), "  ").count(), 5);
    }

    #[test]
    fn category_counts_cover_every_category() {
        let city = CityConfig::new("Eindhoven");
        let counts = sample_catalog().category_counts(&city);
        assert_eq!(counts.len(), JobCategory::ALL.len());
        assert!(counts.contains(&(JobCategory::Delivery, 2)));
        assert!(counts.contains(&(JobCategory::Retail, 0)));
    }
}

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::utils::html::{first_sentence, strip_html};
use crate::utils::time::parse_date;

pub const SHORT_DESCRIPTION_MAX_CHARS: usize = 180;
pub const SHORT_DESCRIPTION_SEPARATOR: &str = " — ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobCategory {
    Delivery,
    Sales,
    Hospitality,
    Retail,
    Tutoring,
    Events,
    Fieldwork,
}

impl JobCategory {
    pub const ALL: [JobCategory; 7] = [
        JobCategory::Delivery,
        JobCategory::Sales,
        JobCategory::Hospitality,
        JobCategory::Retail,
        JobCategory::Tutoring,
        JobCategory::Events,
        JobCategory::Fieldwork,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobCategory::Delivery => "delivery",
            JobCategory::Sales => "sales",
            JobCategory::Hospitality => "hospitality",
            JobCategory::Retail => "retail",
            JobCategory::Tutoring => "tutoring",
            JobCategory::Events => "events",
            JobCategory::Fieldwork => "fieldwork",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobCategory::Delivery => "Delivery",
            JobCategory::Sales => "Sales",
            JobCategory::Hospitality => "Hospitality",
            JobCategory::Retail => "Retail",
            JobCategory::Tutoring => "Tutoring",
            JobCategory::Events => "Events",
            JobCategory::Fieldwork => "Fieldwork",
        }
    }

    /// Case-insensitive lookup; anything outside the vocabulary is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Employment {
    #[default]
    PartTime,
    FullTime,
    Contractor,
    Temporary,
    Intern,
    Volunteer,
}

impl Employment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Employment::PartTime => "PART_TIME",
            Employment::FullTime => "FULL_TIME",
            Employment::Contractor => "CONTRACTOR",
            Employment::Temporary => "TEMPORARY",
            Employment::Intern => "INTERN",
            Employment::Volunteer => "VOLUNTEER",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim().replace(&['-', ' '][..], "_");
        [
            Employment::PartTime,
            Employment::FullTime,
            Employment::Contractor,
            Employment::Temporary,
            Employment::Intern,
            Employment::Volunteer,
        ]
        .into_iter()
        .find(|e| e.as_str().eq_ignore_ascii_case(&raw))
    }

    /// `PART_TIME` -> `part time`, for human-readable emails.
    pub fn display_name(&self) -> String {
        self.as_str().to_lowercase().replace('_', " ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "EUR")]
    Eur,
}

impl Currency {
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Eur => "€",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayUnit {
    Hour,
    Month,
}

fn de_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("Invalid date: {}", raw)))
}

fn de_opt_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => parse_date(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("Invalid date: {}", raw))),
    }
}

/// A job posting as authored in the source list. The derived summary lives on
/// [`JobRecord`] and cannot be set here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub slug: String,
    pub title: String,
    pub org_name: String,
    pub description_html: String,
    #[serde(default)]
    pub employment_type: Employment,

    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub base_salary_min: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub base_salary_max: Option<Decimal>,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub pay_unit: Option<PayUnit>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub per_gig_amount: Option<Decimal>,
    #[serde(default)]
    pub per_gig_amount_text: Option<String>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub per_sale_amount: Option<Decimal>,
    #[serde(default)]
    pub per_sale_amount_text: Option<String>,

    pub address_locality: String,
    #[serde(default)]
    pub address_region: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub area: Option<String>,

    #[serde(default)]
    pub english_friendly: bool,
    #[serde(default, rename = "DUO")]
    pub duo: bool,
    #[serde(default)]
    pub featured: bool,

    #[serde(default)]
    pub work_hours: Option<String>,
    #[serde(deserialize_with = "de_date")]
    pub date_posted: NaiveDate,
    #[serde(default, deserialize_with = "de_opt_date")]
    pub valid_through: Option<NaiveDate>,

    pub categories: Vec<JobCategory>,
    #[serde(default)]
    pub external_url: Option<String>,

    #[serde(default)]
    pub logo_url: Option<String>,
    #[serde(default)]
    pub logo_alt: Option<String>,
    #[serde(default)]
    pub hero_image_url: Option<String>,
    #[serde(default)]
    pub hero_image_alt: Option<String>,
    #[serde(default)]
    pub brand_color: Option<String>,
}

impl JobPosting {
    pub fn short_description(&self) -> String {
        short_description(
            self.currency,
            PayLabel::new(self.per_gig_amount, self.per_gig_amount_text.as_deref()),
            PayLabel::new(self.per_sale_amount, self.per_sale_amount_text.as_deref()),
            &self.description_html,
        )
    }

    pub fn has_category(&self, category: JobCategory) -> bool {
        self.categories.contains(&category)
    }
}

/// One commission-style pay input: a positive amount wins over the free text.
#[derive(Debug, Clone, Copy)]
pub struct PayLabel<'a> {
    pub amount: Option<Decimal>,
    pub text: Option<&'a str>,
}

impl<'a> PayLabel<'a> {
    pub fn new(amount: Option<Decimal>, text: Option<&'a str>) -> Self {
        Self { amount, text }
    }

    fn render(&self, currency: Currency, unit: &str) -> Option<String> {
        match self.amount {
            Some(amount) if amount > Decimal::ZERO => Some(format!(
                "{}{} per {}",
                currency.symbol(),
                amount.normalize(),
                unit
            )),
            _ => self
                .text
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        }
    }
}

/// Gig label, then sale label, then the first sentence of the stripped
/// description, joined by [`SHORT_DESCRIPTION_SEPARATOR`].
pub fn short_description(
    currency: Currency,
    gig: PayLabel<'_>,
    sale: PayLabel<'_>,
    description_html: &str,
) -> String {
    let description = first_sentence(&strip_html(description_html), SHORT_DESCRIPTION_MAX_CHARS);

    [
        gig.render(currency, "gig"),
        sale.render(currency, "sale"),
        Some(description),
    ]
    .into_iter()
    .flatten()
    .filter(|part| !part.is_empty())
    .collect::<Vec<_>>()
    .join(SHORT_DESCRIPTION_SEPARATOR)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyTarget<'a> {
    External(&'a str),
    Internal,
}

/// A posting plus its derived summary. Only the catalog builds these, so the
/// summary is always in step with its inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    #[serde(flatten)]
    posting: JobPosting,
    short_description: String,
}

impl JobRecord {
    pub(crate) fn new(posting: JobPosting) -> Self {
        let short_description = posting.short_description();
        Self {
            posting,
            short_description,
        }
    }

    pub fn posting(&self) -> &JobPosting {
        &self.posting
    }

    pub fn slug(&self) -> &str {
        &self.posting.slug
    }

    pub fn short_description(&self) -> &str {
        &self.short_description
    }

    pub fn apply_target(&self) -> ApplyTarget<'_> {
        match self.posting.external_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => ApplyTarget::External(url),
            _ => ApplyTarget::Internal,
        }
    }
}

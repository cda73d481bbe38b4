use crate::error::{Error, Result};
use crate::models::job::JobCategory;
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

const MIB: usize = 1024 * 1024;

/// Per-deployment city settings. Everything city-specific flows from here.
#[derive(Debug, Clone)]
pub struct CityConfig {
    pub city_name: String,
    pub canonical_host: String,
    pub default_city: String,
    pub categories: Vec<JobCategory>,
}

impl CityConfig {
    pub fn new(city_name: impl Into<String>) -> Self {
        let city_name = city_name.into();
        let slug: String = city_name
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        Self {
            canonical_host: format!("studentjobs{}.nl", slug),
            default_city: city_name.to_lowercase(),
            categories: JobCategory::ALL.to_vec(),
            city_name,
        }
    }

    pub fn site_name(&self) -> String {
        format!("Student Jobs {}", self.city_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Local {
        uploads_dir: PathBuf,
        public_base_url: String,
    },
    Supabase {
        url: String,
        service_key: String,
    },
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub from_address: Option<String>,
    pub from_name: String,
    pub receiver: Option<String>,
    pub send_employer_confirmation: bool,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub environment: String,
    pub enable_emails: bool,
    pub city: CityConfig,
    pub jobs_file: Option<PathBuf>,
    pub storage: StorageBackend,
    pub cv_bucket: String,
    pub logo_bucket: String,
    pub max_cv_bytes: usize,
    pub max_logo_bytes: usize,
    pub max_body_bytes: usize,
    pub storage_timeout: Duration,
    pub db_timeout: Duration,
    pub mail: MailConfig,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let city_name = env::var("CITY_NAME").unwrap_or_else(|_| "Eindhoven".to_string());
        let mut city = CityConfig::new(city_name);
        if let Ok(host) = env::var("CANONICAL_HOST") {
            city.canonical_host = host;
        }
        if let Ok(default_city) = env::var("DEFAULT_CITY") {
            city.default_city = default_city.trim().to_lowercase();
        }

        let storage = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .as_str()
        {
            "local" => StorageBackend::Local {
                uploads_dir: env::var("UPLOADS_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from("./uploads")),
                public_base_url: env::var("PUBLIC_UPLOADS_URL")
                    .unwrap_or_else(|_| "/uploads".to_string()),
            },
            "supabase" => StorageBackend::Supabase {
                url: get_env("SUPABASE_URL")?,
                service_key: get_env("SUPABASE_SERVICE_KEY")?,
            },
            other => {
                return Err(Error::Config(format!(
                    "Invalid value for STORAGE_BACKEND: {}",
                    other
                )))
            }
        };

        let mail = MailConfig {
            api_url: env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com/emails".to_string()),
            api_key: non_empty_env("MAIL_API_KEY"),
            from_address: non_empty_env("MAIL_FROM_ADDRESS"),
            from_name: env::var("MAIL_FROM_NAME").unwrap_or_else(|_| city.site_name()),
            receiver: non_empty_env("MAIL_RECEIVER"),
            send_employer_confirmation: get_env_bool("SEND_EMPLOYER_CONFIRMATION", true),
            timeout: Duration::from_secs(get_env_parse_or("MAIL_TIMEOUT_SECS", 10)?),
        };

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "production".to_string()),
            enable_emails: get_env_bool("ENABLE_EMAILS", false),
            city,
            jobs_file: non_empty_env("JOBS_FILE").map(PathBuf::from),
            storage,
            cv_bucket: env::var("CV_BUCKET").unwrap_or_else(|_| "job-applications".to_string()),
            logo_bucket: env::var("LOGO_BUCKET").unwrap_or_else(|_| "employer-logos".to_string()),
            max_cv_bytes: get_env_parse_or("MAX_CV_BYTES", 5 * MIB)?,
            max_logo_bytes: get_env_parse_or("MAX_LOGO_BYTES", 2 * MIB)?,
            max_body_bytes: get_env_parse_or("MAX_BODY_BYTES", 12 * MIB)?,
            storage_timeout: Duration::from_secs(get_env_parse_or("STORAGE_TIMEOUT_SECS", 15)?),
            db_timeout: Duration::from_secs(get_env_parse_or("DB_TIMEOUT_SECS", 5)?),
            mail,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Email goes out unless we're in development without the opt-in, or the
    /// transport is missing its key, sender or staff inbox.
    pub fn emails_enabled(&self) -> bool {
        if self.environment.eq_ignore_ascii_case("development") && !self.enable_emails {
            return false;
        }
        self.mail.api_key.is_some() && self.mail.from_address.is_some() && self.mail.receiver.is_some()
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_mail(mail: MailConfig) -> Config {
        Config {
            server_address: "127.0.0.1:8080".into(),
            database_url: "postgres://localhost/studentjobs".into(),
            environment: "production".into(),
            enable_emails: false,
            city: CityConfig::new("Eindhoven"),
            jobs_file: None,
            storage: StorageBackend::Local {
                uploads_dir: PathBuf::from("./uploads"),
                public_base_url: "/uploads".into(),
            },
            cv_bucket: "job-applications".into(),
            logo_bucket: "employer-logos".into(),
            max_cv_bytes: 5 * MIB,
            max_logo_bytes: 2 * MIB,
            max_body_bytes: 12 * MIB,
            storage_timeout: Duration::from_secs(15),
            db_timeout: Duration::from_secs(5),
            mail,
        }
    }

    fn full_mail() -> MailConfig {
        MailConfig {
            api_url: "https://mail.test/emails".into(),
            api_key: Some("key".into()),
            from_address: Some("jobs@studentjobs.test".into()),
            from_name: "Student Jobs Eindhoven".into(),
            receiver: Some("staff@studentjobs.test".into()),
            send_employer_confirmation: true,
            timeout: Duration::from_secs(10),
        }
    }

    #[test]
    fn emails_need_key_sender_and_inbox() {
        assert!(config_with_mail(full_mail()).emails_enabled());

        let no_sender = MailConfig {
            from_address: None,
            ..full_mail()
        };
        assert!(!config_with_mail(no_sender).emails_enabled());

        let no_inbox = MailConfig {
            receiver: None,
            ..full_mail()
        };
        assert!(!config_with_mail(no_inbox).emails_enabled());

        let mut dev = config_with_mail(full_mail());
        dev.environment = "development".into();
        assert!(!dev.emails_enabled());
        dev.enable_emails = true;
        assert!(dev.emails_enabled());
    }

    #[test]
    fn city_config_derives_host_and_default_city() {
        let city = CityConfig::new("Eindhoven");
        assert_eq!(city.canonical_host, "studentjobseindhoven.nl");
        assert_eq!(city.default_city, "eindhoven");
        assert_eq!(city.site_name(), "Student Jobs Eindhoven");
        assert_eq!(city.categories.len(), JobCategory::ALL.len());
    }
}

pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod test_dependencies;
pub mod utils;

use std::sync::Arc;

use crate::config::{CityConfig, Config};
use crate::error::{Error, Result};
use crate::services::{
    catalog_service::JobCatalog,
    notification_service::NotificationDispatcher,
    storage_service::UploadService,
    submission_service::SubmissionService,
    submission_store::{PgSubmissionStore, SubmissionStore},
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<JobCatalog>,
    pub city: CityConfig,
    pub submission_service: SubmissionService,
}

impl AppState {
    pub fn from_config(config: &Config, pool: PgPool) -> Result<Self> {
        let catalog = Arc::new(JobCatalog::load(&config.city, config.jobs_file.as_deref())?);
        let uploads = UploadService::from_config(config)
            .map_err(|e| Error::Config(format!("Upload storage: {}", e)))?;
        let store: Arc<dyn SubmissionStore> =
            Arc::new(PgSubmissionStore::new(pool, config.db_timeout));
        let notifications = NotificationDispatcher::from_config(config)
            .map_err(|e| Error::Config(format!("Email notifications: {}", e)))?;

        Ok(Self::from_services(
            catalog,
            config.city.clone(),
            uploads,
            store,
            notifications,
        ))
    }

    pub fn from_services(
        catalog: Arc<JobCatalog>,
        city: CityConfig,
        uploads: UploadService,
        store: Arc<dyn SubmissionStore>,
        notifications: NotificationDispatcher,
    ) -> Self {
        let submission_service = SubmissionService::new(
            catalog.clone(),
            city.clone(),
            uploads,
            store,
            notifications,
        );
        Self {
            catalog,
            city,
            submission_service,
        }
    }
}

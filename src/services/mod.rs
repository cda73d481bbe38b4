pub mod catalog_service;
pub mod notification_service;
pub mod storage_service;
pub mod submission_service;
pub mod submission_store;
pub mod validation_service;

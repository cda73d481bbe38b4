use serde::{Deserialize, Serialize};

use crate::models::job::{JobCategory, JobRecord};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct JobListQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub english: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobListResponse {
    pub items: Vec<JobRecord>,
    pub total: usize,
}

impl JobListResponse {
    pub fn new<'a>(items: impl IntoIterator<Item = &'a JobRecord>) -> Self {
        let items: Vec<JobRecord> = items.into_iter().cloned().collect();
        Self {
            total: items.len(),
            items,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryCount {
    pub key: JobCategory,
    pub label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryListResponse {
    pub city: String,
    pub items: Vec<CategoryCount>,
}

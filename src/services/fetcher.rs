use async_trait::async_trait;
use thiserror::Error;

use crate::config::CriteriaSettings;
use crate::models::{JobPosting, JobSource};

/// Errors that can occur while fetching postings
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: invalid API key or token")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Source not configured: {0}")]
    NotConfigured(String),
}

/// What to search for in one fetch
#[derive(Debug, Clone, Default)]
pub struct FetchQuery {
    pub job_titles: Vec<String>,
    pub keywords: Vec<String>,
    pub locations: Vec<String>,
    /// Overrides `locations` for job boards when set
    pub location: Option<String>,
    pub max_items: usize,
}

impl FetchQuery {
    pub fn from_criteria(criteria: &CriteriaSettings, location: Option<String>, max_items: Option<usize>) -> Self {
        Self {
            job_titles: criteria.job_titles.clone(),
            keywords: criteria.keywords.clone(),
            locations: criteria.locations.clone(),
            location: location.filter(|l| !l.trim().is_empty()),
            max_items: max_items.unwrap_or(criteria.max_jobs_per_run),
        }
    }
}

/// A source of raw postings
#[async_trait]
pub trait JobFetcher: Send + Sync {
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<JobPosting>, FetchError>;

    fn source(&self) -> JobSource;
}

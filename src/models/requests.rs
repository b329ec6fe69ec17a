use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{ApplicationStatus, JobPosting, JobSource};

/// Request to rank a batch of postings
///
/// Criteria fields override the configured defaults for this request only.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankJobsRequest {
    pub jobs: Vec<JobPosting>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default, alias = "excludeKeywords")]
    pub exclude_keywords: Option<Vec<String>>,
    #[serde(default, alias = "minMatchScore")]
    pub min_match_score: Option<f64>,
    #[serde(default, alias = "maxResults")]
    pub max_results: Option<i64>,
}

/// Request to run the fetch/rank/generate/track pipeline once
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RunPipelineRequest {
    #[serde(default)]
    pub source: JobSource,
    #[validate(length(min = 1))]
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, alias = "minMatchScore")]
    pub min_match_score: Option<f64>,
    #[validate(range(min = 5, max = 100))]
    #[serde(default, alias = "maxJobs")]
    pub max_jobs: Option<u32>,
    #[serde(default = "default_true", alias = "generateDocuments")]
    pub generate_documents: bool,
    #[serde(default = "default_true", alias = "updateTracker")]
    pub update_tracker: bool,
}

fn default_true() -> bool {
    true
}

/// Manual status change for a tracked application
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    #[validate(length(min = 1))]
    pub company: String,
    #[validate(length(min = 1))]
    pub position: String,
    pub status: ApplicationStatus,
    #[serde(default)]
    pub notes: String,
}

/// Email text to classify
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClassifyEmailRequest {
    #[validate(length(min = 1))]
    pub subject: String,
    #[serde(default)]
    pub body: String,
}

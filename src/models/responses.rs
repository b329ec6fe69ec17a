use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::{ApplicationRecord, ApplicationStatus, JobPosting, JobSource};

/// Response for the rank endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankJobsResponse {
    pub jobs: Vec<JobPosting>,
    pub total_input: usize,
    pub qualified: usize,
    pub failed: usize,
    pub strategy: String,
}

/// Outcome of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub source: JobSource,
    pub strategy: String,
    pub jobs_found: usize,
    pub qualified: usize,
    /// Qualified share of fetched postings, in percent
    pub match_rate: f64,
    pub documents_generated: usize,
    pub tracker_rows_added: usize,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub finished_at: chrono::DateTime<chrono::Utc>,
    pub jobs: Vec<JobPosting>,
}

impl RunSummary {
    pub fn match_rate(found: usize, qualified: usize) -> f64 {
        if found == 0 {
            return 0.0;
        }
        qualified as f64 / found as f64 * 100.0
    }
}

/// Results of the last completed run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestRunResponse {
    pub total: usize,
    pub jobs: Vec<JobPosting>,
}

/// Tracker listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationsResponse {
    pub total: usize,
    pub applications: Vec<ApplicationRecord>,
}

/// Result of a manual status update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateResponse {
    pub updated: bool,
}

/// Classification of a single email
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyEmailResponse {
    pub status: Option<ApplicationStatus>,
    pub company: Option<String>,
    pub position: Option<String>,
}

/// Document generation over tracked `New` rows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessSummary {
    pub pending: usize,
    pub processed: usize,
    pub failed: usize,
}

/// One pass over the inbox
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollSummary {
    pub messages: usize,
    pub classified: usize,
    pub updates: usize,
    pub applied: usize,
    pub unmatched: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

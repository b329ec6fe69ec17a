//! jobmatch - job-search automation service
//!
//! Fetches postings from job boards and company career pages, scores them
//! against a candidate's keyword profile, generates tailored documents and
//! keeps an application tracker in sync with recruiter emails.

pub mod config;
pub mod core;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{keyword_score, rank, MatchCriteria, Ranker, ScoringStrategy};
pub use models::{ApplicationRecord, ApplicationStatus, JobPosting, JobSource};
pub use pipeline::{EmailMonitor, Pipeline, PipelineError, RunOptions};

// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{ApplicationRecord, ApplicationStatus, CompanyCareer, EmailMessage, JobPosting, JobSource, StatusUpdate};
pub use requests::{ClassifyEmailRequest, RankJobsRequest, RunPipelineRequest, UpdateStatusRequest};
pub use responses::{
    ApplicationsResponse, ClassifyEmailResponse, ErrorResponse, HealthResponse, LatestRunResponse, PollSummary,
    ProcessSummary, RankJobsResponse, RunSummary, StatusUpdateResponse,
};

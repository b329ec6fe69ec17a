use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use validator::Validate;

use super::{error_response, pipeline_error, validation_error, AppState};
use crate::core::{max_results_from, ConfigurationError, MatchCriteria};
use crate::models::{HealthResponse, LatestRunResponse, RankJobsRequest, RankJobsResponse, RunPipelineRequest};
use crate::pipeline::RunOptions;

/// Configure ranking and pipeline routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/jobs/rank", web::post().to(rank_jobs))
        .route("/pipeline/run", web::post().to(run_pipeline))
        .route("/runs/latest", web::get().to(latest_run));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Criteria for one rank request: configured values with request overrides
pub fn request_criteria(base: &MatchCriteria, req: &RankJobsRequest) -> Result<MatchCriteria, ConfigurationError> {
    let threshold = req.min_match_score.unwrap_or(base.min_match_score());

    if req.keywords.is_none() && req.exclude_keywords.is_none() {
        return base.with_min_match_score(threshold);
    }

    MatchCriteria::new(
        req.keywords.as_deref().unwrap_or(base.keywords()),
        req.exclude_keywords.as_deref().unwrap_or(base.exclude_keywords()),
        threshold,
    )
}

/// Rank a batch of postings
///
/// POST /api/v1/jobs/rank
///
/// Request body:
/// ```json
/// {
///   "jobs": [{"title": "Data Analyst", "company": "SAP", "description": "..."}],
///   "keywords": ["python", "sql"],
///   "exclude_keywords": ["senior"],
///   "min_match_score": 0.5,
///   "max_results": 10
/// }
/// ```
async fn rank_jobs(state: web::Data<AppState>, req: web::Json<RankJobsRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }
    let req = req.into_inner();

    let criteria = match request_criteria(state.pipeline.criteria(), &req) {
        Ok(c) => c,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "Invalid criteria", e),
    };
    let max_results = match max_results_from(req.max_results) {
        Ok(n) => n,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, "Invalid criteria", e),
    };

    let ranker = state.pipeline.ranker();
    let outcome = ranker.rank(req.jobs, &criteria, max_results).await;

    tracing::info!(
        "Ranked {} postings: {} qualified, {} failed",
        outcome.total_input,
        outcome.jobs.len(),
        outcome.failed
    );

    HttpResponse::Ok().json(RankJobsResponse {
        qualified: outcome.jobs.len(),
        total_input: outcome.total_input,
        failed: outcome.failed,
        strategy: ranker.strategy_name().to_string(),
        jobs: outcome.jobs,
    })
}

/// Run the pipeline once
///
/// POST /api/v1/pipeline/run
async fn run_pipeline(state: web::Data<AppState>, req: web::Json<RunPipelineRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    match state.pipeline.run(RunOptions::from(req.into_inner())).await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => pipeline_error("Pipeline run failed", e),
    }
}

/// Ranked postings from the last run
///
/// GET /api/v1/runs/latest
async fn latest_run(state: web::Data<AppState>) -> impl Responder {
    match state.pipeline.store().latest_ranked().await {
        Ok(jobs) => HttpResponse::Ok().json(LatestRunResponse { total: jobs.len(), jobs }),
        Err(e) => pipeline_error("Failed to read last run", e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(json: &str) -> RankJobsRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_request_criteria_defaults() {
        let base = MatchCriteria::new(["python"], ["senior"], 0.75).unwrap();
        let criteria = request_criteria(&base, &request(r#"{"jobs": []}"#)).unwrap();
        assert_eq!(criteria, base);
    }

    #[test]
    fn test_request_criteria_overrides() {
        let base = MatchCriteria::new(["python"], ["senior"], 0.75).unwrap();
        let criteria = request_criteria(
            &base,
            &request(r#"{"jobs": [], "keywords": ["Rust"], "min_match_score": 0.2}"#),
        )
        .unwrap();

        assert_eq!(criteria.keywords(), &["rust".to_string()]);
        assert_eq!(criteria.exclude_keywords(), &["senior".to_string()]);
        assert_eq!(criteria.min_match_score(), 0.2);
    }

    #[test]
    fn test_request_criteria_rejects_threshold() {
        let base = MatchCriteria::new(["python"], ["senior"], 0.75).unwrap();
        assert!(request_criteria(&base, &request(r#"{"jobs": [], "min_match_score": -0.1}"#)).is_err());
    }
}

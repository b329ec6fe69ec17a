// Route exports
pub mod applications;
pub mod jobs;

use actix_web::{http::StatusCode, web, HttpResponse};
use std::sync::Arc;

use crate::core::EmailKeywords;
use crate::models::ErrorResponse;
use crate::pipeline::{EmailMonitor, Pipeline, PipelineError};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    /// Absent when no mailbox is configured
    pub monitor: Option<Arc<EmailMonitor>>,
    pub email_keywords: EmailKeywords,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(jobs::configure)
            .configure(applications::configure),
    );
}

pub(crate) fn error_response(status: StatusCode, error: &str, message: impl ToString) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status_code: status.as_u16(),
    })
}

pub(crate) fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    error_response(StatusCode::BAD_REQUEST, "Validation failed", errors)
}

pub(crate) fn pipeline_error(context: &str, err: PipelineError) -> HttpResponse {
    let status = match &err {
        PipelineError::Configuration(_) => StatusCode::BAD_REQUEST,
        PipelineError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        PipelineError::Fetch(_) | PipelineError::Llm(_) | PipelineError::Mail(_) => StatusCode::BAD_GATEWAY,
        PipelineError::Document(_) | PipelineError::Tracker(_) | PipelineError::Store(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        tracing::error!("{}: {}", context, err);
    } else {
        tracing::info!("{}: {}", context, err);
    }
    error_response(status, context, err)
}

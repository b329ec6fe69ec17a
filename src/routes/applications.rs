use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use serde::Deserialize;
use validator::Validate;

use super::{error_response, pipeline_error, validation_error, AppState};
use crate::core::{classify_email, extract_company_position};
use crate::models::{
    ApplicationStatus, ApplicationsResponse, ClassifyEmailRequest, ClassifyEmailResponse, StatusUpdate,
    StatusUpdateResponse, UpdateStatusRequest,
};

/// Configure tracker and email routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/applications", web::get().to(list_applications))
        .route("/applications/status", web::post().to(update_status))
        .route("/applications/process", web::post().to(process_pending))
        .route("/emails/classify", web::post().to(classify))
        .route("/emails/poll", web::post().to(poll_inbox));
}

#[derive(Debug, Deserialize)]
pub struct ApplicationsQuery {
    pub status: Option<String>,
}

/// List tracked applications
///
/// GET /api/v1/applications?status=To%20Apply
async fn list_applications(state: web::Data<AppState>, query: web::Query<ApplicationsQuery>) -> impl Responder {
    let status = match query.status.as_deref() {
        None => None,
        Some(raw) => match ApplicationStatus::parse(raw) {
            Some(status) => Some(status),
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "Invalid status",
                    format!("Unknown application status '{}'", raw),
                )
            }
        },
    };

    match state.pipeline.tracker().list(status).await {
        Ok(applications) => HttpResponse::Ok().json(ApplicationsResponse {
            total: applications.len(),
            applications,
        }),
        Err(e) => pipeline_error("Failed to list applications", e.into()),
    }
}

/// Manually change an application's status
///
/// POST /api/v1/applications/status
async fn update_status(state: web::Data<AppState>, req: web::Json<UpdateStatusRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }
    let req = req.into_inner();

    let update = StatusUpdate {
        company: req.company,
        position: req.position,
        status: req.status,
        notes: req.notes,
    };

    match state.pipeline.tracker().apply_status_update(&update).await {
        Ok(true) => HttpResponse::Ok().json(StatusUpdateResponse { updated: true }),
        Ok(false) => error_response(
            StatusCode::NOT_FOUND,
            "Application not found",
            format!("No tracked application for {} - {}", update.company, update.position),
        ),
        Err(e) => pipeline_error("Failed to update status", e.into()),
    }
}

/// Generate documents for rows still marked `New`
///
/// POST /api/v1/applications/process
async fn process_pending(state: web::Data<AppState>) -> impl Responder {
    match state.pipeline.process_pending().await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => pipeline_error("Processing failed", e),
    }
}

/// Classify a single email without touching the tracker
///
/// POST /api/v1/emails/classify
async fn classify(state: web::Data<AppState>, req: web::Json<ClassifyEmailRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let status = classify_email(&req.subject, &req.body, &state.email_keywords);
    let info = extract_company_position(&req.subject, &req.body);

    HttpResponse::Ok().json(ClassifyEmailResponse {
        status,
        company: info.as_ref().map(|i| i.company.clone()),
        position: info.map(|i| i.position),
    })
}

/// Poll the inbox once and apply status updates
///
/// POST /api/v1/emails/poll
async fn poll_inbox(state: web::Data<AppState>) -> impl Responder {
    let Some(monitor) = &state.monitor else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Email monitoring disabled",
            "Set GMAIL_ACCESS_TOKEN to enable inbox polling",
        );
    };

    match monitor.poll().await {
        Ok(summary) => HttpResponse::Ok().json(summary),
        Err(e) => pipeline_error("Email polling failed", e),
    }
}

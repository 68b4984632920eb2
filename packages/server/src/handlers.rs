//! HTTP handler functions for the report API.

use actix_web::http::header;
use actix_web::{HttpResponse, web};
use basurant_server_models::{
    ApiBulkRequest, ApiBulkResult, ApiError, ApiHealth, ApiNextId, ApiOk, ApiReportList,
    ApiStatusChange, ApiStatusResult,
};
use serde_json::Value;

use crate::{AppState, ServerError};

/// Maps an error to its status code and logs server-side failures.
fn error_response(context: &str, e: &ServerError) -> HttpResponse {
    match e {
        ServerError::InvalidPayload => HttpResponse::BadRequest().json(ApiError::new(e.to_string())),
        ServerError::NotFound { .. } => HttpResponse::NotFound().json(ApiError::new(e.to_string())),
        ServerError::Io(_) | ServerError::Json(_) | ServerError::Analytics(_) => {
            log::error!("{context}: {e}");
            HttpResponse::InternalServerError().json(ApiError::new(context))
        }
    }
}

/// `OPTIONS *`
pub async fn preflight() -> HttpResponse {
    HttpResponse::NoContent()
        .insert_header((header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"))
        .insert_header((header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"))
        .finish()
}

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    let reports = state.reports.list().await.map(|r| r.len());
    HttpResponse::Ok().json(ApiHealth {
        healthy: reports.is_ok(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        reports: reports.unwrap_or(0),
    })
}

/// `GET /api/reports`
pub async fn list_reports(state: web::Data<AppState>) -> HttpResponse {
    match state.reports.list().await {
        Ok(reports) => HttpResponse::Ok().json(ApiReportList { reports }),
        Err(e) => error_response("Failed to read reports", &e),
    }
}

/// `POST /api/reports`
///
/// Stores the body as sent. It must be a JSON object with an id.
pub async fn create_report(state: web::Data<AppState>, body: web::Bytes) -> HttpResponse {
    let report: Value = match serde_json::from_slice(&body) {
        Ok(value @ Value::Object(_)) => value,
        _ => return error_response("", &ServerError::InvalidPayload),
    };

    match state.reports.append(report).await {
        Ok(()) => HttpResponse::Created().json(ApiOk::OK),
        Err(e) => error_response("Failed to save report", &e),
    }
}

/// `GET /api/reports/next-id`
pub async fn next_id(state: web::Data<AppState>) -> HttpResponse {
    let today = chrono::Local::now().date_naive();
    match state.reports.next_id(today).await {
        Ok(id) => HttpResponse::Ok().json(ApiNextId { id }),
        Err(e) => error_response("Failed to allocate report id", &e),
    }
}

/// `POST /api/reports/bulk`
pub async fn bulk_merge(
    state: web::Data<AppState>,
    body: web::Json<ApiBulkRequest>,
) -> HttpResponse {
    let incoming = body.into_inner().reports;
    log::debug!("Merging {} reports", incoming.len());
    match state.reports.merge(incoming).await {
        Ok(count) => HttpResponse::Ok().json(ApiBulkResult { ok: true, count }),
        Err(e) => error_response("Failed to merge reports", &e),
    }
}

/// `POST /api/reports/{id}/status`
pub async fn change_status(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ApiStatusChange>,
) -> HttpResponse {
    let id = path.into_inner();
    let action = body.action;
    match state.reports.set_status(&id, action).await {
        Ok(status) => HttpResponse::Ok().json(ApiStatusResult {
            ok: true,
            status,
            canonical_status: action.resulting_status(),
        }),
        Err(e) => error_response("Failed to update report", &e),
    }
}

/// `GET /api/stats`
///
/// Dashboard summary and chart datasets in server-local time.
pub async fn stats(state: web::Data<AppState>) -> HttpResponse {
    match state.reports.reports().await {
        Ok(reports) => HttpResponse::Ok().json(basurant_analytics::dashboard_stats(
            &reports,
            &chrono::Local::now(),
        )),
        Err(e) => error_response("Failed to compute stats", &e),
    }
}

/// `GET /api/reports/export.csv`
pub async fn export_csv(state: web::Data<AppState>) -> HttpResponse {
    let csv = match state.reports.reports().await {
        Ok(reports) => basurant_analytics::export_csv(&reports).map_err(ServerError::from),
        Err(e) => Err(e),
    };
    match csv {
        Ok(csv) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"reports_export.csv\"",
            ))
            .body(csv),
        Err(e) => error_response("Failed to export reports", &e),
    }
}

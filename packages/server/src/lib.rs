#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web JSON report API.
//!
//! Reports live in a single JSON file (`data/reports.json` by default). The
//! API lists, appends and bulk-merges reports, hands out the next report
//! id, applies administrator status changes, and serves dashboard
//! statistics and a CSV export computed from the same file.

mod handlers;
pub mod interactive;
pub mod repository;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, guard, middleware, web};
use thiserror::Error;

pub use repository::ReportFile;

/// Errors that can occur while serving the report file.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Filesystem access failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The report file or a request body is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Statistics export failed.
    #[error("Export error: {0}")]
    Analytics(#[from] basurant_analytics::AnalyticsError),

    /// A report without an id was submitted.
    #[error("Invalid report payload")]
    InvalidPayload,

    /// No report has the requested id.
    #[error("Report not found: {id}")]
    NotFound {
        /// The requested id.
        id: String,
    },
}

/// Shared application state.
pub struct AppState {
    /// The report file.
    pub reports: Arc<ReportFile>,
}

impl AppState {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            reports: Arc::new(ReportFile::new(path)),
        }
    }
}

/// Registers every route. Shared by [`run_server`] and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/{tail:.*}")
            .guard(guard::Options())
            .to(handlers::preflight),
    )
    .service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/stats", web::get().to(handlers::stats))
            .route("/reports", web::get().to(handlers::list_reports))
            .route("/reports", web::post().to(handlers::create_report))
            .route("/reports/next-id", web::get().to(handlers::next_id))
            .route("/reports/bulk", web::post().to(handlers::bulk_merge))
            .route("/reports/export.csv", web::get().to(handlers::export_csv))
            .route(
                "/reports/{id}/status",
                web::post().to(handlers::change_status),
            ),
    );
}

/// Starts the report API server.
///
/// Reads `BIND_ADDR` (default `127.0.0.1`) and `PORT` (default `3000`).
/// This is a regular async function; the caller provides the runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    let path = basurant_store::paths::reports_json_path();
    log::info!("Serving reports from {}", path.display());
    let state = web::Data::new(AppState::new(path));

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive().disable_preflight();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

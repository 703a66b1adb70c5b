#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the incident map application.
//!
//! Serves marker and area CRUD, the compiled filter query endpoint, crowd
//! report submission, and the moderation endpoints that promote or reject
//! pending reports.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use incident_map_database::stores::DbStores;
use incident_map_database::{db, run_migrations};
use incident_map_filter::YearWindow;
use incident_map_filter::compiler::FilterCompiler;
use incident_map_moderation::ModerationPipeline;
use switchy_database::Database;

/// Shared application state.
pub struct AppState {
    /// Database connection.
    pub db: Arc<dyn Database>,
    /// Filter compiler configured with the deployment's year window.
    pub compiler: FilterCompiler,
    /// Moderation pipeline over the production stores.
    pub pipeline: ModerationPipeline,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    log::info!("Connecting to database...");
    let db_conn = db::connect_from_env()
        .await
        .expect("Failed to connect to database");

    log::info!("Running migrations...");
    run_migrations(db_conn.as_ref())
        .await
        .expect("Failed to run migrations");

    let db: Arc<dyn Database> = Arc::from(db_conn);

    let window: YearWindow = std::env::var("YEAR_WINDOW")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    log::info!("Filter date parsing uses year window {window}");

    let stores = Arc::new(DbStores::new(Arc::clone(&db)));
    let state = web::Data::new(AppState {
        db,
        compiler: FilterCompiler::new(window),
        pipeline: ModerationPipeline::new(stores.clone(), stores),
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/markers", web::post().to(handlers::create_marker))
                    .route("/markers", web::get().to(handlers::list_markers))
                    .route("/markers/filter", web::post().to(handlers::filter_markers))
                    .route(
                        "/markers/case/{case_number}",
                        web::get().to(handlers::get_marker_by_case),
                    )
                    .route("/markers/{id}", web::get().to(handlers::get_marker))
                    .route("/areas", web::post().to(handlers::create_area))
                    .route("/areas", web::get().to(handlers::list_areas))
                    .route("/areas/{gid}", web::get().to(handlers::get_area))
                    .route("/reports", web::post().to(handlers::submit_report))
                    .route("/reports", web::get().to(handlers::list_reports))
                    .route(
                        "/reports/{id}/accept",
                        web::post().to(handlers::accept_report),
                    )
                    .route(
                        "/reports/{id}/reject",
                        web::post().to(handlers::reject_report),
                    ),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

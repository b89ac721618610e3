#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the impact map application.
//!
//! Serves the REST API the visualization frontend uses to look up
//! population density and casualty estimates for an impact footprint.
//! All heavy lifting happens in `impact_map_population`; this crate is
//! routing, parameter validation, and JSON envelopes.

mod handlers;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use impact_map_population::PopulationService;

/// Shared application state.
pub struct AppState {
    /// The estimation pipeline with its caches.
    pub population: PopulationService,
}

/// Starts the impact map API server.
///
/// Builds the population service from the embedded source registry and
/// binds the HTTP server to `BIND_ADDR`/`PORT` (default
/// `127.0.0.1:8080`). This is a regular async function — the caller is
/// responsible for providing the async runtime (e.g. via
/// `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind
/// or encounters a runtime error.
pub async fn run_server() -> std::io::Result<()> {
    let state = web::Data::new(AppState {
        population: PopulationService::new(),
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
                    .route("/density", web::get().to(handlers::density))
                    .route("/casualties", web::get().to(handlers::casualties)),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the incident dashboard.
//!
//! Loads the incident table once at startup, builds the
//! [`AggregationEngine`], and serves its queries as JSON under `/api`.
//! The engine is immutable, so request handlers share it through
//! [`web::Data`] without any locking.

mod handlers;
pub mod interactive;

use std::path::PathBuf;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use gtd_analytics::AggregationEngine;
use gtd_dataset::definition::SelectionDefaults;
use gtd_dataset::progress::ProgressCallback;
use gtd_dataset::{DatasetDefinition, DatasetError, load_table};
use gtd_incident_models::YearRange;
use thiserror::Error;

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The incident table could not be loaded.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Binding or running the HTTP server failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Where to listen and what to load.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port to listen on (`PORT`).
    pub port: u16,
    /// Overrides the incident file path of the dataset definition.
    pub data_path: Option<PathBuf>,
    /// A TOML dataset definition replacing the embedded one.
    pub config_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            data_path: None,
            config_path: None,
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, `GTD_DATA_PATH`, and `GTD_CONFIG`,
    /// falling back to the defaults for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            data_path: std::env::var_os("GTD_DATA_PATH").map(PathBuf::from),
            config_path: std::env::var_os("GTD_CONFIG").map(PathBuf::from),
        }
    }

    /// Resolves the dataset definition this configuration points at.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the definition file cannot be read or
    /// parsed.
    pub fn dataset_definition(&self) -> Result<DatasetDefinition, DatasetError> {
        let definition = match &self.config_path {
            Some(path) => DatasetDefinition::from_path(path)?,
            None => DatasetDefinition::embedded()?,
        };

        Ok(match &self.data_path {
            Some(path) => definition.with_path(path.clone()),
            None => definition,
        })
    }
}

/// Shared application state.
pub struct AppState {
    /// Engine answering every aggregate query.
    pub engine: AggregationEngine,
    /// Initial selection advertised to the frontend.
    pub defaults: SelectionDefaults,
}

impl AppState {
    #[must_use]
    pub const fn new(engine: AggregationEngine, defaults: SelectionDefaults) -> Self {
        Self { engine, defaults }
    }

    /// Loads the table named by `definition` and indexes it.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the table cannot be loaded.
    pub fn load(
        definition: &DatasetDefinition,
        progress: &Arc<dyn ProgressCallback>,
    ) -> Result<Self, DatasetError> {
        let table = load_table(definition, progress)?;
        Ok(Self::new(
            AggregationEngine::new(table),
            definition.defaults.clone(),
        ))
    }

    /// Year range used when a request leaves `from` or `to` out.
    #[must_use]
    pub fn year_bounds(&self) -> YearRange {
        self.engine
            .year_bounds()
            .unwrap_or_else(|| YearRange::new(i32::MIN, i32::MAX))
    }

    /// Initial year slider position: the configured defaults, falling back
    /// to the dataset bounds. `None` for an empty table.
    #[must_use]
    pub fn default_years(&self) -> Option<YearRange> {
        let bounds = self.engine.year_bounds()?;
        Some(YearRange::new(
            self.defaults.year_from.unwrap_or(bounds.from),
            self.defaults.year_to.unwrap_or(bounds.to),
        ))
    }
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/regions", web::get().to(handlers::regions))
            .route("/countries", web::get().to(handlers::countries))
            .route("/years", web::get().to(handlers::years))
            .route("/attack-types", web::get().to(handlers::attack_types))
            .route("/series", web::get().to(handlers::series))
            .route("/totals", web::get().to(handlers::totals))
            .route("/locations", web::get().to(handlers::locations))
            .route("/location", web::get().to(handlers::location))
            .route("/dashboard", web::get().to(handlers::dashboard)),
    );
}

/// Serves `state` on `bind_addr:port` until the server is stopped.
///
/// The caller provides the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError::Io`] if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn serve(state: AppState, bind_addr: &str, port: u16) -> Result<(), ServerError> {
    let state = web::Data::new(state);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await?;

    Ok(())
}

/// Loads the dataset described by `config` and serves it.
///
/// # Errors
///
/// Returns [`ServerError`] if the dataset cannot be loaded or the server
/// fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_with(config: ServerConfig) -> Result<(), ServerError> {
    let definition = config.dataset_definition()?;
    let state = AppState::load(&definition, &gtd_dataset::progress::null_progress())?;

    serve(state, &config.bind_addr, config.port).await
}

/// Starts the server configured from the environment.
///
/// # Errors
///
/// Returns [`ServerError`] if the dataset cannot be loaded or the server
/// fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), ServerError> {
    run_with(ServerConfig::from_env()).await
}

//! pbxlog server
//!
//! Ingests call records from a PABX CDR port into PostgreSQL and serves the
//! paginated call listing over HTTP.

use actix_cors::Cors;
use actix_web::{dev::Server, http::header, web, App, HttpResponse, HttpServer};
use anyhow::Context;
use pbxlog_api::configure_routes;
use pbxlog_core::config::{AppConfig, LoggingConfig, ServerConfig};
use pbxlog_core::traits::{CallQuery, CallStore};
use pbxlog_core::AppError;
use pbxlog_db::{create_pool_from_config, ensure_schema, PgCallRepository};
use pbxlog_ingest::{connect, ErrorSink, IngestStats, Ingestor, RawMirror};
use pbxlog_services::CallListingService;
use std::env;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing/logging
fn init_tracing(logging: &LoggingConfig) {
    let level = &logging.level;
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "pbxlog={level},pbxlog_ingest={level},pbxlog_db={level},pbxlog_services={level},pbxlog_api={level},actix_web=info,sqlx=warn"
        ))
    });

    let registry = tracing_subscriber::registry().with(env_filter);
    if logging.json {
        registry.with(fmt::layer().json().with_current_span(true)).init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}

/// `PBXLOG_CONFIG` names an explicit file; otherwise the layered search applies
fn load_config() -> anyhow::Result<AppConfig> {
    let config = match env::var("PBXLOG_CONFIG") {
        Ok(path) => AppConfig::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        Err(_) => AppConfig::load().context("Failed to load configuration")?,
    };
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn build_cors(origins: &str) -> Cors {
    let origins: Vec<String> = origins
        .split(',')
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();

    let cors = if origins.iter().any(|o| o == "*") {
        Cors::default().allow_any_origin()
    } else {
        Cors::default().allowed_origin_fn(move |origin, _req_head| {
            origin
                .to_str()
                .map(|o| origins.iter().any(|allowed| allowed == o))
                .unwrap_or(false)
        })
    };

    cors.allowed_methods(vec!["GET", "OPTIONS"])
        .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
        .max_age(3600)
}

fn start_http_server(
    settings: &ServerConfig,
    bind_addr: &str,
    listing: web::Data<CallListingService>,
) -> anyhow::Result<Server> {
    info!(
        "Starting HTTP server on {} with {} workers",
        bind_addr, settings.workers
    );

    let cors_origins = settings.cors_origins.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(listing.clone())
            .wrap(build_cors(&cors_origins))
            .wrap(TracingLogger::default())
            .configure(configure_routes)
            // Root redirect to the call listing
            .route(
                "/",
                web::get().to(|| async {
                    HttpResponse::Found()
                        .append_header(("Location", "/api/v1/calls"))
                        .finish()
                }),
            )
    })
    .workers(settings.workers.max(1))
    .disable_signals()
    .bind(bind_addr)
    .with_context(|| format!("Failed to bind HTTP server to {}", bind_addr))?
    .run();

    Ok(server)
}

/// Connect to the PABX and ingest until the stream ends or fails
async fn run_ingestion(config: &AppConfig, store: Arc<dyn CallStore>) -> Result<IngestStats, AppError> {
    let mirror = RawMirror::open(config.files.dump_file.as_deref()).await?;
    let errors = ErrorSink::new(config.files.error_file.as_deref());
    if errors.is_enabled() {
        info!("Invalid records go to {:?}", config.files.error_file);
    }

    let stream = connect(&config.pabx.address).await?;
    let mut ingestor = Ingestor::new(
        store,
        mirror,
        errors,
        config.retry.clone(),
        config.pabx.max_record_bytes,
    );

    ingestor.run(stream).await
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = load_config()?;
    init_tracing(&config.logging);

    info!("Starting pbxlog v{}", env!("CARGO_PKG_VERSION"));

    info!("Connecting to database...");
    let pool = create_pool_from_config(&config.database)
        .await
        .context("Failed to create database pool")?;
    ensure_schema(&pool, config.database.lookup_table)
        .await
        .context("Failed to prepare database schema")?;
    info!(
        "Database ready with {} max connections",
        config.database.max_connections
    );

    let repository = Arc::new(PgCallRepository::new(pool, config.database.lookup_table));
    let store: Arc<dyn CallStore> = repository.clone();
    let query: Arc<dyn CallQuery> = repository;

    let http = if config.server.enabled {
        let listing = web::Data::new(CallListingService::new(query, config.listing.clone()));
        Some(start_http_server(&config.server, &config.server_addr(), listing)?)
    } else {
        info!("HTTP server disabled");
        None
    };
    let http_handle = http.as_ref().map(Server::handle);
    let http_task = async move {
        match http {
            Some(server) => server.await,
            None => std::future::pending().await,
        }
    };

    let outcome: anyhow::Result<()> = tokio::select! {
        result = run_ingestion(&config, store) => match result {
            Ok(stats) => {
                warn!(
                    records = stats.records,
                    stored = stats.stored,
                    invalid = stats.invalid,
                    "PABX closed the connection"
                );
                Err(AppError::PabxDisconnected.into())
            }
            Err(e) => {
                error!("Ingestion failed: {}", e);
                Err(anyhow::Error::new(e).context("Ingestion stopped"))
            }
        },
        result = http_task => match result {
            Ok(()) => {
                warn!("HTTP server exited");
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e).context("HTTP server failed")),
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
            Ok(())
        }
    };

    if let Some(handle) = http_handle {
        handle.stop(true).await;
    }

    outcome?;
    info!("pbxlog stopped");
    Ok(())
}

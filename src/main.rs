//! Allure dashboard - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, web};
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use allure_dashboard_lib::api::{self, ApiDoc};
use allure_dashboard_lib::config::Config;
use allure_dashboard_lib::middleware::RequestLogger;
use allure_dashboard_lib::services::{
    BuildRegistry, DashboardService, HttpJenkinsBackend, JenkinsClient, JenkinsConnection,
    RetryPolicy, start_refresh_task,
};

/// Perform health check (for Docker healthcheck).
async fn health_check() -> bool {
    // Simple check - just verify we can load config
    Config::from_env().is_ok()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Check for --health-check flag (used by Docker HEALTHCHECK)
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|arg| arg == "--health-check") {
        dotenvy::dotenv().ok();
        if health_check().await {
            std::process::exit(0);
        } else {
            std::process::exit(1);
        }
    }

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, JENKINS_BASE_URL must point at your Jenkins");
            error!("  - Timeouts must be positive numbers of seconds");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Allure Dashboard");
    info!("  Environment: {}", config.environment);
    info!("  Jenkins: {}", config.jenkins.base_url);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }
    if config.jenkins.session.is_none() {
        warn!("No JENKINS_JSESSIONID set; reports will fail until a session is supplied");
    }

    // Load the tracked build list
    let registry = BuildRegistry::load(config.builds_file.clone())
        .await
        .map_err(std::io::Error::other)?;

    // Shared HTTP client for every Jenkins read
    let http_client = JenkinsClient::build_http_client(config.jenkins.connect_timeout)
        .map_err(std::io::Error::other)?;
    let backend = HttpJenkinsBackend::new(http_client, config.jenkins.request_timeout);

    let service = Arc::new(DashboardService::new(
        Arc::new(registry),
        Arc::new(backend),
        JenkinsConnection::new(config.jenkins.base_url.clone(), config.jenkins.session.clone()),
        RetryPolicy::with_attempts(config.retry_attempts),
    ));

    // Start the refresh background task
    if config.refresh_interval_secs > 0 {
        start_refresh_task(Arc::clone(&service), config.refresh_interval_secs);
    } else {
        info!("Background refresh disabled; dashboard refreshes on demand");
    }

    let bind_address = config.bind_address();
    let is_development = config.is_development();

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    let openapi = ApiDoc::openapi();

    // Start HTTP server
    let server = HttpServer::new(move || {
        let cors = if is_development {
            Cors::default()
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        } else {
            // Same-origin only
            Cors::default()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec![header::ACCEPT, header::CONTENT_TYPE])
                .max_age(3600)
        };

        App::new()
            // CORS must wrap before the logger
            .wrap(cors)
            .wrap(RequestLogger)
            .app_data(web::Data::new(Arc::clone(&service)))
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_health_routes)
                    .configure(api::configure_build_routes)
                    .configure(api::configure_dashboard_routes)
                    .configure(api::configure_auth_routes),
            )
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}

use actix_cors::Cors;
use actix_web::{get, web, App, HttpResponse, HttpServer, Responder};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

mod config;
mod database;
mod handlers;
mod helpers;
mod ingest;

#[get("/health")]
async fn health(db: web::Data<Arc<database::Database>>) -> impl Responder {
    // Test database connection
    match db.connection.lock() {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "status": "healthy",
            "database": "connected"
        })),
        Err(_) => HttpResponse::InternalServerError().json(serde_json::json!({
            "status": "unhealthy",
            "database": "disconnected"
        })),
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = args.log_file_path {
        let log_path = std::path::Path::new(&log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("pagos-api.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter.clone())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    // Initialize database
    let db = helpers::database::initialize_database().expect("Failed to initialize database");

    println!(
        "Database initialized at: {:?}",
        helpers::database::get_db_path().unwrap()
    );

    // Load config; hash a default admin PIN into it on first run
    let (mut config, config_path) = config::ApiConfig::load().expect("Failed to load config");
    match config.ensure_admin_pin(&config_path) {
        Ok(true) => tracing::warn!(
            "admin PIN initialized to the default value; change it in {}",
            config_path.display()
        ),
        Ok(false) => {}
        Err(e) => {
            tracing::error!(error = %e, "failed to persist admin PIN");
        }
    }

    // Get server config or use defaults
    let (host, port) = if let Some(server_config) = &config.server {
        (server_config.host.clone(), server_config.port)
    } else {
        ("127.0.0.1".to_string(), 8080)
    };

    tracing::info!("Server will listen on {}:{}", host, port);

    let sessions = Arc::new(helpers::session::SessionManager::new(
        helpers::session::DEFAULT_TTL_HOURS,
    ));
    let limiter = Arc::new(helpers::rate_limit::RateLimiter::new());

    // Notification extractor, optionally extended from config
    let ingestor = Arc::new(match &config.patterns {
        Some(extra) => {
            tracing::info!("loading {} extra bank profile(s) from config", extra.len());
            ingest::NotificationIngestor::with_patterns(db.async_connection.clone(), extra)
                .expect("Invalid extraction pattern in config")
        }
        None => ingest::NotificationIngestor::new(db.async_connection.clone()),
    });

    let config = Arc::new(config);

    println!("Starting server on {}:{}", host, port);

    let config_for_server = config.clone();
    let server = HttpServer::new(move || {
        // Configure CORS
        let cors = if let Some(cors_config) = &config_for_server.cors {
            let mut cors_builder = Cors::default();
            for origin in &cors_config.allowed_origins {
                cors_builder = cors_builder.allowed_origin(origin);
            }
            cors_builder
                .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        } else {
            Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type"])
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(config_for_server.clone()))
            .app_data(web::Data::new(sessions.clone()))
            .app_data(web::Data::new(limiter.clone()))
            .app_data(web::Data::new(ingestor.clone()))
            .service(health)
            .route("/api/verify", web::post().to(handlers::verify::verify_payment))
            .route("/api/webhook", web::post().to(handlers::webhook::receive_notification))
            .route("/api/auth/login", web::post().to(handlers::auth::login))
            .route("/api/auth/logout", web::post().to(handlers::auth::logout))
            .route("/api/payments", web::get().to(handlers::payments::list_payments))
            .route("/api/payments/summary", web::get().to(handlers::payments::get_summary))
            .route("/api/payments/export", web::get().to(handlers::payments::export_payments))
            .route(
                "/api/payments/{reference}/release",
                web::post().to(handlers::payments::release_payment),
            )
            .route(
                "/api/payments/{reference}",
                web::delete().to(handlers::payments::delete_payment),
            )
    })
    .bind((host.as_str(), port))?
    .run();

    server.await
}

use std::path::PathBuf;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use tracing_subscriber::prelude::*;

use feriabot_api::config::AppConfig;
use feriabot_api::database;
use feriabot_api::database::store::SqliteTransactionStore;
use feriabot_api::handlers::webhook::{self, AppState};
use feriabot_api::integrations::{OpenAiClassifier, WhatsAppClient};
use feriabot_core::{MessageRouter, PendingStore};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,
    #[arg(long)]
    config_path: Option<PathBuf>,
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
                .unwrap_or(std::ffi::OsStr::new("feriabot-api.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter)
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

    let (config, config_path) = AppConfig::load(args.config_path).expect("Failed to load config");
    tracing::info!("Config loaded from {:?}", config_path);

    let db = database::initialize_database().expect("Failed to initialize database");
    tracing::info!(
        "Database initialized at: {:?}",
        database::get_db_path().unwrap()
    );

    let alerts = config.alerts.clone().unwrap_or_default();
    let pending_config = config.pending.clone().unwrap_or_default();

    let low_balance_threshold = Decimal::from_f64(alerts.low_balance_threshold)
        .unwrap_or_else(|| Decimal::from(500));

    // Construct the collaborators and wire the router; everything behind
    // the trait seams so the core stays test-instantiable.
    let store = Arc::new(SqliteTransactionStore::new(db.async_connection.clone()));
    let classifier = Arc::new(OpenAiClassifier::new(&config.openai));
    let messenger = Arc::new(WhatsAppClient::new(&config.whatsapp));
    let pending = Arc::new(PendingStore::new(chrono::Duration::seconds(
        pending_config.ttl_secs,
    )));

    let router = Arc::new(MessageRouter::new(
        classifier,
        store,
        messenger,
        pending.clone(),
        low_balance_threshold,
    ));

    // Expiry is lazy on read; this sweep only bounds memory.
    if pending_config.sweep_interval_secs > 0 {
        let sweep_pending = pending.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(
                pending_config.sweep_interval_secs,
            ));
            loop {
                interval.tick().await;
                let removed = sweep_pending.sweep();
                if removed > 0 {
                    tracing::debug!(removed, "swept expired pending corrections");
                }
            }
        });
    }

    let (host, port) = if let Some(server_config) = &config.server {
        (server_config.host.clone(), server_config.port)
    } else {
        ("0.0.0.0".to_string(), 8000)
    };

    tracing::info!("Server will listen on {}:{}", host, port);

    let state = web::Data::new(AppState {
        router,
        verify_token: config.whatsapp.verify_token.clone(),
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(db.clone()))
            .app_data(state.clone())
            .route("/health", web::get().to(webhook::health))
            .route("/webhook", web::get().to(webhook::verify))
            .route("/webhook", web::post().to(webhook::receive))
    })
    .bind((host.as_str(), port))?
    .run();

    let handle = server.handle();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }

        tracing::info!("Ctrl+C received, shutting down...");
        handle.stop(true).await;
    });

    server.await
}

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use crypto_core::jwt;
use db_pool::{create_pool, run_migrations};
use photo_service::db::{PgPhotoRepository, MIGRATOR};
use photo_service::geocoding::{DisabledGeocoder, NominatimGeocoder, ReverseGeocoder};
use photo_service::routes::configure_routes;
use photo_service::storage::LocalMediaStorage;
use photo_service::{AppState, Config};
use std::io;
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Photo Service
///
/// Serves posts, images, comments and likes under `/api`.
///
/// # Routes
///
/// - `/api/posts/*` - list, create (multipart), read, update, delete, like
/// - `/api/posts/{post_id}/comments/*` - comments scoped to a post
/// - `/health`, `/health/ready`, `/health/live` - probes
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting photo-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    match jwt::load_validation_key() {
        Ok(public_key) => {
            if let Err(err) = jwt::initialize_jwt_validation_only(&public_key) {
                return Err(io::Error::new(
                    io::ErrorKind::Other,
                    format!("Failed to initialize JWT keys: {err}"),
                ));
            }
        }
        Err(err) => {
            tracing::warn!(
                "JWT public key not configured ({err}); authenticated routes will reject every request"
            );
        }
    }

    let db_cfg = config.database.pool_config("photo-service");
    db_cfg.log_config();

    let db_pool = match create_pool(db_cfg).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {:#}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    run_migrations(&db_pool, &MIGRATOR)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Migrations failed: {e}")))?;

    let storage = LocalMediaStorage::new(&config.media.root);
    storage.ensure_dirs().await.map_err(|e| {
        io::Error::new(
            io::ErrorKind::Other,
            format!("Media root {} is not writable: {e}", config.media.root),
        )
    })?;
    tracing::info!(media_root = %config.media.root, media_url = %config.media.url, "media storage ready");

    let geocoder: Arc<dyn ReverseGeocoder> = if config.geocoder.enabled {
        let client = NominatimGeocoder::new(&config.geocoder).map_err(|e| {
            io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to build geocoding client: {e}"),
            )
        })?;
        tracing::info!(
            base_url = %config.geocoder.base_url,
            timeout_ms = config.geocoder.timeout_ms,
            "reverse geocoding enabled"
        );
        Arc::new(client)
    } else {
        tracing::info!("reverse geocoding disabled");
        Arc::new(DisabledGeocoder)
    };

    let state = web::Data::new(AppState::new(
        Arc::new(PgPhotoRepository::new(db_pool)),
        Arc::new(storage),
        geocoder,
        config.media.clone(),
    ));

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let cors_config = config.cors.clone();
    let server = HttpServer::new(move || {
        let mut cors = Cors::default()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);
        for origin in cors_config.origins() {
            cors = if origin == "*" {
                cors.allow_any_origin()
            } else {
                cors.allowed_origin(origin)
            };
        }

        App::new()
            .app_data(state.clone())
            .wrap(cors)
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .disable_signals()
    .run();

    let handle = server.handle();
    actix_web::rt::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, stopping HTTP server");
        handle.stop(true).await;
    });

    server.await?;
    tracing::info!("photo-service stopped");
    Ok(())
}

use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod db;
mod gemini_client;
mod generators;
mod handlers;
mod ingestion;
mod middleware;
mod models;
mod pipeline;
mod store;

use generators::clip::{ClipMode, ClipRenderer};
use generators::visual::QuoteGraphicGenerator;
use ingestion::VideoIngester;
use pipeline::Pipeline;
use store::{MemoryStore, PgProjectStore, ProjectStore};

// AppState holds the optional database pool (for auth), the injected
// project store, and the pipeline that creation requests schedule runs on
pub struct AppState {
    pub db_pool: Option<sqlx::PgPool>,
    pub store: Arc<dyn ProjectStore>,
    pub pipeline: Arc<Pipeline>,
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize production-grade logging
    init_logging().expect("Failed to initialize logging");

    // Ensure the clip output directory exists for heavyweight rendering
    if let Err(e) = std::fs::create_dir_all("outputs/clips") {
        tracing::warn!("Failed to create outputs directory: {}", e);
    } else {
        tracing::info!("Outputs directory ready");
    }

    // Create the database connection pool if a database is configured.
    // Without one the service substitutes an in-memory store with the
    // same contract shape.
    let db_pool = match std::env::var("DATABASE_URL") {
        Ok(_) => match db::create_pool().await {
            Ok(pool) => {
                tracing::info!("✅ Postgres store initialized");
                Some(pool)
            }
            Err(e) => {
                tracing::error!(
                    "Failed to initialize Postgres store: {}. Falling back to in-memory store.",
                    e
                );
                None
            }
        },
        Err(_) => {
            tracing::warn!(
                "DATABASE_URL not set. Using in-memory store; projects will not survive restarts."
            );
            None
        }
    };

    let project_store: Arc<dyn ProjectStore> = match db_pool.clone() {
        Some(pool) => Arc::new(PgProjectStore::new(pool)),
        None => Arc::new(MemoryStore::new()),
    };

    // Initialize Gemini client for design suggestions if an API key is provided
    let gemini_client = match std::env::var("GEMINI_API_KEY").ok() {
        Some(api_key) if !api_key.is_empty() => {
            tracing::info!("Initializing Gemini client for design suggestions...");
            Some(gemini_client::GeminiClient::new(api_key))
        }
        _ => {
            tracing::warn!("GEMINI_API_KEY not found. Quote graphics will use the default palette.");
            None
        }
    };

    let clip_renderer = ClipRenderer::from_env();
    match clip_renderer.mode() {
        ClipMode::Render => tracing::info!("🎬 Clip rendering enabled (ffmpeg)"),
        ClipMode::Reference => {
            tracing::info!("Clip generation running in reference mode. Set CLIP_RENDERING=ffmpeg to render media.")
        }
    }

    let pipeline = Arc::new(Pipeline::new(
        project_store.clone(),
        VideoIngester::new(),
        QuoteGraphicGenerator::new(gemini_client),
        clip_renderer,
    ));

    // Create the shared state
    let shared_state = Arc::new(AppState {
        db_pool,
        store: project_store,
        pipeline,
    });

    // Build our application with all routes and shared state
    let app = Router::new()
        .merge(handlers::auth::auth_routes())
        .merge(handlers::projects::project_routes())
        .route("/api/status", axum::routing::get(api_status))
        .layer(axum::middleware::from_fn(
            middleware::logging::request_logging_middleware,
        ))
        .layer(CorsLayer::permissive())
        .layer(Extension(shared_state.clone()));

    // Run the server
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000")
        .await
        .expect("Failed to bind 0.0.0.0:3000");
    tracing::info!("listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}

// Production-grade logging configuration
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, fmt, Layer};

    // Get log level from environment or default to INFO for production
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,content_forge=trace,sqlx=info,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,content_forge=info,sqlx=warn,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    // Configure structured logging for production
    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for production (easier for log aggregation)
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        // Human-readable logging for development
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("🎬 ContentForge starting up...");
    tracing::info!("Version: {}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build mode: {}",
        if cfg!(debug_assertions) { "development" } else { "production" }
    );

    let db_configured = std::env::var("DATABASE_URL").is_ok();
    let gemini_configured = std::env::var("GEMINI_API_KEY").is_ok();
    tracing::info!(
        "Configuration - Database: {}, Gemini AI: {}",
        if db_configured { "✅" } else { "❌" },
        if gemini_configured { "✅" } else { "❌" }
    );

    Ok(())
}

// API Status endpoint
async fn api_status(
    Extension(state): Extension<Arc<AppState>>,
) -> axum::response::Json<serde_json::Value> {
    use serde_json::json;

    let store_status = match &state.db_pool {
        Some(pool) => match sqlx::query("SELECT 1").fetch_one(pool).await {
            Ok(_) => "postgres",
            Err(_) => "postgres_unhealthy",
        },
        None => "in_memory",
    };

    let gemini_status = if std::env::var("GEMINI_API_KEY").is_ok() {
        "configured"
    } else {
        "not_configured"
    };

    axum::response::Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "store": store_status,
            "design_suggestions": gemini_status,
        },
        "failure_policies": {
            "ingestion": VideoIngester::FAILURE_POLICY.as_str(),
            "text_generation": generators::text::FAILURE_POLICY.as_str(),
            "visual_generation": QuoteGraphicGenerator::FAILURE_POLICY.as_str(),
            "clip_rendering": ClipRenderer::FAILURE_POLICY.as_str(),
        },
        "endpoints": {
            "status": "/api/status",
            "auth": "/api/auth/*",
            "projects": "/api/projects",
        }
    }))
}

//! services/api/src/bin/api.rs

use api_lib::{
    adapters::db::PgStore,
    config::Config,
    error::ApiError,
    web::{availability, profiles, sessions, state::AppState, tutors, ApiDoc},
};
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    routing::{get, patch, post, put},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    let store = Arc::new(PgStore::new(db_pool));
    info!("Running database migrations...");
    store
        .run_migrations()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    info!("Database migrations complete.");

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        store,
        config: config.clone(),
    });

    let frontend_origin = config
        .frontend_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid FRONTEND_ORIGIN: {}", e)))?;
    let cors = CorsLayer::new()
        .allow_origin(frontend_origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // --- 4. Create the Web Router ---
    let api_router = Router::new()
        .route("/tutors", get(tutors::list_tutors_handler))
        .route(
            "/availability",
            get(availability::get_availability_handler)
                .post(availability::save_availability_handler),
        )
        .route(
            "/availability/exceptions",
            post(availability::create_exception_handler),
        )
        .route(
            "/availability/{event_id}",
            patch(availability::update_slot_handler).delete(availability::delete_slot_handler),
        )
        .route(
            "/availability-flag",
            patch(availability::set_availability_flag_handler),
        )
        .route("/profiles", get(profiles::get_profile_handler))
        .route("/profiles/{id}", patch(profiles::update_profile_handler))
        .route(
            "/profiles/{id}/subjects",
            put(profiles::replace_subjects_handler),
        )
        .route("/subjects", get(profiles::list_subjects_handler))
        .route(
            "/sessions",
            post(sessions::create_session_handler).get(sessions::list_sessions_handler),
        )
        .route(
            "/sessions/{id}",
            patch(sessions::update_session_status_handler),
        )
        .layer(cors)
        .with_state(app_state);

    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod auth;
mod config;
mod db;
mod dto;
mod error;
mod events;
mod handlers;
mod models;
mod services;

use auth::rate_limit::RateLimitState;
use config::Config;
use events::EventBus;
use services::genai::GenAiClient;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub genai: GenAiClient,
    pub events: EventBus,
    pub rate_limiter: RateLimitState,
}

#[cfg(test)]
impl AppState {
    /// State over a test database with the model unconfigured.
    pub fn for_tests(db: PgPool) -> Self {
        let config = Config::for_tests();
        Self {
            db,
            genai: GenAiClient::new(&config).unwrap(),
            config: Arc::new(config),
            events: EventBus::new(64),
            rate_limiter: RateLimitState::new(),
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "heartnote_api=debug,tower_http=debug".into()),
        )
        .json()
        .init();

    let config = Arc::new(Config::from_env());

    // Database
    let db = db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Database migrations applied");

    let genai = GenAiClient::new(&config).expect("Failed to build GenAI client");
    if !genai.is_configured() {
        tracing::warn!("GENAI_API_KEY not set, AI features will use fallbacks");
    }

    let events = EventBus::new(256);
    events::spawn_event_logger(&events);

    let rate_limiter = RateLimitState::new();
    auth::rate_limit::spawn_rate_limit_cleanup_worker(rate_limiter.clone());

    let state = AppState {
        db,
        config: config.clone(),
        genai,
        events,
        rate_limiter,
    };

    let auth_routes = Router::new()
        .route("/api/auth/anonymous", post(handlers::auth::sign_in_anonymously))
        .route("/api/auth/refresh", post(handlers::auth::refresh))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_auth,
        ));

    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/ws", get(handlers::ws::ws_handler))
        .merge(auth_routes);

    // Model-backed routes get a per-user budget on top of auth
    let ai_routes = Router::new()
        .route("/api/profile/avatar", post(handlers::profile::generate_avatar))
        .route("/api/companions/:id/chat", post(handlers::companions::chat))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::rate_limit::rate_limit_ai,
        ));

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        // Profile
        .route(
            "/api/profile",
            get(handlers::profile::get_profile).put(handlers::profile::update_profile),
        )
        // Emotions
        .route(
            "/api/emotions",
            get(handlers::emotions::list_emotions).post(handlers::emotions::create_emotion),
        )
        .route(
            "/api/emotions/:id",
            get(handlers::emotions::get_emotion)
                .put(handlers::emotions::update_emotion)
                .delete(handlers::emotions::delete_emotion),
        )
        // Diary
        .route(
            "/api/diary",
            get(handlers::diary::list_diary_entries).post(handlers::diary::create_diary_entry),
        )
        .route(
            "/api/diary/:id",
            get(handlers::diary::get_diary_entry)
                .put(handlers::diary::update_diary_entry)
                .delete(handlers::diary::delete_diary_entry),
        )
        .route("/api/streak", get(handlers::diary::get_streak))
        // Rewards
        .route("/api/rewards", get(handlers::rewards::list_rewards))
        .route("/api/rewards/evaluate", post(handlers::rewards::evaluate_rewards))
        // Shop
        .route("/api/shop", get(handlers::shop::list_shop))
        .route("/api/shop/unequip", post(handlers::shop::unequip_item))
        .route("/api/shop/:id/purchase", post(handlers::shop::purchase_item))
        .route("/api/shop/:id/equip", post(handlers::shop::equip_item))
        // Games
        .route("/api/games", get(handlers::games::list_games))
        .route("/api/games/:id/complete", post(handlers::games::complete_game))
        // Report & sharing
        .route("/api/report", get(handlers::report::get_report))
        .route("/api/share", post(handlers::share::share_progress))
        // Companions
        .route("/api/companions", get(handlers::companions::list_companions))
        .merge(ai_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::middleware::require_auth,
        ));

    let allowed_origins: Vec<axum::http::HeaderValue> = {
        let mut origins = Vec::new();
        match config.frontend_url.parse::<axum::http::HeaderValue>() {
            Ok(hv) => origins.push(hv),
            Err(_) => tracing::error!(frontend_url = %config.frontend_url, "Invalid FRONTEND_URL"),
        }
        // In dev, also allow LAN access (e.g. testing from another device)
        if let Ok(extra) = std::env::var("CORS_EXTRA_ORIGINS") {
            for o in extra.split(',') {
                if let Ok(hv) = o.trim().parse::<axum::http::HeaderValue>() {
                    origins.push(hv);
                }
            }
        }
        origins
    };
    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::PUT,
            axum::http::Method::DELETE,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
        ])
        .allow_credentials(true);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = config.listen_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");
    // Connect info gives the rate limiter the client IP
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .expect("Server error");
}

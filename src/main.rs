use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn,
    routing::{get, post},
};

use http::{Method, header};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_governor::governor::GovernorConfigBuilder;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};

use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod state;
mod db;
mod notify;

mod scheduling {
    pub mod interval;
    pub mod slots;
}

mod models {
    pub mod actor;
    pub mod coach;
    pub mod purchase;
    pub mod session;
}

mod repositories {
    pub mod coach;
    pub mod purchase;
    pub mod session;
}

mod services {
    pub mod availability;
    pub mod sessions;
}

mod handlers {
    pub mod availability;
    pub mod sessions;
}

mod middleware_layer {
    pub mod actor;
}

mod validation {
    pub mod booking;
}

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("✅ Configuration loaded successfully");

    let state = AppState::new(&config).await?;
    tracing::info!("✅ AppState initialized");

    let cors = CorsLayer::new()
        .allow_origin([
            "http://localhost:3000".parse().unwrap(),
            "http://127.0.0.1:3000".parse().unwrap(),
        ])
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            "x-actor-id".parse().unwrap(),
            "x-actor-role".parse().unwrap(),
        ])
        .max_age(Duration::from_secs(86400));

    let booking_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(50)
            .use_headers()
            .finish()
            .unwrap(),
    );

    let read_routes = Router::new()
        .route("/api/sessions", get(handlers::sessions::list_sessions))
        .route("/api/sessions/stats", get(handlers::sessions::session_stats))
        .route("/api/sessions/{session_id}", get(handlers::sessions::get_session))
        .route(
            "/api/coaches/{coach_id}/slots",
            get(handlers::availability::available_slots),
        )
        .route_layer(from_fn(middleware_layer::actor::resolve_actor))
        .with_state(state.clone());

    let write_routes = Router::new()
        .route("/api/sessions", post(handlers::sessions::book_session))
        .route(
            "/api/sessions/{session_id}/cancel",
            post(handlers::sessions::cancel_session),
        )
        .route(
            "/api/sessions/{session_id}/reschedule",
            post(handlers::sessions::reschedule_session),
        )
        .route(
            "/api/sessions/{session_id}/complete",
            post(handlers::sessions::complete_session),
        )
        .route(
            "/api/sessions/{session_id}/notes",
            post(handlers::sessions::add_session_notes),
        )
        .layer(tower_governor::GovernorLayer::new(
            booking_governor_conf.clone(),
        ))
        .route_layer(from_fn(middleware_layer::actor::resolve_actor))
        .with_state(state.clone());

    let app = Router::new()
        .merge(read_routes)
        .merge(write_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default())
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(DefaultBodyLimit::max(64 * 1024))
        .layer(cors);

    let addr = SocketAddr::from(([127, 0, 0, 1], state.config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);
    tracing::info!("✅ All systems operational");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rust_nubix_client::config::Config;
use rust_nubix_client::gateway_client::NubixGatewayClient;
use rust_nubix_client::handlers::{self, AppState};
use rust_nubix_client::holidays::NorwegianHolidayCalendar;
use rust_nubix_client::triangulation::Triangulator;

/// Main entry point for the application.
///
/// Initializes tracing, loads configuration, builds the Nubix gateway and the
/// triangulator, and serves the HTTP API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_nubix_client=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let gateway = NubixGatewayClient::new(&config)?;
    tracing::info!("✓ Nubix client initialized: {}", config.nubix_service_url);

    let triangulator = Triangulator::new(
        Arc::new(gateway),
        Arc::new(NorwegianHolidayCalendar),
        config.operator_timezone,
    );

    let app_state = Arc::new(AppState {
        config: config.clone(),
        triangulator,
    });

    // Rate limiting: 10 req/sec per IP, burst of 20
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(10)
            .burst_size(20)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("invalid rate limiter configuration"))?,
    );

    let protected_routes = Router::new()
        .route(
            "/api/v1/metering-points/lookup",
            post(handlers::lookup_metering_point),
        )
        .route(
            "/api/v1/metering-points/triangulate",
            post(handlers::triangulate_metering_point),
        )
        .route("/api/v1/reading-need", get(handlers::reading_need))
        .layer(
            ServiceBuilder::new()
                .layer(RequestBodyLimitLayer::new(64 * 1024))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}

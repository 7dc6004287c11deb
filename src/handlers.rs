use crate::config::Config;
use crate::errors::AppError;
use crate::models::{MeteringPointRequest, MeteringRecord, ReadingNeedParams, ReadingNeedResponse};
use crate::triangulation::Triangulator;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Lookup orchestration over the configured gateway and holiday calendar.
    pub triangulator: Triangulator,
}

/// GET /health
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/metering-points/lookup
///
/// One lookup with exactly the fields supplied by the caller.
pub async fn lookup_metering_point(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MeteringPointRequest>,
) -> Result<Json<Vec<MeteringRecord>>, AppError> {
    tracing::info!(
        "POST /metering-points/lookup - person: {}, company: {}",
        request.person.is_some(),
        request.company.is_some()
    );

    let records = state.triangulator.lookup(request).await?;
    Ok(Json(records))
}

/// POST /api/v1/metering-points/triangulate
///
/// Fans the request out into candidate queries and returns the merged matches,
/// each carrying the `resultStrength` of the candidate that found it.
pub async fn triangulate_metering_point(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MeteringPointRequest>,
) -> Result<Json<Vec<MeteringRecord>>, AppError> {
    tracing::info!(
        "POST /metering-points/triangulate - person: {}, company: {}",
        request.person.is_some(),
        request.company.is_some()
    );

    let records = state.triangulator.triangulate(request).await?;
    Ok(Json(records))
}

/// GET /api/v1/reading-need?lastReadingDate=YYYY-MM-DD&readingType=manual
pub async fn reading_need(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ReadingNeedParams>,
) -> Result<Json<ReadingNeedResponse>, AppError> {
    tracing::debug!(
        "GET /reading-need - {:?} last read {:?} ({})",
        params.reading_type,
        params.last_reading_date,
        state.config.operator_timezone
    );

    let needs_reading = state
        .triangulator
        .needs_reading_today(params.last_reading_date, params.reading_type)?;

    Ok(Json(ReadingNeedResponse {
        needs_reading,
        reading_type: params.reading_type,
        last_reading_date: params.last_reading_date,
    }))
}

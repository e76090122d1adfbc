use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::Result,
    services::availability as availability_service,
    state::AppState,
};

/// The query parameters for resolving a coach's free slots.
#[derive(Deserialize)]
pub struct SlotsQuery {
    pub date: NaiveDate,
}

/// Resolves a coach's free slots for a date.
#[axum::debug_handler]
pub async fn available_slots(
    State(state): State<AppState>,
    Path(coach_id): Path<Uuid>,
    Query(query): Query<SlotsQuery>,
) -> Result<Response> {
    let day = availability_service::available_slots(&state, coach_id, query.date).await?;

    let response = sonic_rs::to_string(&sonic_rs::json!({
        "date": day.date.format("%Y-%m-%d").to_string(),
        "day_of_week": day.day_of_week,
        "available_slots": day.available_slots,
        "booked_slots": day.booked_slots,
    }))
    .unwrap_or_default();

    Ok((StatusCode::OK, response).into_response())
}

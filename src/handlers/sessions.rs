use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::Result,
    models::actor::Actor,
    models::session::{Exercise, SessionStatus, SessionType},
    repositories::session::SessionFilters,
    services::sessions as session_service,
    services::sessions::BookSessionInput,
    state::AppState,
    validation::booking as validate,
};

/// The request payload for booking a session.
#[derive(Deserialize)]
pub struct BookSessionRequest {
    pub coach_id: Uuid,
    pub purchase_id: Option<Uuid>,
    pub session_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub session_type: Option<SessionType>,
    pub location: Option<String>,
    pub client_notes: Option<String>,
}

/// The query parameters for listing sessions.
#[derive(Deserialize)]
pub struct ListSessionsQuery {
    pub client_id: Option<Uuid>,
    pub coach_id: Option<Uuid>,
    pub status: Option<SessionStatus>,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub upcoming: bool,
}

/// The request payload for cancelling a session.
#[derive(Deserialize)]
pub struct CancelSessionRequest {
    pub reason: Option<String>,
}

/// The request payload for rescheduling a session.
#[derive(Deserialize)]
pub struct RescheduleSessionRequest {
    pub session_date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

/// The request payload for completing a session or updating its notes.
#[derive(Deserialize)]
pub struct SessionNotesRequest {
    pub coach_notes: Option<String>,
    pub exercises: Option<Vec<Exercise>>,
}

/// Books a new session for the acting client.
#[axum::debug_handler]
pub async fn book_session(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<BookSessionRequest>,
) -> Result<Response> {
    let slot = validate::parse_slot(&req.start_time, &req.end_time)?;
    validate::validate_text("Location", &req.location, 255)?;
    validate::validate_text("Client notes", &req.client_notes, 2000)?;

    let input = BookSessionInput {
        coach_id: req.coach_id,
        purchase_id: req.purchase_id,
        session_date: req.session_date,
        slot,
        session_type: req.session_type.unwrap_or_default(),
        location: req.location,
        client_notes: req.client_notes,
    };

    let session = session_service::book(&state, &input, actor.id).await?;

    let response = sonic_rs::to_string(&sonic_rs::json!({
        "message": "Session booked successfully",
        "session": session.payload(),
    }))
    .unwrap_or_default();

    Ok((StatusCode::CREATED, response).into_response())
}

/// Lists sessions visible to the actor, with optional filters.
#[axum::debug_handler]
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<ListSessionsQuery>,
) -> Result<Response> {
    let filters = SessionFilters {
        client_id: query.client_id,
        coach_id: query.coach_id,
        status: query.status,
        date: query.date,
        upcoming: query.upcoming,
    };

    let sessions = session_service::list(&state, &actor, filters).await?;
    let payloads: Vec<_> = sessions.iter().map(|s| s.payload()).collect();
    let count = payloads.len();

    let response = sonic_rs::to_string(&sonic_rs::json!({
        "sessions": payloads,
        "count": count,
    }))
    .unwrap_or_default();

    Ok((StatusCode::OK, response).into_response())
}

/// Gets a single session by ID.
#[axum::debug_handler]
pub async fn get_session(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(session_id): Path<Uuid>,
) -> Result<Response> {
    let session = session_service::get(&state, session_id, &actor).await?;
    let response = sonic_rs::to_string(&session.payload()).unwrap_or_default();
    Ok((StatusCode::OK, response).into_response())
}

/// Cancels a scheduled session.
#[axum::debug_handler]
pub async fn cancel_session(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<CancelSessionRequest>,
) -> Result<Response> {
    validate::validate_text("Cancellation reason", &req.reason, 500)?;

    let session = session_service::cancel(&state, session_id, &actor, req.reason).await?;

    let response = sonic_rs::to_string(&sonic_rs::json!({
        "message": "Session cancelled successfully",
        "session": session.payload(),
    }))
    .unwrap_or_default();

    Ok((StatusCode::OK, response).into_response())
}

/// Reschedules a scheduled session to a new date/time.
#[axum::debug_handler]
pub async fn reschedule_session(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<RescheduleSessionRequest>,
) -> Result<Response> {
    let slot = validate::parse_slot(&req.start_time, &req.end_time)?;

    let session =
        session_service::reschedule(&state, session_id, &actor, req.session_date, slot).await?;

    let response = sonic_rs::to_string(&sonic_rs::json!({
        "message": "Session rescheduled successfully",
        "session": session.payload(),
    }))
    .unwrap_or_default();

    Ok((StatusCode::OK, response).into_response())
}

/// Marks a scheduled session as completed.
#[axum::debug_handler]
pub async fn complete_session(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SessionNotesRequest>,
) -> Result<Response> {
    validate::validate_text("Coach notes", &req.coach_notes, 2000)?;
    validate::validate_exercises(&req.exercises)?;

    let session =
        session_service::complete(&state, session_id, &actor, req.coach_notes, req.exercises)
            .await?;

    let response = sonic_rs::to_string(&sonic_rs::json!({
        "message": "Session marked as completed",
        "session": session.payload(),
    }))
    .unwrap_or_default();

    Ok((StatusCode::OK, response).into_response())
}

/// Updates a session's coach notes without changing its status.
#[axum::debug_handler]
pub async fn add_session_notes(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(session_id): Path<Uuid>,
    Json(req): Json<SessionNotesRequest>,
) -> Result<Response> {
    validate::validate_text("Coach notes", &req.coach_notes, 2000)?;
    validate::validate_exercises(&req.exercises)?;

    let session =
        session_service::add_notes(&state, session_id, &actor, req.coach_notes, req.exercises)
            .await?;

    let response = sonic_rs::to_string(&session.payload()).unwrap_or_default();
    Ok((StatusCode::OK, response).into_response())
}

/// Returns the session stats rollup. Staff only.
#[axum::debug_handler]
pub async fn session_stats(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> Result<Response> {
    if !actor.can_view_all() {
        return Err(crate::error::AppError::Unauthorized);
    }

    let stats = session_service::stats(&state).await?;

    let top_coaches: Vec<_> = stats
        .top_coaches
        .iter()
        .map(|c| {
            sonic_rs::json!({
                "coach_id": c.coach_id.to_string(),
                "display_name": c.display_name.clone(),
                "is_active": c.is_active,
                "session_count": c.session_count,
            })
        })
        .collect();

    let response = sonic_rs::to_string(&sonic_rs::json!({
        "total_sessions": stats.counts.total,
        "scheduled_sessions": stats.counts.scheduled,
        "completed_sessions": stats.counts.completed,
        "cancelled_sessions": stats.counts.cancelled,
        "upcoming_sessions": stats.counts.upcoming,
        "top_coaches": top_coaches,
    }))
    .unwrap_or_default();

    Ok((StatusCode::OK, response).into_response())
}

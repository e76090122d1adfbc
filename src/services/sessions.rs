use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::actor::{Actor, Role},
    models::coach::TopCoach,
    models::session::{CancelledBy, Exercise, Session, SessionType},
    notify::SessionEvent,
    repositories::{coach as coach_repo, purchase as purchase_repo, session as session_repo},
    repositories::session::{SessionFilters, StatusCounts},
    scheduling::interval::TimeRange,
    state::AppState,
};

/// A validated booking request.
#[derive(Debug, Clone)]
pub struct BookSessionInput {
    pub coach_id: Uuid,
    pub purchase_id: Option<Uuid>,
    pub session_date: NaiveDate,
    pub slot: TimeRange,
    pub session_type: SessionType,
    pub location: Option<String>,
    pub client_notes: Option<String>,
}

/// The session stats rollup.
pub struct SessionStats {
    pub counts: StatusCounts,
    pub top_coaches: Vec<TopCoach>,
}

/// Runs a transactional operation, retrying exactly once when the store
/// reports a deadlock or serialization conflict. The second attempt
/// re-runs the full validation path; if it also loses, the failure
/// surfaces as transient.
async fn with_single_retry<T, F, Fut>(f: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Err(e) if e.is_serialization_conflict() => {
            tracing::warn!("Transaction lost a serialization conflict, retrying once");
            f().await.map_err(|e| {
                if e.is_serialization_conflict() {
                    AppError::Transient
                } else {
                    e
                }
            })
        }
        other => other,
    }
}

/// Books a session for the acting client.
///
/// The conflict check, the session insert, and the ledger decrement run in
/// one read-committed transaction holding the coach row lock. A second
/// booking for the same coach waits on that lock and, once it resumes, its
/// conflict check reads the winner's freshly committed session, so two
/// concurrent bookings for the same slot cannot both pass.
pub async fn book(state: &AppState, input: &BookSessionInput, client_id: Uuid) -> Result<Session> {
    let session = with_single_retry(move || book_once(state, input, client_id)).await?;

    state.notifier.publish(SessionEvent::Booked {
        session_id: session.id,
        client_id: session.client_id,
        coach_id: session.coach_id,
    });
    tracing::info!(
        session_id = %session.id,
        coach_id = %session.coach_id,
        "Session booked"
    );
    Ok(session)
}

async fn book_once(
    state: &AppState,
    input: &BookSessionInput,
    client_id: Uuid,
) -> Result<Session> {
    let mut client = state.db.get().await?;
    let tx = client.transaction().await?;

    // Serializes this coach's calendar against concurrent bookings.
    let coach = coach_repo::lock_by_id(&tx, &input.coach_id)
        .await?
        .ok_or(AppError::CoachUnavailable)?;
    if !coach.is_active {
        return Err(AppError::CoachUnavailable);
    }

    if let Some(ref purchase_id) = input.purchase_id {
        let purchase = purchase_repo::lock_by_id(&tx, purchase_id)
            .await?
            .ok_or(AppError::NotFound("Package purchase"))?;
        purchase_repo::check_consumable(&purchase, &client_id)?;
    }

    if let Some(existing) =
        session_repo::find_conflict(&tx, &input.coach_id, input.session_date, &input.slot, None)
            .await?
    {
        return Err(AppError::SlotConflict(Box::new(existing)));
    }

    let session = session_repo::insert(
        &tx,
        Uuid::new_v4(),
        client_id,
        input.coach_id,
        input.purchase_id,
        input.session_type,
        input.session_date,
        input.slot,
        input.location.clone(),
        input.client_notes.clone(),
    )
    .await?;

    if let Some(ref purchase_id) = input.purchase_id {
        purchase_repo::consume(&tx, purchase_id).await?;
    }

    tx.commit().await?;
    Ok(session)
}

/// Cancels a scheduled session, refunding its entitlement if it was
/// booked against a package.
pub async fn cancel(
    state: &AppState,
    session_id: Uuid,
    actor: &Actor,
    reason: Option<String>,
) -> Result<Session> {
    let session = session_repo::find_by_id(&state.db, &session_id)
        .await?
        .ok_or(AppError::NotFound("Session"))?;
    let coach = coach_repo::find_by_id(&state.db, &session.coach_id)
        .await?
        .ok_or(AppError::NotFound("Coach"))?;

    authorize_participant(actor, &session, coach.user_id)?;
    session.ensure_scheduled("Can only cancel scheduled sessions")?;

    let cancelled_by = CancelledBy::derive(actor.id, session.client_id, coach.user_id);

    let reason_ref = &reason;
    let cancelled = with_single_retry(move || {
        cancel_once(state, session_id, cancelled_by, reason_ref.clone())
    })
    .await?;

    state.notifier.publish(SessionEvent::Cancelled {
        session_id: cancelled.id,
        cancelled_by,
    });
    tracing::info!(
        session_id = %cancelled.id,
        cancelled_by = cancelled_by.as_str(),
        "Session cancelled"
    );
    Ok(cancelled)
}

async fn cancel_once(
    state: &AppState,
    session_id: Uuid,
    cancelled_by: CancelledBy,
    reason: Option<String>,
) -> Result<Session> {
    let mut client = state.db.get().await?;
    let tx = client.transaction().await?;

    // Re-check under the row lock: the status may have moved since the
    // pre-validation read.
    let session = session_repo::lock_by_id(&tx, &session_id)
        .await?
        .ok_or(AppError::NotFound("Session"))?;
    session.ensure_scheduled("Can only cancel scheduled sessions")?;

    let cancelled = session_repo::mark_cancelled(&tx, &session_id, cancelled_by, reason).await?;

    // The cancel and the refund commit or roll back together; a client
    // never permanently loses an entitlement to a cancelled session.
    if let Some(ref purchase_id) = session.purchase_id {
        purchase_repo::refund(&tx, purchase_id).await?;
    }

    tx.commit().await?;
    Ok(cancelled)
}

/// Moves a scheduled session to a new date/time. No ledger effect: the
/// entitlement was consumed at booking and stays consumed.
pub async fn reschedule(
    state: &AppState,
    session_id: Uuid,
    actor: &Actor,
    new_date: NaiveDate,
    new_slot: TimeRange,
) -> Result<Session> {
    let session = session_repo::find_by_id(&state.db, &session_id)
        .await?
        .ok_or(AppError::NotFound("Session"))?;
    let coach = coach_repo::find_by_id(&state.db, &session.coach_id)
        .await?
        .ok_or(AppError::NotFound("Coach"))?;

    authorize_participant(actor, &session, coach.user_id)?;
    session.ensure_scheduled("Can only reschedule scheduled sessions")?;

    let coach_id = session.coach_id;
    let rescheduled = with_single_retry(move || {
        reschedule_once(state, session_id, coach_id, new_date, new_slot)
    })
    .await?;

    state.notifier.publish(SessionEvent::Rescheduled {
        session_id: rescheduled.id,
    });
    tracing::info!(
        session_id = %rescheduled.id,
        date = %new_date,
        slot = %new_slot.display(),
        "Session rescheduled"
    );
    Ok(rescheduled)
}

async fn reschedule_once(
    state: &AppState,
    session_id: Uuid,
    coach_id: Uuid,
    new_date: NaiveDate,
    new_slot: TimeRange,
) -> Result<Session> {
    let mut client = state.db.get().await?;
    let tx = client.transaction().await?;

    // Same calendar serialization as booking.
    coach_repo::lock_by_id(&tx, &coach_id)
        .await?
        .ok_or(AppError::NotFound("Coach"))?;

    let session = session_repo::lock_by_id(&tx, &session_id)
        .await?
        .ok_or(AppError::NotFound("Session"))?;
    session.ensure_scheduled("Can only reschedule scheduled sessions")?;

    if let Some(existing) =
        session_repo::find_conflict(&tx, &coach_id, new_date, &new_slot, Some(session_id)).await?
    {
        return Err(AppError::SlotConflict(Box::new(existing)));
    }

    let updated = session_repo::update_times(&tx, &session_id, new_date, new_slot).await?;
    tx.commit().await?;
    Ok(updated)
}

/// Marks a scheduled session as completed with the coach's notes, bumping
/// the coach's lifetime counter in the same transaction.
pub async fn complete(
    state: &AppState,
    session_id: Uuid,
    actor: &Actor,
    coach_notes: Option<String>,
    exercises: Option<Vec<Exercise>>,
) -> Result<Session> {
    let session = session_repo::find_by_id(&state.db, &session_id)
        .await?
        .ok_or(AppError::NotFound("Session"))?;
    let coach = coach_repo::find_by_id(&state.db, &session.coach_id)
        .await?
        .ok_or(AppError::NotFound("Coach"))?;

    if actor.id != coach.user_id && !actor.is_admin() {
        return Err(AppError::Unauthorized);
    }
    session.ensure_scheduled("Can only complete scheduled sessions")?;

    let exercises_json = exercises
        .map(|list| serde_json::to_value(list))
        .transpose()
        .map_err(|e| AppError::Internal(format!("Failed to encode exercises: {}", e)))?;

    let coach_id = session.coach_id;
    let notes_ref = &coach_notes;
    let exercises_ref = &exercises_json;
    let completed = with_single_retry(move || {
        complete_once(
            state,
            session_id,
            coach_id,
            notes_ref.clone(),
            exercises_ref.clone(),
        )
    })
    .await?;

    state.notifier.publish(SessionEvent::Completed {
        session_id: completed.id,
        coach_id,
    });
    tracing::info!(session_id = %completed.id, coach_id = %coach_id, "Session completed");
    Ok(completed)
}

async fn complete_once(
    state: &AppState,
    session_id: Uuid,
    coach_id: Uuid,
    coach_notes: Option<String>,
    exercises: Option<serde_json::Value>,
) -> Result<Session> {
    let mut client = state.db.get().await?;
    let tx = client.transaction().await?;

    let session = session_repo::lock_by_id(&tx, &session_id)
        .await?
        .ok_or(AppError::NotFound("Session"))?;
    session.ensure_scheduled("Can only complete scheduled sessions")?;

    let completed = session_repo::mark_completed(&tx, &session_id, coach_notes, exercises).await?;
    coach_repo::increment_total_sessions(&tx, &coach_id).await?;

    tx.commit().await?;
    Ok(completed)
}

/// Updates the coach's notes on a session without changing its status.
/// Only the session's own coach may write here.
pub async fn add_notes(
    state: &AppState,
    session_id: Uuid,
    actor: &Actor,
    coach_notes: Option<String>,
    exercises: Option<Vec<Exercise>>,
) -> Result<Session> {
    let session = session_repo::find_by_id(&state.db, &session_id)
        .await?
        .ok_or(AppError::NotFound("Session"))?;
    let coach = coach_repo::find_by_id(&state.db, &session.coach_id)
        .await?
        .ok_or(AppError::NotFound("Coach"))?;

    if actor.id != coach.user_id {
        return Err(AppError::Unauthorized);
    }

    let exercises_json = exercises
        .map(|list| serde_json::to_value(list))
        .transpose()
        .map_err(|e| AppError::Internal(format!("Failed to encode exercises: {}", e)))?;

    session_repo::update_notes(&state.db, &session_id, coach_notes, exercises_json).await
}

/// Fetches one session, visible to its participants and staff.
pub async fn get(state: &AppState, session_id: Uuid, actor: &Actor) -> Result<Session> {
    let session = session_repo::find_by_id(&state.db, &session_id)
        .await?
        .ok_or(AppError::NotFound("Session"))?;
    let coach = coach_repo::find_by_id(&state.db, &session.coach_id)
        .await?
        .ok_or(AppError::NotFound("Coach"))?;

    if !actor.can_view_all() && actor.id != session.client_id && actor.id != coach.user_id {
        return Err(AppError::Unauthorized);
    }
    Ok(session)
}

/// Lists sessions with the caller's filters, scoped to what their role may
/// see: plain users only ever see their own bookings, coaches their own
/// calendar, staff everything.
pub async fn list(state: &AppState, actor: &Actor, mut filters: SessionFilters) -> Result<Vec<Session>> {
    match actor.role {
        Role::User => {
            filters.client_id = Some(actor.id);
        }
        Role::Coach => {
            let Some(coach) = coach_repo::find_by_user_id(&state.db, &actor.id).await? else {
                // The user has no coach profile yet; an empty calendar, not
                // an error.
                return Ok(Vec::new());
            };
            filters.coach_id = Some(coach.id);
        }
        _ => {}
    }
    session_repo::list(&state.db, &filters).await
}

/// Read-only rollups for the admin dashboard.
pub async fn stats(state: &AppState) -> Result<SessionStats> {
    let (counts, top_coaches) = futures::try_join!(
        session_repo::count_by_status(&state.db),
        session_repo::top_coaches(&state.db, state.config.top_coaches_limit),
    )?;
    Ok(SessionStats {
        counts,
        top_coaches,
    })
}

fn authorize_participant(actor: &Actor, session: &Session, coach_user_id: Uuid) -> Result<()> {
    if session.is_client(actor.id) || actor.id == coach_user_id || actor.is_admin() {
        return Ok(());
    }
    Err(AppError::Unauthorized)
}

use chrono::{NaiveDate, Utc};
use deadpool_postgres::{Pool, Transaction};
use tokio_postgres::types::ToSql;
use uuid::Uuid;

use crate::{
    error::Result,
    models::coach::TopCoach,
    models::session::{CancelledBy, Session, SessionStatus, SessionType},
    scheduling::interval::TimeRange,
};

/// Filters for listing sessions. All fields are optional and combined
/// with AND; `upcoming` additionally forces status = scheduled.
#[derive(Debug, Default, Clone)]
pub struct SessionFilters {
    pub client_id: Option<Uuid>,
    pub coach_id: Option<Uuid>,
    pub status: Option<SessionStatus>,
    pub date: Option<NaiveDate>,
    pub upcoming: bool,
}

/// Read-only rollup of session counts by status.
pub struct StatusCounts {
    pub total: i64,
    pub scheduled: i64,
    pub completed: i64,
    pub cancelled: i64,
    pub upcoming: i64,
}

/// Creates a new session in `scheduled` status.
#[allow(clippy::too_many_arguments)]
pub async fn insert(
    tx: &Transaction<'_>,
    id: Uuid,
    client_id: Uuid,
    coach_id: Uuid,
    purchase_id: Option<Uuid>,
    session_type: SessionType,
    session_date: NaiveDate,
    slot: TimeRange,
    location: Option<String>,
    client_notes: Option<String>,
) -> Result<Session> {
    let row = tx
        .query_one(
            r#"
            INSERT INTO sessions (
                id, client_id, coach_id, purchase_id, session_type,
                session_date, start_time, end_time, duration_minutes,
                location, client_notes, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'scheduled')
            RETURNING *
            "#,
            &[
                &id,
                &client_id,
                &coach_id,
                &purchase_id,
                &session_type,
                &session_date,
                &slot.start,
                &slot.end,
                &slot.duration_minutes(),
                &location,
                &client_notes,
            ],
        )
        .await?;
    Ok(Session::from(&row))
}

/// Finds a session by its ID.
pub async fn find_by_id(pool: &Pool, session_id: &Uuid) -> Result<Option<Session>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            SELECT *
            FROM sessions
            WHERE id = $1
            "#,
            &[session_id],
        )
        .await?;
    Ok(row.as_ref().map(Session::from))
}

/// Loads a session inside a transaction with a row lock, so the status
/// check and the status write cannot race another transition.
pub async fn lock_by_id(tx: &Transaction<'_>, session_id: &Uuid) -> Result<Option<Session>> {
    let row = tx
        .query_opt(
            r#"
            SELECT *
            FROM sessions
            WHERE id = $1
            FOR UPDATE
            "#,
            &[session_id],
        )
        .await?;
    Ok(row.as_ref().map(Session::from))
}

/// Finds a scheduled session for the coach/date whose interval overlaps
/// the requested slot under half-open semantics, optionally excluding the
/// session being rescheduled. Returns the conflicting session itself so
/// callers can report it.
pub async fn find_conflict(
    tx: &Transaction<'_>,
    coach_id: &Uuid,
    session_date: NaiveDate,
    slot: &TimeRange,
    exclude_session_id: Option<Uuid>,
) -> Result<Option<Session>> {
    let row = tx
        .query_opt(
            r#"
            SELECT *
            FROM sessions
            WHERE coach_id = $1
              AND session_date = $2
              AND status = 'scheduled'
              AND start_time < $4
              AND end_time > $3
              AND ($5::uuid IS NULL OR id <> $5)
            ORDER BY start_time ASC
            LIMIT 1
            "#,
            &[
                coach_id,
                &session_date,
                &slot.start,
                &slot.end,
                &exclude_session_id,
            ],
        )
        .await?;
    Ok(row.as_ref().map(Session::from))
}

/// Replaces a session's date/time fields, recomputing the duration.
pub async fn update_times(
    tx: &Transaction<'_>,
    session_id: &Uuid,
    session_date: NaiveDate,
    slot: TimeRange,
) -> Result<Session> {
    let row = tx
        .query_one(
            r#"
            UPDATE sessions
            SET
                session_date = $1,
                start_time = $2,
                end_time = $3,
                duration_minutes = $4,
                updated_at = NOW()
            WHERE id = $5
            RETURNING *
            "#,
            &[
                &session_date,
                &slot.start,
                &slot.end,
                &slot.duration_minutes(),
                session_id,
            ],
        )
        .await?;
    Ok(Session::from(&row))
}

/// Transitions a session to `cancelled` with its cancellation metadata.
pub async fn mark_cancelled(
    tx: &Transaction<'_>,
    session_id: &Uuid,
    cancelled_by: CancelledBy,
    reason: Option<String>,
) -> Result<Session> {
    let row = tx
        .query_one(
            r#"
            UPDATE sessions
            SET
                status = 'cancelled',
                cancelled_by = $1,
                cancellation_reason = $2,
                cancelled_at = NOW(),
                updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
            &[&cancelled_by, &reason, session_id],
        )
        .await?;
    Ok(Session::from(&row))
}

/// Transitions a session to `completed` with its completion metadata.
pub async fn mark_completed(
    tx: &Transaction<'_>,
    session_id: &Uuid,
    coach_notes: Option<String>,
    exercises: Option<serde_json::Value>,
) -> Result<Session> {
    let row = tx
        .query_one(
            r#"
            UPDATE sessions
            SET
                status = 'completed',
                coach_notes = $1,
                exercises = $2,
                updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
            &[&coach_notes, &exercises, session_id],
        )
        .await?;
    Ok(Session::from(&row))
}

/// Updates a session's coach notes/exercises without touching its status.
pub async fn update_notes(
    pool: &Pool,
    session_id: &Uuid,
    coach_notes: Option<String>,
    exercises: Option<serde_json::Value>,
) -> Result<Session> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            r#"
            UPDATE sessions
            SET
                coach_notes = $1,
                exercises = $2,
                updated_at = NOW()
            WHERE id = $3
            RETURNING *
            "#,
            &[&coach_notes, &exercises, session_id],
        )
        .await?;
    Ok(Session::from(&row))
}

/// Lists sessions matching the given filters.
///
/// Coach-scoped listings come back in calendar order (date ascending);
/// everything else newest-first, matching how clients browse history.
pub async fn list(pool: &Pool, filters: &SessionFilters) -> Result<Vec<Session>> {
    let client = pool.get().await?;

    let mut sql = String::from("SELECT * FROM sessions WHERE true");
    let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
    let today = Utc::now().date_naive();

    if let Some(ref client_id) = filters.client_id {
        params.push(client_id);
        sql.push_str(&format!(" AND client_id = ${}", params.len()));
    }
    if let Some(ref coach_id) = filters.coach_id {
        params.push(coach_id);
        sql.push_str(&format!(" AND coach_id = ${}", params.len()));
    }
    if let Some(ref status) = filters.status {
        params.push(status);
        sql.push_str(&format!(" AND status = ${}", params.len()));
    }
    if let Some(ref date) = filters.date {
        params.push(date);
        sql.push_str(&format!(" AND session_date = ${}", params.len()));
    }
    if filters.upcoming {
        params.push(&today);
        sql.push_str(&format!(
            " AND session_date >= ${} AND status = 'scheduled'",
            params.len()
        ));
    }

    if filters.coach_id.is_some() {
        sql.push_str(" ORDER BY session_date ASC, start_time ASC");
    } else {
        sql.push_str(" ORDER BY session_date DESC, start_time ASC");
    }

    let rows = client.query(&sql, &params).await?;
    Ok(rows.iter().map(Session::from).collect())
}

/// All sessions blocking a coach's calendar on a date (scheduled and
/// completed rows both occupy their slot for availability purposes).
pub async fn list_blocking_for_date(
    pool: &Pool,
    coach_id: &Uuid,
    session_date: NaiveDate,
) -> Result<Vec<Session>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT *
            FROM sessions
            WHERE coach_id = $1
              AND session_date = $2
              AND status IN ('scheduled', 'completed')
            ORDER BY start_time ASC
            "#,
            &[coach_id, &session_date],
        )
        .await?;
    Ok(rows.iter().map(Session::from).collect())
}

/// Counts sessions by status, plus upcoming scheduled sessions.
pub async fn count_by_status(pool: &Pool) -> Result<StatusCounts> {
    let client = pool.get().await?;
    let today = Utc::now().date_naive();
    let row = client
        .query_one(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'scheduled') AS scheduled,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed,
                COUNT(*) FILTER (WHERE status = 'cancelled') AS cancelled,
                COUNT(*) FILTER (WHERE status = 'scheduled' AND session_date >= $1) AS upcoming
            FROM sessions
            "#,
            &[&today],
        )
        .await?;
    Ok(StatusCounts {
        total: row.get("total"),
        scheduled: row.get("scheduled"),
        completed: row.get("completed"),
        cancelled: row.get("cancelled"),
        upcoming: row.get("upcoming"),
    })
}

/// The top-N coaches by session count, with coach identity attached.
pub async fn top_coaches(pool: &Pool, limit: i64) -> Result<Vec<TopCoach>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            r#"
            SELECT
                c.id AS coach_id,
                c.display_name,
                c.is_active,
                COUNT(s.id) AS session_count
            FROM sessions s
            JOIN coaches c ON c.id = s.coach_id
            GROUP BY c.id, c.display_name, c.is_active
            ORDER BY session_count DESC
            LIMIT $1
            "#,
            &[&limit],
        )
        .await?;
    Ok(rows
        .iter()
        .map(|row| TopCoach {
            coach_id: row.get("coach_id"),
            display_name: row.get("display_name"),
            is_active: row.get("is_active"),
            session_count: row.get("session_count"),
        })
        .collect())
}

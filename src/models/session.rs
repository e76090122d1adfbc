use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;
use uuid::Uuid;

/// The lifecycle status of a session.
///
/// `Scheduled` is the only non-terminal status: a session moves to
/// `Completed` or `Cancelled` exactly once and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "session_status")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[postgres(name = "scheduled")]
    Scheduled,
    #[postgres(name = "completed")]
    Completed,
    #[postgres(name = "cancelled")]
    Cancelled,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Scheduled => "scheduled",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        }
    }
}

/// The kind of session being booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "session_type")]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    #[postgres(name = "one_on_one")]
    OneOnOne,
    #[postgres(name = "group")]
    Group,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::OneOnOne => "one_on_one",
            SessionType::Group => "group",
        }
    }
}

impl Default for SessionType {
    fn default() -> Self {
        SessionType::OneOnOne
    }
}

/// Who cancelled a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSql, FromSql)]
#[postgres(name = "cancelled_by")]
#[serde(rename_all = "snake_case")]
pub enum CancelledBy {
    #[postgres(name = "user")]
    User,
    #[postgres(name = "coach")]
    Coach,
    #[postgres(name = "admin")]
    Admin,
}

impl CancelledBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelledBy::User => "user",
            CancelledBy::Coach => "coach",
            CancelledBy::Admin => "admin",
        }
    }

    /// Derives who a cancellation is attributed to from which identity the
    /// acting user matched: the coach's own user id wins over the client id,
    /// anyone else is acting as an admin.
    pub fn derive(actor_id: Uuid, client_id: Uuid, coach_user_id: Uuid) -> Self {
        if actor_id == coach_user_id {
            CancelledBy::Coach
        } else if actor_id == client_id {
            CancelledBy::User
        } else {
            CancelledBy::Admin
        }
    }
}

/// One exercise performed during a completed session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exercise {
    /// The name of the exercise.
    pub name: String,
    /// The number of sets performed.
    pub sets: Option<i32>,
    /// The number of reps per set.
    pub reps: Option<i32>,
    /// Free-text notes about the exercise.
    pub notes: Option<String>,
}

/// Represents a scheduled engagement between a client and a coach.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// The unique identifier for the session.
    pub id: Uuid,
    /// The ID of the client who booked the session.
    pub client_id: Uuid,
    /// The ID of the coach delivering the session.
    pub coach_id: Uuid,
    /// The ID of the package purchase backing the session, if any.
    pub purchase_id: Option<Uuid>,
    /// The kind of session.
    pub session_type: SessionType,
    /// The calendar date of the session.
    pub session_date: NaiveDate,
    /// The wall-clock start time.
    pub start_time: NaiveTime,
    /// The wall-clock end time.
    pub end_time: NaiveTime,
    /// The duration in minutes, recomputed on every time change.
    pub duration_minutes: i32,
    /// Where the session takes place.
    pub location: Option<String>,
    /// Notes from the client at booking time.
    pub client_notes: Option<String>,
    /// Notes from the coach, set on completion or via the notes endpoint.
    pub coach_notes: Option<String>,
    /// Exercises performed, set on completion or via the notes endpoint.
    pub exercises: Option<serde_json::Value>,
    /// The lifecycle status.
    pub status: SessionStatus,
    /// Who cancelled the session, if cancelled.
    pub cancelled_by: Option<CancelledBy>,
    /// Why the session was cancelled, if cancelled.
    pub cancellation_reason: Option<String>,
    /// When the session was cancelled, if cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
    /// The timestamp when the session was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the session was last updated.
    pub updated_at: DateTime<Utc>,
}

impl From<&Row> for Session {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            client_id: row.get("client_id"),
            coach_id: row.get("coach_id"),
            purchase_id: row.get("purchase_id"),
            session_type: row.get("session_type"),
            session_date: row.get("session_date"),
            start_time: row.get("start_time"),
            end_time: row.get("end_time"),
            duration_minutes: row.get("duration_minutes"),
            location: row.get("location"),
            client_notes: row.get("client_notes"),
            coach_notes: row.get("coach_notes"),
            exercises: row.get("exercises"),
            status: row.get("status"),
            cancelled_by: row.get("cancelled_by"),
            cancellation_reason: row.get("cancellation_reason"),
            cancelled_at: row.get("cancelled_at"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

impl Session {
    /// Fails unless the session is still in `scheduled` status.
    ///
    /// `message` names the attempted operation for the caller, e.g.
    /// "Can only cancel scheduled sessions".
    pub fn ensure_scheduled(&self, message: &'static str) -> crate::error::Result<()> {
        if self.status != SessionStatus::Scheduled {
            return Err(crate::error::AppError::InvalidTransition(message));
        }
        Ok(())
    }

    /// Whether the given actor id is the session's client.
    pub fn is_client(&self, actor_id: Uuid) -> bool {
        self.client_id == actor_id
    }

    /// The session as a response payload, with times rendered as "HH:MM".
    pub fn payload(&self) -> sonic_rs::Value {
        sonic_rs::json!({
            "id": self.id.to_string(),
            "client_id": self.client_id.to_string(),
            "coach_id": self.coach_id.to_string(),
            "purchase_id": self.purchase_id.map(|id| id.to_string()),
            "session_type": self.session_type.as_str(),
            "session_date": self.session_date.format("%Y-%m-%d").to_string(),
            "start_time": self.start_time.format("%H:%M").to_string(),
            "end_time": self.end_time.format("%H:%M").to_string(),
            "duration_minutes": self.duration_minutes,
            "location": self.location.clone(),
            "client_notes": self.client_notes.clone(),
            "coach_notes": self.coach_notes.clone(),
            "exercises": self.exercises.clone(),
            "status": self.status.as_str(),
            "cancelled_by": self.cancelled_by.map(|c| c.as_str()),
            "cancellation_reason": self.cancellation_reason.clone(),
            "cancelled_at": self.cancelled_at.map(|t| t.to_rfc3339()),
            "created_at": self.created_at.to_rfc3339(),
            "updated_at": self.updated_at.to_rfc3339(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn sample_session(status: SessionStatus) -> Session {
        Session {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            coach_id: Uuid::new_v4(),
            purchase_id: None,
            session_type: SessionType::OneOnOne,
            session_date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            duration_minutes: 60,
            location: None,
            client_notes: None,
            coach_notes: None,
            exercises: None,
            status,
            cancelled_by: None,
            cancellation_reason: None,
            cancelled_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn scheduled_sessions_pass_the_status_gate() {
        let session = sample_session(SessionStatus::Scheduled);
        assert!(session.ensure_scheduled("Can only cancel scheduled sessions").is_ok());
    }

    #[test]
    fn terminal_statuses_fail_the_status_gate() {
        for status in [SessionStatus::Completed, SessionStatus::Cancelled] {
            let session = sample_session(status);
            let err = session
                .ensure_scheduled("Can only cancel scheduled sessions")
                .unwrap_err();
            assert!(matches!(err, AppError::InvalidTransition(_)));
        }
    }

    #[test]
    fn cancelled_by_prefers_coach_over_client() {
        let client = Uuid::new_v4();
        let coach_user = Uuid::new_v4();
        let stranger = Uuid::new_v4();

        assert_eq!(CancelledBy::derive(client, client, coach_user), CancelledBy::User);
        assert_eq!(CancelledBy::derive(coach_user, client, coach_user), CancelledBy::Coach);
        assert_eq!(CancelledBy::derive(stranger, client, coach_user), CancelledBy::Admin);
    }

    #[test]
    fn payload_renders_wall_clock_times() {
        let session = sample_session(SessionStatus::Scheduled);
        let rendered = sonic_rs::to_string(&session.payload()).unwrap();
        assert!(rendered.contains(r#""start_time":"09:00""#));
        assert!(rendered.contains(r#""end_time":"10:00""#));
        assert!(rendered.contains(r#""session_date":"2024-06-10""#));
    }
}

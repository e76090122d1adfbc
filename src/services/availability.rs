use chrono::{Datelike, NaiveDate};
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::coach::weekday_key,
    repositories::{coach as coach_repo, session as session_repo},
    scheduling::interval::TimeRange,
    scheduling::slots,
    state::AppState,
};

/// A coach's resolved availability for one date.
pub struct DayAvailability {
    pub date: NaiveDate,
    pub day_of_week: &'static str,
    pub available_slots: Vec<String>,
    pub booked_slots: Vec<String>,
}

/// Resolves a coach's free slots on a date: the weekday template minus
/// every slot overlapping a booked session. Deterministic and read-only;
/// calling twice with no intervening writes returns identical results.
pub async fn available_slots(
    state: &AppState,
    coach_id: Uuid,
    date: NaiveDate,
) -> Result<DayAvailability> {
    let coach = coach_repo::find_by_id(&state.db, &coach_id)
        .await?
        .ok_or(AppError::NotFound("Coach"))?;
    if !coach.is_active {
        return Err(AppError::CoachUnavailable);
    }

    let weekday = date.weekday();
    let template = coach.availability.for_weekday(weekday);

    let sessions = session_repo::list_blocking_for_date(&state.db, &coach_id, date).await?;
    let booked: Vec<TimeRange> = sessions
        .iter()
        .map(|s| TimeRange::new(s.start_time, s.end_time))
        .collect();

    let available_slots = slots::free_slots(template, &booked);
    let booked_slots = booked.iter().map(TimeRange::display).collect();

    Ok(DayAvailability {
        date,
        day_of_week: weekday_key(weekday),
        available_slots,
        booked_slots,
    })
}

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio_postgres::Row;
use uuid::Uuid;

/// A coach's recurring weekly availability: lowercase weekday name to an
/// ordered list of "HH:MM-HH:MM" strings. Stored as JSONB and decoded once
/// here at the edge; mutated only by the external coach-profile collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailabilityTemplate(pub BTreeMap<String, Vec<String>>);

impl AvailabilityTemplate {
    /// The template entry for a weekday, empty if the coach has none.
    pub fn for_weekday(&self, weekday: Weekday) -> &[String] {
        self.0
            .get(weekday_key(weekday))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// The lowercase weekday name used as a template key.
pub fn weekday_key(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Represents a coach in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coach {
    /// The unique identifier for the coach.
    pub id: Uuid,
    /// The ID of the user account behind this coach.
    pub user_id: Uuid,
    /// The coach's display name.
    pub display_name: String,
    /// Whether the coach currently accepts bookings.
    pub is_active: bool,
    /// Lifetime count of completed sessions, maintained for reporting.
    pub total_sessions: i32,
    /// The coach's weekly availability template.
    pub availability: AvailabilityTemplate,
    /// The timestamp when the coach was created.
    pub created_at: DateTime<Utc>,
}

impl From<&Row> for Coach {
    fn from(row: &Row) -> Self {
        let availability = row
            .get::<_, Option<serde_json::Value>>("availability")
            .and_then(|v| serde_json::from_value(v).ok())
            .unwrap_or_default();
        Self {
            id: row.get("id"),
            user_id: row.get("user_id"),
            display_name: row.get("display_name"),
            is_active: row.get("is_active"),
            total_sessions: row.get("total_sessions"),
            availability,
            created_at: row.get("created_at"),
        }
    }
}

/// One row of the top-coaches rollup.
#[derive(Debug, Clone, Serialize)]
pub struct TopCoach {
    /// The coach's ID.
    pub coach_id: Uuid,
    /// The coach's display name.
    pub display_name: String,
    /// Whether the coach is active.
    pub is_active: bool,
    /// Sessions referencing this coach, any status.
    pub session_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use chrono::Datelike;

    #[test]
    fn weekday_keys_are_lowercase_names() {
        assert_eq!(weekday_key(Weekday::Mon), "monday");
        assert_eq!(weekday_key(Weekday::Sun), "sunday");
    }

    #[test]
    fn template_lookup_by_date_weekday() {
        let mut map = BTreeMap::new();
        map.insert(
            "monday".to_string(),
            vec!["09:00-10:00".to_string(), "10:00-11:00".to_string()],
        );
        let template = AvailabilityTemplate(map);

        // 2024-06-10 is a Monday.
        let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
        assert_eq!(template.for_weekday(date.weekday()).len(), 2);

        let tuesday = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();
        assert!(template.for_weekday(tuesday.weekday()).is_empty());
    }
}

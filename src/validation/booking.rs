use crate::error::{AppError, Result};
use crate::models::session::Exercise;
use crate::scheduling::interval::{parse_time, TimeRange};

/// Parses and validates a start/end pair of "HH:MM" strings into a
/// half-open slot.
///
/// # Arguments
///
/// * `start` - The wall-clock start time.
/// * `end` - The wall-clock end time.
///
/// # Returns
///
/// A `Result` containing the validated `TimeRange`.
pub fn parse_slot(start: &str, end: &str) -> Result<TimeRange> {
    TimeRange::checked(parse_time(start)?, parse_time(end)?)
}

/// Validates an optional free-text field against a length cap.
pub fn validate_text(field: &str, value: &Option<String>, max_len: usize) -> Result<()> {
    if let Some(v) = value {
        if v.chars().count() > max_len {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters",
                field, max_len
            )));
        }
    }
    Ok(())
}

/// Validates a structured exercise list from a completion payload.
pub fn validate_exercises(exercises: &Option<Vec<Exercise>>) -> Result<()> {
    let Some(list) = exercises else {
        return Ok(());
    };

    if list.len() > 50 {
        return Err(AppError::Validation(
            "At most 50 exercises per session".to_string(),
        ));
    }

    for exercise in list {
        if exercise.name.is_empty() || exercise.name.len() > 120 {
            return Err(AppError::Validation(
                "Exercise name must be between 1 and 120 characters".to_string(),
            ));
        }
        if exercise.sets.is_some_and(|s| s <= 0) || exercise.reps.is_some_and(|r| r <= 0) {
            return Err(AppError::Validation(
                "Exercise sets and reps must be positive".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_parsing_enforces_ordering() {
        assert!(parse_slot("09:00", "10:00").is_ok());
        assert!(parse_slot("10:00", "09:00").is_err());
        assert!(parse_slot("09:00", "09:00").is_err());
        assert!(parse_slot("late", "10:00").is_err());
    }

    #[test]
    fn text_caps_are_enforced() {
        assert!(validate_text("Location", &Some("Studio A".to_string()), 255).is_ok());
        assert!(validate_text("Location", &None, 255).is_ok());
        assert!(validate_text("Location", &Some("x".repeat(256)), 255).is_err());
    }

    #[test]
    fn text_caps_count_characters_not_bytes() {
        // Four characters, eight bytes.
        let accented = Some("éàüö".to_string());
        assert!(validate_text("Location", &accented, 4).is_ok());
        assert!(validate_text("Location", &accented, 3).is_err());
    }

    #[test]
    fn exercise_lists_are_bounded_and_named() {
        let good = Some(vec![Exercise {
            name: "Back squat".to_string(),
            sets: Some(5),
            reps: Some(5),
            notes: None,
        }]);
        assert!(validate_exercises(&good).is_ok());
        assert!(validate_exercises(&None).is_ok());

        let unnamed = Some(vec![Exercise {
            name: String::new(),
            sets: None,
            reps: None,
            notes: None,
        }]);
        assert!(validate_exercises(&unnamed).is_err());

        let negative = Some(vec![Exercise {
            name: "Deadlift".to_string(),
            sets: Some(0),
            reps: Some(5),
            notes: None,
        }]);
        assert!(validate_exercises(&negative).is_err());
    }
}

use chrono::NaiveTime;

use crate::error::{AppError, Result};

/// A half-open same-day time interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    /// Builds a range the caller already knows to be well-formed
    /// (e.g. times read back from the store).
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Builds a range from request input, failing unless start < end.
    pub fn checked(start: NaiveTime, end: NaiveTime) -> Result<Self> {
        if start >= end {
            return Err(AppError::Validation(
                "Start time must be before end time".to_string(),
            ));
        }
        Ok(Self { start, end })
    }

    /// Parses a "HH:MM-HH:MM" template string.
    pub fn parse(s: &str) -> Result<Self> {
        let (start, end) = s.split_once('-').ok_or_else(|| {
            AppError::Validation(format!("Invalid time range '{}', expected HH:MM-HH:MM", s))
        })?;
        Self::checked(parse_time(start)?, parse_time(end)?)
    }

    /// Half-open overlap test: touching intervals do not overlap,
    /// identical intervals do.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// The interval length in whole minutes.
    pub fn duration_minutes(&self) -> i32 {
        (self.end - self.start).num_minutes() as i32
    }

    /// Renders the range as "HH:MM-HH:MM".
    pub fn display(&self) -> String {
        format!(
            "{}-{}",
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// Parses a wall-clock "HH:MM" time (seconds tolerated but ignored).
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s.trim(), "%H:%M:%S"))
        .map_err(|_| AppError::Validation(format!("Invalid time '{}', expected HH:MM", s)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(s: &str) -> TimeRange {
        TimeRange::parse(s).unwrap()
    }

    #[test]
    fn overlap_is_half_open() {
        // Touching intervals are not a conflict.
        assert!(!range("09:00-10:00").overlaps(&range("10:00-11:00")));
        assert!(!range("10:00-11:00").overlaps(&range("09:00-10:00")));

        // Partial overlap in either direction is.
        assert!(range("09:00-10:00").overlaps(&range("09:30-10:30")));
        assert!(range("09:30-10:30").overlaps(&range("09:00-10:00")));

        // Containment and exact duplicates are.
        assert!(range("09:00-12:00").overlaps(&range("10:00-11:00")));
        assert!(range("10:00-11:00").overlaps(&range("09:00-12:00")));
        assert!(range("09:00-10:00").overlaps(&range("09:00-10:00")));

        // Disjoint intervals are not.
        assert!(!range("09:00-10:00").overlaps(&range("14:00-15:00")));
    }

    #[test]
    fn duration_is_end_minus_start_in_minutes() {
        assert_eq!(range("09:00-10:00").duration_minutes(), 60);
        assert_eq!(range("09:00-09:45").duration_minutes(), 45);
        assert_eq!(range("06:30-18:00").duration_minutes(), 690);
    }

    #[test]
    fn checked_rejects_inverted_and_empty_ranges() {
        let ten = parse_time("10:00").unwrap();
        let nine = parse_time("09:00").unwrap();
        assert!(TimeRange::checked(ten, nine).is_err());
        assert!(TimeRange::checked(ten, ten).is_err());
    }

    #[test]
    fn parses_wall_clock_times() {
        assert!(parse_time("09:00").is_ok());
        assert!(parse_time("23:59").is_ok());
        assert!(parse_time("09:00:00").is_ok());
        assert!(parse_time("24:00").is_err());
        assert!(parse_time("9 AM").is_err());
        assert!(parse_time("").is_err());
    }

    #[test]
    fn parse_rejects_malformed_template_entries() {
        assert!(TimeRange::parse("09:00").is_err());
        assert!(TimeRange::parse("10:00-09:00").is_err());
        assert!(TimeRange::parse("morning-noon").is_err());
    }

    #[test]
    fn display_round_trips() {
        assert_eq!(range("09:00-10:30").display(), "09:00-10:30");
    }
}

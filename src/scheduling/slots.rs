use super::interval::TimeRange;

/// Intersects a coach's weekday template with the day's booked sessions:
/// a template slot survives only if it overlaps no booked interval
/// (half-open test, so a slot ending exactly when a session starts is kept).
///
/// Malformed template entries are skipped with a warning rather than
/// failing the whole read; the template is owned by an external
/// collaborator and must not be able to break this path.
pub fn free_slots(template: &[String], booked: &[TimeRange]) -> Vec<String> {
    template
        .iter()
        .filter(|entry| match TimeRange::parse(entry) {
            Ok(slot) => !booked.iter().any(|b| slot.overlaps(b)),
            Err(_) => {
                tracing::warn!("Skipping malformed availability entry '{}'", entry);
                false
            }
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    fn booked(entries: &[&str]) -> Vec<TimeRange> {
        entries.iter().map(|s| TimeRange::parse(s).unwrap()).collect()
    }

    #[test]
    fn booked_sessions_knock_out_overlapping_slots() {
        let slots = free_slots(
            &template(&["09:00-10:00", "10:00-11:00", "11:00-12:00"]),
            &booked(&["09:30-10:30"]),
        );
        assert_eq!(slots, vec!["11:00-12:00"]);
    }

    #[test]
    fn touching_sessions_leave_the_slot_free() {
        let slots = free_slots(
            &template(&["09:00-10:00", "10:00-11:00"]),
            &booked(&["10:00-11:00"]),
        );
        assert_eq!(slots, vec!["09:00-10:00"]);
    }

    #[test]
    fn empty_template_yields_no_slots() {
        assert!(free_slots(&[], &booked(&["09:00-10:00"])).is_empty());
    }

    #[test]
    fn no_bookings_returns_the_template_in_order() {
        let entries = template(&["07:00-08:00", "09:00-10:00"]);
        assert_eq!(free_slots(&entries, &[]), entries);
    }

    #[test]
    fn malformed_entries_are_dropped() {
        let slots = free_slots(&template(&["not-a-slot", "09:00-10:00"]), &[]);
        assert_eq!(slots, vec!["09:00-10:00"]);
    }
}

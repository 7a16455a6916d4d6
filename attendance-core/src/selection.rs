//! Validation of calendar selections (the "select a time range" gesture).

use chrono::NaiveDateTime;

use crate::error::{ValidationError, ValidationResult};

/// A time range picked on the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Selection {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Selection { start, end }
    }

    /// Check that the selection can become a new session.
    ///
    /// Rejects empty or inverted ranges, ranges spanning two calendar days,
    /// and ranges starting before `now`.
    pub fn validate(&self, now: NaiveDateTime) -> ValidationResult<()> {
        if self.end <= self.start {
            return Err(ValidationError::EndBeforeStart);
        }
        if DayCheck::of(self.start, self.end) == DayCheck::CrossesDay {
            return Err(ValidationError::CrossDaySelection);
        }
        if self.start < now {
            return Err(ValidationError::PastSelection);
        }
        Ok(())
    }
}

/// Whether a range stays within one calendar day.
///
/// Creation rejects `CrossesDay`; move and resize only report it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayCheck {
    SameDay,
    CrossesDay,
}

impl DayCheck {
    pub fn of(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        // A session ending exactly at midnight still belongs to its start day.
        let last_instant = end - chrono::Duration::seconds(1);
        if start.date() == end.date() || (end > start && start.date() == last_instant.date()) {
            DayCheck::SameDay
        } else {
            DayCheck::CrossesDay
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn accepts_same_day_future_range() {
        let sel = Selection::new(at(20, 9, 0), at(20, 11, 0));
        assert_eq!(sel.validate(at(19, 8, 0)), Ok(()));
    }

    #[test]
    fn rejects_range_spanning_two_days() {
        let sel = Selection::new(at(20, 22, 0), at(21, 1, 0));
        assert_eq!(
            sel.validate(at(19, 8, 0)),
            Err(ValidationError::CrossDaySelection)
        );
    }

    #[test]
    fn rejects_past_range() {
        let sel = Selection::new(at(18, 9, 0), at(18, 10, 0));
        assert_eq!(sel.validate(at(19, 8, 0)), Err(ValidationError::PastSelection));
    }

    #[test]
    fn rejects_inverted_range() {
        let sel = Selection::new(at(20, 11, 0), at(20, 9, 0));
        assert_eq!(sel.validate(at(19, 8, 0)), Err(ValidationError::EndBeforeStart));
    }

    #[test]
    fn midnight_end_is_same_day() {
        assert_eq!(DayCheck::of(at(20, 22, 0), at(21, 0, 0)), DayCheck::SameDay);
        assert_eq!(DayCheck::of(at(20, 22, 0), at(21, 0, 30)), DayCheck::CrossesDay);
    }
}

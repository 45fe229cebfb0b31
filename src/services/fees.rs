//! Late-fee calculation

use chrono::{DateTime, Utc};

use crate::config::CirculationConfig;

/// Whole hours overdue, rounded up, with any positive duration counting as
/// at least one hour. Zero when the reference time is not past the due date.
pub fn hours_overdue(due_date: DateTime<Utc>, reference: DateTime<Utc>) -> i64 {
    let seconds = (reference - due_date).num_seconds();
    if seconds <= 0 {
        0
    } else {
        (seconds + 3599) / 3600
    }
}

/// Fee policy: a flat initial fee plus a per-started-hour charge.
///
/// The same formula serves both "returned late" (reference = returned_at)
/// and "currently overdue" (reference = now).
#[derive(Debug, Clone, Copy)]
pub struct FeeSchedule {
    pub initial_fee: i64,
    pub fee_per_hour: i64,
}

impl FeeSchedule {
    pub fn from_config(config: &CirculationConfig) -> Self {
        Self {
            initial_fee: config.initial_fee,
            fee_per_hour: config.fee_per_hour,
        }
    }

    /// Amount owed for a borrow due at `due_date`, measured at `reference`
    pub fn amount_due(&self, due_date: DateTime<Utc>, reference: DateTime<Utc>) -> i64 {
        let hours = hours_overdue(due_date, reference);
        if hours == 0 {
            0
        } else {
            self.initial_fee + hours * self.fee_per_hour
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn schedule() -> FeeSchedule {
        FeeSchedule {
            initial_fee: 5,
            fee_per_hour: 1,
        }
    }

    fn due() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn no_fee_on_or_before_due_date() {
        let fees = schedule();
        assert_eq!(fees.amount_due(due(), due()), 0);
        assert_eq!(fees.amount_due(due(), due() - Duration::hours(48)), 0);
        assert_eq!(fees.amount_due(due(), due() - Duration::seconds(1)), 0);
    }

    #[test]
    fn one_second_late_charges_a_full_hour() {
        let fees = schedule();
        assert_eq!(fees.amount_due(due(), due() + Duration::seconds(1)), 5 + 1);
    }

    #[test]
    fn partial_hours_round_up() {
        let fees = schedule();
        // 90 minutes late rounds up to 2 hours
        assert_eq!(hours_overdue(due(), due() + Duration::minutes(90)), 2);
        assert_eq!(fees.amount_due(due(), due() + Duration::minutes(90)), 5 + 2);
    }

    #[test]
    fn exact_hour_boundaries_do_not_over_round() {
        assert_eq!(hours_overdue(due(), due() + Duration::hours(1)), 1);
        assert_eq!(hours_overdue(due(), due() + Duration::hours(1) + Duration::seconds(1)), 2);
        assert_eq!(hours_overdue(due(), due() + Duration::hours(24)), 24);
    }

    #[test]
    fn fee_grows_linearly_with_hours() {
        let fees = schedule();
        assert_eq!(fees.amount_due(due(), due() + Duration::hours(10)), 5 + 10);
    }
}

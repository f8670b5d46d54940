use chrono::{Datelike, Months, NaiveDate};

use crate::models::DatePeriod;

// ── Day iteration ─────────────────────────────────────────────────────────────

/// Every calendar day of `period`, bounds included.
pub fn days_in(period: DatePeriod) -> impl Iterator<Item = NaiveDate> {
    period
        .start
        .iter_days()
        .take_while(move |day| *day <= period.end)
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// The first day of every month that begins inside `period`.
///
/// The period's own start is not included unless it falls on the 1st.
pub fn month_starts(period: DatePeriod) -> Vec<NaiveDate> {
    let mut out = Vec::new();
    let mut cursor = month_start(period.start);
    if cursor < period.start {
        cursor = match cursor.checked_add_months(Months::new(1)) {
            Some(next) => next,
            None => return out,
        };
    }
    while cursor <= period.end {
        out.push(cursor);
        cursor = match cursor.checked_add_months(Months::new(1)) {
            Some(next) => next,
            None => break,
        };
    }
    out
}

// ── Chart coordinates ─────────────────────────────────────────────────────────

/// Map a date onto a continuous x coordinate (days since the common era).
pub fn date_to_x(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

/// Inverse of [`date_to_x`], rounding to the nearest day.
pub fn x_to_date(x: f64) -> Option<NaiveDate> {
    if !x.is_finite() {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_in_inclusive() {
        let days: Vec<_> = days_in(DatePeriod::new(date(2024, 2, 28), date(2024, 3, 1))).collect();
        assert_eq!(days, vec![date(2024, 2, 28), date(2024, 2, 29), date(2024, 3, 1)]);
    }

    #[test]
    fn test_days_in_single_day() {
        let d = date(2024, 1, 1);
        assert_eq!(days_in(DatePeriod::new(d, d)).count(), 1);
    }

    #[test]
    fn test_month_starts_skips_partial_first_month() {
        let starts = month_starts(DatePeriod::new(date(2023, 11, 15), date(2024, 2, 1)));
        assert_eq!(
            starts,
            vec![date(2023, 12, 1), date(2024, 1, 1), date(2024, 2, 1)]
        );
    }

    #[test]
    fn test_month_starts_includes_start_on_first() {
        let starts = month_starts(DatePeriod::new(date(2024, 1, 1), date(2024, 1, 31)));
        assert_eq!(starts, vec![date(2024, 1, 1)]);
    }

    #[test]
    fn test_date_x_roundtrip() {
        let d = date(2024, 7, 14);
        assert_eq!(x_to_date(date_to_x(d)), Some(d));
        assert_eq!(date_to_x(date(2024, 1, 2)) - date_to_x(date(2024, 1, 1)), 1.0);
        assert!(x_to_date(f64::NAN).is_none());
    }
}

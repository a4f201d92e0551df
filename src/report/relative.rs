//! Calendar distance between two instants, phrased in Swedish.

use chrono::{Datelike, Months, NaiveDateTime};

/// Whole years, months and days from one instant to a later one.
///
/// Months are counted first on the calendar (so 31 January plus one month is
/// the last day of February), and what is left over becomes whole days.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelativeDelta {
    /// Whole years.
    pub years: u32,
    /// Whole months after the years.
    pub months: u32,
    /// Whole days after the months.
    pub days: u32,
}

impl RelativeDelta {
    /// Compute the distance from `now` to `then`.
    ///
    /// Instants in the past give a zero delta.
    #[must_use]
    pub fn between(now: NaiveDateTime, then: NaiveDateTime) -> Self {
        if then <= now {
            return Self::default();
        }

        let year_span = i64::from(then.year()) - i64::from(now.year());
        let month_span = i64::from(then.month()) - i64::from(now.month());
        let mut total_months = u32::try_from((year_span * 12 + month_span).max(0)).unwrap_or(0);

        let mut anchor = add_months(now, total_months);
        while total_months > 0 && anchor > then {
            total_months -= 1;
            anchor = add_months(now, total_months);
        }

        let days = u32::try_from((then - anchor).num_days().max(0)).unwrap_or(u32::MAX);

        Self {
            years: total_months.div_euclid(12),
            months: total_months.rem_euclid(12),
            days,
        }
    }

    /// Returns whether every component is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.years == 0 && self.months == 0 && self.days == 0
    }
}

fn add_months(start: NaiveDateTime, months: u32) -> NaiveDateTime {
    start
        .checked_add_months(Months::new(months))
        .unwrap_or(NaiveDateTime::MAX)
}

fn unit(value: u32, singular: &'static str, plural: &'static str) -> Option<String> {
    match value {
        0 => None,
        1 => Some(format!("1 {singular}")),
        n => Some(format!("{n} {plural}")),
    }
}

/// Phrase a delta in Swedish, e.g. `1 år, 2 månader och 3 dagar`.
///
/// Zero components are left out. A delta shorter than a day reads
/// `mindre än en dag`.
#[must_use]
pub fn humanize_sv(delta: RelativeDelta) -> String {
    let parts: Vec<String> = [
        unit(delta.years, "år", "år"),
        unit(delta.months, "månad", "månader"),
        unit(delta.days, "dag", "dagar"),
    ]
    .into_iter()
    .flatten()
    .collect();

    match parts.split_last() {
        None => String::from("mindre än en dag"),
        Some((last, [])) => last.clone(),
        Some((last, rest)) => format!("{} och {last}", rest.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rstest::rstest;

    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, 0, 0))
            .expect("test timestamp should be valid")
    }

    fn delta(years: u32, months: u32, days: u32) -> RelativeDelta {
        RelativeDelta {
            years,
            months,
            days,
        }
    }

    #[rstest]
    #[case(dt(2026, 10, 18, 12), dt(2026, 10, 25, 12), delta(0, 0, 7))]
    #[case(dt(2026, 10, 18, 12), dt(2026, 12, 20, 9), delta(0, 2, 1))]
    #[case(dt(2026, 10, 18, 12), dt(2027, 10, 18, 12), delta(1, 0, 0))]
    #[case(dt(2026, 10, 18, 12), dt(2028, 1, 19, 13), delta(1, 3, 1))]
    #[case(dt(2026, 1, 31, 8), dt(2026, 2, 28, 8), delta(0, 1, 0))]
    #[case(dt(2026, 1, 31, 8), dt(2026, 3, 1, 8), delta(0, 1, 1))]
    #[case(dt(2026, 10, 18, 12), dt(2026, 11, 18, 11), delta(0, 0, 30))]
    #[case(dt(2026, 10, 18, 12), dt(2026, 10, 18, 20), delta(0, 0, 0))]
    fn between_counts_calendar_months_then_days(
        #[case] now: NaiveDateTime,
        #[case] then: NaiveDateTime,
        #[case] expected: RelativeDelta,
    ) {
        assert_eq!(RelativeDelta::between(now, then), expected);
    }

    #[rstest]
    fn past_instants_give_zero() {
        let result = RelativeDelta::between(dt(2026, 10, 18, 12), dt(2026, 9, 1, 8));
        assert!(result.is_zero());
    }

    #[rstest]
    #[case(delta(0, 0, 1), "1 dag")]
    #[case(delta(0, 0, 5), "5 dagar")]
    #[case(delta(0, 1, 0), "1 månad")]
    #[case(delta(0, 3, 2), "3 månader och 2 dagar")]
    #[case(delta(1, 0, 0), "1 år")]
    #[case(delta(2, 1, 1), "2 år, 1 månad och 1 dag")]
    #[case(delta(1, 0, 9), "1 år och 9 dagar")]
    #[case(delta(0, 0, 0), "mindre än en dag")]
    fn humanize_sv_pluralises_and_joins(#[case] value: RelativeDelta, #[case] expected: &str) {
        assert_eq!(humanize_sv(value), expected);
    }
}

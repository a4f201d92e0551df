//! Terminal report for a parsed timetable.
//!
//! Output is Swedish, matching the booking site: one row per office, a
//! totals line, and a sentence saying how far away the earliest slot is.

mod relative;

use std::time::Duration;

use chrono::NaiveDateTime;

use crate::timetable::{FirstAvailable, Timetable};

pub use relative::{RelativeDelta, humanize_sv};

const NO_SLOTS: &str = "inga lediga tider hittades!";
const SLOT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Render the per-office table.
///
/// Offices without free slots get a blank "första" column. A page without
/// any office renders a single "nothing found" line.
#[must_use]
pub fn render_table(timetable: &Timetable) -> String {
    if timetable.offices.is_empty() {
        return format!("{NO_SLOTS}\n");
    }

    let mut lines = vec![
        format!("{:12} | {:>5} | {:16}", "stad", "antal", "första"),
        format!("{}+{}+{}", "-".repeat(13), "-".repeat(7), "-".repeat(17)),
    ];
    for office in &timetable.offices {
        let first = office
            .first_slot()
            .map_or_else(|| String::from(" "), |slot| slot.format(SLOT_FORMAT).to_string());
        lines.push(format!(
            "{:12} | {:>5} | {:16}",
            office.name,
            office.available(),
            first
        ));
    }
    lines.iter().map(|line| format!("{line}\n")).collect()
}

/// Render the timing and totals line.
#[must_use]
pub fn render_totals(elapsed: Duration, timetable: &Timetable) -> String {
    format!(
        "det tog totalt {:.2} sekunder att hitta {} lediga tider på {} kontor",
        elapsed.as_secs_f64(),
        timetable.total_available(),
        timetable.total_offices()
    )
}

/// Render the "earliest slot is in ..." sentence.
#[must_use]
pub fn render_first_available(now: NaiveDateTime, first: &FirstAvailable) -> String {
    let phrase = humanize_sv(RelativeDelta::between(now, first.at));
    format!("tidigast lediga tiden är om {phrase} i {}", first.office)
}

/// Render the complete report: table, totals and, when a slot exists, the
/// earliest-slot sentence.
#[must_use]
pub fn render_report(timetable: &Timetable, elapsed: Duration, now: NaiveDateTime) -> String {
    let mut out = render_table(timetable);
    out.push_str(&render_totals(elapsed, timetable));
    out.push('\n');
    if let Some(first) = timetable.first_available() {
        out.push_str(&render_first_available(now, &first));
        out.push('\n');
    }
    out
}

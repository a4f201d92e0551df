//! Timetable page parsing.
//!
//! The "first available time" search answers with one `table.timetable` per
//! office. Each bookable cell carries its start time in a `data-fromdatetime`
//! attribute. This module turns that page into a [`Timetable`].

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use scraper::{ElementRef, Html, Selector};

use crate::error::TimetableError;

const SLOT_ATTRIBUTE: &str = "data-fromdatetime";
const SLOT_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];

#[expect(
    clippy::expect_used,
    reason = "selector literals are fixed at compile time and covered by tests"
)]
fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector should parse")
}

static TABLE: LazyLock<Selector> = LazyLock::new(|| selector("table.timetable"));
static OFFICE_NAME: LazyLock<Selector> =
    LazyLock::new(|| selector("thead tr th strong#sectionName"));
static SLOT_CELL: LazyLock<Selector> = LazyLock::new(|| {
    selector(
        "tbody tr td.timetable-cells div.cellcontainer div[data-function=\"timeTableCell\"]",
    )
});

/// One office and its free slots, in page order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Office {
    /// Office name as shown on the page.
    pub name: String,
    /// Free slot start times.
    pub slots: Vec<NaiveDateTime>,
}

impl Office {
    /// Returns the number of free slots.
    #[must_use]
    pub fn available(&self) -> usize {
        self.slots.len()
    }

    /// Returns the earliest free slot, if any.
    #[must_use]
    pub fn first_slot(&self) -> Option<NaiveDateTime> {
        self.slots.iter().min().copied()
    }
}

/// The earliest slot across all offices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FirstAvailable {
    /// Office offering the slot.
    pub office: String,
    /// Slot start time.
    pub at: NaiveDateTime,
}

/// All offices listed on a timetable page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timetable {
    /// Offices in page order.
    pub offices: Vec<Office>,
}

impl Timetable {
    /// Returns the number of offices on the page.
    #[must_use]
    pub fn total_offices(&self) -> usize {
        self.offices.len()
    }

    /// Returns the number of free slots across all offices.
    #[must_use]
    pub fn total_available(&self) -> usize {
        self.offices.iter().map(Office::available).sum()
    }

    /// Returns the earliest slot across all offices.
    ///
    /// When two offices share the earliest time, the one listed first wins.
    #[must_use]
    pub fn first_available(&self) -> Option<FirstAvailable> {
        let mut best: Option<FirstAvailable> = None;
        for office in &self.offices {
            let Some(at) = office.first_slot() else {
                continue;
            };
            if best.as_ref().is_none_or(|current| at < current.at) {
                best = Some(FirstAvailable {
                    office: office.name.clone(),
                    at,
                });
            }
        }
        best
    }
}

/// Parse a timetable page.
///
/// # Errors
///
/// Returns [`TimetableError::MissingOfficeName`] when a table lacks its office
/// heading, and [`TimetableError::MalformedSlot`] when a slot time cannot be
/// parsed.
pub fn parse_timetable(html: &str) -> Result<Timetable, TimetableError> {
    let document = Html::parse_document(html);
    let offices = document
        .select(&TABLE)
        .enumerate()
        .map(|(index, table)| parse_office(index, table))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Timetable { offices })
}

fn parse_office(index: usize, table: ElementRef<'_>) -> Result<Office, TimetableError> {
    let name = table
        .select(&OFFICE_NAME)
        .next()
        .map(|heading| heading.text().collect::<String>().trim().to_owned())
        .filter(|name| !name.is_empty())
        .ok_or(TimetableError::MissingOfficeName { index })?;

    let mut slots = Vec::new();
    for cell in table.select(&SLOT_CELL) {
        let Some(raw) = cell.value().attr(SLOT_ATTRIBUTE) else {
            tracing::warn!(office = %name, "slot cell without {SLOT_ATTRIBUTE}, skipping");
            continue;
        };
        slots.push(parse_slot(&name, raw)?);
    }

    Ok(Office { name, slots })
}

fn parse_slot(office: &str, raw: &str) -> Result<NaiveDateTime, TimetableError> {
    let value = raw.trim();
    SLOT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| TimetableError::MalformedSlot {
            office: office.to_owned(),
            value: raw.to_owned(),
        })
}

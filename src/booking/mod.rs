//! Booking wizard client.
//!
//! The booking site only shows the timetable after a short multi-page form:
//! start a new booking, accept the terms, confirm Swedish residency, then ask
//! for the first available time. Each page is a POST that the site answers
//! with a redirect, and the session cookie ties the pages together.

mod session;
mod steps;
mod transport;

use chrono::NaiveDate;

use crate::config::BookingConfig;
use crate::error::PasstiderError;

pub use session::{BookingSession, INDEX_LABEL, MAX_LANDING_REDIRECTS, validation_errors};
pub use steps::{AGREEMENT_TEXT, FormStep, wizard_steps};
pub use transport::{BookingTransport, BoxFuture, HttpTransport, StepResponse, TransportError};

/// Walk the whole wizard and return the timetable page HTML.
///
/// # Errors
///
/// Returns the first error raised by the landing page or any wizard step.
pub async fn search_first_available<T: BookingTransport>(
    session: &BookingSession<'_, T>,
    config: &BookingConfig,
    from: NaiveDate,
) -> Result<String, PasstiderError> {
    session.open().await?;

    let mut page = String::new();
    for step in wizard_steps(config, from) {
        page = session.submit(&step).await?;
    }
    Ok(page)
}

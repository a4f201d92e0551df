//! A single run through the booking wizard.

use std::sync::LazyLock;
use std::time::Instant;

use reqwest::Url;
use scraper::{Html, Selector};

use super::steps::FormStep;
use super::transport::{BookingTransport, StepResponse};
use crate::config::BookingConfig;
use crate::error::{BookingError, PasstiderError};
use crate::snapshot::SnapshotStore;

/// Label used for the landing page request.
pub const INDEX_LABEL: &str = "Startsidan";

/// Redirects followed while loading the landing page.
pub const MAX_LANDING_REDIRECTS: u8 = 5;

#[expect(
    clippy::expect_used,
    reason = "selector is a compile-time constant and covered by tests"
)]
static VALIDATION_ERRORS: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".validation-summary-errors ul li").expect("valid selector")
});

/// Collect the validation messages a re-rendered wizard page shows.
#[must_use]
pub fn validation_errors(html: &str) -> Vec<String> {
    Html::parse_document(html)
        .select(&VALIDATION_ERRORS)
        .map(|item| item.text().collect::<String>().trim().to_owned())
        .filter(|text| !text.is_empty())
        .collect()
}

/// Drives the wizard over a [`BookingTransport`].
///
/// The transport carries the session cookies, so steps must be submitted in
/// order on the same session.
pub struct BookingSession<'a, T: BookingTransport> {
    transport: T,
    index_url: String,
    next_url: String,
    snapshots: &'a SnapshotStore,
}

impl<'a, T: BookingTransport> BookingSession<'a, T> {
    /// Create a session for the configured region.
    pub fn new(transport: T, config: &BookingConfig, snapshots: &'a SnapshotStore) -> Self {
        Self {
            transport,
            index_url: config.index_url(),
            next_url: config.next_url(),
            snapshots,
        }
    }

    /// Load the landing page, which sets the session cookie.
    ///
    /// Redirects are followed up to [`MAX_LANDING_REDIRECTS`] hops, as a
    /// browser would, before the final page is checked.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::RequestFailed` on transport failure,
    /// `InvalidRedirect` for an unusable `Location` and `UnexpectedStatus` for
    /// any final status other than 200 or a redirect chain that is too long.
    pub async fn open(&self) -> Result<(), PasstiderError> {
        let start = Instant::now();
        let mut current = self.index_url.clone();
        let mut response = self
            .transport
            .get(current.clone())
            .await
            .map_err(|error| request_failed(INDEX_LABEL, &error))?;

        let mut hops = 0;
        while response.is_redirect() {
            if hops == MAX_LANDING_REDIRECTS {
                return Err(unexpected(INDEX_LABEL, response.status));
            }
            let (target, next) = self
                .follow(INDEX_LABEL, &current, response.location.as_deref())
                .await?;
            current = target;
            response = next;
            hops += 1;
        }

        if response.status != 200 {
            return Err(unexpected(INDEX_LABEL, response.status));
        }
        tracing::info!(step = INDEX_LABEL, elapsed = ?start.elapsed(), "wizard step completed");
        Ok(())
    }

    /// Submit one wizard step and return the page it leads to.
    ///
    /// The site answers an accepted POST with a single 302 redirect to the
    /// next page. A plain 200 means the form came back with validation
    /// errors, and any other redirect status is not the wizard advancing.
    ///
    /// # Errors
    ///
    /// Returns `BookingError::StepRejected` when the form is re-rendered, the
    /// POST is answered with a redirect other than 302, or the redirect chain
    /// is longer than one hop; `UnexpectedStatus` for other statuses,
    /// `InvalidRedirect` for an unusable `Location` and `RequestFailed` on
    /// transport failure. Saving the rejection page can also fail with a
    /// filesystem error.
    pub async fn submit(&self, step: &FormStep) -> Result<String, PasstiderError> {
        let start = Instant::now();
        let posted = self
            .transport
            .post_form(self.next_url.clone(), step.fields.clone())
            .await
            .map_err(|error| request_failed(step.label, &error))?;

        let page = match posted.status {
            200 => return Err(self.rejected(step, &posted.body)),
            302 if posted.location.is_some() => {
                let (_, followed) = self
                    .follow(step.label, &self.next_url, posted.location.as_deref())
                    .await?;
                followed
            }
            _ if posted.is_redirect() => return Err(self.rejected(step, &posted.body)),
            status => return Err(unexpected(step.label, status)),
        };

        match page.status {
            200 => {}
            _ if page.is_redirect() => return Err(self.rejected(step, &page.body)),
            status => return Err(unexpected(step.label, status)),
        }

        tracing::info!(step = step.label, elapsed = ?start.elapsed(), "wizard step completed");
        Ok(page.body)
    }

    /// GET the page `location` points at, resolved against `base`.
    ///
    /// Returns the absolute URL that was requested together with its
    /// response.
    async fn follow(
        &self,
        label: &str,
        base: &str,
        location: Option<&str>,
    ) -> Result<(String, StepResponse), PasstiderError> {
        let raw = location.unwrap_or_default();
        let target = Some(raw.trim())
            .filter(|value| !value.is_empty())
            .and_then(|value| Url::parse(base).and_then(|url| url.join(value)).ok())
            .ok_or_else(|| BookingError::InvalidRedirect {
                step: label.to_owned(),
                location: raw.to_owned(),
            })?;
        tracing::debug!(step = label, %target, "following redirect");
        let url = String::from(target);
        let response = self
            .transport
            .get(url.clone())
            .await
            .map_err(|error| request_failed(label, &error))?;
        Ok((url, response))
    }

    fn rejected(&self, step: &FormStep, body: &str) -> PasstiderError {
        let errors = validation_errors(body);
        match self.snapshots.save_error(body) {
            Ok(Some(path)) => tracing::warn!(step = step.label, %path, "saved rejected page"),
            Ok(None) => {}
            Err(error) => return error,
        }
        BookingError::StepRejected {
            step: step.label.to_owned(),
            errors,
        }
        .into()
    }
}

fn request_failed(step: &str, error: &impl ToString) -> PasstiderError {
    BookingError::RequestFailed {
        step: step.to_owned(),
        message: error.to_string(),
    }
    .into()
}

fn unexpected(step: &str, status: u16) -> PasstiderError {
    BookingError::UnexpectedStatus {
        step: step.to_owned(),
        status,
    }
    .into()
}

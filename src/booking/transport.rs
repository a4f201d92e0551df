//! HTTP transport seam for the booking wizard.
//!
//! The session logic only needs two verbs, so it talks to a
//! [`BookingTransport`] instead of `reqwest` directly. Production code uses
//! [`HttpTransport`]; unit tests substitute `mockall` mocks.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use thiserror::Error;

use crate::config::BookingConfig;
use crate::error::BookingError;

/// A boxed future for async trait methods.
///
/// This type alias enables `mockall::automock` compatibility and trait object
/// usage for async methods in [`BookingTransport`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The parts of an HTTP response the wizard inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw `Location` header, when present.
    pub location: Option<String>,
    /// Response body decoded as text.
    pub body: String,
}

impl StepResponse {
    /// Returns whether the response is a redirect carrying a location.
    #[must_use]
    pub const fn is_redirect(&self) -> bool {
        self.status >= 300 && self.status < 400 && self.location.is_some()
    }
}

/// A request failed before a complete response was read.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Wrap a transport failure description.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        Self::new(error.to_string())
    }
}

/// Behaviour required to drive the booking wizard.
///
/// Implementations must keep cookies between calls and must not follow
/// redirects on their own: the session checks every hop itself.
pub trait BookingTransport: Send + Sync {
    /// Issue a GET request.
    fn get(&self, url: String) -> BoxFuture<'_, Result<StepResponse, TransportError>>;

    /// POST `fields` as `application/x-www-form-urlencoded`, in order.
    fn post_form(
        &self,
        url: String,
        fields: Vec<(String, String)>,
    ) -> BoxFuture<'_, Result<StepResponse, TransportError>>;
}

/// Production transport backed by a cookie-keeping `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a client with a cookie store, no automatic redirects and the
    /// configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::ClientBuildFailed`] if the TLS backend or
    /// client cannot be initialised.
    pub fn new(config: &BookingConfig) -> Result<Self, BookingError> {
        let client = Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("passtider/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| BookingError::ClientBuildFailed {
                message: error.to_string(),
            })?;
        Ok(Self { client })
    }
}

async fn into_step_response(response: Response) -> Result<StepResponse, TransportError> {
    let status = response.status().as_u16();
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(String::from);
    let body = response.text().await?;
    Ok(StepResponse {
        status,
        location,
        body,
    })
}

impl BookingTransport for HttpTransport {
    fn get(&self, url: String) -> BoxFuture<'_, Result<StepResponse, TransportError>> {
        Box::pin(async move {
            let response = self.client.get(&url).send().await?;
            into_step_response(response).await
        })
    }

    fn post_form(
        &self,
        url: String,
        fields: Vec<(String, String)>,
    ) -> BoxFuture<'_, Result<StepResponse, TransportError>> {
        Box::pin(async move {
            let response = self.client.post(&url).form(&fields).send().await?;
            into_step_response(response).await
        })
    }
}

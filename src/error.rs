//! Semantic error types for the passtider application.
//!
//! This module defines the error hierarchy for passtider, following the principle
//! of using semantic error enums (via `thiserror`) for conditions the caller might
//! inspect or report, while reserving opaque errors (`eyre::Report`) for the
//! application boundary.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {message}")]
    ParseError {
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// The `OrthoConfig` library returned an error during configuration loading.
    ///
    /// This wraps errors from the layered configuration system, including
    /// file, environment and CLI layer merge failures.
    #[error("configuration loading failed: {0}")]
    OrthoConfig(Arc<ortho_config::OrthoError>),
}

/// Errors raised while walking the booking wizard.
#[derive(Debug, Error)]
pub enum BookingError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {message}")]
    ClientBuildFailed {
        /// A description of the builder failure.
        message: String,
    },

    /// A request could not be sent or its body could not be read.
    #[error("request for \"{step}\" failed: {message}")]
    RequestFailed {
        /// The wizard step label.
        step: String,
        /// A description of the transport failure.
        message: String,
    },

    /// The server answered with a status the wizard does not expect.
    #[error("\"{step}\" returned unexpected status {status}")]
    UnexpectedStatus {
        /// The wizard step label.
        step: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The server re-rendered the form instead of advancing the wizard.
    #[error("\"{step}\" failed: {errors:?}")]
    StepRejected {
        /// The wizard step label.
        step: String,
        /// Validation messages scraped from the re-rendered page.
        errors: Vec<String>,
    },

    /// A redirect pointed somewhere that cannot be followed.
    #[error("\"{step}\" redirected to an invalid location: {location}")]
    InvalidRedirect {
        /// The wizard step label.
        step: String,
        /// The raw `Location` header value.
        location: String,
    },
}

/// Errors raised while reading the timetable page.
#[derive(Debug, Error)]
pub enum TimetableError {
    /// A timetable block carried no office name.
    #[error("timetable #{index} has no office name")]
    MissingOfficeName {
        /// Zero-based position of the table on the page.
        index: usize,
    },

    /// A slot carried a timestamp that could not be parsed.
    #[error("malformed slot '{value}' for {office}")]
    MalformedSlot {
        /// The office the slot belongs to.
        office: String,
        /// The raw attribute value.
        value: String,
    },
}

/// Errors that can occur during container engine operations.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// Failed to connect to the container engine socket.
    #[error("failed to connect to container engine: {message}")]
    ConnectionFailed {
        /// A description of the connection failure.
        message: String,
    },

    /// The container engine socket was not found.
    #[error("container engine socket not found: {path}")]
    SocketNotFound {
        /// The path where the socket was expected.
        path: PathBuf,
    },

    /// Permission denied when accessing the container engine socket.
    #[error("permission denied accessing container socket: {path}")]
    PermissionDenied {
        /// The path to the socket.
        path: PathBuf,
    },

    /// The engine reported a failure while building an image.
    #[error("failed to build image '{tag}': {message}")]
    BuildFailed {
        /// The image tag being built.
        tag: String,
        /// A description of the build failure.
        message: String,
    },

    /// The engine could not inspect an image.
    #[error("failed to inspect image '{tag}': {message}")]
    InspectFailed {
        /// The image tag being inspected.
        tag: String,
        /// A description of the inspection failure.
        message: String,
    },

    /// A built image does not honour the packaging contract.
    #[error("image '{tag}' does not match its recipe: {}", .mismatches.join("; "))]
    ImageMismatch {
        /// The image tag being verified.
        tag: String,
        /// Human-readable descriptions of each mismatch.
        mismatches: Vec<String>,
    },

    /// Health check failed - engine did not respond correctly.
    #[error("container engine health check failed: {message}")]
    HealthCheckFailed {
        /// A description of the health check failure.
        message: String,
    },

    /// Health check timed out.
    #[error("container engine health check timed out after {seconds} seconds")]
    HealthCheckTimeout {
        /// The timeout duration in seconds.
        seconds: u64,
    },
}

/// Errors that can occur during filesystem operations.
#[derive(Debug, Error)]
pub enum FilesystemError {
    /// A file or directory was not found.
    #[error("path not found: {path}")]
    NotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// An I/O error occurred.
    #[error("I/O error at '{path}': {message}")]
    IoError {
        /// The path where the error occurred.
        path: PathBuf,
        /// A description of the I/O error.
        message: String,
    },
}

/// Top-level error type for the passtider application.
///
/// This enum aggregates all domain-specific errors into a single type that can
/// be used throughout the application. At the application boundary (main.rs),
/// these errors are converted to `eyre::Report` for human-readable reporting.
#[derive(Debug, Error)]
pub enum PasstiderError {
    /// An error occurred during configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An error occurred while walking the booking wizard.
    #[error(transparent)]
    Booking(#[from] BookingError),

    /// An error occurred while parsing the timetable.
    #[error(transparent)]
    Timetable(#[from] TimetableError),

    /// An error occurred during container engine operations.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// An error occurred during filesystem operations.
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// A specialised `Result` type for passtider operations.
pub type Result<T> = std::result::Result<T, PasstiderError>;

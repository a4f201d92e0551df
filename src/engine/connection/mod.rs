//! Socket resolution and container engine connection.
//!
//! This module resolves the container engine endpoint from configuration,
//! well-known environment variables and platform defaults, then connects
//! through `Bollard`. Connection failures are classified so the user learns
//! whether the socket is missing, unreadable or simply unreachable.

mod error_classification;
mod health_check;
mod image_build;

use bollard::Docker;

use crate::error::PasstiderError;
use error_classification::classify_connection_error;

pub use image_build::{BuildImageFuture, ImageEngine, InspectImageFuture, image_mismatches};

/// Environment variables checked, in order, after configuration sources.
const FALLBACK_ENV_VARS: &[&str] = &["DOCKER_HOST", "CONTAINER_HOST", "PODMAN_HOST"];

/// Connection timeout in seconds for engine API calls.
///
/// Image builds stream for a long time, so this is generous.
const CONNECTION_TIMEOUT_SECS: u64 = 600;

/// Timeout in seconds for health check operations.
const HEALTH_CHECK_TIMEOUT_SECS: u64 = 10;

#[cfg(unix)]
const DEFAULT_SOCKET: &str = "unix:///var/run/docker.sock";

#[cfg(windows)]
const DEFAULT_SOCKET: &str = "npipe:////./pipe/docker_engine";

/// Resolves engine endpoints from `DOCKER_HOST`, `CONTAINER_HOST` and
/// `PODMAN_HOST`.
///
/// The environment is injected through `mockable::Env` so resolution can be
/// tested without touching the process environment.
pub struct SocketResolver<'a, E: mockable::Env> {
    env: &'a E,
}

impl<'a, E: mockable::Env> SocketResolver<'a, E> {
    /// Creates a resolver over the given environment provider.
    #[must_use]
    pub const fn new(env: &'a E) -> Self {
        Self { env }
    }

    /// Returns the first non-empty fallback variable, if any.
    #[must_use]
    pub fn resolve_from_env(&self) -> Option<String> {
        FALLBACK_ENV_VARS
            .iter()
            .filter_map(|var_name| self.env.string(var_name))
            .find(|value| !value.is_empty())
    }

    /// Returns the platform default endpoint.
    #[must_use]
    pub const fn default_socket() -> &'static str {
        DEFAULT_SOCKET
    }
}

/// Endpoint shapes accepted by [`EngineConnector::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SocketType {
    Socket,
    Http,
    BarePath,
}

impl SocketType {
    fn classify(socket: &str) -> Self {
        if socket.starts_with("unix://") || socket.starts_with("npipe://") {
            Self::Socket
        } else if ["tcp://", "http://", "https://"]
            .iter()
            .any(|scheme| socket.starts_with(scheme))
        {
            Self::Http
        } else {
            Self::BarePath
        }
    }
}

/// Connects to Docker or Podman and drives image operations.
pub struct EngineConnector;

impl EngineConnector {
    /// Connect to the engine at `socket`.
    ///
    /// Accepts `unix://` and `npipe://` sockets, `tcp://` (sent as HTTP),
    /// `http://`, `https://`, and bare paths. A bare path starting with `//`
    /// or `\\` is a named pipe; anything else is a Unix socket.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::SocketNotFound`, `PermissionDenied` or
    /// `ConnectionFailed` depending on why the client could not be created.
    pub fn connect(socket: &str) -> Result<Docker, PasstiderError> {
        let (socket_uri, use_http) = match SocketType::classify(socket) {
            SocketType::Socket => (socket.to_owned(), false),
            SocketType::Http => (socket.replacen("tcp://", "http://", 1), true),
            SocketType::BarePath => (Self::normalize_bare_path(socket), false),
        };
        let result = if use_http {
            Docker::connect_with_http(
                &socket_uri,
                CONNECTION_TIMEOUT_SECS,
                bollard::API_DEFAULT_VERSION,
            )
        } else {
            Docker::connect_with_socket(
                &socket_uri,
                CONNECTION_TIMEOUT_SECS,
                bollard::API_DEFAULT_VERSION,
            )
        };
        result.map_err(|error| PasstiderError::from(classify_connection_error(&error, &socket_uri)))
    }

    fn normalize_bare_path(path: &str) -> String {
        if path.starts_with("\\\\") || path.starts_with("//") {
            format!("npipe://{path}")
        } else {
            format!("unix://{path}")
        }
    }

    /// Connect to the endpoint chosen by [`Self::resolve_socket`].
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Self::connect`].
    pub fn connect_with_fallback<E: mockable::Env>(
        config_socket: Option<&str>,
        resolver: &SocketResolver<'_, E>,
    ) -> Result<Docker, PasstiderError> {
        let socket = Self::resolve_socket(config_socket, resolver);
        tracing::debug!(%socket, "connecting to container engine");
        Self::connect(&socket)
    }

    /// Pick the engine endpoint without connecting.
    ///
    /// Resolution order:
    /// 1. `config_socket` (CLI, config file or `PASSTIDER_ENGINE_SOCKET`)
    /// 2. `DOCKER_HOST`, `CONTAINER_HOST`, `PODMAN_HOST`
    /// 3. Platform default
    #[must_use]
    pub fn resolve_socket<E: mockable::Env>(
        config_socket: Option<&str>,
        resolver: &SocketResolver<'_, E>,
    ) -> String {
        config_socket
            .filter(|socket| !socket.is_empty())
            .map(String::from)
            .or_else(|| resolver.resolve_from_env())
            .unwrap_or_else(|| SocketResolver::<E>::default_socket().to_owned())
    }
}

#[cfg(test)]
mod tests;

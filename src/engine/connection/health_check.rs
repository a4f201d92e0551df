//! Engine health check and connect-and-verify helpers.

use std::time::Duration;

use bollard::Docker;

use super::{EngineConnector, HEALTH_CHECK_TIMEOUT_SECS, SocketResolver};
use crate::error::{ContainerError, PasstiderError};

impl EngineConnector {
    /// Ping the engine, failing if it does not answer in time.
    ///
    /// A reachable socket is not enough before a long image build: this
    /// confirms the daemon behind it is actually serving requests.
    ///
    /// # Errors
    ///
    /// Returns `ContainerError::HealthCheckFailed` if the ping fails and
    /// `ContainerError::HealthCheckTimeout` if it does not complete in time.
    pub async fn health_check_async(docker: &Docker) -> Result<(), PasstiderError> {
        let timeout = Duration::from_secs(HEALTH_CHECK_TIMEOUT_SECS);

        tokio::time::timeout(timeout, docker.ping())
            .await
            .map_err(|_| {
                PasstiderError::from(ContainerError::HealthCheckTimeout {
                    seconds: HEALTH_CHECK_TIMEOUT_SECS,
                })
            })?
            .map_err(|error| {
                PasstiderError::from(ContainerError::HealthCheckFailed {
                    message: error.to_string(),
                })
            })?;
        Ok(())
    }

    /// Resolve the endpoint, connect, and ping the engine.
    ///
    /// # Errors
    ///
    /// Returns the connection errors of [`Self::connect`] or the health
    /// check errors of [`Self::health_check_async`].
    pub async fn connect_with_fallback_and_verify_async<E: mockable::Env>(
        config_socket: Option<&str>,
        resolver: &SocketResolver<'_, E>,
    ) -> Result<Docker, PasstiderError> {
        let docker = Self::connect_with_fallback(config_socket, resolver)?;
        Self::health_check_async(&docker).await?;
        Ok(docker)
    }
}

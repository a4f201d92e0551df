//! Container engine connection and image operations.
//!
//! The engine endpoint is resolved through a priority-based fallback chain:
//!
//! 1. CLI argument (`--engine-socket`)
//! 2. Config file (`engine_socket` in TOML)
//! 3. `PASSTIDER_ENGINE_SOCKET` environment variable
//! 4. `DOCKER_HOST` environment variable
//! 5. `CONTAINER_HOST` environment variable
//! 6. `PODMAN_HOST` environment variable
//! 7. Platform default (`/var/run/docker.sock` on Unix)
//!
//! Once connected, the engine builds the passtider image from a prepared
//! context and verifies the result against its recipe.

mod connection;

pub use connection::{
    BuildImageFuture, EngineConnector, ImageEngine, InspectImageFuture, SocketResolver,
    image_mismatches,
};

//! Turns `Bollard` connection errors into actionable `ContainerError`s.

use std::io;
use std::path::Path;

use crate::error::ContainerError;

/// Filesystem path behind a `unix://` or `npipe://` URI.
///
/// HTTP endpoints have no path and yield `None`.
pub(super) fn extract_socket_path(socket_uri: &str) -> Option<&Path> {
    socket_uri
        .strip_prefix("unix://")
        .or_else(|| socket_uri.strip_prefix("npipe://"))
        .map(Path::new)
}

fn classify_io_error_kind(
    kind: io::ErrorKind,
    socket_path: Option<&Path>,
    error_msg: &str,
) -> ContainerError {
    match (kind, socket_path) {
        (io::ErrorKind::PermissionDenied, Some(path)) => ContainerError::PermissionDenied {
            path: path.to_path_buf(),
        },
        (io::ErrorKind::NotFound, Some(path)) => ContainerError::SocketNotFound {
            path: path.to_path_buf(),
        },
        _ => ContainerError::ConnectionFailed {
            message: error_msg.to_owned(),
        },
    }
}

/// Classify a connection error for the endpoint `socket_uri`.
///
/// Missing and unreadable sockets get their own variants; everything else,
/// and every failure on an HTTP endpoint, is `ConnectionFailed`.
pub(super) fn classify_connection_error(
    bollard_error: &bollard::errors::Error,
    socket_uri: &str,
) -> ContainerError {
    let socket_path = extract_socket_path(socket_uri);
    let error_msg = bollard_error.to_string();

    match bollard_error {
        bollard::errors::Error::SocketNotFoundError(_) => {
            if let Some(path) = socket_path {
                return ContainerError::SocketNotFound {
                    path: path.to_path_buf(),
                };
            }
        }
        bollard::errors::Error::IOError { err } => {
            let kind = io_error_kind_in_chain(err).unwrap_or_else(|| err.kind());
            return classify_io_error_kind(kind, socket_path, &error_msg);
        }
        _ => {}
    }

    io_error_kind_in_chain(bollard_error).map_or_else(
        || ContainerError::ConnectionFailed {
            message: error_msg.clone(),
        },
        |kind| classify_io_error_kind(kind, socket_path, &error_msg),
    )
}

/// Walk the source chain looking for an `io::Error`.
fn io_error_kind_in_chain(error: &dyn std::error::Error) -> Option<io::ErrorKind> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = error.source();
    while let Some(err) = current {
        if let Some(io_err) = err.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        current = err.source();
    }
    None
}

//! Unit tests for socket resolution and engine connection.

use mockable::MockEnv;
use rstest::{fixture, rstest};

use super::{EngineConnector, SocketResolver, SocketType};
use crate::error::{ContainerError, PasstiderError};

/// Build a `MockEnv` answering only the given variables.
fn env_with(vars: &[(&str, &str)]) -> MockEnv {
    let owned: Vec<(String, String)> = vars
        .iter()
        .map(|(key, value)| (String::from(*key), String::from(*value)))
        .collect();
    let mut env = MockEnv::new();
    env.expect_string().returning(move |key| {
        owned
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.clone())
    });
    env
}

/// Fixture providing a `MockEnv` with no variables set.
#[fixture]
fn empty_env() -> MockEnv {
    env_with(&[])
}

#[rstest]
#[case::docker_host(&[("DOCKER_HOST", "unix:///docker.sock")], Some("unix:///docker.sock"))]
#[case::container_host(&[("CONTAINER_HOST", "unix:///container.sock")], Some("unix:///container.sock"))]
#[case::podman_host(&[("PODMAN_HOST", "unix:///podman.sock")], Some("unix:///podman.sock"))]
#[case::docker_over_podman(
    &[("DOCKER_HOST", "unix:///docker.sock"), ("PODMAN_HOST", "unix:///podman.sock")],
    Some("unix:///docker.sock")
)]
#[case::empty_values_skipped(
    &[("DOCKER_HOST", ""), ("CONTAINER_HOST", ""), ("PODMAN_HOST", "tcp://remote:2375")],
    Some("tcp://remote:2375")
)]
#[case::all_empty(&[("DOCKER_HOST", ""), ("PODMAN_HOST", "")], None)]
#[case::nothing_set(&[], None)]
fn resolver_checks_fallback_variables_in_order(
    #[case] vars: &[(&str, &str)],
    #[case] expected: Option<&str>,
) {
    let env = env_with(vars);
    let resolver = SocketResolver::new(&env);
    assert_eq!(resolver.resolve_from_env(), expected.map(String::from));
}

#[rstest]
fn configured_socket_wins_over_environment() {
    let env = env_with(&[("DOCKER_HOST", "unix:///docker.sock")]);
    let resolver = SocketResolver::new(&env);
    assert_eq!(
        EngineConnector::resolve_socket(Some("unix:///config.sock"), &resolver),
        "unix:///config.sock"
    );
    assert_eq!(
        EngineConnector::resolve_socket(Some(""), &resolver),
        "unix:///docker.sock"
    );
}

#[rstest]
#[cfg(unix)]
fn platform_default_is_last_resort(empty_env: MockEnv) {
    let resolver = SocketResolver::new(&empty_env);
    assert_eq!(
        EngineConnector::resolve_socket(None, &resolver),
        "unix:///var/run/docker.sock"
    );
}

#[rstest]
#[case("unix:///run/docker.sock", SocketType::Socket)]
#[case("npipe:////./pipe/docker_engine", SocketType::Socket)]
#[case("tcp://host:2375", SocketType::Http)]
#[case("https://host:2376", SocketType::Http)]
#[case("/run/podman/podman.sock", SocketType::BarePath)]
fn endpoints_are_classified_by_scheme(#[case] socket: &str, #[case] expected: SocketType) {
    assert_eq!(SocketType::classify(socket), expected);
}

#[rstest]
#[case::tcp_hostname("tcp://host:2375")]
#[case::tcp_ip("tcp://192.168.1.100:2376")]
#[case::http("http://remotehost:2375")]
#[case::https("https://remotehost:2376")]
fn http_compatible_endpoints_create_client(#[case] endpoint: &str) {
    // connect_with_http only builds the client; nothing is dialled yet.
    EngineConnector::connect(endpoint)
        .unwrap_or_else(|error| panic!("connect {endpoint} should create client: {error}"));
}

#[rstest]
fn tcp_endpoint_from_environment_connects() {
    let env = env_with(&[("DOCKER_HOST", "tcp://192.168.1.100:2376")]);
    let resolver = SocketResolver::new(&env);
    EngineConnector::connect_with_fallback(None, &resolver)
        .expect("tcp endpoint from DOCKER_HOST should create client");
}

#[rstest]
#[cfg(unix)]
fn missing_unix_socket_is_reported_with_its_path() {
    let tmp = tempfile::tempdir().expect("should create temp dir");
    let socket = tmp.path().join("absent.sock");
    let uri = format!("unix://{}", socket.display());

    let result = EngineConnector::connect(&uri);

    assert!(matches!(
        result,
        Err(PasstiderError::Container(ContainerError::SocketNotFound { ref path }))
            if *path == socket
    ));
}

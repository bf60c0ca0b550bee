// ABOUTME: Runtime connection errors with SNAFU pattern.
// ABOUTME: Separates reaching the runtime socket from individual operations.

use snafu::Snafu;

/// Failure to establish a connection to the container runtime.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ConnectError {
    #[snafu(display("failed to connect to container runtime at {socket}: {source}"))]
    Socket {
        socket: String,
        source: bollard::errors::Error,
    },
}

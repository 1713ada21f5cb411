//! Launch failures, one variant per lifecycle stage.

use thiserror::Error;

use crate::bootstrap::BootstrapError;
use crate::transport::ListenerError;

use super::shutdown::ShutdownError;

/// Why the server process could not start or stopped abnormally.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Configuration, telemetry, token or plugin loading failed.
    #[error("bootstrap failed: {0}")]
    Bootstrap(#[from] BootstrapError),
    /// The listener could not be bound, started or joined.
    #[error("listener failed: {0}")]
    Listener(#[from] ListenerError),
    /// Termination signals could not be awaited.
    #[error("cannot wait for shutdown: {0}")]
    Shutdown(#[from] ShutdownError),
}

//! Blocking wait for process termination.

use std::fmt;
use std::io;
use std::sync::{Mutex, PoisonError};

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::info;

use super::PROCESS_TARGET;

/// Signals that stop the server.
const TERMINATION_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Source of the "stop serving now" notification.
pub trait ShutdownSignal: Send + Sync {
    /// Blocks until the server should stop.
    ///
    /// # Errors
    ///
    /// Fails when the notification source cannot be set up.
    fn wait(&self) -> Result<(), ShutdownError>;
}

/// Failure to observe a shutdown request.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Signal handlers could not be registered.
    #[error("cannot register signal handlers: {source}")]
    Install {
        /// OS error.
        #[source]
        source: io::Error,
    },
}

/// Waits for SIGTERM, SIGINT, SIGQUIT or SIGHUP.
///
/// Handlers are registered when the value is installed, so a signal that
/// arrives while the server is still starting is delivered to the first
/// [`ShutdownSignal::wait`] instead of taking the default action.
pub struct SystemShutdownSignal {
    signals: Mutex<Signals>,
}

impl SystemShutdownSignal {
    /// Registers the termination signal handlers.
    ///
    /// # Errors
    ///
    /// Fails when the handlers cannot be registered.
    pub fn install() -> Result<Self, ShutdownError> {
        let signals =
            Signals::new(TERMINATION_SIGNALS).map_err(|source| ShutdownError::Install { source })?;
        Ok(Self {
            signals: Mutex::new(signals),
        })
    }
}

impl ShutdownSignal for SystemShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let mut signals = self.signals.lock().unwrap_or_else(PoisonError::into_inner);
        let received = signals.forever().next();
        info!(
            target: PROCESS_TARGET,
            signal = received.map(signal_name),
            "stopping on signal"
        );
        Ok(())
    }
}

impl fmt::Debug for SystemShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemShutdownSignal")
            .field("signals", &TERMINATION_SIGNALS.map(signal_name))
            .finish()
    }
}

fn signal_name(signal: i32) -> &'static str {
    match signal {
        SIGTERM => "SIGTERM",
        SIGINT => "SIGINT",
        SIGQUIT => "SIGQUIT",
        SIGHUP => "SIGHUP",
        _ => "unknown",
    }
}

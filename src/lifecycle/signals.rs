//! Process-wide interrupt registration.
//!
//! Listeners are installed eagerly by [`Interrupts::register`] at program
//! start and live until the process exits; there is no teardown.
//!
//! ## Unix
//! SIGINT, SIGTERM and SIGQUIT all request a graceful shutdown.
//!
//! ## Other platforms
//! Only Ctrl-C is observed.

use crate::utils::{Error, Result};

#[cfg(unix)]
pub struct Interrupts {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
    sigquit: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Interrupts {
    /// Must be called from inside the tokio runtime.
    pub fn register() -> Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};

        Ok(Self {
            sigint: signal(SignalKind::interrupt()).map_err(Error::Signal)?,
            sigterm: signal(SignalKind::terminate()).map_err(Error::Signal)?,
            sigquit: signal(SignalKind::quit()).map_err(Error::Signal)?,
        })
    }

    /// Blocks (without polling) until the first interrupt arrives.
    pub async fn recv(&mut self) {
        tokio::select! {
            _ = self.sigint.recv() => {},
            _ = self.sigterm.recv() => {},
            _ = self.sigquit.recv() => {},
        }
    }
}

#[cfg(not(unix))]
pub struct Interrupts {
    _private: (),
}

#[cfg(not(unix))]
impl Interrupts {
    pub fn register() -> Result<Self> {
        Ok(Self { _private: () })
    }

    pub async fn recv(&mut self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("ctrl-c listener failed: {}", Error::Signal(e));
        }
    }
}
